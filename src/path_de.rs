use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Deserialize with JSON-path context in error messages.
pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| {
        let path = err.path().to_string();
        anyhow!("at JSON path {path} → {}", err.into_inner())
    })
}

/// Parse a JSON document, optionally select a subnode by JSON Pointer, then
/// deserialize it with path context.
pub fn from_str_at_pointer<T: DeserializeOwned>(src: &str, pointer: Option<&str>) -> Result<T> {
    let mut doc = serde_json::from_str::<Value>(src)?;
    let node = match pointer {
        None => doc,
        Some(ptr) => doc
            .pointer_mut(ptr)
            .map(Value::take)
            .ok_or_else(|| anyhow!("JSON pointer {ptr} selects nothing"))?,
    };
    from_value_with_path(node)
}
