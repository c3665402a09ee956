//! Spec-string grammar.
//!
//! A spec string names a check function and its arguments:
//!
//! ```text
//! integer(0, 10, default=5)
//! option("fast", "slow", default="fast")
//! string_list(min=1, default=list("a", "b"))
//! boolean
//! ```
//!
//! [`parse`] splits one spec into the function name, positional arguments,
//! keyword arguments and the (still textual) default. Turning that text into
//! typed values is the job of [`coerce`].
pub mod coerce;

use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub use coerce::ValidationError;

// ------------------------------- Types ------------------------------------ //

/// One argument value as written in the spec string, quotes removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawArg {
    Scalar { text: String, quoted: bool },
    List(Vec<String>),
}

/// Output of [`parse`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCheck {
    pub name: String,
    pub args: Vec<String>,
    pub kwargs: IndexMap<String, RawArg>,
    /// `None` when the spec string has no `default=`; distinct from `default=None`.
    pub default: Option<RawArg>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecSyntaxError {
    #[error("bad syntax in check \"{0}\"")]
    Malformed(String),
    #[error("unterminated quote in check \"{0}\"")]
    UnterminatedQuote(String),
    #[error("empty argument in check \"{0}\"")]
    EmptyArgument(String),
    #[error("keyword `{key}` given more than once in check \"{check}\"")]
    DuplicateKeyword { key: String, check: String },
    #[error("list(...) is only allowed as a keyword value in check \"{0}\"")]
    PositionalList(String),
}

// ------------------------------- Regexes ---------------------------------- //

static CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^([^()]+?)\((.*)\)$").expect("call regex")
});

static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*)$").expect("keyword regex")
});

static LIST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^list\s*\((.*)\)$").expect("list regex")
});

// ------------------------------- Parse ------------------------------------ //

/// Parse a spec string. A spec without parentheses is a bare function name.
pub fn parse(check: &str) -> Result<ParsedCheck, SpecSyntaxError> {
    let trimmed = check.trim();
    let Some(caps) = CALL_RE.captures(trimmed) else {
        if trimmed.contains(['(', ')']) {
            return Err(SpecSyntaxError::Malformed(check.to_string()));
        }
        return Ok(ParsedCheck { name: trimmed.to_string(), ..ParsedCheck::default() });
    };

    let name = caps[1].trim().to_string();
    let mut out = ParsedCheck { name, ..ParsedCheck::default() };

    for piece in split_args(&caps[2], check)? {
        if let Some(kw) = KEYWORD_RE.captures(&piece) {
            let key = kw[1].to_string();
            let value = match LIST_RE.captures(&kw[2]) {
                Some(list) => RawArg::List(
                    split_args(&list[1], check)?
                        .iter()
                        .map(|member| scalar(member, check).map(|(text, _)| text))
                        .collect::<Result<_, _>>()?,
                ),
                None => {
                    let (text, quoted) = scalar(&kw[2], check)?;
                    RawArg::Scalar { text, quoted }
                }
            };
            if out.kwargs.contains_key(&key) {
                return Err(SpecSyntaxError::DuplicateKeyword { key, check: check.to_string() });
            }
            out.kwargs.insert(key, value);
        } else if LIST_RE.is_match(&piece) {
            return Err(SpecSyntaxError::PositionalList(check.to_string()));
        } else {
            out.args.push(scalar(&piece, check)?.0);
        }
    }

    out.default = out.kwargs.shift_remove("default");
    Ok(out)
}

/// Unquoted `None` means null. Quoted `"None"` stays the text `None`.
pub fn normalize_none(raw: RawArg) -> Option<RawArg> {
    match &raw {
        RawArg::Scalar { text, quoted: false } if text == "None" => None,
        _ => Some(raw),
    }
}

// ------------------------------- Helpers ---------------------------------- //

/// Split on top-level commas. Commas inside quotes or parentheses stay put.
/// A single trailing comma is tolerated.
fn split_args(body: &str, check: &str) -> Result<Vec<String>, SpecSyntaxError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;

    for c in body.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' if opens_value(&current) => {
                    quote = Some(c);
                    current.push(c);
                }
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| SpecSyntaxError::Malformed(check.to_string()))?;
                    current.push(c);
                }
                ',' if depth == 0 => pieces.push(std::mem::take(&mut current)),
                _ => current.push(c),
            },
        }
    }

    if quote.is_some() {
        return Err(SpecSyntaxError::UnterminatedQuote(check.to_string()));
    }
    if depth != 0 {
        return Err(SpecSyntaxError::Malformed(check.to_string()));
    }
    if !current.trim().is_empty() {
        pieces.push(current);
    }

    pieces
        .into_iter()
        .map(|p| {
            let p = p.trim();
            if p.is_empty() {
                Err(SpecSyntaxError::EmptyArgument(check.to_string()))
            } else {
                Ok(p.to_string())
            }
        })
        .collect()
}

/// A quote only opens a value at the start of a token.
fn opens_value(current: &str) -> bool {
    let t = current.trim_end();
    t.is_empty() || t.ends_with(['=', '(', ','])
}

fn scalar(piece: &str, check: &str) -> Result<(String, bool), SpecSyntaxError> {
    let piece = piece.trim();
    match piece.chars().next() {
        Some(q @ ('"' | '\'')) => {
            if piece.len() >= 2 && piece.ends_with(q) {
                Ok((piece[1..piece.len() - 1].to_string(), true))
            } else {
                Err(SpecSyntaxError::UnterminatedQuote(check.to_string()))
            }
        }
        Some(_) => Ok((piece.to_string(), false)),
        None => Err(SpecSyntaxError::EmptyArgument(check.to_string())),
    }
}

impl RawArg {
    pub fn text(text: impl Into<String>) -> Self {
        RawArg::Scalar { text: text.into(), quoted: false }
    }
}

impl fmt::Display for RawArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawArg::Scalar { text, .. } => write!(f, "{text}"),
            RawArg::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_kw<'a>(p: &'a ParsedCheck, key: &str) -> &'a str {
        match p.kwargs.get(key) {
            Some(RawArg::Scalar { text, .. }) => text,
            other => panic!("expected scalar for {key}, got {other:?}"),
        }
    }

    #[test]
    fn bare_name_has_no_args_or_default() {
        let p = parse("boolean").unwrap();
        assert_eq!(p.name, "boolean");
        assert!(p.args.is_empty());
        assert!(p.kwargs.is_empty());
        assert_eq!(p.default, None);

        let empty = parse("").unwrap();
        assert_eq!(empty.name, "");
    }

    #[test]
    fn keywords_positionals_and_default_are_separated() {
        let p = parse("integer(0, max=10, default=5)").unwrap();
        assert_eq!(p.name, "integer");
        assert_eq!(p.args, vec!["0".to_string()]);
        assert_eq!(scalar_kw(&p, "max"), "10");
        assert!(!p.kwargs.contains_key("default"));
        assert_eq!(p.default, Some(RawArg::text("5")));
    }

    #[test]
    fn quoted_values_keep_commas_and_parens() {
        let p = parse(r#"option("a, b", 'c)', default="a, b")"#).unwrap();
        assert_eq!(p.args, vec!["a, b".to_string(), "c)".to_string()]);
        assert_eq!(
            p.default,
            Some(RawArg::Scalar { text: "a, b".into(), quoted: true })
        );
    }

    #[test]
    fn list_keyword_values() {
        let p = parse(r#"string_list(min=1, default=list("x", y , 'z'))"#).unwrap();
        assert_eq!(
            p.default,
            Some(RawArg::List(vec!["x".into(), "y".into(), "z".into()]))
        );
        let empty = parse("list(default=list())").unwrap();
        assert_eq!(empty.default, Some(RawArg::List(vec![])));
    }

    #[test]
    fn none_normalization_respects_quotes() {
        assert_eq!(normalize_none(RawArg::text("None")), None);
        let quoted = RawArg::Scalar { text: "None".into(), quoted: true };
        assert_eq!(normalize_none(quoted.clone()), Some(quoted));
        let p = parse("integer(default=None)").unwrap();
        assert_eq!(p.default.and_then(normalize_none), None);
    }

    #[test]
    fn trailing_comma_is_tolerated() {
        let p = parse("float(0, 1, )").unwrap();
        assert_eq!(p.args, vec!["0".to_string(), "1".to_string()]);
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(parse("integer(0"), Err(SpecSyntaxError::Malformed(_))));
        assert!(matches!(parse("integer(0) tail"), Err(SpecSyntaxError::Malformed(_))));
        assert!(matches!(parse("option('a)"), Err(SpecSyntaxError::UnterminatedQuote(_))));
        assert!(matches!(parse("float(0,,1)"), Err(SpecSyntaxError::EmptyArgument(_))));
        assert!(matches!(
            parse("integer(min=0, min=1)"),
            Err(SpecSyntaxError::DuplicateKeyword { .. })
        ));
        assert!(matches!(parse("list(list(1, 2))"), Err(SpecSyntaxError::PositionalList(_))));
    }
}
