// Strongly-typed descriptor IR. Built once by `lower`, never mutated.

/// Length bound used when a list spec gives no `max`.
pub const UNBOUNDED_LEN: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElemTy {
    Integer,
    Float,
    Boolean,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Any,
    Integer { min: Option<i64>, max: Option<i64> },
    Float   { min: Option<f64>, max: Option<f64> },
    Boolean,
    Text,
    ListOf {
        item: Option<ElemTy>, // None for plain `list`/`tuple`
        min_len: usize,
        max_len: usize,       // UNBOUNDED_LEN when not given
    },
    Enum { options: Vec<String> }, // declaration order
}

/// A coerced default.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    List(Vec<Value>),
}

/// "No default" and "default is null" are different states.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DefaultValue<T = Value> {
    #[default]
    NotProvided,
    Null,
    Value(T),
}

impl<T> DefaultValue<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DefaultValue<U> {
        match self {
            DefaultValue::NotProvided => DefaultValue::NotProvided,
            DefaultValue::Null => DefaultValue::Null,
            DefaultValue::Value(v) => DefaultValue::Value(f(v)),
        }
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<DefaultValue<U>, E> {
        Ok(match self {
            DefaultValue::NotProvided => DefaultValue::NotProvided,
            DefaultValue::Null => DefaultValue::Null,
            DefaultValue::Value(v) => DefaultValue::Value(f(v)?),
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DefaultValue::Null)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    ty: Ty,
    default: DefaultValue,
    help: Option<String>,
}

impl ParameterDescriptor {
    pub fn any(default: DefaultValue, help: Option<String>) -> Self {
        Self { ty: Ty::Any, default, help }
    }

    pub fn integer(default: DefaultValue<i64>, help: Option<String>, min: Option<i64>, max: Option<i64>) -> Self {
        Self { ty: Ty::Integer { min, max }, default: default.map(Value::Integer), help }
    }

    pub fn float(default: DefaultValue<f64>, help: Option<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self { ty: Ty::Float { min, max }, default: default.map(Value::Float), help }
    }

    pub fn boolean(default: DefaultValue<bool>, help: Option<String>) -> Self {
        Self { ty: Ty::Boolean, default: default.map(Value::Boolean), help }
    }

    pub fn text(default: DefaultValue<String>, help: Option<String>) -> Self {
        Self { ty: Ty::Text, default: default.map(Value::Text), help }
    }

    pub fn list_of(
        item: Option<ElemTy>,
        default: DefaultValue<Vec<Value>>,
        help: Option<String>,
        min_len: usize,
        max_len: usize,
    ) -> Self {
        Self {
            ty: Ty::ListOf { item, min_len, max_len },
            default: default.map(Value::List),
            help,
        }
    }

    pub fn enumeration(options: Vec<String>, default: DefaultValue<String>, help: Option<String>) -> Self {
        Self { ty: Ty::Enum { options }, default: default.map(Value::Text), help }
    }

    pub fn ty(&self) -> &Ty { &self.ty }
    pub fn default_value(&self) -> &DefaultValue { &self.default }
    pub fn help(&self) -> Option<&str> { self.help.as_deref() }

    /// Derived from the default, never stored.
    pub fn allow_none(&self) -> bool {
        self.default.is_null()
    }

    pub fn options(&self) -> Option<&[String]> {
        match &self.ty {
            Ty::Enum { options } => Some(options),
            _ => None,
        }
    }
}

impl Ty {
    pub fn name(&self) -> &'static str {
        match self {
            Ty::Any => "any",
            Ty::Integer { .. } => "integer",
            Ty::Float { .. } => "float",
            Ty::Boolean => "boolean",
            Ty::Text => "text",
            Ty::ListOf { .. } => "list",
            Ty::Enum { .. } => "enum",
        }
    }
}

impl ElemTy {
    pub fn name(self) -> &'static str {
        match self {
            ElemTy::Integer => "integer",
            ElemTy::Float => "float",
            ElemTy::Boolean => "boolean",
            ElemTy::Text => "text",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_none_follows_default() {
        let null = ParameterDescriptor::integer(DefaultValue::Null, None, None, None);
        assert!(null.allow_none());
        let missing = ParameterDescriptor::integer(DefaultValue::NotProvided, None, None, None);
        assert!(!missing.allow_none());
        let set = ParameterDescriptor::integer(DefaultValue::Value(3), None, None, None);
        assert!(!set.allow_none());
        assert_eq!(set.default_value(), &DefaultValue::Value(Value::Integer(3)));
    }

    #[test]
    fn try_map_keeps_missing_and_null() {
        let f = |s: &str| s.parse::<i64>();
        assert_eq!(DefaultValue::<&str>::NotProvided.try_map(f), Ok(DefaultValue::NotProvided));
        assert_eq!(DefaultValue::<&str>::Null.try_map(f), Ok(DefaultValue::Null));
        assert!(DefaultValue::Value("x").try_map(f).is_err());
    }
}
