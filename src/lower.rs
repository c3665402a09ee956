//! Lower one `(name, spec, comment)` triple into a [`ParameterDescriptor`].
//!
//! The spec string's function name picks a [`Handler`] from a fixed registry. The
//! handler binds its arguments, coerces the default through
//! [`crate::grammar::coerce`] and builds the descriptor.
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::error::BuildError;
use crate::grammar::{self, coerce, ParsedCheck, RawArg};
use crate::ir::{DefaultValue, ElemTy, ParameterDescriptor, Value, UNBOUNDED_LEN};

// ------------------------------- Options ---------------------------------- //

/// How `bool_list` defaults are coerced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoolListCoercion {
    /// Elements parsed as boolean tokens.
    #[default]
    Boolean,
    /// Elements parsed as floats. Matches older configs that relied on it.
    LegacyFloat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub bool_list: BoolListCoercion,
}

// ------------------------------- Registry --------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Pass,
    Integer,
    Float,
    Boolean,
    Text,
    List(Option<ElemTy>),
    Option,
}

// ip_addr, ip_addr_list, mixed_list and force_list are not supported.
static REGISTRY: Lazy<IndexMap<&'static str, Handler>> = Lazy::new(|| {
    IndexMap::from([
        ("", Handler::Pass),
        ("pass", Handler::Pass),
        ("integer", Handler::Integer),
        ("float", Handler::Float),
        ("boolean", Handler::Boolean),
        ("string", Handler::Text),
        ("input_file", Handler::Text),
        ("output_file", Handler::Text),
        ("list", Handler::List(None)),
        ("tuple", Handler::List(None)),
        ("int_list", Handler::List(Some(ElemTy::Integer))),
        ("float_list", Handler::List(Some(ElemTy::Float))),
        ("bool_list", Handler::List(Some(ElemTy::Boolean))),
        ("string_list", Handler::List(Some(ElemTy::Text))),
        ("option", Handler::Option),
    ])
});

pub fn lookup(function: &str) -> Option<Handler> {
    REGISTRY.get(function).copied()
}

/// Registered function names, in declaration order.
pub fn supported_functions() -> impl Iterator<Item = &'static str> {
    REGISTRY.keys().copied()
}

// ------------------------------- Lowering --------------------------------- //

pub fn lower_parameter(
    parameter: &str,
    spec: &str,
    comment: Option<&str>,
    options: &BuildOptions,
) -> Result<ParameterDescriptor, BuildError> {
    let ParsedCheck { name: function, args, kwargs, default } =
        grammar::parse(spec).map_err(|source| BuildError::Syntax {
            parameter: parameter.to_string(),
            source,
        })?;

    let default = match default {
        None => DefaultValue::NotProvided,
        Some(raw) => match grammar::normalize_none(raw) {
            None => DefaultValue::Null,
            Some(raw) => DefaultValue::Value(raw),
        },
    };
    let help = comment.map(help_from_comment);

    let handler = lookup(&function).ok_or_else(|| BuildError::UnsupportedSpecFunction {
        parameter: parameter.to_string(),
        function: function.clone(),
    })?;

    let call = Call { parameter, function: &function, args, kwargs };
    let descriptor = handler.build(call, default, help, options)?;
    debug!(parameter, function = %function, ty = descriptor.ty().name(), "lowered parameter");
    Ok(descriptor)
}

/// `"# max allowed retries"` -> `"max allowed retries"`.
pub fn help_from_comment(comment: &str) -> String {
    comment.trim_start_matches('#').trim().to_string()
}

// ------------------------------- Handlers --------------------------------- //

struct Call<'a> {
    parameter: &'a str,
    function: &'a str,
    args: Vec<String>,
    kwargs: IndexMap<String, RawArg>,
}

impl Handler {
    fn build(
        self,
        call: Call<'_>,
        default: DefaultValue<RawArg>,
        help: Option<String>,
        options: &BuildOptions,
    ) -> Result<ParameterDescriptor, BuildError> {
        match self {
            Handler::Pass => {
                call.expect_no_args()?;
                Ok(ParameterDescriptor::any(default.map(untyped), help))
            }
            Handler::Integer => {
                let (min, max) = call.bind_bounds()?;
                let min = coerce::num_param::<i64>("min", bound(min).as_ref())?;
                let max = coerce::num_param::<i64>("max", bound(max).as_ref())?;
                let default = default.try_map(|raw| coerce::is_integer(&raw, min, max))?;
                Ok(ParameterDescriptor::integer(default, help, min, max))
            }
            Handler::Float => {
                let (min, max) = call.bind_bounds()?;
                let min = coerce::num_param::<f64>("min", bound(min).as_ref())?;
                let max = coerce::num_param::<f64>("max", bound(max).as_ref())?;
                let default = default.try_map(|raw| coerce::is_float(&raw, min, max))?;
                Ok(ParameterDescriptor::float(default, help, min, max))
            }
            Handler::Boolean => {
                call.expect_no_args()?;
                let default = default.try_map(|raw| coerce::is_boolean(&raw))?;
                Ok(ParameterDescriptor::boolean(default, help))
            }
            Handler::Text => {
                let (parameter, function) = (call.parameter, call.function);
                let (min, max) = call.bind_bounds()?;
                // present at all, even as `None`, is rejected
                for (name, given) in [("min", min), ("max", max)] {
                    if given.is_some() {
                        return Err(unsupported(parameter, function, name));
                    }
                }
                let default = default.try_map(|raw| coerce::is_string(&raw))?;
                Ok(ParameterDescriptor::text(default, help))
            }
            Handler::List(item) => {
                let (min, max) = call.bind_bounds()?;
                let min = coerce::num_param::<usize>("min", bound(min).as_ref())?;
                let max = coerce::num_param::<usize>("max", bound(max).as_ref())?;
                let default = default.try_map(|raw| coerce_list(item, &raw, min, max, options))?;
                Ok(ParameterDescriptor::list_of(
                    item,
                    default,
                    help,
                    min.unwrap_or(0),
                    max.unwrap_or(UNBOUNDED_LEN),
                ))
            }
            Handler::Option => {
                if let Some(key) = call.kwargs.keys().next() {
                    return Err(unsupported(call.parameter, call.function, key));
                }
                let choices = call.args;
                let default = default.try_map(|raw| coerce::is_option(&raw, &choices))?;
                Ok(ParameterDescriptor::enumeration(choices, default, help))
            }
        }
    }
}

impl Call<'_> {
    fn expect_no_args(&self) -> Result<(), BuildError> {
        let first = self.args.first().or_else(|| self.kwargs.keys().next());
        match first {
            Some(arg) => Err(unsupported(self.parameter, self.function, arg)),
            None => Ok(()),
        }
    }

    /// Bind `min`/`max` from positionals (in that order) and keywords.
    /// Values are returned as written; see [`bound`] for `None` handling.
    fn bind_bounds(self) -> Result<(Option<RawArg>, Option<RawArg>), BuildError> {
        let mut slots: [(&str, Option<RawArg>); 2] = [("min", None), ("max", None)];

        if self.args.len() > slots.len() {
            return Err(unsupported(self.parameter, self.function, &self.args[slots.len()]));
        }
        for (slot, arg) in slots.iter_mut().zip(self.args) {
            slot.1 = Some(RawArg::Scalar { text: arg, quoted: false });
        }

        for (key, value) in self.kwargs {
            let Some(slot) = slots.iter_mut().find(|(name, _)| *name == key) else {
                return Err(unsupported(self.parameter, self.function, &key));
            };
            if slot.1.is_some() {
                return Err(unsupported(self.parameter, self.function, &key));
            }
            slot.1 = Some(value);
        }

        let [(_, min), (_, max)] = slots;
        Ok((min, max))
    }
}

fn coerce_list(
    item: Option<ElemTy>,
    raw: &RawArg,
    min: Option<usize>,
    max: Option<usize>,
    options: &BuildOptions,
) -> Result<Vec<Value>, coerce::ValidationError> {
    Ok(match item {
        None => coerce::is_list(raw, min, max)?.into_iter().map(Value::Text).collect(),
        Some(ElemTy::Integer) => coerce::is_int_list(raw, min, max)?.into_iter().map(Value::Integer).collect(),
        Some(ElemTy::Float) => coerce::is_float_list(raw, min, max)?.into_iter().map(Value::Float).collect(),
        Some(ElemTy::Text) => coerce::is_string_list(raw, min, max)?.into_iter().map(Value::Text).collect(),
        Some(ElemTy::Boolean) => match options.bool_list {
            BoolListCoercion::Boolean => {
                coerce::is_bool_list(raw, min, max)?.into_iter().map(Value::Boolean).collect()
            }
            BoolListCoercion::LegacyFloat => {
                warn!(value = %raw, "bool_list default coerced as float_list (legacy mode)");
                coerce::is_float_list(raw, min, max)?.into_iter().map(Value::Float).collect()
            }
        },
    })
}

/// A numeric bound written as unquoted `None`, by position or keyword,
/// counts as absent.
fn bound(raw: Option<RawArg>) -> Option<RawArg> {
    raw.and_then(grammar::normalize_none)
}

fn untyped(raw: RawArg) -> Value {
    match raw {
        RawArg::Scalar { text, .. } => Value::Text(text),
        RawArg::List(items) => Value::List(items.into_iter().map(Value::Text).collect()),
    }
}

fn unsupported(parameter: &str, function: &str, constraint: &str) -> BuildError {
    BuildError::UnsupportedConstraint {
        parameter: parameter.to_string(),
        function: function.to_string(),
        constraint: constraint.to_string(),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ValidationError;
    use crate::ir::Ty;

    fn lower(spec: &str) -> Result<ParameterDescriptor, BuildError> {
        lower_parameter("p", spec, None, &BuildOptions::default())
    }

    #[test]
    fn every_function_without_default_is_not_provided() {
        for function in supported_functions() {
            let spec = if function == "option" { "option('a')".to_string() } else { function.to_string() };
            let d = lower(&spec).unwrap_or_else(|e| panic!("{spec}: {e}"));
            assert_eq!(d.default_value(), &DefaultValue::NotProvided, "{spec}");
            assert!(!d.allow_none(), "{spec}");
        }
    }

    #[test]
    fn null_default_allows_none() {
        let d = lower("integer(min=0, default=None)").unwrap();
        assert_eq!(d.default_value(), &DefaultValue::Null);
        assert!(d.allow_none());
        assert_eq!(d.ty(), &Ty::Integer { min: Some(0), max: None });
    }

    #[test]
    fn quoted_none_is_text() {
        let d = lower("string(default='None')").unwrap();
        assert_eq!(d.default_value(), &DefaultValue::Value(Value::Text("None".into())));
        assert!(!d.allow_none());
    }

    #[test]
    fn numeric_bounds_positional_or_keyword() {
        let d = lower("integer(0, 10, default=10)").unwrap();
        assert_eq!(d.ty(), &Ty::Integer { min: Some(0), max: Some(10) });
        assert_eq!(d.default_value(), &DefaultValue::Value(Value::Integer(10)));

        let f = lower("float(max=1.5, default=0.25)").unwrap();
        assert_eq!(f.ty(), &Ty::Float { min: None, max: Some(1.5) });
        assert_eq!(f.default_value(), &DefaultValue::Value(Value::Float(0.25)));

        let err = lower("float(0, 1, default=2)").unwrap_err();
        assert_eq!(err, BuildError::Validation(ValidationError::TooBig { value: "2".into() }));
    }

    #[test]
    fn bound_given_twice_or_unknown_keyword() {
        assert!(matches!(
            lower("integer(0, min=1)"),
            Err(BuildError::UnsupportedConstraint { constraint, .. }) if constraint == "min"
        ));
        assert!(matches!(
            lower("integer(step=2)"),
            Err(BuildError::UnsupportedConstraint { constraint, .. }) if constraint == "step"
        ));
        assert!(matches!(
            lower("integer(0, 1, 2)"),
            Err(BuildError::UnsupportedConstraint { constraint, .. }) if constraint == "2"
        ));
        assert!(matches!(lower("boolean(1)"), Err(BuildError::UnsupportedConstraint { .. })));
    }

    #[test]
    fn bad_bound_is_a_validation_error() {
        assert_eq!(
            lower("integer(min=low)").unwrap_err(),
            BuildError::Validation(ValidationError::BadParameter { name: "min".into(), value: "low".into() })
        );
    }

    #[test]
    fn none_bound_binds_the_same_by_position_or_keyword() {
        let expected = Ty::Integer { min: None, max: Some(10) };
        assert_eq!(lower("integer(None, 10)").unwrap().ty(), &expected);
        assert_eq!(lower("integer(min=None, max=10)").unwrap().ty(), &expected);

        let d = lower("list(None, None)").unwrap();
        assert_eq!(d.ty(), &Ty::ListOf { item: None, min_len: 0, max_len: UNBOUNDED_LEN });
        assert_eq!(lower("float(max=None)").unwrap().ty(), &Ty::Float { min: None, max: None });
    }

    #[test]
    fn string_rejects_bounds() {
        for spec in [
            "string(min=1)",
            "string(max=4)",
            "string(min=None)",
            "string(None)",
            "input_file(1)",
            "output_file(max=2)",
            "output_file(max=None)",
        ] {
            assert!(matches!(lower(spec), Err(BuildError::UnsupportedConstraint { .. })), "{spec}");
        }
        let d = lower("output_file(default=out.fits)").unwrap();
        assert_eq!(d.ty(), &Ty::Text);
        assert_eq!(d.default_value(), &DefaultValue::Value(Value::Text("out.fits".into())));
    }

    #[test]
    fn list_defaults_and_lengths() {
        let d = lower("list()").unwrap();
        assert_eq!(d.ty(), &Ty::ListOf { item: None, min_len: 0, max_len: UNBOUNDED_LEN });

        let d = lower("int_list(min=1, max=3, default=list(1, 2))").unwrap();
        assert_eq!(d.ty(), &Ty::ListOf { item: Some(ElemTy::Integer), min_len: 1, max_len: 3 });
        assert_eq!(
            d.default_value(),
            &DefaultValue::Value(Value::List(vec![Value::Integer(1), Value::Integer(2)]))
        );

        assert!(matches!(
            lower("string_list(max=1, default=list(a, b))"),
            Err(BuildError::Validation(ValidationError::TooLong { .. }))
        ));
        assert!(matches!(
            lower("tuple(default=a)"),
            Err(BuildError::Validation(ValidationError::WrongType { .. }))
        ));
    }

    #[test]
    fn bool_list_coercion_modes() {
        let spec = "bool_list(default=list(yes, 0))";
        let d = lower(spec).unwrap();
        assert_eq!(
            d.default_value(),
            &DefaultValue::Value(Value::List(vec![Value::Boolean(true), Value::Boolean(false)]))
        );

        let legacy = BuildOptions { bool_list: BoolListCoercion::LegacyFloat };
        assert!(lower_parameter("p", spec, None, &legacy).is_err());
        let d = lower_parameter("p", "bool_list(default=list(1, 0))", None, &legacy).unwrap();
        assert_eq!(d.ty(), &Ty::ListOf { item: Some(ElemTy::Boolean), min_len: 0, max_len: UNBOUNDED_LEN });
        assert_eq!(
            d.default_value(),
            &DefaultValue::Value(Value::List(vec![Value::Float(1.0), Value::Float(0.0)]))
        );
    }

    #[test]
    fn option_membership_and_order() {
        let d = lower("option('b', 'a', default='a')").unwrap();
        assert_eq!(d.options(), Some(&["b".to_string(), "a".to_string()][..]));
        assert_eq!(d.default_value(), &DefaultValue::Value(Value::Text("a".into())));
        assert!(!d.allow_none());

        assert_eq!(
            lower("option('a', 'b', default='c')").unwrap_err(),
            BuildError::Validation(ValidationError::NotAnOption { value: "c".into() })
        );
        assert!(matches!(lower("option('a', min=1)"), Err(BuildError::UnsupportedConstraint { .. })));
    }

    #[test]
    fn pass_keeps_raw_default() {
        let d = lower("pass(default=list(1, x))").unwrap();
        assert_eq!(d.ty(), &Ty::Any);
        assert_eq!(
            d.default_value(),
            &DefaultValue::Value(Value::List(vec![Value::Text("1".into()), Value::Text("x".into())]))
        );
        assert!(matches!(lower("(default=3)"), Err(BuildError::Syntax { .. })));
    }

    #[test]
    fn unknown_function_is_rejected() {
        assert_eq!(
            lower("frobnicate(default=1)").unwrap_err(),
            BuildError::UnsupportedSpecFunction { parameter: "p".into(), function: "frobnicate".into() }
        );
        for excluded in ["ip_addr", "ip_addr_list", "mixed_list", "force_list"] {
            assert!(lookup(excluded).is_none());
        }
    }

    #[test]
    fn help_strips_marker_and_whitespace() {
        assert_eq!(help_from_comment("# max allowed retries"), "max allowed retries");
        assert_eq!(help_from_comment("##  two  spaces  "), "two  spaces");
        let d = lower_parameter("p", "integer", Some("# retries"), &BuildOptions::default()).unwrap();
        assert_eq!(d.help(), Some("retries"));
    }
}
