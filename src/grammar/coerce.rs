use std::str::FromStr;

use thiserror::Error;

use super::RawArg;

/// Raised by the coercers when a value breaks a type, bound, length or
/// membership check. Messages follow the usual validator wording.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("the value \"{value}\" is of the wrong type.")]
    WrongType { value: String },
    #[error("the value \"{value}\" is too small.")]
    TooSmall { value: String },
    #[error("the value \"{value}\" is too big.")]
    TooBig { value: String },
    #[error("the value \"{value}\" is too short.")]
    TooShort { value: String },
    #[error("the value \"{value}\" is too long.")]
    TooLong { value: String },
    #[error("the value \"{value}\" is unacceptable.")]
    NotAnOption { value: String },
    #[error("passed an incorrect value \"{value}\" for parameter \"{name}\".")]
    BadParameter { name: String, value: String },
}

const TRUE_TOKENS: [&str; 4] = ["true", "yes", "on", "1"];
const FALSE_TOKENS: [&str; 4] = ["false", "no", "off", "0"];

// ----------------------------- Parameters --------------------------------- //

/// Parse a bound argument such as `min=0`. Absent stays absent.
pub fn num_param<T: FromStr>(name: &str, raw: Option<&RawArg>) -> Result<Option<T>, ValidationError> {
    let Some(raw) = raw else { return Ok(None) };
    let bad = || ValidationError::BadParameter { name: name.to_string(), value: raw.to_string() };
    match raw {
        RawArg::Scalar { text, .. } => text.trim().parse::<T>().map(Some).map_err(|_| bad()),
        RawArg::List(_) => Err(bad()),
    }
}

// ------------------------------- Scalars ---------------------------------- //

pub fn is_integer(value: &RawArg, min: Option<i64>, max: Option<i64>) -> Result<i64, ValidationError> {
    let n = integer_from_str(scalar_text(value)?)?;
    check_bounds(n, min, max, value)
}

pub fn is_float(value: &RawArg, min: Option<f64>, max: Option<f64>) -> Result<f64, ValidationError> {
    let x = float_from_str(scalar_text(value)?)?;
    check_bounds(x, min, max, value)
}

pub fn is_boolean(value: &RawArg) -> Result<bool, ValidationError> {
    boolean_from_str(scalar_text(value)?)
}

pub fn is_string(value: &RawArg) -> Result<String, ValidationError> {
    scalar_text(value).map(str::to_string)
}

/// Membership check; `options` keeps the declared order.
pub fn is_option(value: &RawArg, options: &[String]) -> Result<String, ValidationError> {
    let text = scalar_text(value)?;
    if options.iter().any(|o| o == text) {
        Ok(text.to_string())
    } else {
        Err(ValidationError::NotAnOption { value: text.to_string() })
    }
}

// -------------------------------- Lists ----------------------------------- //

/// Element-agnostic list check. Only lengths are validated.
pub fn is_list(value: &RawArg, min: Option<usize>, max: Option<usize>) -> Result<Vec<String>, ValidationError> {
    let RawArg::List(items) = value else {
        return Err(wrong_type(value));
    };
    if min.is_some_and(|m| items.len() < m) {
        return Err(ValidationError::TooShort { value: value.to_string() });
    }
    if max.is_some_and(|m| items.len() > m) {
        return Err(ValidationError::TooLong { value: value.to_string() });
    }
    Ok(items.clone())
}

pub fn is_int_list(value: &RawArg, min: Option<usize>, max: Option<usize>) -> Result<Vec<i64>, ValidationError> {
    is_list(value, min, max)?.iter().map(|s| integer_from_str(s)).collect()
}

pub fn is_float_list(value: &RawArg, min: Option<usize>, max: Option<usize>) -> Result<Vec<f64>, ValidationError> {
    is_list(value, min, max)?.iter().map(|s| float_from_str(s)).collect()
}

pub fn is_bool_list(value: &RawArg, min: Option<usize>, max: Option<usize>) -> Result<Vec<bool>, ValidationError> {
    is_list(value, min, max)?.iter().map(|s| boolean_from_str(s)).collect()
}

pub fn is_string_list(value: &RawArg, min: Option<usize>, max: Option<usize>) -> Result<Vec<String>, ValidationError> {
    is_list(value, min, max)
}

// ------------------------------- Helpers ---------------------------------- //

fn wrong_type(value: impl ToString) -> ValidationError {
    ValidationError::WrongType { value: value.to_string() }
}

fn scalar_text(value: &RawArg) -> Result<&str, ValidationError> {
    match value {
        RawArg::Scalar { text, .. } => Ok(text),
        RawArg::List(_) => Err(wrong_type(value)),
    }
}

fn integer_from_str(s: &str) -> Result<i64, ValidationError> {
    s.trim().parse::<i64>().map_err(|_| wrong_type(s))
}

fn float_from_str(s: &str) -> Result<f64, ValidationError> {
    s.trim().parse::<f64>().map_err(|_| wrong_type(s))
}

fn boolean_from_str(s: &str) -> Result<bool, ValidationError> {
    let lower = s.to_ascii_lowercase();
    if TRUE_TOKENS.contains(&lower.as_str()) {
        Ok(true)
    } else if FALSE_TOKENS.contains(&lower.as_str()) {
        Ok(false)
    } else {
        Err(wrong_type(s))
    }
}

fn check_bounds<T: PartialOrd>(x: T, min: Option<T>, max: Option<T>, raw: &RawArg) -> Result<T, ValidationError> {
    if min.is_some_and(|m| x < m) {
        return Err(ValidationError::TooSmall { value: raw.to_string() });
    }
    if max.is_some_and(|m| x > m) {
        return Err(ValidationError::TooBig { value: raw.to_string() });
    }
    Ok(x)
}

// ------------------------------- Tests ------------------------------------ //
