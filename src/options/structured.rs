//! Options from a structured configuration object.
//!
//! Used when a request starts directly with the pattern delimiter: the
//! options then come from an object supplied by the embedder instead of
//! from the request text. Only the fixed key set is read.

use serde_json::{Map, Value};

use crate::error::{ErrorCode, SyntaxError};

use super::{
    BOOLEAN_OPTIONS, Encoding, Flavor, MatchingMode, NumericOption, Options, OptionsBuilder,
    parser::check_numeric,
};

/// The value a key holds has the wrong type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatch;

/// Typed key/value lookup over a configuration object.
///
/// Getters return `Ok(None)` for a missing key.
pub trait OptionLookup {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, TypeMismatch>;
    fn get_str(&self, key: &str) -> Result<Option<&str>, TypeMismatch>;
    fn get_u64(&self, key: &str) -> Result<Option<u64>, TypeMismatch>;
}

impl OptionLookup for Map<String, Value> {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, TypeMismatch> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(TypeMismatch),
        }
    }

    fn get_str(&self, key: &str) -> Result<Option<&str>, TypeMismatch> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(TypeMismatch),
        }
    }

    fn get_u64(&self, key: &str) -> Result<Option<u64>, TypeMismatch> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n.as_u64().map(Some).ok_or(TypeMismatch),
            Some(_) => Err(TypeMismatch),
        }
    }
}

fn wrong_type(key: &str, expected: &str) -> SyntaxError {
    SyntaxError::new(
        format!("option '{key}' must be {expected}"),
        0,
        ErrorCode::InvalidOption,
    )
}

fn unknown_name(key: &str, value: &str) -> SyntaxError {
    SyntaxError::new(
        format!("unknown value '{value}' for option '{key}'"),
        0,
        ErrorCode::InvalidOption,
    )
}

/// Build [`Options`] from a configuration object.
pub fn from_lookup(lookup: &dyn OptionLookup) -> Result<Options, SyntaxError> {
    let mut builder = OptionsBuilder::new();
    for (key, bit) in BOOLEAN_OPTIONS {
        if let Some(value) = lookup.get_bool(key).map_err(|_| wrong_type(key, "a boolean"))? {
            builder = builder.toggle(bit, value);
        }
    }
    if let Some(name) = lookup.get_str("Flavor").map_err(|_| wrong_type("Flavor", "a string"))? {
        let flavor = Flavor::from_name(name).ok_or_else(|| unknown_name("Flavor", name))?;
        builder = builder.flavor(flavor);
    }
    if let Some(name) = lookup
        .get_str("Encoding")
        .map_err(|_| wrong_type("Encoding", "a string"))?
    {
        let encoding = Encoding::from_name(name).ok_or_else(|| unknown_name("Encoding", name))?;
        builder = builder.encoding(encoding);
    }
    if let Some(name) = lookup
        .get_str("MatchingMode")
        .map_err(|_| wrong_type("MatchingMode", "a string"))?
    {
        let mode =
            MatchingMode::from_name(name).ok_or_else(|| unknown_name("MatchingMode", name))?;
        builder = builder.matching_mode(Some(mode));
    }
    if let Some(locale) = lookup
        .get_str("PythonLocale")
        .map_err(|_| wrong_type("PythonLocale", "a string"))?
    {
        builder = builder.python_locale(Some(locale.to_owned()));
    }
    for option in NumericOption::ALL {
        let key = option.key();
        if let Some(value) = lookup
            .get_u64(key)
            .map_err(|_| wrong_type(key, "an unsigned integer"))?
        {
            builder = builder.numeric(option, check_numeric(option, value)?);
        }
    }
    Ok(builder.finish())
}
