//! Decoding of loosely-typed host arguments into typed fetch requests.
//!
//! Two calling conventions exist. The editor passes the collection name and
//! then option objects in any order:
//!
//! ```text
//! fetchDocuments("tick", {"fields": ["tick", "params.position"]}, {"limit": 100}, {"sort": [true]})
//! ```
//!
//! The runtime passes positional arguments: collection, field array, limit and
//! an optional session-id array.

use serde_json::Value;

use crate::errors::GatewayError;
use crate::query::FetchOptions;

/// Field the runtime dialect always orders by, whether or not it is requested.
pub const RUNTIME_SORT_FIELD: &str = "tick";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRequest {
    pub collection: String,
    pub fields: Vec<String>,
    pub options: FetchOptions,
}

fn invalid(msg: impl Into<String>) -> GatewayError {
    GatewayError::InvalidArgument(msg.into())
}

/// Non-negative whole number; whole-valued floats are accepted.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn as_count(v: &Value, what: &str) -> Result<u64, GatewayError> {
    if let Some(n) = v.as_u64() {
        return Ok(n);
    }
    match v.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(invalid(format!("{what} must be a non-negative integer, got {v}"))),
    }
}

/// # Errors
/// `InvalidArgument` unless `v` is an array of strings.
pub fn as_string_list(v: &Value, what: &str) -> Result<Vec<String>, GatewayError> {
    let arr = v.as_array().ok_or_else(|| invalid(format!("{what} must be an array")))?;
    arr.iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str().map(str::to_string).ok_or_else(|| invalid(format!("{what}[{i}] must be a string")))
        })
        .collect()
}

fn as_flag_list(v: &Value) -> Result<Vec<bool>, GatewayError> {
    let arr = v.as_array().ok_or_else(|| invalid("sort must be an array"))?;
    arr.iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
            Value::Null => Ok(false),
            _ => Err(invalid(format!("sort[{i}] must be a boolean"))),
        })
        .collect()
}

fn collection_arg(args: &[Value]) -> Result<String, GatewayError> {
    match args.first() {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(GatewayError::EmptyCollectionName),
        Some(other) => Err(invalid(format!("collection must be a string, got {other}"))),
        None => Err(invalid("missing collection argument")),
    }
}

/// Parse the editor dialect: collection, then option objects.
///
/// An option object may carry several keys. Later objects override earlier
/// ones. Unknown keys and non-object arguments are ignored.
///
/// # Errors
/// `InvalidArgument` for a missing collection or a known key of the wrong type.
pub fn parse_editor_fetch_args(args: &[Value]) -> Result<FetchRequest, GatewayError> {
    let mut req = FetchRequest { collection: collection_arg(args)?, ..FetchRequest::default() };
    for arg in &args[1..] {
        let Value::Object(map) = arg else {
            log::debug!("ignoring non-object fetch argument {arg}");
            continue;
        };
        for (key, value) in map {
            match key.as_str() {
                "limit" => req.options.limit = as_count(value, "limit")?,
                "skip" => req.options.skip = as_count(value, "skip")?,
                "fields" => req.fields = as_string_list(value, "fields")?,
                "sort" => req.options.sort_flags = as_flag_list(value)?,
                "sessions_ids" | "session_ids" => {
                    req.options.session_ids = Some(as_string_list(value, key)?);
                }
                other => log::debug!("ignoring unknown fetch option '{other}'"),
            }
        }
    }
    Ok(req)
}

/// Parse the runtime dialect: `(collection, fields, limit?, session_ids?)`.
///
/// Results are always ordered by [`RUNTIME_SORT_FIELD`].
///
/// # Errors
/// `InvalidArgument` for a missing collection or a mistyped positional argument.
pub fn parse_runtime_fetch_args(args: &[Value]) -> Result<FetchRequest, GatewayError> {
    let collection = collection_arg(args)?;
    let fields = match args.get(1) {
        Some(v) => as_string_list(v, "fields")?,
        None => return Err(invalid("missing fields argument")),
    };
    let limit = match args.get(2) {
        None | Some(Value::Null) => 0,
        Some(v) => as_count(v, "limit")?,
    };
    let session_ids = match args.get(3) {
        None | Some(Value::Null) => None,
        Some(v) => Some(as_string_list(v, "session_ids")?),
    };
    let options = FetchOptions {
        limit,
        session_ids,
        order_by: vec![RUNTIME_SORT_FIELD.to_string()],
        ..FetchOptions::default()
    };
    Ok(FetchRequest { collection, fields, options })
}
