//! Native function table: the named entry points the hosts register.
//!
//! Arguments and results are JSON values. A `null` first argument yields
//! `null`. Configuration mistakes are logged and reported as `null` (or
//! `false` for the connection functions); capacity and transport errors are
//! returned as errors.

use serde_json::{Value, json};

use crate::args::{parse_editor_fetch_args, parse_runtime_fetch_args};
use crate::errors::GatewayError;
use crate::gateway::Gateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeFunction {
    // editor
    ConnectToDatabase,
    SelectDatabase,
    FetchFieldKeys,
    FetchDocuments,
    SessionsIds,
    // runtime
    RuntimeConnect,
    RuntimeSelect,
    FetchFieldData,
}

impl NativeFunction {
    pub const ALL: [Self; 8] = [
        Self::ConnectToDatabase,
        Self::SelectDatabase,
        Self::FetchFieldKeys,
        Self::FetchDocuments,
        Self::SessionsIds,
        Self::RuntimeConnect,
        Self::RuntimeSelect,
        Self::FetchFieldData,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ConnectToDatabase => "connectToDatabase",
            Self::SelectDatabase => "selectDatabase",
            Self::FetchFieldKeys => "fetchFieldKeys",
            Self::FetchDocuments => "fetchDocuments",
            Self::SessionsIds => "sessionsIds",
            Self::RuntimeConnect => "connect_to_database",
            Self::RuntimeSelect => "select_database",
            Self::FetchFieldData => "fetch_field_data",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    fn call(self, gw: &Gateway, args: &[Value]) -> Result<Value, GatewayError> {
        match self {
            Self::ConnectToDatabase | Self::RuntimeConnect => {
                let address = string_arg(args, "address")?;
                Ok(Value::Bool(gw.connect(address)?))
            }
            Self::SelectDatabase => {
                let out = gw.select_database(string_arg(args, "database")?)?;
                // editor contract: the collection list on change, `false` otherwise
                Ok(if out.changed { json!(out.collection_names) } else { Value::Bool(false) })
            }
            Self::RuntimeSelect => Ok(Value::Bool(gw.select_database(string_arg(args, "database")?)?.changed)),
            Self::FetchFieldKeys => Ok(json!(gw.list_field_keys(string_arg(args, "collection")?)?)),
            Self::FetchDocuments => {
                let req = parse_editor_fetch_args(args)?;
                Ok(gw.fetch_documents(&req.collection, &req.fields, &req.options)?.to_json())
            }
            Self::FetchFieldData => {
                let req = parse_runtime_fetch_args(args)?;
                Ok(gw.fetch_documents(&req.collection, &req.fields, &req.options)?.to_json())
            }
            Self::SessionsIds => Ok(json!(gw.fetch_session_ids(string_arg(args, "level key")?)?)),
        }
    }

    fn fallback(self) -> Value {
        match self {
            Self::ConnectToDatabase | Self::RuntimeConnect | Self::RuntimeSelect => Value::Bool(false),
            _ => Value::Null,
        }
    }
}

fn string_arg<'a>(args: &'a [Value], what: &str) -> Result<&'a str, GatewayError> {
    match args.first() {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(GatewayError::InvalidArgument(format!("{what} must be a string, got {other}"))),
        None => Err(GatewayError::InvalidArgument(format!("missing {what}"))),
    }
}

/// Invoke the native function `name` with host arguments.
///
/// # Errors
/// `UnknownFunction`, capacity errors and store errors.
pub fn invoke(gw: &Gateway, name: &str, args: &[Value]) -> Result<Value, GatewayError> {
    let func = NativeFunction::from_name(name).ok_or_else(|| GatewayError::UnknownFunction(name.to_string()))?;
    if matches!(args.first(), None | Some(Value::Null)) {
        log::debug!("{name}: no argument, returning null");
        return Ok(Value::Null);
    }
    match func.call(gw, args) {
        Ok(v) => Ok(v),
        Err(e) if e.is_configuration() => {
            log::warn!("{name}: {e}");
            Ok(func.fallback())
        }
        Err(e) => {
            log::error!("{name}: {e}");
            Err(e)
        }
    }
}
