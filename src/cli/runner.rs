use serde_json::{Value, json};
use std::io::Write;

use crate::api;
use crate::decode::ColumnSet;
use crate::gateway::Gateway;
use crate::query::FetchOptions;

use super::command::Command;
use super::util::parse_call_args;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputMode {
    /// One JSON value per command.
    Json,
    /// One line per item; fetch results as NDJSON rows.
    Plain,
}

pub fn run_with_format<W: Write>(
    gw: &Gateway,
    cmd: Command,
    mode: OutputMode,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Command::Collections => write_list(out, mode, &gw.list_collections()?),
        Command::Keys { collection } => write_list(out, mode, &gw.list_field_keys(&collection)?),
        Command::Sessions { level_key } => write_list(out, mode, &gw.fetch_session_ids(&level_key)?),
        Command::Count { collection, sessions } => {
            let opts = FetchOptions { session_ids: non_empty(sessions), ..FetchOptions::default() };
            let n = gw.count_documents(&collection, &opts)?;
            match mode {
                OutputMode::Json => writeln!(out, "{}", json!({ "collection": collection, "count": n }))?,
                OutputMode::Plain => writeln!(out, "{n}")?,
            }
            Ok(())
        }
        Command::Fetch { collection, fields, sort, limit, skip, sessions } => {
            let opts = FetchOptions {
                limit,
                skip,
                sort_flags: sort,
                session_ids: non_empty(sessions),
                ..FetchOptions::default()
            };
            let set = gw.fetch_documents(&collection, &fields, &opts)?;
            match mode {
                OutputMode::Json => writeln!(out, "{}", set.to_json())?,
                OutputMode::Plain => {
                    for row in rows(&set) {
                        writeln!(out, "{row}")?;
                    }
                }
            }
            Ok(())
        }
        Command::Call { function, args_json } => {
            let args = parse_call_args(&args_json)?;
            let result = api::invoke(gw, &function, &args)?;
            writeln!(out, "{result}")?;
            Ok(())
        }
    }
}

fn non_empty(ids: Vec<String>) -> Option<Vec<String>> {
    if ids.is_empty() { None } else { Some(ids) }
}

fn write_list<W: Write>(out: &mut W, mode: OutputMode, items: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    match mode {
        OutputMode::Json => writeln!(out, "{}", json!(items))?,
        OutputMode::Plain => {
            for s in items {
                writeln!(out, "{s}")?;
            }
        }
    }
    Ok(())
}

/// Re-assemble columns into one object per document; vector fields become `[x, y, z]`.
fn rows(set: &ColumnSet) -> Vec<Value> {
    let columns = set.to_json();
    let Value::Object(columns) = columns else {
        return Vec::new();
    };
    (0..set.documents())
        .map(|i| {
            let mut row = serde_json::Map::new();
            for col in set.columns() {
                let stride = col.kind.stride();
                let cells = columns.get(&col.field).and_then(Value::as_array).and_then(|a| a.get(i * stride..(i + 1) * stride));
                let v = match cells {
                    Some([single]) => single.clone(),
                    Some(many) => Value::Array(many.to_vec()),
                    None => Value::Null,
                };
                row.insert(col.field.clone(), v);
            }
            Value::Object(row)
        })
        .collect()
}
