//! Seed a [`MemoryServer`] from a directory tree.
//!
//! Layout: `<dir>/<database>/<collection>.ndjson` (or `.jsonl`) holds one JSON
//! object per line; `<dir>/<database>/<collection>.json` holds a JSON array of
//! objects. Other files are ignored.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use bson::Document;
use serde_json::Value;

use super::MemoryServer;
use crate::errors::GatewayError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureReport {
    pub databases: usize,
    pub collections: usize,
    pub inserted: u64,
    pub skipped: u64,
}

/// # Errors
/// Returns an I/O error if `dir` or one of its files cannot be read, or if a
/// `.json` file is not an array.
pub fn load_fixtures(server: &MemoryServer, dir: &Path) -> io::Result<FixtureReport> {
    let mut report = FixtureReport::default();
    let mut dbs: Vec<_> = std::fs::read_dir(dir)?.filter_map(Result::ok).map(|e| e.path()).collect();
    dbs.sort();
    for db_dir in dbs.into_iter().filter(|p| p.is_dir()) {
        let Some(db) = db_dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        report.databases += 1;
        let mut files: Vec<_> = std::fs::read_dir(&db_dir)?.filter_map(Result::ok).map(|e| e.path()).collect();
        files.sort();
        for file in files {
            let (Some(stem), Some(ext)) = (
                file.file_stem().and_then(|s| s.to_str()),
                file.extension().and_then(|s| s.to_str()),
            ) else {
                continue;
            };
            match ext {
                "ndjson" | "jsonl" => load_lines(server, &db, stem, &file, &mut report)?,
                "json" => load_array(server, &db, stem, &file, &mut report)?,
                _ => continue,
            }
            report.collections += 1;
        }
    }
    log::info!(
        "fixtures loaded from {}: {} database(s), {} collection(s), {} document(s), {} skipped",
        dir.display(),
        report.databases,
        report.collections,
        report.inserted,
        report.skipped
    );
    Ok(report)
}

fn record_to_document(val: Value) -> Result<Document, GatewayError> {
    match val {
        Value::Object(map) => Ok(Document::try_from(map)?),
        other => Err(GatewayError::InvalidArgument(format!("record is not an object: {other}"))),
    }
}

fn parse_record(line: &str) -> Result<Document, GatewayError> {
    record_to_document(serde_json::from_str(line)?)
}

fn load_lines(server: &MemoryServer, db: &str, coll: &str, path: &Path, report: &mut FixtureReport) -> io::Result<()> {
    server.create_collection(db, coll);
    let reader = BufReader::new(File::open(path)?);
    let mut docs = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_record(line) {
            Ok(d) => docs.push(d),
            Err(e) => {
                log::warn!("{}:{}: skipping record: {}", path.display(), i + 1, e);
                report.skipped += 1;
            }
        }
    }
    report.inserted += docs.len() as u64;
    server.insert_many(db, coll, docs);
    Ok(())
}

fn load_array(server: &MemoryServer, db: &str, coll: &str, path: &Path, report: &mut FixtureReport) -> io::Result<()> {
    let val: Value = serde_json::from_reader(BufReader::new(File::open(path)?))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let Value::Array(arr) = val else {
        return Err(io::Error::new(io::ErrorKind::InvalidData, format!("{}: expected JSON array", path.display())));
    };
    server.create_collection(db, coll);
    let mut docs = Vec::with_capacity(arr.len());
    for (i, v) in arr.into_iter().enumerate() {
        match record_to_document(v) {
            Ok(d) => docs.push(d),
            Err(e) => {
                log::warn!("{}[{}]: skipping record: {}", path.display(), i, e);
                report.skipped += 1;
            }
        }
    }
    report.inserted += docs.len() as u64;
    server.insert_many(db, coll, docs);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_lines_and_arrays() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("telemetry");
        std::fs::create_dir(&db).unwrap();
        std::fs::write(db.join("tick.ndjson"), "{\"tick\":1}\n\nnot json\n{\"tick\":2}\n").unwrap();
        std::fs::write(db.join("session_start.json"), r#"[{"session_id":"a"}, 3]"#).unwrap();
        std::fs::write(db.join("README.txt"), "ignored").unwrap();

        let server = MemoryServer::new();
        let report = load_fixtures(&server, dir.path()).unwrap();
        assert_eq!(report.databases, 1);
        assert_eq!(report.collections, 2);
        assert_eq!(report.inserted, 3);
        assert_eq!(report.skipped, 2);
        assert_eq!(server.document_count("telemetry", "tick"), 2);
        assert_eq!(server.document_count("telemetry", "session_start"), 1);
    }

    #[test]
    fn records_convert_nested_objects_only() {
        let d = parse_record(r#"{"tick":1,"params":{"position":"Vector3(0,0,0)"}}"#).unwrap();
        assert_eq!(d.get_i32("tick").unwrap(), 1);
        assert_eq!(d.get_document("params").unwrap().get_str("position").unwrap(), "Vector3(0,0,0)");
        assert!(matches!(parse_record("[1,2,3]"), Err(GatewayError::InvalidArgument(_))));
        assert!(matches!(parse_record("{"), Err(GatewayError::Json(_))));
    }

    #[test]
    fn json_file_must_be_an_array() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("db");
        std::fs::create_dir(&db).unwrap();
        std::fs::write(db.join("c.json"), r#"{"a":1}"#).unwrap();
        let err = load_fixtures(&MemoryServer::new(), dir.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
