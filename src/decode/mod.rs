//! Columnar decoding of query results.
//!
//! Every requested field becomes one column. Columns advance in lockstep: each
//! scanned document appends exactly one cell per scalar column (null when the
//! field is absent) and exactly one x,y,z triple per vector column.

mod vector;

use bson::{Bson, Document};
use serde::Serialize;

use crate::errors::GatewayError;
use crate::query::get_path;

pub use vector::{VECTOR3_PREFIX, VectorParseError, parse_vector3};

// Upper bound on pre-allocation from a server-side count hint.
const MAX_PREALLOC_ROWS: usize = 64 * 1024;

/// A decoded output value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl Cell {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Map a stored value's dynamic type to an output cell.
///
/// Date-times become epoch milliseconds and timestamps their seconds component;
/// unrecognized types degrade to null.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn decode_value(v: &Bson) -> Cell {
    match v {
        Bson::Double(d) => Cell::Number(*d),
        Bson::String(s) => Cell::String(s.clone()),
        Bson::Int32(i) => Cell::Number(f64::from(*i)),
        Bson::Int64(i) => Cell::Number(*i as f64),
        Bson::Boolean(b) => Cell::Boolean(*b),
        Bson::DateTime(dt) => Cell::Number(dt.timestamp_millis() as f64),
        Bson::Timestamp(ts) => Cell::Number(f64::from(ts.time)),
        Bson::Null | Bson::Undefined => Cell::Null,
        _ => Cell::Null,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Scalar,
    /// Interleaved x,y,z; three cells per document.
    Vector3,
}

impl ColumnKind {
    #[must_use]
    pub fn stride(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector3 => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub field: String,
    pub kind: ColumnKind,
    pub values: Vec<Cell>,
}

impl Column {
    fn new(field: &str, kind: ColumnKind, rows: usize) -> Self {
        Self { field: field.to_string(), kind, values: Vec::with_capacity(rows * kind.stride()) }
    }

    /// Number of documents this column holds values for.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.values.len() / self.kind.stride()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnSet {
    columns: Vec<Column>,
    documents: usize,
    cursor_errors: usize,
    malformed_vectors: usize,
}

impl ColumnSet {
    /// Empty columns for `fields`, as returned when a query could not run.
    #[must_use]
    pub fn empty(fields: &[String], decoder: &Decoder) -> Self {
        Self::with_rows(fields, decoder, 0)
    }

    fn with_rows(fields: &[String], decoder: &Decoder, rows: usize) -> Self {
        let columns = fields.iter().map(|f| Column::new(f, decoder.kind_of(f), rows)).collect();
        Self { columns, ..Self::default() }
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, field: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.field == field)
    }

    #[must_use]
    pub fn values(&self, field: &str) -> Option<&[Cell]> {
        self.column(field).map(|c| c.values.as_slice())
    }

    /// Documents successfully read from the cursor.
    #[must_use]
    pub fn documents(&self) -> usize {
        self.documents
    }

    #[must_use]
    pub fn cursor_errors(&self) -> usize {
        self.cursor_errors
    }

    #[must_use]
    pub fn malformed_vectors(&self) -> usize {
        self.malformed_vectors
    }

    /// `{ field: [values...] }` in the shape the hosts consume.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.columns.len());
        for c in &self.columns {
            let values = c.values.iter().map(cell_to_json).collect();
            map.insert(c.field.clone(), serde_json::Value::Array(values));
        }
        serde_json::Value::Object(map)
    }

    fn push_document(&mut self, doc: &Document) -> usize {
        let mut malformed = 0usize;
        for col in &mut self.columns {
            let found = get_path(doc, &col.field);
            match col.kind {
                ColumnKind::Scalar => col.values.push(found.map_or(Cell::Null, decode_value)),
                ColumnKind::Vector3 => match found {
                    None => col.values.extend(null_triple()),
                    Some(Bson::String(s)) => match parse_vector3(s) {
                        Ok(xyz) => col.values.extend(xyz.map(Cell::Number)),
                        Err(e) => {
                            log::debug!("field '{}': malformed vector '{}': {}", col.field, s, e);
                            malformed += 1;
                            col.values.extend(null_triple());
                        }
                    },
                    Some(other) => {
                        log::debug!("field '{}': expected vector string, got {:?}", col.field, other.element_type());
                        malformed += 1;
                        col.values.extend(null_triple());
                    }
                },
            }
        }
        self.documents += 1;
        malformed
    }
}

fn null_triple() -> [Cell; 3] {
    [Cell::Null, Cell::Null, Cell::Null]
}

fn cell_to_json(c: &Cell) -> serde_json::Value {
    match c {
        Cell::Null => serde_json::Value::Null,
        Cell::Boolean(b) => serde_json::Value::Bool(*b),
        Cell::Number(n) => serde_json::Number::from_f64(*n).map_or(serde_json::Value::Null, serde_json::Value::Number),
        Cell::String(s) => serde_json::Value::String(s.clone()),
    }
}

/// Decodes a document cursor into a [`ColumnSet`].
#[derive(Debug, Clone)]
pub struct Decoder {
    vector_key: String,
}

impl Decoder {
    pub fn new(vector_key: impl Into<String>) -> Self {
        Self { vector_key: vector_key.into() }
    }

    /// A field is a vector field when its leaf key is the designated vector key.
    #[must_use]
    pub fn is_vector_field(&self, path: &str) -> bool {
        path.rsplit('.').next() == Some(self.vector_key.as_str())
    }

    fn kind_of(&self, path: &str) -> ColumnKind {
        if self.is_vector_field(path) { ColumnKind::Vector3 } else { ColumnKind::Scalar }
    }

    pub fn decode<I>(&self, cursor: I, fields: &[String]) -> ColumnSet
    where
        I: IntoIterator<Item = Result<Document, GatewayError>>,
    {
        self.decode_with_hint(cursor, fields, 0)
    }

    /// Like [`Decoder::decode`], pre-sizing columns for `expected` documents.
    ///
    /// Consumes the whole cursor. Cursor errors are logged and counted; they
    /// never stop iteration.
    pub fn decode_with_hint<I>(&self, cursor: I, fields: &[String], expected: usize) -> ColumnSet
    where
        I: IntoIterator<Item = Result<Document, GatewayError>>,
    {
        let mut set = ColumnSet::with_rows(fields, self, expected.min(MAX_PREALLOC_ROWS));
        for item in cursor {
            match item {
                Ok(doc) => {
                    let malformed = set.push_document(&doc);
                    set.malformed_vectors += malformed;
                }
                Err(e) => {
                    set.cursor_errors += 1;
                    log::warn!("cursor error after {} documents: {}", set.documents, e);
                }
            }
        }
        if set.malformed_vectors > 0 {
            log::warn!("{} vector value(s) could not be parsed; null triples used", set.malformed_vectors);
        }
        set
    }
}
