use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::errors::GatewayError;

/// Default upper bound on requested fields per fetch.
pub const MAX_FIELDS: usize = 10;

// Safety limits
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_PATH_LEN: usize = 1024;

pub const ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    #[must_use]
    pub fn direction(self) -> i32 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Asc }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Exists { path: String, exists: bool },
    Eq { path: String, value: Bson },
}

/// Field projection. `_id` is always excluded.
///
/// An empty field list keeps every other key of the document; a non-empty list
/// keeps exactly the listed (possibly dotted) paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    pub fields: Vec<String>,
}

impl Projection {
    pub fn include(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { fields: fields.into_iter().map(Into::into).collect() }
    }

    /// Projection that only drops `_id`.
    #[must_use]
    pub fn without_id() -> Self {
        Self::default()
    }
}

/// Options passed to the store's `find`.
///
/// `limit == 0` means no limit and `skip == 0` means no skip, as on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub projection: Option<Projection>,
    pub sort: Vec<SortSpec>,
    pub limit: u64,
    pub skip: u64,
}

/// Caller-facing fetch options, aligned by index with the requested fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub sort_flags: Vec<bool>,
    #[serde(default)]
    pub session_ids: Option<Vec<String>>,
    /// Extra ascending sort keys applied after the flagged fields. They are
    /// not projected.
    #[serde(default)]
    pub order_by: Vec<String>,
}

/// Bounds-checked, ordered list of requested field paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldList {
    fields: Vec<String>,
    max: usize,
}

impl FieldList {
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self { fields: Vec::with_capacity(max.min(MAX_FIELDS)), max }
    }

    /// # Errors
    /// Fails on an empty path or when the list would exceed its bound.
    pub fn from_slice(fields: &[String], max: usize) -> Result<Self, GatewayError> {
        if fields.len() > max {
            return Err(GatewayError::TooManyFields { count: fields.len(), max });
        }
        let mut list = Self::new(max);
        for f in fields {
            list.push(f.clone())?;
        }
        Ok(list)
    }

    /// # Errors
    /// Fails on an empty path or when the list is already full.
    pub fn push(&mut self, field: String) -> Result<(), GatewayError> {
        if field.is_empty() {
            return Err(GatewayError::EmptyFieldPath(self.fields.len()));
        }
        if self.fields.len() >= self.max {
            return Err(GatewayError::TooManyFields { count: self.fields.len() + 1, max: self.max });
        }
        self.fields.push(field);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn capacity_bound(&self) -> usize {
        self.max
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.fields.iter()
    }
}

/// A validated, normalized single-collection query.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub collection: String,
    pub fields: FieldList,
    pub filter: Filter,
    pub options: FindOptions,
}

impl QuerySpec {
    /// Wire form of the filter predicate.
    #[must_use]
    pub fn filter_document(&self) -> Document {
        self.filter.to_document()
    }

    /// Wire form of the find options (`limit`, `skip`, `sort`, `projection`).
    #[must_use]
    pub fn options_document(&self) -> Document {
        self.options.to_document()
    }
}
