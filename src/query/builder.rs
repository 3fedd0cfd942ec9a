use bson::Bson;

use crate::config::GatewayConfig;
use crate::errors::GatewayError;

use super::types::{FetchOptions, FieldList, Filter, FindOptions, Projection, QuerySpec, SortSpec};

/// Turns caller arguments into a validated [`QuerySpec`].
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    max_fields: usize,
    position_path: String,
    session_field: String,
}

impl QueryBuilder {
    pub fn new(max_fields: usize, position_path: impl Into<String>, session_field: impl Into<String>) -> Self {
        Self { max_fields, position_path: position_path.into(), session_field: session_field.into() }
    }

    #[must_use]
    pub fn from_config(cfg: &GatewayConfig) -> Self {
        Self::new(cfg.max_fields, cfg.position_path.clone(), cfg.session_field.clone())
    }

    /// # Errors
    /// Returns a configuration or capacity error; nothing is truncated.
    pub fn build(&self, collection: &str, fields: &[String], opts: &FetchOptions) -> Result<QuerySpec, GatewayError> {
        if collection.is_empty() {
            return Err(GatewayError::EmptyCollectionName);
        }
        let fields = FieldList::from_slice(fields, self.max_fields)?;
        if opts.sort_flags.len() > fields.len() {
            return Err(GatewayError::SortFlagsMisaligned { flags: opts.sort_flags.len(), fields: fields.len() });
        }

        if let Some(i) = opts.order_by.iter().position(String::is_empty) {
            return Err(GatewayError::InvalidArgument(format!("order_by[{i}] is empty")));
        }

        let filter = self.filter_for(opts);

        let mut sort: Vec<SortSpec> = fields
            .iter()
            .zip(opts.sort_flags.iter())
            .filter(|(_, asc)| **asc)
            .map(|(f, _)| SortSpec::asc(f.clone()))
            .collect();
        for key in &opts.order_by {
            if !sort.iter().any(|s| &s.field == key) {
                sort.push(SortSpec::asc(key.clone()));
            }
        }

        let options = FindOptions {
            projection: Some(Projection::include(fields.iter().cloned())),
            sort,
            limit: opts.limit,
            skip: opts.skip,
        };

        Ok(QuerySpec { collection: collection.to_string(), fields, filter, options })
    }

    /// Filter part of a fetch: the session filter when ids are given, otherwise match-all.
    #[must_use]
    pub fn filter_for(&self, opts: &FetchOptions) -> Filter {
        match opts.session_ids.as_deref() {
            Some(ids) if !ids.is_empty() => self.session_filter(ids),
            _ => Filter::True,
        }
    }

    #[must_use]
    pub fn max_fields(&self) -> usize {
        self.max_fields
    }

    /// Position must exist AND session id is one of `ids` (branches in supplied order).
    #[must_use]
    pub fn session_filter(&self, ids: &[String]) -> Filter {
        let branches = ids
            .iter()
            .map(|id| Filter::Eq { path: self.session_field.clone(), value: Bson::String(id.clone()) })
            .collect();
        Filter::And(vec![
            Filter::Exists { path: self.position_path.clone(), exists: true },
            Filter::Or(branches),
        ])
    }
}
