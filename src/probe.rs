//! Schema probing: enumerate the field keys of one sampled document.

use bson::Bson;

use crate::errors::GatewayError;
use crate::query::{Filter, FindOptions, Projection};
use crate::store::Database;

/// Field keys of the document at offset `skip` in `collection`.
///
/// Top-level keys are returned as-is, except document-valued keys which are
/// replaced by their immediate `parent.child` keys and array-valued keys which
/// are replaced by `parent.<index>`. `_id` is projected out.
/// An empty collection yields an empty list.
///
/// # Errors
/// `EmptyCollectionName`, or the store's error if the query cannot start.
pub fn probe_field_keys(db: &dyn Database, collection: &str, skip: u64) -> Result<Vec<String>, GatewayError> {
    if collection.is_empty() {
        return Err(GatewayError::EmptyCollectionName);
    }
    let opts = FindOptions { projection: Some(Projection::without_id()), sort: Vec::new(), limit: 1, skip };
    let mut cursor = db.find(collection, &Filter::True, &opts)?;

    let doc = loop {
        match cursor.next() {
            Some(Ok(d)) => break d,
            Some(Err(e)) => log::warn!("probe of '{collection}': cursor error: {e}"),
            None => {
                log::debug!("probe of '{collection}' (skip {skip}) found no document");
                return Ok(Vec::new());
            }
        }
    };

    let mut keys = Vec::with_capacity(doc.len());
    for (k, v) in &doc {
        match v {
            Bson::Document(sub) => keys.extend(sub.keys().map(|c| format!("{k}.{c}"))),
            Bson::Array(items) => keys.extend((0..items.len()).map(|i| format!("{k}.{i}"))),
            _ => keys.push(k.clone()),
        }
    }
    Ok(keys)
}
