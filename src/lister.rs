use crate::store::Database;

/// Collection names of `db`. A listing failure is logged and yields an empty list.
#[must_use]
pub fn list_collections(db: &dyn Database) -> Vec<String> {
    match db.list_collection_names() {
        Ok(names) => names,
        Err(e) => {
            log::warn!("listing collections of '{}' failed: {}", db.name(), e);
            Vec::new()
        }
    }
}
