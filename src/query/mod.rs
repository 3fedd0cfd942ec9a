mod builder;
mod cursor;
mod eval;
mod exec;
mod render;
mod types;

pub use builder::QueryBuilder;
pub use cursor::Cursor;
pub use eval::{compare_bson, compare_docs, eval_filter, get_path, project_fields};
pub use exec::{count_docs, find_docs};
pub use types::{
    FetchOptions, FieldList, Filter, FindOptions, ID_FIELD, MAX_FIELDS, Order, Projection, QuerySpec,
    SortSpec,
};
