//! Wire rendering of query parts into the document-filter dialect.
//!
//! Arrays such as the `$or` operand are BSON arrays, whose elements are keyed
//! by their positional index ("0", "1", ...) when encoded.

use bson::{Bson, Document};

use super::types::{Filter, FindOptions, ID_FIELD, Projection};

impl Filter {
    #[must_use]
    pub fn to_document(&self) -> Document {
        match self {
            Self::True => Document::new(),
            Self::Exists { path, exists } => {
                let mut op = Document::new();
                op.insert("$exists", *exists);
                let mut d = Document::new();
                d.insert(path.clone(), op);
                d
            }
            Self::Eq { path, value } => {
                let mut d = Document::new();
                d.insert(path.clone(), value.clone());
                d
            }
            Self::Or(branches) => {
                let arr: Vec<Bson> = branches.iter().map(|b| Bson::Document(b.to_document())).collect();
                let mut d = Document::new();
                d.insert("$or", arr);
                d
            }
            Self::And(parts) => {
                let docs: Vec<Document> = parts.iter().map(Self::to_document).collect();
                // Flat form when no two parts share a key, `$and` otherwise.
                let total: usize = docs.iter().map(Document::len).sum();
                let mut merged = Document::new();
                for d in &docs {
                    for (k, v) in d {
                        merged.insert(k.clone(), v.clone());
                    }
                }
                if merged.len() == total {
                    return merged;
                }
                let arr: Vec<Bson> = docs.into_iter().map(Bson::Document).collect();
                let mut out = Document::new();
                out.insert("$and", arr);
                out
            }
        }
    }
}

impl Projection {
    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut d = Document::new();
        d.insert(ID_FIELD, false);
        for f in &self.fields {
            if f != ID_FIELD {
                d.insert(f.clone(), true);
            }
        }
        d
    }
}

impl FindOptions {
    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut d = Document::new();
        d.insert("limit", i64::try_from(self.limit).unwrap_or(i64::MAX));
        d.insert("skip", i64::try_from(self.skip).unwrap_or(i64::MAX));
        if !self.sort.is_empty() {
            let mut sort = Document::new();
            for s in &self.sort {
                sort.insert(s.field.clone(), s.order.direction());
            }
            d.insert("sort", sort);
        }
        if let Some(p) = &self.projection {
            d.insert("projection", p.to_document());
        }
        d
    }
}
