use bson::Document;

use crate::errors::GatewayError;

type Source = Box<dyn Iterator<Item = Result<Document, GatewayError>> + Send>;

/// A forward-only, non-restartable cursor over query results.
///
/// Each item is either a document or a per-document cursor error; an error does
/// not end the sequence.
pub struct Cursor {
    source: Source,
    pos: usize,
}

impl Cursor {
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Result<Document, GatewayError>>,
        I::IntoIter: Send + 'static,
    {
        Self { source: Box::new(items.into_iter()), pos: 0 }
    }

    #[must_use]
    pub fn from_documents(docs: Vec<Document>) -> Self {
        Self::new(docs.into_iter().map(Ok))
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::from_documents(Vec::new())
    }

    pub fn advance(&mut self) -> Option<Result<Document, GatewayError>> {
        let item = self.source.next()?;
        self.pos += 1;
        Some(item)
    }

    /// Number of items (documents or errors) consumed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Iterator for Cursor {
    type Item = Result<Document, GatewayError>;
    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor").field("pos", &self.pos).finish_non_exhaustive()
    }
}
