// crates/translate/src/collection.rs

use bson::Document;

// ─────────────────────────────────────────────────────────────────────────────
// Execution port: drivers / stores implement these. Nothing here executes.
// ─────────────────────────────────────────────────────────────────────────────

/// A collection handle that can start a lazy find.
#[cfg_attr(test, mockall::automock(type Query = crate::assemble::FindSpec;))]
pub trait Collection {
    type Query: QueryHandle;

    /// Start a query. `projection` is forwarded verbatim.
    fn find(&self, filter: Document, projection: Option<Document>) -> Self::Query;
}

/// Builder-style modifiers chained onto a started query.
pub trait QueryHandle: Sized {
    /// `{ field: 1 | -1, ... }`, first key is the primary ordering.
    fn sort(self, sort: Document) -> Self;

    fn skip(self, skip: u64) -> Self;

    fn limit(self, limit: i64) -> Self;
}
