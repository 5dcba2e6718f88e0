// crates/mql/src/store.rs

use std::cmp::Ordering;
use std::sync::Arc;

use bson::{oid::ObjectId, Bson, Document};
use tracing::{debug, instrument};
use translate::{Collection, QueryHandle};

use crate::ast::{FindOptions, Projection};
use crate::error::QueryError;
use crate::eval::{compare_values, eval_filter, field_value};
use crate::index::TextIndex;
use crate::parser::{parse_filter, parse_projection, parse_sort};

// ─────────────────────────────────────────────────────────────────────────────
// In-memory collection
// ─────────────────────────────────────────────────────────────────────────────

/// Simple in-memory collection of BSON documents.
///
/// Cursors share the documents by `Arc`, so inserting after a cursor was
/// started does not affect it.
#[derive(Debug, Clone, Default)]
pub struct MemCollection {
    docs: Arc<Vec<Document>>,
    text_index: TextIndex,
}

impl MemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents<I>(docs: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        let mut collection = Self::new();
        collection.insert_many(docs);
        collection
    }

    /// Insert a document, assigning an `_id` when it has none. Returns the id.
    pub fn insert_one(&mut self, doc: Document) -> Bson {
        let (id, doc) = match doc.get("_id").cloned() {
            Some(id) => (id, doc),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                // `_id` leads the document, as a server would store it
                let mut with_id = Document::new();
                with_id.insert("_id", id.clone());
                for (key, value) in doc {
                    with_id.insert(key, value);
                }
                (id, with_id)
            }
        };
        Arc::make_mut(&mut self.docs).push(doc);
        id
    }

    pub fn insert_many<I>(&mut self, docs: I) -> Vec<Bson>
    where
        I: IntoIterator<Item = Document>,
    {
        docs.into_iter().map(|doc| self.insert_one(doc)).collect()
    }

    /// Replace the text index with one over `fields`.
    pub fn create_text_index<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_index = TextIndex::new(fields);
        let fields: Vec<&str> = self.text_index.fields().collect();
        debug!(?fields, "text index created");
    }

    pub fn text_index(&self) -> &TextIndex {
        &self.text_index
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl Collection for MemCollection {
    type Query = MemCursor;

    fn find(&self, filter: Document, projection: Option<Document>) -> MemCursor {
        MemCursor {
            docs: Arc::clone(&self.docs),
            text_index: self.text_index.clone(),
            filter,
            projection,
            sort: None,
            skip: None,
            limit: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lazy cursor
// ─────────────────────────────────────────────────────────────────────────────

/// A started but not yet executed find. Nothing is evaluated until
/// [`MemCursor::to_vec`] or [`MemCursor::count`].
#[derive(Debug, Clone)]
pub struct MemCursor {
    docs: Arc<Vec<Document>>,
    text_index: TextIndex,
    filter: Document,
    projection: Option<Document>,
    sort: Option<Document>,
    skip: Option<u64>,
    limit: Option<i64>,
}

impl QueryHandle for MemCursor {
    fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl MemCursor {
    pub fn filter(&self) -> &Document {
        &self.filter
    }

    fn options(&self) -> Result<FindOptions, QueryError> {
        Ok(FindOptions {
            sort: match &self.sort {
                Some(sort) => parse_sort(sort)?,
                None => Vec::new(),
            },
            skip: self.skip,
            limit: self.limit,
            projection: self.projection.as_ref().map(parse_projection).transpose()?,
        })
    }

    /// Execute the query:
    ///
    /// 1. Parse the filter and options.
    /// 2. Scan every document with `eval_filter`.
    /// 3. Sort, then skip + limit, then project.
    #[instrument(skip_all, fields(filter = %self.filter))]
    pub fn to_vec(&self) -> Result<Vec<Document>, QueryError> {
        let filter = parse_filter(&self.filter)?;
        if filter.uses_text() && self.text_index.is_empty() {
            return Err(QueryError::TextIndexRequired);
        }
        let opts = self.options()?;

        let mut matched: Vec<&Document> = self
            .docs
            .iter()
            .filter(|doc| eval_filter(&filter, doc, &self.text_index))
            .collect();
        let total = matched.len();

        apply_sort(&mut matched, &opts.sort);
        let page = apply_skip_limit(matched, opts.skip, opts.limit);

        let out: Vec<Document> = match &opts.projection {
            Some(projection) => page.into_iter().map(|d| project(d, projection)).collect(),
            None => page.into_iter().cloned().collect(),
        };

        debug!(matched = total, returned = out.len(), "query executed");
        Ok(out)
    }

    /// Number of documents matching the filter, ignoring skip and limit.
    pub fn count(&self) -> Result<usize, QueryError> {
        let filter = parse_filter(&self.filter)?;
        if filter.uses_text() && self.text_index.is_empty() {
            return Err(QueryError::TextIndexRequired);
        }
        Ok(self
            .docs
            .iter()
            .filter(|doc| eval_filter(&filter, doc, &self.text_index))
            .count())
    }
}

/// Apply sort clauses in-place.
///
/// `sort` is a Vec<(field_path, dir)> where dir is 1 (asc) or -1 (desc).
fn apply_sort(docs: &mut [&Document], sort: &[(String, i8)]) {
    if sort.is_empty() || docs.len() <= 1 {
        return;
    }

    docs.sort_by(|a, b| {
        for (field, dir) in sort {
            let ord = compare_field(a, b, field);
            if ord != Ordering::Equal {
                return if *dir >= 0 { ord } else { ord.reverse() };
            }
        }
        Ordering::Equal
    });
}

/// Compare a single field across two docs. Missing sorts first.
fn compare_field(a: &Document, b: &Document, field: &str) -> Ordering {
    match (field_value(a, field), field_value(b, field)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(va), Some(vb)) => compare_values(va, vb).unwrap_or(Ordering::Equal),
    }
}

/// Apply skip + limit. A limit of 0 means no limit; a negative limit uses
/// its absolute value.
fn apply_skip_limit(docs: Vec<&Document>, skip: Option<u64>, limit: Option<i64>) -> Vec<&Document> {
    let start = usize::try_from(skip.unwrap_or(0)).unwrap_or(usize::MAX);
    let take = match limit {
        None | Some(0) => usize::MAX,
        Some(n) => usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX),
    };

    docs.into_iter().skip(start).take(take).collect()
}

/// Top-level field selection.
fn project(doc: &Document, projection: &Projection) -> Document {
    match projection {
        Projection::Include { fields, id } => {
            let mut out = Document::new();
            if *id {
                if let Some(v) = doc.get("_id") {
                    out.insert("_id", v.clone());
                }
            }
            for field in fields {
                if let Some(v) = doc.get(field) {
                    out.insert(field.clone(), v.clone());
                }
            }
            out
        }
        Projection::Exclude { fields } => {
            let mut out = doc.clone();
            for field in fields {
                out.remove(field);
            }
            out
        }
    }
}
