// crates/mql/src/index.rs

use std::collections::HashSet;

use bson::{Bson, Document};

use crate::ast::{words, TextSearch};
use crate::eval::field_value;

// ─────────────────────────────────────────────────────────────────────────────
// Text index configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Which fields a `$text` search looks at.
///
/// A collection holds at most one text index; an empty one means `$text`
/// queries are rejected.
#[derive(Debug, Clone, Default)]
pub struct TextIndex {
    fields: Vec<String>,
}

impl TextIndex {
    /// Example:
    /// ```ignore
    /// let index = TextIndex::new(["name", "description"]);
    /// ```
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into();
            if !out.contains(&field) {
                out.push(field);
            }
        }
        Self { fields: out }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Whole-word, case-insensitive match of `search` over the indexed
    /// string fields of `doc`.
    ///
    /// Any negated word excludes the document, every phrase must appear,
    /// and at least one term must appear when terms are given.
    pub fn matches(&self, doc: &Document, search: &TextSearch) -> bool {
        if search.is_empty() {
            return false;
        }

        let text = self.indexed_text(doc);
        if text.is_empty() {
            return false;
        }
        let vocabulary: HashSet<String> = words(&text).collect();

        if search.negated.iter().any(|w| vocabulary.contains(w)) {
            return false;
        }
        if !search.phrases.iter().all(|p| text.contains(p.as_str())) {
            return false;
        }
        search.terms.is_empty() || search.terms.iter().any(|t| vocabulary.contains(t))
    }

    /// Lower-cased concatenation of every indexed string value.
    fn indexed_text(&self, doc: &Document) -> String {
        let mut parts: Vec<String> = Vec::new();
        for field in &self.fields {
            match field_value(doc, field) {
                Some(Bson::String(s)) => parts.push(s.to_lowercase()),
                Some(Bson::Array(arr)) => parts.extend(
                    arr.iter()
                        .filter_map(Bson::as_str)
                        .map(str::to_lowercase),
                ),
                _ => {}
            }
        }
        parts.join("\n")
    }
}
