// crates/translate/src/operator.rs

use crate::sanitize::{to_bson, Sanitizer};
use bson::{doc, Bson, Document};
use regex::Regex;
use serde_json::Value as Json;
use std::fmt::{self, Display, Formatter};
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Builds the query fragment for one `field_operator` key.
pub type OperatorFn = fn(field: &str, value: &Json, sanitizer: &Sanitizer) -> Document;

/// Operator suffixes accepted on filter keys (`age_gte`, `name_contains`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Open interval `[lo, hi]`, both bounds strict.
    Ir,
    /// Closed interval `[lo, hi]`, both bounds inclusive.
    Ire,
    In,
    Nin,
    Contains,
    Containss,
    Matches,
    Matchess,
    ContainsIndex,
    ContainssIndex,
    MatchesIndex,
    MatchessIndex,
}

impl Operator {
    pub const ALL: [Operator; 17] = [
        Operator::Ne,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Ir,
        Operator::Ire,
        Operator::In,
        Operator::Nin,
        Operator::Contains,
        Operator::Containss,
        Operator::Matches,
        Operator::Matchess,
        Operator::ContainsIndex,
        Operator::ContainssIndex,
        Operator::MatchesIndex,
        Operator::MatchessIndex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Ir => "ir",
            Operator::Ire => "ire",
            Operator::In => "in",
            Operator::Nin => "nin",
            Operator::Contains => "contains",
            Operator::Containss => "containss",
            Operator::Matches => "matches",
            Operator::Matchess => "matchess",
            Operator::ContainsIndex => "containsIndex",
            Operator::ContainssIndex => "containssIndex",
            Operator::MatchesIndex => "matchesIndex",
            Operator::MatchessIndex => "matchessIndex",
        }
    }

    /// Exact, case-sensitive token lookup.
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == token)
    }

    pub fn handler(self) -> OperatorFn {
        match self {
            Operator::Ne => ne,
            Operator::Gt => gt,
            Operator::Gte => gte,
            Operator::Lt => lt,
            Operator::Lte => lte,
            Operator::Ir => ir,
            Operator::Ire => ire,
            Operator::In => in_list,
            Operator::Nin => nin_list,
            Operator::Contains => contains,
            Operator::Containss => containss,
            Operator::Matches => matches,
            Operator::Matchess => matchess,
            Operator::ContainsIndex => contains_index,
            Operator::ContainssIndex => containss_index,
            Operator::MatchesIndex => matches_index,
            Operator::MatchessIndex => matchess_index,
        }
    }

    pub fn apply(self, field: &str, value: &Json, sanitizer: &Sanitizer) -> Document {
        (self.handler())(field, value, sanitizer)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Comparison
// ─────────────────────────────────────────────────────────────────────────────

fn ne(field: &str, value: &Json, _: &Sanitizer) -> Document {
    doc! { field: { "$ne": to_bson(value) } }
}

fn gt(field: &str, value: &Json, s: &Sanitizer) -> Document {
    doc! { field: { "$gt": s.sanitize(value) } }
}

fn gte(field: &str, value: &Json, s: &Sanitizer) -> Document {
    doc! { field: { "$gte": s.sanitize(value) } }
}

fn lt(field: &str, value: &Json, s: &Sanitizer) -> Document {
    doc! { field: { "$lt": s.sanitize(value) } }
}

fn lte(field: &str, value: &Json, s: &Sanitizer) -> Document {
    doc! { field: { "$lte": s.sanitize(value) } }
}

fn ir(field: &str, value: &Json, s: &Sanitizer) -> Document {
    interval(field, value, s, "$gt", "$lt")
}

fn ire(field: &str, value: &Json, s: &Sanitizer) -> Document {
    interval(field, value, s, "$gte", "$lte")
}

/// `[lo, hi]`; a scalar is taken as a lone lower bound and extra elements are
/// ignored.
fn interval(field: &str, value: &Json, s: &Sanitizer, lower: &str, upper: &str) -> Document {
    let bounds = as_sequence(value);
    let mut cond = Document::new();
    if let Some(lo) = bounds.first() {
        cond.insert(lower, s.sanitize(lo));
    }
    if let Some(hi) = bounds.get(1) {
        cond.insert(upper, s.sanitize(hi));
    }
    doc! { field: cond }
}

// ─────────────────────────────────────────────────────────────────────────────
// Membership
// ─────────────────────────────────────────────────────────────────────────────

fn in_list(field: &str, value: &Json, s: &Sanitizer) -> Document {
    doc! { field: { "$in": sanitized_list(value, s) } }
}

fn nin_list(field: &str, value: &Json, s: &Sanitizer) -> Document {
    doc! { field: { "$nin": sanitized_list(value, s) } }
}

fn sanitized_list(value: &Json, s: &Sanitizer) -> Vec<Bson> {
    as_sequence(value).into_iter().map(|v| s.sanitize(v)).collect()
}

fn as_sequence(value: &Json) -> Vec<&Json> {
    match value {
        Json::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Text
// ─────────────────────────────────────────────────────────────────────────────

fn contains(field: &str, value: &Json, _: &Sanitizer) -> Document {
    doc! { field: regex_clause(normalize_text(value), true) }
}

fn containss(field: &str, value: &Json, _: &Sanitizer) -> Document {
    doc! { field: regex_clause(normalize_text(value), false) }
}

fn matches(field: &str, value: &Json, _: &Sanitizer) -> Document {
    word_fragment(field, value, true, false)
}

fn matchess(field: &str, value: &Json, _: &Sanitizer) -> Document {
    word_fragment(field, value, false, false)
}

fn contains_index(field: &str, value: &Json, _: &Sanitizer) -> Document {
    let text = normalize_text(value);
    with_text_search(&text, field, regex_clause(text.clone(), true))
}

fn containss_index(field: &str, value: &Json, _: &Sanitizer) -> Document {
    let text = normalize_text(value);
    with_text_search(&text, field, regex_clause(text.clone(), false))
}

fn matches_index(field: &str, value: &Json, _: &Sanitizer) -> Document {
    word_fragment(field, value, true, true)
}

fn matchess_index(field: &str, value: &Json, _: &Sanitizer) -> Document {
    word_fragment(field, value, false, true)
}

/// Word-boundary match on any word of `value`. Blank input has no words and
/// yields an empty fragment, so the field is left unconstrained.
fn word_fragment(field: &str, value: &Json, case_insensitive: bool, indexed: bool) -> Document {
    let text = normalize_text(value);
    if text.is_empty() {
        return Document::new();
    }
    let regex = regex_clause(word_pattern(&text), case_insensitive);
    if indexed {
        with_text_search(&text, field, regex)
    } else {
        doc! { field: regex }
    }
}

/// Index clause narrows candidates, the regex clause keeps exact semantics.
fn with_text_search(text: &str, field: &str, regex: Document) -> Document {
    let mut fragment = doc! { "$text": { "$search": text } };
    fragment.insert(field, regex);
    fragment
}

fn regex_clause(pattern: String, case_insensitive: bool) -> Document {
    if case_insensitive {
        doc! { "$regex": pattern, "$options": "i" }
    } else {
        doc! { "$regex": pattern }
    }
}

/// Trim and collapse whitespace runs. Non-string scalars use their JSON text.
fn normalize_text(value: &Json) -> String {
    let raw = match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    };
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// `"lore ipsum"` → `\blore|\bipsum`
fn word_pattern(text: &str) -> String {
    text.split(' ')
        .filter(|w| !w.is_empty())
        .map(|w| format!(r"\b{w}"))
        .collect::<Vec<_>>()
        .join("|")
}
