// crates/mql/src/ast.rs

use bson::Bson;
use regex::Regex;

/// Comparison operations on a single field path.
#[derive(Debug, Clone)]
pub enum CmpOp {
    Eq(Bson),
    Ne(Bson),
    Gt(Bson),
    Gte(Bson),
    Lt(Bson),
    Lte(Bson),
    In(Vec<Bson>),
    Nin(Vec<Bson>),
    Exists(bool),
    Regex(Regex),
    /// Negation of the conjunction of the inner operators.
    Not(Vec<CmpOp>),
}

/// A single field expression: `<path> <op>`.
#[derive(Debug, Clone)]
pub struct FieldExpr {
    /// Dotted path into nested documents.
    pub path: String,
    pub op: CmpOp,
}

/// Filter tree.
#[derive(Debug, Clone)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Nor(Vec<Filter>),
    Field(FieldExpr),
    Text(TextSearch),
}

impl Filter {
    /// True if a `$text` clause appears anywhere in the tree.
    pub fn uses_text(&self) -> bool {
        match self {
            Filter::Text(_) => true,
            Filter::Field(_) => false,
            Filter::And(list) | Filter::Or(list) | Filter::Nor(list) => {
                list.iter().any(Filter::uses_text)
            }
        }
    }
}

/// Parsed `$search` string. Everything is lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSearch {
    pub terms: Vec<String>,
    pub negated: Vec<String>,
    pub phrases: Vec<String>,
}

impl TextSearch {
    /// `aenean "quam felis" -leo` → term `aenean`, phrase `quam felis`,
    /// negated `leo`.
    pub fn parse(search: &str) -> Self {
        let mut out = TextSearch::default();

        for (i, segment) in search.split('"').enumerate() {
            if i % 2 == 1 {
                let phrase = segment.trim().to_lowercase();
                if !phrase.is_empty() {
                    out.phrases.push(phrase);
                }
                continue;
            }
            for token in segment.split_whitespace() {
                let (negate, token) = match token.strip_prefix('-') {
                    Some(rest) if !rest.is_empty() => (true, rest),
                    _ => (false, token),
                };
                for word in words(token) {
                    if negate {
                        out.negated.push(word);
                    } else {
                        out.terms.push(word);
                    }
                }
            }
        }

        out
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.phrases.is_empty()
    }
}

/// Lower-cased alphanumeric runs.
pub(crate) fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Field selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Only these top-level fields, plus `_id` when `id` is set.
    Include { fields: Vec<String>, id: bool },
    /// Everything except these top-level fields.
    Exclude { fields: Vec<String> },
}

/// Sort, pagination and projection for a find. `sort` holds `(path, 1 | -1)`
/// pairs in priority order.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub sort: Vec<(String, i8)>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
    pub projection: Option<Projection>,
}
