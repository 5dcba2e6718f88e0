// crates/mql/src/eval.rs

use std::cmp::Ordering;

use bson::{Bson, Document};

use crate::ast::{CmpOp, Filter};
use crate::index::TextIndex;
use crate::parser::compile_regex;

/// Resolve a dotted field path (e.g. "meta.author") into a nested value.
///
/// Numeric segments index into arrays. Returns `None` if any segment is missing.
pub fn field_value<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(d) => d.get(part)?,
            Bson::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Numeric values compare across Int32/Int64/Double.
fn as_f64(v: &Bson) -> Option<f64> {
    match v {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

pub(crate) fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Ordering between two values of comparable types; `None` otherwise.
pub(crate) fn compare_values(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// The value itself, then each element when it is an array.
fn candidates(actual: &Bson) -> impl Iterator<Item = &Bson> {
    let elements: &[Bson] = match actual {
        Bson::Array(arr) => arr,
        _ => &[],
    };
    std::iter::once(actual).chain(elements.iter())
}

fn matches_eq(expected: &Bson, actual: Option<&Bson>) -> bool {
    match actual {
        Some(actual) => candidates(actual).any(|v| values_equal(v, expected)),
        // { field: null } matches documents without the field
        None => matches!(expected, Bson::Null),
    }
}

fn matches_range(actual: Option<&Bson>, expected: &Bson, accept: fn(Ordering) -> bool) -> bool {
    actual.is_some_and(|actual| {
        candidates(actual).any(|v| compare_values(v, expected).is_some_and(accept))
    })
}

/// Evaluate a single comparison operator against an optional value.
fn eval_cmp(op: &CmpOp, actual: Option<&Bson>) -> bool {
    use CmpOp::*;

    match op {
        // { field: { $eq: value } }
        Eq(expected) => matches_eq(expected, actual),

        // { field: { $ne: value } }
        Ne(expected) => !matches_eq(expected, actual),

        // { field: { $gt: value } } and friends
        Gt(expected) => matches_range(actual, expected, Ordering::is_gt),
        Gte(expected) => matches_range(actual, expected, Ordering::is_ge),
        Lt(expected) => matches_range(actual, expected, Ordering::is_lt),
        Lte(expected) => matches_range(actual, expected, Ordering::is_le),

        // { field: { $in: [v1, v2, ...] } }
        In(list) => matches_in(list, actual),

        // { field: { $nin: [v1, v2, ...] } }
        Nin(list) => !matches_in(list, actual),

        // { field: { $exists: true|false } }
        Exists(flag) => *flag == actual.is_some(),

        // { field: { $regex: pattern, $options: flags } }
        Regex(re) => actual.is_some_and(|a| matches_regex(re, a)),

        // { field: { $not: { <cmp expr> } } }
        Not(inner) => !inner.iter().all(|op| eval_cmp(op, actual)),
    }
}

/// Regex members of an `$in` list match like `$regex`.
fn matches_in(list: &[Bson], actual: Option<&Bson>) -> bool {
    list.iter().any(|v| match v {
        Bson::RegularExpression(re) => actual.is_some_and(|a| {
            compile_regex(&re.pattern, &re.options).is_ok_and(|re| matches_regex(&re, a))
        }),
        v => matches_eq(v, actual),
    })
}

fn matches_regex(re: &regex::Regex, actual: &Bson) -> bool {
    candidates(actual).any(|v| match v {
        Bson::String(s) => re.is_match(s),
        _ => false,
    })
}

/// Evaluate a full Filter against a document.
///
/// `$text` clauses are answered by `index`; an empty index matches nothing.
pub fn eval_filter(filter: &Filter, doc: &Document, index: &TextIndex) -> bool {
    use Filter::*;

    match filter {
        Field(expr) => eval_cmp(&expr.op, field_value(doc, &expr.path)),
        And(filters) => filters.iter().all(|f| eval_filter(f, doc, index)),
        Or(filters) => filters.iter().any(|f| eval_filter(f, doc, index)),
        Nor(filters) => !filters.iter().any(|f| eval_filter(f, doc, index)),
        Text(search) => index.matches(doc, search),
    }
}
