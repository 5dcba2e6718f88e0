// crates/mql/src/parser.rs

use crate::ast::{CmpOp, FieldExpr, Filter, Projection, TextSearch};
use crate::error::QueryError;
use bson::{Bson, Document};
use regex::{Regex, RegexBuilder};

/// Parse a query document into a Filter AST.
pub fn parse_filter(doc: &Document) -> Result<Filter, QueryError> {
    let mut filters = Vec::new();

    for (key, value) in doc {
        match key.as_str() {
            "$and" => filters.push(Filter::And(parse_list(key, value)?)),
            "$or" => filters.push(Filter::Or(parse_list(key, value)?)),
            "$nor" => filters.push(Filter::Nor(parse_list(key, value)?)),
            "$text" => filters.push(Filter::Text(parse_text(value)?)),
            k if k.starts_with('$') => {
                return Err(QueryError::InvalidOperator(format!(
                    "unsupported top-level operator {k}"
                )))
            }
            _ => filters.push(parse_field_expr(key, value)?),
        }
    }

    if filters.len() == 1 {
        Ok(filters.remove(0))
    } else {
        Ok(Filter::And(filters))
    }
}

fn parse_list(op: &str, value: &Bson) -> Result<Vec<Filter>, QueryError> {
    let arr = match value {
        Bson::Array(arr) if !arr.is_empty() => arr,
        _ => {
            return Err(QueryError::filter(format!(
                "{op} expects a non-empty array"
            )))
        }
    };

    arr.iter()
        .map(|sub| match sub {
            Bson::Document(d) => parse_filter(d),
            _ => Err(QueryError::filter(format!("{op} entries must be documents"))),
        })
        .collect()
}

fn parse_text(value: &Bson) -> Result<TextSearch, QueryError> {
    value
        .as_document()
        .and_then(|d| d.get_str("$search").ok())
        .map(TextSearch::parse)
        .ok_or_else(|| QueryError::filter("$text expects { $search: <string> }"))
}

fn parse_field_expr(path: &str, value: &Bson) -> Result<Filter, QueryError> {
    let ops = match value {
        Bson::Document(d) if is_operator_doc(d) => parse_ops(d)?,
        Bson::RegularExpression(re) => vec![CmpOp::Regex(compile_regex(&re.pattern, &re.options)?)],
        // Shorthand: { field: value } → Eq
        other => vec![CmpOp::Eq(other.clone())],
    };

    let mut exprs: Vec<Filter> = ops
        .into_iter()
        .map(|op| {
            Filter::Field(FieldExpr {
                path: path.to_string(),
                op,
            })
        })
        .collect();

    if exprs.len() == 1 {
        Ok(exprs.remove(0))
    } else {
        Ok(Filter::And(exprs))
    }
}

fn is_operator_doc(d: &Document) -> bool {
    d.keys().next().is_some_and(|k| k.starts_with('$'))
}

/// `$options` only modifies `$regex`, so it is consumed here rather than
/// parsed as an operator of its own.
fn parse_ops(d: &Document) -> Result<Vec<CmpOp>, QueryError> {
    let options = match d.get("$options") {
        None => None,
        Some(Bson::String(s)) => Some(s.as_str()),
        Some(_) => return Err(QueryError::filter("$options must be a string")),
    };
    if options.is_some() && !d.contains_key("$regex") {
        return Err(QueryError::filter("$options requires $regex"));
    }

    d.iter()
        .filter(|(name, _)| name.as_str() != "$options")
        .map(|(name, value)| parse_cmp_op(name, value, options))
        .collect()
}

fn parse_cmp_op(op_name: &str, value: &Bson, options: Option<&str>) -> Result<CmpOp, QueryError> {
    use CmpOp::*;

    match op_name {
        "$eq" => Ok(Eq(value.clone())),
        "$ne" => Ok(Ne(value.clone())),
        "$gt" => Ok(Gt(value.clone())),
        "$gte" => Ok(Gte(value.clone())),
        "$lt" => Ok(Lt(value.clone())),
        "$lte" => Ok(Lte(value.clone())),
        "$in" => Ok(In(expect_array(op_name, value)?)),
        "$nin" => Ok(Nin(expect_array(op_name, value)?)),
        "$exists" => Ok(Exists(truthy(value))),
        "$regex" => {
            let re = match value {
                Bson::String(pattern) => compile_regex(pattern, options.unwrap_or(""))?,
                Bson::RegularExpression(re) => {
                    compile_regex(&re.pattern, options.unwrap_or(&re.options))?
                }
                _ => return Err(QueryError::filter("$regex expects a string")),
            };
            Ok(Regex(re))
        }
        "$not" => match value {
            Bson::Document(inner) if is_operator_doc(inner) => Ok(Not(parse_ops(inner)?)),
            Bson::RegularExpression(re) => {
                Ok(Not(vec![Regex(compile_regex(&re.pattern, &re.options)?)]))
            }
            _ => Err(QueryError::filter(
                "$not expects an operator document or a regex",
            )),
        },
        _ => Err(QueryError::InvalidOperator(format!(
            "unsupported operator {op_name}"
        ))),
    }
}

fn expect_array(op_name: &str, value: &Bson) -> Result<Vec<Bson>, QueryError> {
    value
        .as_array()
        .cloned()
        .ok_or_else(|| QueryError::filter(format!("{op_name} expects array")))
}

/// Build a regex honouring the `i`, `m`, `s` and `x` option flags.
pub fn compile_regex(pattern: &str, options: &str) -> Result<Regex, QueryError> {
    RegexBuilder::new(pattern)
        .case_insensitive(options.contains('i'))
        .multi_line(options.contains('m'))
        .dot_matches_new_line(options.contains('s'))
        .ignore_whitespace(options.contains('x'))
        .build()
        .map_err(|source| QueryError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })
}

pub(crate) fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

/// `{ field: 1 | -1 }`; `"asc"`/`"desc"` (and the long forms) are also
/// accepted.
pub fn parse_sort(doc: &Document) -> Result<Vec<(String, i8)>, QueryError> {
    let mut sort = Vec::with_capacity(doc.len());

    for (field, dir) in doc {
        let dir = match dir {
            Bson::Int32(1) | Bson::Int64(1) => 1,
            Bson::Int32(-1) | Bson::Int64(-1) => -1,
            Bson::Double(d) if *d == 1.0 => 1,
            Bson::Double(d) if *d == -1.0 => -1,
            Bson::String(s) => match s.to_ascii_lowercase().as_str() {
                "asc" | "ascending" => 1,
                "desc" | "descending" => -1,
                _ => {
                    return Err(QueryError::InvalidSort(format!(
                        "unknown direction {s:?} for {field}"
                    )))
                }
            },
            other => {
                return Err(QueryError::InvalidSort(format!(
                    "sort direction for {field} must be 1 or -1, got {other}"
                )))
            }
        };
        sort.push((field.clone(), dir));
    }

    Ok(sort)
}

/// Inclusion or exclusion projection; `_id` may be excluded from an
/// inclusion projection but the two modes cannot otherwise be mixed.
pub fn parse_projection(doc: &Document) -> Result<Projection, QueryError> {
    let mut include = Vec::new();
    let mut exclude = Vec::new();
    let mut id = true;

    for (field, flag) in doc {
        let on = truthy(flag);
        if field == "_id" {
            id = on;
            continue;
        }
        if on {
            include.push(field.clone());
        } else {
            exclude.push(field.clone());
        }
    }

    match (include.is_empty(), exclude.is_empty()) {
        (false, false) => Err(QueryError::InvalidProjection(
            "cannot mix inclusion and exclusion".into(),
        )),
        (false, true) => Ok(Projection::Include {
            fields: include,
            id,
        }),
        _ => {
            if !id {
                exclude.push("_id".to_string());
            }
            Ok(Projection::Exclude { fields: exclude })
        }
    }
}
