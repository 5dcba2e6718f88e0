// crates/translate/src/request.rs

use serde::Serialize;
use serde_json::{Map, Value as Json};

const WHERE: &str = "where";
const SORT: &str = "sort";
const LIMIT: &str = "limit";
const SKIP: &str = "skip";
const START: &str = "start";

/// A REST-style filter request, read leniently from JSON.
///
/// ```json
/// {
///   "where": { "age_gte": 4, "name_contains": "lore" },
///   "sort": ["field:desc", "age:asc"],
///   "limit": 2,
///   "skip": 1,
///   "field": 3
/// }
/// ```
///
/// Unknown top-level keys land in `params` as implicit equality constraints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRequest {
    pub where_clause: Map<String, Json>,
    pub sort: Vec<SortKey>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
    pub params: Map<String, Json>,
}

impl FilterRequest {
    /// Never fails: anything that is not the expected shape is dropped.
    ///
    /// - `where` must be an object, otherwise it is empty.
    /// - `sort` is a string or an array of strings.
    /// - `limit`/`skip` accept integers or integer strings; `start` is the
    ///   legacy name for `skip` and loses when both are present.
    pub fn from_value(value: &Json) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let where_clause = match obj.get(WHERE) {
            Some(Json::Object(map)) => map.clone(),
            _ => Map::new(),
        };

        let sort = match obj.get(SORT) {
            Some(Json::String(spec)) => SortKey::parse(spec).into_iter().collect(),
            Some(Json::Array(specs)) => specs
                .iter()
                .filter_map(Json::as_str)
                .filter_map(SortKey::parse)
                .collect(),
            _ => Vec::new(),
        };

        let limit = obj.get(LIMIT).and_then(as_integer);
        let skip = obj
            .get(SKIP)
            .and_then(as_integer)
            .or_else(|| obj.get(START).and_then(as_integer));

        let params = obj
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), WHERE | SORT | LIMIT | SKIP | START))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            where_clause,
            sort,
            limit,
            skip,
            params,
        }
    }
}

fn as_integer(value: &Json) -> Option<i64> {
    match value {
        Json::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// `1` or `-1`, the ordinal document stores expect.
    pub fn ordinal(self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// One `field:direction` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    /// `"age:asc"` is ascending; any other direction, or none, is descending.
    /// Returns `None` for an empty field name.
    pub fn parse(spec: &str) -> Option<Self> {
        let (field, direction) = spec.split_once(':').unwrap_or((spec, ""));
        if field.is_empty() {
            return None;
        }
        let direction = if direction == "asc" {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        };
        Some(Self {
            field: field.to_string(),
            direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ─────────────────────────────────────────────────────────────
    // where
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn malformed_where_degrades_to_empty() {
        for bad in [json!(null), json!([1, 2]), json!(""), json!("age=4"), json!(3)] {
            let req = FilterRequest::from_value(&json!({ "where": bad }));
            assert!(req.where_clause.is_empty());
            assert!(req.params.is_empty());
        }
    }

    #[test]
    fn non_object_request_is_empty() {
        assert_eq!(FilterRequest::from_value(&json!(null)), FilterRequest::default());
        assert_eq!(FilterRequest::from_value(&json!([1])), FilterRequest::default());
    }

    #[test]
    fn reserved_keys_do_not_become_params() {
        let req = FilterRequest::from_value(&json!({
            "where": { "age": 4 },
            "sort": "age:asc",
            "limit": 2,
            "skip": 1,
            "start": 5,
            "field": 1
        }));
        assert_eq!(req.params.len(), 1);
        assert_eq!(req.params.get("field"), Some(&json!(1)));
        assert_eq!(req.where_clause.get("age"), Some(&json!(4)));
    }

    // ─────────────────────────────────────────────────────────────
    // pagination
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn start_is_legacy_skip() {
        let req = FilterRequest::from_value(&json!({ "start": 3 }));
        assert_eq!(req.skip, Some(3));

        let both = FilterRequest::from_value(&json!({ "start": 3, "skip": 1 }));
        assert_eq!(both.skip, Some(1));
    }

    #[test]
    fn integer_strings_are_accepted() {
        let req = FilterRequest::from_value(&json!({ "limit": "10", "skip": " 2 " }));
        assert_eq!(req.limit, Some(10));
        assert_eq!(req.skip, Some(2));
    }

    #[test]
    fn garbage_pagination_is_ignored() {
        let req = FilterRequest::from_value(&json!({ "limit": "ten", "skip": true }));
        assert_eq!(req.limit, None);
        assert_eq!(req.skip, None);
    }

    // ─────────────────────────────────────────────────────────────
    // sort
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn sort_string_and_array() {
        let one = FilterRequest::from_value(&json!({ "sort": "field:asc" }));
        assert_eq!(
            one.sort,
            vec![SortKey {
                field: "field".into(),
                direction: SortDirection::Ascending
            }]
        );

        let many = FilterRequest::from_value(&json!({ "sort": ["field:desc", 7, "age:asc"] }));
        let fields: Vec<_> = many.sort.iter().map(|k| k.field.as_str()).collect();
        assert_eq!(fields, vec!["field", "age"]);
        assert_eq!(many.sort[0].direction, SortDirection::Descending);
        assert_eq!(many.sort[1].direction, SortDirection::Ascending);
    }

    #[test]
    fn anything_but_asc_is_descending() {
        for spec in ["age:desc", "age:ASC", "age", "age:"] {
            let key = SortKey::parse(spec).unwrap();
            assert_eq!(key.field, "age");
            assert_eq!(key.direction.ordinal(), -1, "{spec}");
        }
        assert_eq!(SortKey::parse("age:asc").unwrap().direction.ordinal(), 1);
    }

    #[test]
    fn empty_sort_field_is_skipped() {
        assert_eq!(SortKey::parse(":asc"), None);
        assert_eq!(SortKey::parse(""), None);
    }
}
