// crates/translate/src/assemble.rs

use crate::allowlist::{self, Schema};
use crate::collection::{Collection, QueryHandle};
use crate::request::{FilterRequest, SortKey};
use crate::sanitize::{to_bson, Sanitizer};
use crate::settings::TranslatorSettings;
use crate::tokenizer::tokenize;
use bson::Document;
use serde::Serialize;
use serde_json::{Map, Value as Json};
use tracing::{debug, trace};

/// A fully assembled, not-yet-executed find.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FindSpec {
    pub filter: Document,
    pub projection: Option<Document>,
    pub sort: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

impl FindSpec {
    /// Replay onto a collection: `find`, then `sort`, `skip`, `limit` when set.
    pub fn apply<C: Collection>(self, collection: &C) -> C::Query {
        let mut query = collection.find(self.filter, self.projection);
        if let Some(sort) = self.sort {
            query = query.sort(sort);
        }
        if let Some(skip) = self.skip {
            query = query.skip(skip);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        query
    }
}

impl QueryHandle for FindSpec {
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

/// Turns REST filter requests into store queries.
///
/// Holds no per-call state; one instance can serve any number of
/// concurrent translations.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    settings: TranslatorSettings,
    schema: Schema,
    sanitizer: Sanitizer,
}

impl Translator {
    pub fn new(settings: TranslatorSettings) -> Self {
        let sanitizer = Sanitizer::new(settings.sanitize_values);
        Self {
            settings,
            schema: Schema::SchemaLess,
            sanitizer,
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn settings(&self) -> &TranslatorSettings {
        &self.settings
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Build the query description for a raw JSON request.
    #[tracing::instrument(
        skip_all,
        fields(sanitize = self.sanitizer.is_enabled(), schema_backed = self.schema.is_backed())
    )]
    pub fn build(&self, request: &Json, projection: Option<Document>) -> FindSpec {
        self.build_request(&FilterRequest::from_value(request), projection)
    }

    /// Precedence, lowest to highest:
    /// top-level params < `where` equality < operator fragments.
    pub fn build_request(&self, request: &FilterRequest, projection: Option<Document>) -> FindSpec {
        let (equality, fragments) = self.split_where(&request.where_clause);

        let mut params = params_document(&request.params);
        merge_into(&mut params, equality);
        let params = allowlist::filter_fields(params, &self.schema, &self.settings);

        let mut filter = params;
        merge_into(&mut filter, fragments);
        trace!(?filter, "assembled filter");

        FindSpec {
            filter,
            projection,
            sort: sort_document(&request.sort),
            skip: request.skip.and_then(|s| u64::try_from(s).ok()),
            limit: request.limit.filter(|l| *l > -1),
        }
    }

    /// Build and start the query on `collection`. Nothing is executed.
    #[tracing::instrument(skip_all)]
    pub fn translate<C: Collection>(
        &self,
        collection: &C,
        request: &Json,
        projection: Option<Document>,
    ) -> C::Query {
        self.build(request, projection).apply(collection)
    }

    /// Partition `where` into plain equality keys and operator fragments.
    fn split_where(&self, where_clause: &Map<String, Json>) -> (Document, Document) {
        let mut equality = Document::new();
        let mut fragments = Document::new();

        for (key, value) in where_clause {
            let parsed = tokenize(key, &self.settings.id_field);
            match parsed.operator {
                Some(op) => {
                    debug!(key = %key, field = %parsed.field, operator = %op, "operator filter");
                    merge_into(&mut fragments, op.apply(&parsed.field, value, &self.sanitizer));
                }
                None => {
                    debug!(key = %key, "equality filter");
                    equality.insert(key.clone(), to_bson(value));
                }
            }
        }

        (equality, fragments)
    }
}

/// Convenience wrapper using default settings.
pub fn translate<C: Collection>(
    collection: &C,
    schema: Schema,
    request: &Json,
    projection: Option<Document>,
) -> C::Query {
    Translator::default()
        .with_schema(schema)
        .translate(collection, request, projection)
}

fn params_document(params: &Map<String, Json>) -> Document {
    params
        .iter()
        .map(|(k, v)| (k.clone(), to_bson(v)))
        .collect()
}

/// Object union; keys from `overlay` replace existing ones.
fn merge_into(base: &mut Document, overlay: Document) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}

fn sort_document(keys: &[SortKey]) -> Option<Document> {
    if keys.is_empty() {
        return None;
    }
    let mut sort = Document::new();
    for key in keys {
        sort.insert(key.field.clone(), key.direction.ordinal());
    }
    Some(sort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::MockCollection;
    use bson::{doc, oid::ObjectId};
    use mockall::predicate::eq;
    use serde_json::json;

    fn build(request: Json) -> FindSpec {
        Translator::default().build(&request, None)
    }

    // ─────────────────────────────────────────────────────────────
    // filter assembly
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn unknown_suffix_is_literal_equality() {
        let spec = build(json!({ "where": { "first_name": "lore", "age_eq": 4 } }));
        assert_eq!(spec.filter, doc! { "first_name": "lore", "age_eq": 4 });
    }

    #[test]
    fn operators_and_equality_merge() {
        let spec = build(json!({ "where": { "name_contains": "lore", "age_gte": 4, "field": 1 } }));
        assert_eq!(
            spec.filter,
            doc! {
                "field": 1,
                "name": { "$regex": "lore", "$options": "i" },
                "age": { "$gte": 4 },
            }
        );
    }

    #[test]
    fn where_equality_beats_top_level_param() {
        let spec = build(json!({ "field": 2, "where": { "field": 3, "age_gte": 6 } }));
        assert_eq!(spec.filter.get_i32("field").unwrap(), 3);
        assert_eq!(spec.filter.get_document("age").unwrap(), &doc! { "$gte": 6 });
    }

    #[test]
    fn operator_fragment_beats_equality_on_same_field() {
        let spec = build(json!({ "age": 1, "where": { "age": 2, "age_gt": 3 } }));
        assert_eq!(spec.filter, doc! { "age": { "$gt": 3 } });
    }

    #[test]
    fn later_fragment_on_same_field_wins() {
        let spec = build(json!({ "where": { "age_gt": 3, "age_lt": 9 } }));
        assert_eq!(spec.filter, doc! { "age": { "$lt": 9 } });
    }

    #[test]
    fn top_level_native_operator_object_passes_through() {
        let spec = build(json!({ "field": { "$in": [1, 3] }, "where": { "age_gte": 6 } }));
        assert_eq!(
            spec.filter,
            doc! { "field": { "$in": [1, 3] }, "age": { "$gte": 6 } }
        );
    }

    #[test]
    fn compound_key_round_trips_untouched() {
        let or = json!([{ "field": 1 }, { "field": 3 }]);
        let expected = doc! { "$or": [ { "field": 1 }, { "field": 3 } ] };

        let schema_less = build(json!({ "$or": or.clone() }));
        assert_eq!(schema_less.filter, expected);

        let backed = Translator::default()
            .with_schema(Schema::backed(["field"]))
            .build(&json!({ "where": { "$or": or } }), None);
        assert_eq!(backed.filter, expected);
    }

    #[test]
    fn schema_strips_undeclared_equality_but_not_operators() {
        let t = Translator::default().with_schema(Schema::backed(["name"]));
        let spec = t.build(
            &json!({ "injected": 1, "where": { "name": "lore", "secret": 1, "age_gt": 3 } }),
            None,
        );
        assert_eq!(spec.filter, doc! { "name": "lore", "age": { "$gt": 3 } });
    }

    #[test]
    fn id_operator_key_targets_identifier_with_object_ids() {
        let hex = "507f1f77bcf86cd799439011";
        let spec = build(json!({ "where": { "user_id_in": hex } }));
        let oid = ObjectId::parse_str(hex).unwrap();
        assert_eq!(spec.filter, doc! { "_id": { "$in": [oid] } });
    }

    #[test]
    fn sanitizing_can_be_switched_off() {
        let t = Translator::new(TranslatorSettings {
            sanitize_values: false,
            ..Default::default()
        });
        let spec = t.build(&json!({ "where": { "day_gte": "2020-01-01" } }), None);
        assert_eq!(spec.filter, doc! { "day": { "$gte": "2020-01-01" } });
    }

    #[test]
    fn accessors_reflect_construction() {
        let t = Translator::new(TranslatorSettings {
            id_field: "uid".into(),
            ..Default::default()
        })
        .with_schema(Schema::backed(["name"]));
        assert_eq!(t.settings().id_field, "uid");
        assert_eq!(t.schema(), &Schema::backed(["name"]));
        assert_eq!(Translator::default().schema(), &Schema::SchemaLess);
    }

    #[test]
    fn malformed_where_yields_empty_filter() {
        assert_eq!(build(json!({ "where": [1, 2] })).filter, Document::new());
        assert_eq!(build(json!({ "where": null })).filter, Document::new());
        assert_eq!(build(json!(null)), FindSpec::default());
    }

    // ─────────────────────────────────────────────────────────────
    // sort / skip / limit
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn multi_sort_preserves_order() {
        let spec = build(json!({ "sort": ["field:desc", "age:asc"] }));
        let sort = spec.sort.unwrap();
        let keys: Vec<_> = sort.keys().cloned().collect();
        assert_eq!(keys, vec!["field", "age"]);
        assert_eq!(sort, doc! { "field": -1, "age": 1 });
    }

    #[test]
    fn single_sort_string() {
        let spec = build(json!({ "sort": "field:asc" }));
        assert_eq!(spec.sort, Some(doc! { "field": 1 }));
    }

    #[test]
    fn limit_minus_one_or_below_is_unset() {
        assert_eq!(build(json!({ "limit": -1 })).limit, None);
        assert_eq!(build(json!({ "limit": -5 })).limit, None);
        assert_eq!(build(json!({ "limit": 0 })).limit, Some(0));
        assert_eq!(build(json!({ "limit": 2 })).limit, Some(2));
    }

    #[test]
    fn negative_skip_is_unset() {
        assert_eq!(build(json!({ "skip": -1 })).skip, None);
        assert_eq!(build(json!({ "start": 4 })).skip, Some(4));
    }

    #[test]
    fn projection_is_forwarded() {
        let spec = Translator::default().build(&json!({}), Some(doc! { "age": 1 }));
        assert_eq!(spec.projection, Some(doc! { "age": 1 }));
    }

    // ─────────────────────────────────────────────────────────────
    // purity
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn translation_is_idempotent() {
        let request = json!({
            "field": 2,
            "where": { "name_matches": "lore ipsum", "age_in": [4, 5], "day_lt": "2020-01-01" },
            "sort": ["field:desc", "age:asc"],
            "limit": 2,
            "skip": 1
        });
        let t = Translator::default();
        assert_eq!(t.build(&request, None), t.build(&request, None));
    }

    // ─────────────────────────────────────────────────────────────
    // collaborator invocation
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn translate_calls_find_once_then_chains_modifiers() {
        let mut mock = MockCollection::new();
        mock.expect_find()
            .times(1)
            .with(eq(doc! { "age": { "$nin": [4, 5] } }), eq(Some(doc! { "age": 1 })))
            .returning(|filter, projection| FindSpec {
                filter,
                projection,
                ..Default::default()
            });

        let query = Translator::default().translate(
            &mock,
            &json!({ "where": { "age_nin": [4, 5] }, "sort": "age:asc", "limit": 2, "start": 1 }),
            Some(doc! { "age": 1 }),
        );

        assert_eq!(query.sort, Some(doc! { "age": 1 }));
        assert_eq!(query.skip, Some(1));
        assert_eq!(query.limit, Some(2));
    }

    #[test]
    fn translate_without_modifiers_leaves_them_unset() {
        let mut mock = MockCollection::new();
        mock.expect_find()
            .times(1)
            .returning(|filter, projection| FindSpec {
                filter,
                projection,
                ..Default::default()
            });

        let query = translate(&mock, Schema::SchemaLess, &json!({ "limit": -1 }), None);
        assert_eq!(query.sort, None);
        assert_eq!(query.skip, None);
        assert_eq!(query.limit, None);
    }
}
