#![allow(dead_code)]

use bson::{doc, Bson, Document};
use mql::{MemCollection, MemCursor};
use serde_json::Value as Json;
use tracing_subscriber::EnvFilter;
use translate::{Schema, Translator};

pub const DESC_LORE: &str = "Cum sociis natoque penatibus et magnis dis parturient montes, nascetur ridiculus mus. Donec quam felis, ultricies nec, pellentesque eu, pretium quis, sem. Nulla consequat massa quis enim. Donec pede justo, fringilla vel, aliquet nec, vulputate eget, arcu. In enim justo, rhoncus ut, imperdiet a, venenatis vitae, justo. Nullam dictum felis eu pede mollis pretium. Integer tincidunt. Cras dapibus. Vivamus elementum semper nisi. Aenean vulputate eleifend tellus. Aenean leo ligula, porttitor eu, consequat vitae, eleifend ac, enim. Aliquam lorem ante, dapibus in, viverra quis, feugiat a, tellus. Phasellus viverra nulla ut metus varius laoreet.";

pub const DESC_IPSUM: &str = "Quisque rutrum. Aenean imperdiet. Etiam ultricies nisi vel augue. Curabitur ullamcorper ultricies nisi. Nam eget dui. Etiam rhoncus. Maecenas tempus, tellus eget condimentum rhoncus, sem quam semper libero, sit amet adipiscing sem neque sed ipsum. Nam quam nunc, blandit vel, luctus pulvinar, hendrerit id, lorem. Maecenas nec odio et ante tincidunt tempus.";

pub const DESC_LORE_UPPER: &str = " Donec vitae sapien aenean ut libero venenatis faucibus. Nullam quis ante. Etiam sit amet orci eget eros faucibus tincidunt. Duis leo.";

/// Route `tracing` output through the test harness; `RUST_LOG` selects levels.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn docs() -> Vec<Document> {
    vec![
        doc! { "field": 1, "name": "lore", "age": 4, "description": DESC_LORE },
        doc! { "field": 2, "name": "ipsum", "age": 5, "description": DESC_IPSUM },
        doc! { "field": 3, "name": "Lore", "age": 6, "description": DESC_LORE_UPPER },
    ]
}

pub fn docs_multi_sort() -> Vec<Document> {
    vec![
        doc! { "field": 1, "name": "lore", "age": 4, "description": DESC_LORE },
        doc! { "field": 1, "name": "ipsum", "age": 5, "description": DESC_IPSUM },
        doc! { "field": 1, "name": "Lore", "age": 6, "description": DESC_LORE_UPPER },
        doc! { "field": 2, "name": "Lore", "age": 6, "description": DESC_LORE_UPPER },
    ]
}

/// The three fixture documents with a text index on `description`.
pub fn test_collection() -> MemCollection {
    init_tracing();
    let mut collection = MemCollection::with_documents(docs());
    collection.create_text_index(["description"]);
    collection
}

pub fn multi_sort_collection() -> MemCollection {
    init_tracing();
    MemCollection::with_documents(docs_multi_sort())
}

/// Translate `request` schema-less and execute it.
pub fn run(collection: &MemCollection, request: Json) -> Vec<Document> {
    run_with(collection, Schema::SchemaLess, request, None)
}

pub fn run_with(
    collection: &MemCollection,
    schema: Schema,
    request: Json,
    projection: Option<Document>,
) -> Vec<Document> {
    cursor(collection, schema, request, projection)
        .to_vec()
        .expect("query failed")
}

pub fn cursor(
    collection: &MemCollection,
    schema: Schema,
    request: Json,
    projection: Option<Document>,
) -> MemCursor {
    Translator::default()
        .with_schema(schema)
        .translate(collection, &request, projection)
}

pub fn int(doc: &Document, key: &str) -> i32 {
    doc.get_i32(key)
        .unwrap_or_else(|e| panic!("{key} is not an i32 in {doc}: {e}"))
}

pub fn text<'a>(doc: &'a Document, key: &str) -> &'a str {
    doc.get_str(key)
        .unwrap_or_else(|e| panic!("{key} is not a string in {doc}: {e}"))
}

pub fn ints(docs: &[Document], key: &str) -> Vec<i32> {
    docs.iter().map(|d| int(d, key)).collect()
}

pub fn names(docs: &[Document]) -> Vec<&str> {
    docs.iter().map(|d| text(d, "name")).collect()
}

pub fn id_hex(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        other => panic!("expected ObjectId, got {other}"),
    }
}
