// crates/translate/src/allowlist.rs

use crate::settings::TranslatorSettings;
use bson::Document;
use std::collections::BTreeSet;
use tracing::debug;

/// What the caller knows about the target collection's fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Schema {
    /// Declared field names; anything else is stripped from equality keys.
    SchemaBacked { fields: BTreeSet<String> },
    /// No declared schema; the allow-list is a no-op.
    #[default]
    SchemaLess,
}

impl Schema {
    pub fn backed<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Schema::SchemaBacked {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_backed(&self) -> bool {
        matches!(self, Schema::SchemaBacked { .. })
    }
}

/// Drop equality keys the schema does not declare.
///
/// Compound keys (leading marker, e.g. `$or`) and the identifier field always
/// survive. Operator fragments never pass through here.
pub fn filter_fields(params: Document, schema: &Schema, settings: &TranslatorSettings) -> Document {
    let Schema::SchemaBacked { fields } = schema else {
        return params;
    };

    params
        .into_iter()
        .filter(|(key, _)| {
            let keep = settings.is_compound(key) || key == &settings.id_field || fields.contains(key);
            if !keep {
                debug!(key = %key, "dropping undeclared filter field");
            }
            keep
        })
        .collect()
}
