// crates/translate/src/settings.rs

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_ID_FIELD: &str = "_id";
pub const DEFAULT_COMPOUND_MARKER: char = '$';

/// Knobs for [`crate::Translator`].
///
/// ```toml
/// id_field = "_id"
/// sanitize_values = true
/// compound_marker = "$"
/// ```
///
/// Every key is optional; missing keys take the defaults above.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TranslatorSettings {
    /// Identifier column that `<x>_id_<op>` keys are rewritten to.
    pub id_field: String,

    /// Coerce hex identifiers and date strings before range and membership
    /// comparisons. Off means raw JSON values reach the query untouched.
    pub sanitize_values: bool,

    /// Leading character of native compound keys such as `$or`.
    pub compound_marker: char,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
            sanitize_values: true,
            compound_marker: DEFAULT_COMPOUND_MARKER,
        }
    }
}

impl TranslatorSettings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        Self::from_toml_str(&text)
    }

    /// True when `key` is a native compound key that bypasses the allow-list.
    pub fn is_compound(&self, key: &str) -> bool {
        key.starts_with(self.compound_marker)
    }
}
