// crates/translate/src/tokenizer.rs

use crate::operator::Operator;

/// A filter key split into its field and optional operator suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterKey {
    pub field: String,
    pub operator: Option<Operator>,
}

impl FilterKey {
    /// Plain equality on the literal key.
    pub fn equality(key: &str) -> Self {
        Self {
            field: key.to_string(),
            operator: None,
        }
    }
}

/// Split a `where` key into `(field, operator)`.
///
/// - no underscore → equality on the key.
/// - `<x>_id_<op>` (exactly three segments, middle `id`) → `<op>` on
///   `id_field`.
/// - otherwise the trailing segment is the operator candidate and everything
///   before the last underscore is the field, so `created_at_gte` is
///   `created_at` / `gte`.
///
/// A candidate that is not a registered token makes the whole key a literal
/// equality field. Consequently a field literally named `rating_in` can only
/// be reached through the `in` operator on `rating`.
pub fn tokenize(key: &str, id_field: &str) -> FilterKey {
    let Some((head, suffix)) = key.rsplit_once('_') else {
        return FilterKey::equality(key);
    };
    let Some(operator) = Operator::parse(suffix) else {
        return FilterKey::equality(key);
    };

    let field = if is_id_operator_key(key) { id_field } else { head };
    if field.is_empty() {
        return FilterKey::equality(key);
    }

    FilterKey {
        field: field.to_string(),
        operator: Some(operator),
    }
}

fn is_id_operator_key(key: &str) -> bool {
    let mut parts = key.split('_');
    matches!(
        (parts.next(), parts.next(), parts.next(), parts.next()),
        (Some(_), Some("id"), Some(op), None) if !op.is_empty()
    )
}
