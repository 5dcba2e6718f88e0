//! REST filter → document query translation.
//!
//! A flat request such as
//!
//! ```json
//! { "where": { "age_gte": 4, "name_contains": "lore" }, "sort": "age:asc", "limit": 2 }
//! ```
//!
//! becomes a BSON filter plus sort/skip/limit modifiers, handed to any
//! [`Collection`] as a lazy query.

pub mod allowlist;
pub mod assemble;
pub mod collection;
pub mod error;
pub mod operator;
pub mod request;
pub mod sanitize;
pub mod settings;
pub mod tokenizer;

pub use allowlist::Schema;
pub use assemble::{translate, FindSpec, Translator};
pub use collection::{Collection, QueryHandle};
pub use error::{Error, Result};
pub use operator::{Operator, OperatorFn};
pub use request::{FilterRequest, SortDirection, SortKey};
pub use sanitize::Sanitizer;
pub use settings::TranslatorSettings;
pub use tokenizer::{tokenize, FilterKey};
