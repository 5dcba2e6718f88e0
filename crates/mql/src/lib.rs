//! In-memory document collection that executes assembled query documents.
//!
//! Implements the `translate` execution port so translated REST filters can
//! run without a database server.

pub mod ast;
pub mod error;
pub mod eval;
pub mod index;
pub mod parser;
pub mod store;

pub use ast::{CmpOp, FieldExpr, Filter, FindOptions, Projection, TextSearch};
pub use error::QueryError;
pub use eval::eval_filter;
pub use index::TextIndex;
pub use parser::{parse_filter, parse_projection, parse_sort};
pub use store::{MemCollection, MemCursor};
