// src/lib.rs
pub use adapter::MutatingPolicyDocumentAdapter;
pub use document::PolicyDocument;
pub use error::PolicyError;
pub use statement::{
    DEFAULT_ACTION_SIZE_ESTIMATE, DEFAULT_ARN_SIZE_ESTIMATE, EstimateSizeOptions,
    FrozenPolicyStatement, PolicyStatement, PolicyStatementProps,
};
pub use token::is_unresolved;
pub use traits::StatementSink;
pub use types::*;

mod adapter;
mod document;
mod error;
mod statement;
mod token;
mod traits;
pub mod types;

#[cfg(test)]
mod tests;
