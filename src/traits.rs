use crate::error::PolicyError;
use crate::statement::PolicyStatement;

/// Anything statements can be added to, e.g. a `PolicyDocument` or an adapter
/// that rewrites statements on their way into one.
pub trait StatementSink {
    /// Append statements, in order.
    fn add_statements(&mut self, statements: Vec<PolicyStatement>) -> Result<(), PolicyError>;

    fn statement_count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.statement_count() == 0
    }
}
