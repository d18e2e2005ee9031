//! A statement sink that rewrites statements before forwarding them.

use crate::error::PolicyError;
use crate::statement::PolicyStatement;
use crate::traits::StatementSink;

type Mutator<'a> = Box<dyn Fn(PolicyStatement) -> Result<PolicyStatement, PolicyError> + 'a>;

/// Applies `mutator` to every statement added, then adds the result to the
/// wrapped sink.
pub struct MutatingPolicyDocumentAdapter<'a> {
    wrapped: &'a mut dyn StatementSink,
    mutator: Mutator<'a>,
}

impl<'a> MutatingPolicyDocumentAdapter<'a> {
    pub fn new<F>(wrapped: &'a mut dyn StatementSink, mutator: F) -> Self
    where
        F: Fn(PolicyStatement) -> Result<PolicyStatement, PolicyError> + 'a,
    {
        MutatingPolicyDocumentAdapter {
            wrapped,
            mutator: Box::new(mutator),
        }
    }
}

impl StatementSink for MutatingPolicyDocumentAdapter<'_> {
    fn add_statements(&mut self, statements: Vec<PolicyStatement>) -> Result<(), PolicyError> {
        for statement in statements {
            let statement = (self.mutator)(statement)?;
            self.wrapped.add_statements(vec![statement])?;
        }
        Ok(())
    }

    fn statement_count(&self) -> usize {
        self.wrapped.statement_count()
    }
}
