//! Policy documents: ordered lists of statements.

use serde_json::Value;
use tracing::debug;

use crate::error::PolicyError;
use crate::statement::PolicyStatement;
use crate::traits::StatementSink;
use crate::types::{DocumentBlock, DocumentJson, POLICY_VERSION};

/// An IAM policy document. Statements are kept in the order they were added;
/// no deduplication or merging happens across statements.
#[derive(Debug, Clone, Default)]
pub struct PolicyDocument {
    statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_statements<I: IntoIterator<Item = PolicyStatement>>(statements: I) -> Self {
        PolicyDocument {
            statements: statements.into_iter().collect(),
        }
    }

    /// Parse a document from IAM policy JSON. A missing `Statement` yields an
    /// empty document; every statement must pass
    /// [`PolicyStatement::validate_for_any_policy`].
    pub fn from_json(json: &Value) -> Result<Self, PolicyError> {
        let statements = match json.get("Statement") {
            None | Some(Value::Null) => return Ok(PolicyDocument::new()),
            Some(Value::Array(statements)) => statements,
            Some(_) => {
                return Err(PolicyError::InvalidFormat(
                    "Statement must be an array".to_string(),
                ));
            }
        };

        let statements = statements
            .iter()
            .map(PolicyStatement::from_json)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            event = "Document",
            phase = "Parsed",
            statements = statements.len()
        );
        Ok(PolicyDocument::from_statements(statements))
    }

    pub fn from_json_str(json: &str) -> Result<Self, PolicyError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json(&value)
    }

    pub fn statements(&self) -> &[PolicyStatement] {
        &self.statements
    }

    pub fn add_statements<I: IntoIterator<Item = PolicyStatement>>(&mut self, statements: I) {
        let before = self.statements.len();
        self.statements.extend(statements);
        debug!(
            event = "Document",
            phase = "Statements",
            added = self.statements.len() - before,
            total = self.statements.len()
        );
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    pub fn validate_for_any_policy(&self) -> Vec<String> {
        self.collect_errors("Any", PolicyStatement::validate_for_any_policy)
    }

    pub fn validate_for_resource_policy(&self) -> Vec<String> {
        self.collect_errors("Resource", PolicyStatement::validate_for_resource_policy)
    }

    pub fn validate_for_identity_policy(&self) -> Vec<String> {
        self.collect_errors("Identity", PolicyStatement::validate_for_identity_policy)
    }

    fn collect_errors(
        &self,
        kind: &str,
        validate: fn(&PolicyStatement) -> Vec<String>,
    ) -> Vec<String> {
        let errors: Vec<String> = self.statements.iter().flat_map(validate).collect();
        if !errors.is_empty() {
            debug!(
                event = "Document",
                phase = "Validation",
                policy = kind,
                errors = errors.len()
            );
        }
        errors
    }

    /// Render as IAM policy JSON, or `None` if the document has no statements.
    pub fn to_document_json(&self) -> Option<DocumentJson> {
        if self.is_empty() {
            return None;
        }
        Some(DocumentJson {
            statement: self
                .statements
                .iter()
                .map(PolicyStatement::to_statement_json)
                .collect(),
            version: POLICY_VERSION.to_string(),
        })
    }

    /// Render in block form.
    pub fn to_json(&self) -> DocumentBlock {
        DocumentBlock {
            statement: self.statements.iter().map(PolicyStatement::to_json).collect(),
        }
    }
}

impl StatementSink for PolicyDocument {
    fn add_statements(&mut self, statements: Vec<PolicyStatement>) -> Result<(), PolicyError> {
        PolicyDocument::add_statements(self, statements);
        Ok(())
    }

    fn statement_count(&self) -> usize {
        self.statements.len()
    }
}
