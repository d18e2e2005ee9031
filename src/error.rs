use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolicyError {
    #[error(
        "{method}: freeze() has been called on this PolicyStatement previously, so it can no longer be modified"
    )]
    Frozen { method: String },

    #[error("Cannot add '{field}' to policy statement if '{other}' have been added")]
    FieldConflict { field: String, other: String },

    #[error(
        "Action '{0}' is invalid. An action string consists of a service namespace, a colon, and the name of an action. Action names can include wildcards."
    )]
    InvalidAction(String),

    #[error(
        "Cannot merge principals {target} and {merged}; if one uses a the StarPrincipal string the other one must be empty"
    )]
    StarPrincipalConflict { target: String, merged: String },

    #[error(
        "All principals in a PolicyStatement must have the same Conditions (got '{existing}' and '{incoming}'). Use multiple statements instead."
    )]
    PrincipalConditionConflict { existing: String, incoming: String },

    #[error(
        "Components of a CompositePrincipal must not have conditions. Tried to add the following fragment: {0}"
    )]
    CompositeConditions(String),

    #[error("CompositePrincipals must be constructed with at least 1 Principal but none were passed.")]
    EmptyComposite,

    #[error("Invalid principal type: {0}")]
    InvalidPrincipalType(String),

    #[error("{0}")]
    InvalidCondition(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Incorrect Policy Statement: {0}")]
    IncorrectStatement(String),

    #[error("failed to parse policy: {0}")]
    ParseError(String),
}

impl PolicyError {
    pub(crate) fn frozen(method: &str) -> Self {
        PolicyError::Frozen {
            method: method.to_string(),
        }
    }

    pub(crate) fn conflict(field: &str, other: &str) -> Self {
        PolicyError::FieldConflict {
            field: field.to_string(),
            other: other.to_string(),
        }
    }
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        PolicyError::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        frozen = { PolicyError::frozen("add_actions"), "add_actions: freeze() has been called on this PolicyStatement previously, so it can no longer be modified" },
        conflict = { PolicyError::conflict("Actions", "NotActions"), "Cannot add 'Actions' to policy statement if 'NotActions' have been added" },
        empty_composite = { PolicyError::EmptyComposite, "CompositePrincipals must be constructed with at least 1 Principal but none were passed." },
        principal_type = { PolicyError::InvalidPrincipalType("foo".to_string()), "Invalid principal type: foo" },
    )]
    fn test_error_messages(err: PolicyError, expected: &str) {
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PolicyError = err.into();
        assert!(matches!(err, PolicyError::ParseError(_)));
        assert!(err.to_string().starts_with("failed to parse policy: "));
    }
}
