//! Principals that wrap another principal: extra conditions and session tags.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde_json::{Map, Value};
use tracing::debug;

use crate::adapter::MutatingPolicyDocumentAdapter;
use crate::error::PolicyError;
use crate::traits::StatementSink;

use super::condition::{Condition, ConditionMap, identity_key};
use super::fragment::PrincipalPolicyFragment;
use super::principal::Principal;

pub const TAG_SESSION: &str = "sts:TagSession";

/// A principal with additional conditions specifying when the policy is in effect.
#[derive(Debug, Clone)]
pub struct PrincipalWithConditions {
    wrapped: Box<Principal>,
    additional: ConditionMap,
}

impl Display for PrincipalWithConditions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.wrapped)
    }
}

impl PrincipalWithConditions {
    pub fn new<I: IntoIterator<Item = Condition>>(principal: Principal, conditions: I) -> Self {
        PrincipalWithConditions {
            wrapped: Box::new(principal),
            additional: ConditionMap::from_conditions(conditions),
        }
    }

    pub fn wrapped(&self) -> &Principal {
        &self.wrapped
    }

    /// Add a condition. A condition for an existing (test, variable) pair
    /// replaces the earlier values.
    pub fn add_condition(&mut self, condition: Condition) {
        self.additional.add_condition(condition);
    }

    pub fn add_conditions<I: IntoIterator<Item = Condition>>(&mut self, conditions: I) {
        self.additional.add_conditions(conditions);
    }

    /// Add the conditions for one operator, given as `{ "context:key": value | [values] }`.
    pub fn add_condition_object(&mut self, key: &str, value: &Value) -> Result<(), PolicyError> {
        let conditions = ConditionMap::conditions_from_object(key, value)?;
        self.additional.add_conditions(conditions);
        Ok(())
    }

    /// Add conditions for several operators, given as an IAM JSON `Condition` object.
    pub fn add_condition_objects(
        &mut self,
        conditions: &Map<String, Value>,
    ) -> Result<(), PolicyError> {
        let mut parsed = Vec::new();
        for (key, value) in conditions {
            parsed.extend(ConditionMap::conditions_from_object(key, value)?);
        }
        self.additional.add_conditions(parsed);
        Ok(())
    }

    /// The wrapped principal's conditions, overlaid with this principal's own.
    pub fn conditions(&self) -> Result<Vec<Condition>, PolicyError> {
        let mut merged = ConditionMap::from_conditions(self.wrapped.policy_fragment()?.conditions);
        merged.add_conditions(self.additional.iter().cloned());
        Ok(merged.to_conditions())
    }

    pub fn assume_role_action(&self) -> &str {
        self.wrapped.assume_role_action()
    }

    pub fn policy_fragment(&self) -> Result<PrincipalPolicyFragment, PolicyError> {
        Ok(PrincipalPolicyFragment::new(
            self.wrapped.policy_fragment()?.principals,
            self.conditions()?,
        ))
    }

    /// Add the wrapped principal's assume-role statements, each carrying this
    /// principal's conditions.
    pub fn add_to_assume_role_policy(
        &self,
        doc: &mut dyn StatementSink,
    ) -> Result<(), PolicyError> {
        let action = self.assume_role_action().to_string();
        let conditions = self.conditions()?;
        debug!(
            event = "AssumeRole",
            phase = "WithConditions",
            principal = self.to_string(),
            conditions = conditions.len()
        );
        let mut adapter = MutatingPolicyDocumentAdapter::new(doc, move |mut statement| {
            statement.add_actions([action.clone()])?;
            statement.add_conditions(conditions.clone())?;
            Ok(statement)
        });
        self.wrapped.add_to_assume_role_policy(&mut adapter)
    }

    pub(crate) fn dedupe_string(&self) -> String {
        format!(
            "PrincipalWithConditions:{}",
            identity_key(&(self.wrapped.dedupe_string(), self.additional.to_conditions()))
        )
    }
}

/// A principal whose role assumptions may pass session tags.
#[derive(Debug, Clone)]
pub struct SessionTagsPrincipal {
    wrapped: Box<Principal>,
}

impl Display for SessionTagsPrincipal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "SessionTagsPrincipal({})", self.wrapped)
    }
}

impl SessionTagsPrincipal {
    pub fn new(principal: Principal) -> Self {
        SessionTagsPrincipal {
            wrapped: Box::new(principal),
        }
    }

    pub fn wrapped(&self) -> &Principal {
        &self.wrapped
    }

    pub fn assume_role_action(&self) -> &str {
        self.wrapped.assume_role_action()
    }

    pub fn policy_fragment(&self) -> Result<PrincipalPolicyFragment, PolicyError> {
        self.wrapped.policy_fragment()
    }

    /// Add the wrapped principal's assume-role statements with `sts:TagSession` added.
    pub fn add_to_assume_role_policy(
        &self,
        doc: &mut dyn StatementSink,
    ) -> Result<(), PolicyError> {
        debug!(
            event = "AssumeRole",
            phase = "SessionTags",
            principal = self.to_string()
        );
        let mut adapter = MutatingPolicyDocumentAdapter::new(doc, |mut statement| {
            statement.add_actions([TAG_SESSION])?;
            Ok(statement)
        });
        self.wrapped.add_to_assume_role_policy(&mut adapter)
    }

    pub(crate) fn dedupe_string(&self) -> String {
        format!("SessionTagsPrincipal:{}:", self.wrapped.dedupe_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn org_account() -> Principal {
        Principal::account("123456789012").with_conditions([Condition::new(
            "StringEquals",
            "aws:PrincipalOrgID",
            ["o-1234"],
        )])
    }

    #[test]
    fn test_own_conditions_overlay_wrapped() {
        let base = Principal::federated(
            "graph.facebook.com",
            [
                Condition::new("StringEquals", "graph.facebook.com:app_id", ["1"]),
                Condition::new("StringLike", "graph.facebook.com:id", ["2"]),
            ],
        );
        let mut principal = PrincipalWithConditions::new(
            base,
            [Condition::new("StringEquals", "graph.facebook.com:app_id", ["3"])],
        );
        principal.add_condition(Condition::new(
            "NumericLessThan",
            "aws:MultiFactorAuthAge",
            ["3600"],
        ));
        assert_eq!(
            principal.conditions().unwrap(),
            vec![
                Condition::new("StringEquals", "graph.facebook.com:app_id", ["3"]),
                Condition::new("StringLike", "graph.facebook.com:id", ["2"]),
                Condition::new("NumericLessThan", "aws:MultiFactorAuthAge", ["3600"]),
            ]
        );
    }

    #[test]
    fn test_add_condition_objects() {
        let mut principal = PrincipalWithConditions::new(Principal::arn("arn:a"), []);
        let objects = json!({
            "StringEquals": { "aws:SourceAccount": "123" },
            "ArnLike": { "aws:SourceArn": ["arn:x", "arn:y"] }
        });
        principal
            .add_condition_objects(objects.as_object().unwrap())
            .unwrap();
        assert_eq!(
            principal.conditions().unwrap(),
            vec![
                Condition::new("StringEquals", "aws:SourceAccount", ["123"]),
                Condition::new("ArnLike", "aws:SourceArn", ["arn:x", "arn:y"]),
            ]
        );
    }

    #[test]
    fn test_add_condition_objects_is_atomic() {
        let mut principal = PrincipalWithConditions::new(Principal::arn("arn:a"), []);
        let objects = json!({
            "StringEquals": { "aws:SourceAccount": "123" },
            "ArnLike": "arn:x"
        });
        assert!(principal.add_condition_objects(objects.as_object().unwrap()).is_err());
        assert!(principal.conditions().unwrap().is_empty());
    }

    #[test]
    fn test_display_and_action_follow_wrapped() {
        let principal = org_account();
        assert_eq!(principal.to_string(), "AccountPrincipal(123456789012)");
        assert_eq!(principal.assume_role_action(), "sts:AssumeRole");
        assert_eq!(principal.principal_account(), Some("123456789012"));
    }

    #[test]
    fn test_session_tags_keep_fragment() {
        let inner = Principal::web_identity("cognito-identity.amazonaws.com", []);
        let tagged = SessionTagsPrincipal::new(inner.clone());
        assert_eq!(
            tagged.policy_fragment().unwrap(),
            inner.policy_fragment().unwrap()
        );
        assert_eq!(tagged.assume_role_action(), "sts:AssumeRoleWithWebIdentity");
    }
}
