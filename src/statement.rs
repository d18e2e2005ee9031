//! Policy statements.
//!
//! A [`PolicyStatement`] is built up through `add_*` calls and rendered either
//! as IAM policy JSON ([`PolicyStatement::to_statement_json`]) or in block
//! form ([`PolicyStatement::to_json`]). Once frozen it can no longer change.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::Deref;
use std::sync::Arc;

use indexmap::set::Slice;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::PolicyError;
use crate::token::is_unresolved;
use crate::types::{
    Condition, ConditionMap, Effect, OrderedSet, Principal, PrincipalJson,
    PrincipalPolicyFragment, PrincipalProps, ServicePrincipalOpts, StatementBlock,
    StatementJson, StringOrList, conditions_key, merge_principal, principal_json,
};

static ACTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*|[a-zA-Z0-9-]+:[a-zA-Z0-9*]+)$").expect("action pattern is valid")
});

/// Estimated length of an ARN that is not known until deploy time.
pub const DEFAULT_ARN_SIZE_ESTIMATE: usize = 150;
/// Estimated length of an action that is not known until deploy time.
pub const DEFAULT_ACTION_SIZE_ESTIMATE: usize = 20;

/// Properties for a new statement. Fields left as `None` are not set; for
/// [`PolicyStatement::copy`] they keep the original's value.
#[derive(Debug, Clone, Default)]
pub struct PolicyStatementProps {
    pub sid: Option<String>,
    pub effect: Option<Effect>,
    pub actions: Option<Vec<String>>,
    pub not_actions: Option<Vec<String>>,
    pub principals: Option<Vec<Principal>>,
    pub not_principals: Option<Vec<Principal>>,
    pub resources: Option<Vec<String>>,
    pub not_resources: Option<Vec<String>>,
    pub conditions: Option<Vec<Condition>>,
}

fn strings<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

impl PolicyStatementProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sid<T: Into<String>>(mut self, sid: T) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn actions<I: IntoIterator<Item = S>, S: Into<String>>(mut self, actions: I) -> Self {
        self.actions = Some(strings(actions));
        self
    }

    pub fn not_actions<I: IntoIterator<Item = S>, S: Into<String>>(mut self, actions: I) -> Self {
        self.not_actions = Some(strings(actions));
        self
    }

    pub fn principals<I: IntoIterator<Item = Principal>>(mut self, principals: I) -> Self {
        self.principals = Some(principals.into_iter().collect());
        self
    }

    pub fn not_principals<I: IntoIterator<Item = Principal>>(mut self, principals: I) -> Self {
        self.not_principals = Some(principals.into_iter().collect());
        self
    }

    pub fn resources<I: IntoIterator<Item = S>, S: Into<String>>(mut self, resources: I) -> Self {
        self.resources = Some(strings(resources));
        self
    }

    pub fn not_resources<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        resources: I,
    ) -> Self {
        self.not_resources = Some(strings(resources));
        self
    }

    pub fn conditions<I: IntoIterator<Item = Condition>>(mut self, conditions: I) -> Self {
        self.conditions = Some(conditions.into_iter().collect());
        self
    }
}

/// Estimates used by [`PolicyStatement::estimate_size`] for values that are
/// not known until deploy time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimateSizeOptions {
    pub arn_estimate: usize,
    pub action_estimate: usize,
}

impl Default for EstimateSizeOptions {
    fn default() -> Self {
        EstimateSizeOptions {
            arn_estimate: DEFAULT_ARN_SIZE_ESTIMATE,
            action_estimate: DEFAULT_ACTION_SIZE_ESTIMATE,
        }
    }
}

/// A statement in an IAM policy document.
#[derive(Debug, Clone, Default)]
pub struct PolicyStatement {
    sid: Option<String>,
    effect: Effect,
    actions: OrderedSet<String>,
    not_actions: OrderedSet<String>,
    principals: OrderedSet<Principal>,
    not_principals: OrderedSet<Principal>,
    // merged principal entries, one per principal type
    principal_props: Vec<PrincipalProps>,
    not_principal_props: Vec<PrincipalProps>,
    resources: OrderedSet<String>,
    not_resources: OrderedSet<String>,
    conditions: ConditionMap,
    principal_conditions: Option<Vec<Condition>>,
    frozen: bool,
}

impl Display for PolicyStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.sid {
            Some(sid) => write!(f, "PolicyStatement({sid})"),
            None => write!(f, "PolicyStatement"),
        }
    }
}

impl PolicyStatement {
    /// An empty statement with effect `Allow`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a statement from props. Fields are applied in the order actions,
    /// not-actions, principals, not-principals, resources, not-resources,
    /// conditions.
    pub fn from_props(props: PolicyStatementProps) -> Result<Self, PolicyError> {
        let mut statement = PolicyStatement {
            sid: props.sid,
            effect: props.effect.unwrap_or_default(),
            ..Default::default()
        };
        statement.add_actions(props.actions.unwrap_or_default())?;
        statement.add_not_actions(props.not_actions.unwrap_or_default())?;
        statement.add_principals(props.principals.unwrap_or_default())?;
        statement.add_not_principals(props.not_principals.unwrap_or_default())?;
        statement.add_resources(props.resources.unwrap_or_default())?;
        statement.add_not_resources(props.not_resources.unwrap_or_default())?;
        statement.add_conditions(props.conditions.unwrap_or_default())?;
        Ok(statement)
    }

    /// Parse a statement from IAM policy JSON and check that it has the shape
    /// every policy statement needs.
    pub fn from_json(json: &Value) -> Result<Self, PolicyError> {
        Self::from_statement_json(StatementJson::from_value(json)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, PolicyError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json(&value)
    }

    pub fn from_statement_json(json: StatementJson) -> Result<Self, PolicyError> {
        let as_principal = |principal: &PrincipalJson| {
            vec![Principal::Json(PrincipalPolicyFragment::from_principal_json(
                principal, None,
            ))]
        };

        let props = PolicyStatementProps {
            sid: json.sid,
            effect: Some(json.effect),
            actions: json.action.map(StringOrList::into_vec),
            not_actions: json.not_action.map(StringOrList::into_vec),
            principals: json.principal.as_ref().map(as_principal),
            not_principals: json.not_principal.as_ref().map(as_principal),
            resources: json.resource.map(StringOrList::into_vec),
            not_resources: json.not_resource.map(StringOrList::into_vec),
            conditions: json
                .condition
                .as_ref()
                .map(|c| ConditionMap::from_json(c).to_conditions()),
        };
        let statement = Self::from_props(props)?;

        let errors = statement.validate_for_any_policy();
        if !errors.is_empty() {
            return Err(PolicyError::IncorrectStatement(errors.join("\n")));
        }
        debug!(
            event = "Statement",
            phase = "Parsed",
            statement = statement.to_string(),
            actions = statement.actions.len(),
            principals = statement.principals.len()
        );
        Ok(statement)
    }

    fn assert_not_frozen(&self, method: &str) -> Result<(), PolicyError> {
        if self.frozen {
            warn!(
                event = "Statement",
                phase = "Frozen",
                statement = self.to_string(),
                method = method
            );
            return Err(PolicyError::frozen(method));
        }
        Ok(())
    }

    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    pub fn set_sid<T: Into<String>>(&mut self, sid: T) -> Result<(), PolicyError> {
        self.assert_not_frozen("set_sid")?;
        self.sid = Some(sid.into());
        Ok(())
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn set_effect(&mut self, effect: Effect) -> Result<(), PolicyError> {
        self.assert_not_frozen("set_effect")?;
        self.effect = effect;
        Ok(())
    }

    //
    // Actions
    //

    /// Add actions such as `s3:GetObject` or `sqs:*`.
    pub fn add_actions<I, S>(&mut self, actions: I) -> Result<(), PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assert_not_frozen("add_actions")?;
        let actions = strings(actions);
        if !actions.is_empty() && !self.not_actions.is_empty() {
            return Err(PolicyError::conflict("Actions", "NotActions"));
        }
        validate_actions(&actions)?;
        self.actions.push(actions);
        Ok(())
    }

    /// Add actions this statement applies to everything except.
    pub fn add_not_actions<I, S>(&mut self, not_actions: I) -> Result<(), PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assert_not_frozen("add_not_actions")?;
        let not_actions = strings(not_actions);
        if !not_actions.is_empty() && !self.actions.is_empty() {
            return Err(PolicyError::conflict("NotActions", "Actions"));
        }
        validate_actions(&not_actions)?;
        self.not_actions.push(not_actions);
        Ok(())
    }

    //
    // Principals
    //

    pub fn has_principal(&self) -> bool {
        !self.principals.is_empty() || !self.not_principals.is_empty()
    }

    pub fn add_principals<I: IntoIterator<Item = Principal>>(
        &mut self,
        principals: I,
    ) -> Result<(), PolicyError> {
        self.assert_not_frozen("add_principals")?;
        let principals: Vec<Principal> = principals.into_iter().collect();
        if !principals.is_empty() && !self.not_principals.is_empty() {
            return Err(PolicyError::conflict("Principals", "NotPrincipals"));
        }

        let mut set = self.principals.clone();
        let mut props = self.principal_props.clone();
        let added = set.push(principals);
        self.merge_principals(&added, &mut props)?;
        self.principals = set;
        self.principal_props = props;
        Ok(())
    }

    pub fn add_not_principals<I: IntoIterator<Item = Principal>>(
        &mut self,
        not_principals: I,
    ) -> Result<(), PolicyError> {
        self.assert_not_frozen("add_not_principals")?;
        let not_principals: Vec<Principal> = not_principals.into_iter().collect();
        if !not_principals.is_empty() && !self.principals.is_empty() {
            return Err(PolicyError::conflict("NotPrincipals", "Principals"));
        }

        let mut set = self.not_principals.clone();
        let mut props = self.not_principal_props.clone();
        let added = set.push(not_principals);
        self.merge_principals(&added, &mut props)?;
        self.not_principals = set;
        self.not_principal_props = props;
        Ok(())
    }

    /// Merge the fragments of newly added principals into `props`, and their
    /// conditions into this statement. Nothing is changed on error.
    fn merge_principals(
        &mut self,
        added: &[Principal],
        props: &mut Vec<PrincipalProps>,
    ) -> Result<(), PolicyError> {
        let mut principal_conditions = self.principal_conditions.clone();
        let mut conditions = self.conditions.clone();

        for principal in added {
            let fragment = principal.policy_fragment()?;
            merge_principal(props, &fragment.principals)?;

            match &principal_conditions {
                None => principal_conditions = Some(fragment.conditions.clone()),
                Some(existing) if *existing != fragment.conditions => {
                    warn!(
                        event = "Statement",
                        phase = "Principals",
                        principal = principal.to_string(),
                        "principal conditions differ from earlier principals"
                    );
                    return Err(PolicyError::PrincipalConditionConflict {
                        existing: conditions_key(existing),
                        incoming: conditions_key(&fragment.conditions),
                    });
                }
                Some(_) => {}
            }
            conditions.add_conditions(fragment.conditions);
        }

        debug!(
            event = "Statement",
            phase = "Principals",
            statement = self.to_string(),
            added = added.len(),
            types = props.len()
        );
        self.principal_conditions = principal_conditions;
        self.conditions = conditions;
        Ok(())
    }

    /// Add an AWS account root principal, e.g. `arn:aws:iam::123456789012:root`.
    pub fn add_aws_account_principal(&mut self, account_id: &str) -> Result<(), PolicyError> {
        self.add_principals([Principal::account(account_id)])
    }

    pub fn add_arn_principal(&mut self, arn: &str) -> Result<(), PolicyError> {
        self.add_principals([Principal::arn(arn)])
    }

    pub fn add_service_principal(
        &mut self,
        service: &str,
        opts: Option<ServicePrincipalOpts>,
    ) -> Result<(), PolicyError> {
        self.add_principals([Principal::service_with_opts(
            service,
            opts.unwrap_or_default(),
        )])
    }

    /// Add a federated identity provider such as `cognito-identity.amazonaws.com`.
    pub fn add_federated_principal<I: IntoIterator<Item = Condition>>(
        &mut self,
        federated: &str,
        conditions: I,
    ) -> Result<(), PolicyError> {
        self.add_principals([Principal::federated(federated, conditions)])
    }

    pub fn add_canonical_user_principal(
        &mut self,
        canonical_user_id: &str,
    ) -> Result<(), PolicyError> {
        self.add_principals([Principal::canonical_user(canonical_user_id)])
    }

    /// Add all identities in all accounts: `{"AWS": "*"}`.
    pub fn add_any_principal(&mut self) -> Result<(), PolicyError> {
        self.add_principals([Principal::Any])
    }

    //
    // Resources
    //

    pub fn add_resources<I, S>(&mut self, arns: I) -> Result<(), PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assert_not_frozen("add_resources")?;
        let arns = strings(arns);
        if !arns.is_empty() && !self.not_resources.is_empty() {
            return Err(PolicyError::conflict("Resources", "NotResources"));
        }
        self.resources.push(arns);
        Ok(())
    }

    pub fn add_not_resources<I, S>(&mut self, arns: I) -> Result<(), PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assert_not_frozen("add_not_resources")?;
        let arns = strings(arns);
        if !arns.is_empty() && !self.resources.is_empty() {
            return Err(PolicyError::conflict("NotResources", "Resources"));
        }
        self.not_resources.push(arns);
        Ok(())
    }

    /// Add the `"*"` resource.
    pub fn add_all_resources(&mut self) -> Result<(), PolicyError> {
        self.add_resources(["*"])
    }

    pub fn has_resource(&self) -> bool {
        !self.resources.is_empty()
    }

    //
    // Conditions
    //

    /// Add a condition. A later condition with the same test and variable
    /// replaces the earlier one's values; pass all accepted values in one
    /// condition to allow any of them.
    pub fn add_condition(&mut self, condition: Condition) -> Result<(), PolicyError> {
        self.add_conditions([condition])
    }

    pub fn add_conditions<I: IntoIterator<Item = Condition>>(
        &mut self,
        conditions: I,
    ) -> Result<(), PolicyError> {
        self.assert_not_frozen("add_condition")?;
        self.conditions.add_conditions(conditions);
        Ok(())
    }

    /// Add the conditions for one operator, given as `{ "context:key": value | [values] }`.
    pub fn add_condition_object(&mut self, key: &str, value: &Value) -> Result<(), PolicyError> {
        self.assert_not_frozen("add_condition")?;
        let conditions = ConditionMap::conditions_from_object(key, value)?;
        self.conditions.add_conditions(conditions);
        Ok(())
    }

    /// Add conditions for several operators, given as an IAM JSON `Condition` object.
    pub fn add_condition_objects(
        &mut self,
        conditions: &Map<String, Value>,
    ) -> Result<(), PolicyError> {
        self.assert_not_frozen("add_condition")?;
        let mut parsed = Vec::new();
        for (key, value) in conditions {
            parsed.extend(ConditionMap::conditions_from_object(key, value)?);
        }
        self.conditions.add_conditions(parsed);
        Ok(())
    }

    /// Limit the statement to the given external ids (`sts:ExternalId`).
    /// Replaces any earlier call.
    pub fn add_account_condition<I, S>(&mut self, account_ids: I) -> Result<(), PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_condition(Condition::new("StringEquals", "sts:ExternalId", strings(account_ids)))
    }

    /// Limit the statement to requests from the given accounts (`aws:SourceAccount`).
    /// Replaces any earlier call.
    pub fn add_source_account_condition<I, S>(&mut self, account_ids: I) -> Result<(), PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_condition(Condition::new(
            "StringEquals",
            "aws:SourceAccount",
            strings(account_ids),
        ))
    }

    /// Limit the statement to requests from the given resources (`aws:SourceArn`).
    /// Replaces any earlier call.
    pub fn add_source_arn_condition<I, S>(&mut self, arns: I) -> Result<(), PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_condition(Condition::new("ArnEquals", "aws:SourceArn", strings(arns)))
    }

    //
    // Accessors
    //

    pub fn actions(&self) -> Vec<String> {
        self.actions.copy()
    }

    pub fn not_actions(&self) -> Vec<String> {
        self.not_actions.copy()
    }

    pub fn principals(&self) -> Vec<Principal> {
        self.principals.copy()
    }

    pub fn not_principals(&self) -> Vec<Principal> {
        self.not_principals.copy()
    }

    pub fn resources(&self) -> Vec<String> {
        self.resources.copy()
    }

    pub fn not_resources(&self) -> Vec<String> {
        self.not_resources.copy()
    }

    pub fn conditions(&self) -> Vec<Condition> {
        self.conditions.to_conditions()
    }

    /// A new, unfrozen statement with this statement's fields, except those
    /// given in `overrides`, which replace the originals.
    pub fn copy(&self, overrides: PolicyStatementProps) -> Result<PolicyStatement, PolicyError> {
        PolicyStatement::from_props(PolicyStatementProps {
            sid: overrides.sid.or_else(|| self.sid.clone()),
            effect: overrides.effect.or(Some(self.effect)),
            actions: overrides.actions.or_else(|| Some(self.actions())),
            not_actions: overrides.not_actions.or_else(|| Some(self.not_actions())),
            principals: overrides.principals.or_else(|| Some(self.principals())),
            not_principals: overrides
                .not_principals
                .or_else(|| Some(self.not_principals())),
            resources: overrides.resources.or_else(|| Some(self.resources())),
            not_resources: overrides
                .not_resources
                .or_else(|| Some(self.not_resources())),
            conditions: overrides.conditions.or_else(|| Some(self.conditions())),
        })
    }

    //
    // Serialization
    //

    /// Render as IAM policy JSON. Empty fields are omitted and single-element
    /// lists are rendered as scalars.
    pub fn to_statement_json(&self) -> StatementJson {
        StatementJson {
            action: non_empty(self.actions.direct()),
            not_action: non_empty(self.not_actions.direct()),
            condition: (!self.conditions.is_empty()).then(|| self.conditions.to_json()),
            effect: self.effect,
            principal: (!self.principal_props.is_empty())
                .then(|| principal_json(&self.principal_props)),
            not_principal: (!self.not_principal_props.is_empty())
                .then(|| principal_json(&self.not_principal_props)),
            resource: non_empty(self.resources.direct()),
            not_resource: non_empty(self.not_resources.direct()),
            sid: self.sid.clone(),
        }
    }

    /// Render in block form, with principals as explicit typed entries.
    pub fn to_json(&self) -> StatementBlock {
        StatementBlock {
            sid: self.sid.clone(),
            actions: self.actions(),
            not_actions: self.not_actions(),
            principals: self.principal_props.clone(),
            not_principals: self.not_principal_props.clone(),
            resources: self.resources(),
            not_resources: self.not_resources(),
            condition: self.conditions(),
            effect: self.effect,
        }
    }

    //
    // Validation
    //

    /// Problems that make this statement invalid in any policy.
    pub fn validate_for_any_policy(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.actions.is_empty() && self.not_actions.is_empty() {
            errors.push(
                "A PolicyStatement must specify at least one 'action' or 'notAction'.".to_string(),
            );
        }
        errors
    }

    /// Problems that make this statement invalid in a resource-based policy.
    pub fn validate_for_resource_policy(&self) -> Vec<String> {
        let mut errors = self.validate_for_any_policy();
        if self.principals.is_empty() && self.not_principals.is_empty() {
            errors.push(
                "A PolicyStatement used in a resource-based policy must specify at least one IAM principal."
                    .to_string(),
            );
        }
        errors
    }

    /// Problems that make this statement invalid in an identity-based policy.
    pub fn validate_for_identity_policy(&self) -> Vec<String> {
        let mut errors = self.validate_for_any_policy();
        if !self.principals.is_empty() || !self.not_principals.is_empty() {
            errors.push(
                "A PolicyStatement used in an identity-based policy cannot specify any IAM principals."
                    .to_string(),
            );
        }
        if self.resources.is_empty() && self.not_resources.is_empty() {
            errors.push(
                "A PolicyStatement used in an identity-based policy must specify at least one resource."
                    .to_string(),
            );
        }
        errors
    }

    //
    // Lifecycle
    //

    /// Make the statement immutable. Every later `add_*` or setter call fails.
    /// Calling this more than once has no further effect.
    pub fn freeze(&mut self) -> &Self {
        if !self.frozen {
            debug!(event = "Statement", phase = "Frozen", statement = self.to_string());
        }
        self.frozen = true;
        self
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Freeze the statement and hand it over as a shareable read-only value.
    pub fn into_frozen(mut self) -> FrozenPolicyStatement {
        self.freeze();
        FrozenPolicyStatement(Arc::new(self))
    }

    /// Overestimate the length of this statement's JSON, counting values that
    /// are unresolved at this point with the given estimates.
    pub fn estimate_size(&self, options: EstimateSizeOptions) -> usize {
        fn count(key: &str, values: &Slice<String>, token_size: usize) -> usize {
            if values.is_empty() {
                return 0;
            }
            // quotes, colon and brackets around the key, quotes and a separator per value
            key.len()
                + 5
                + values
                    .iter()
                    .map(|v| (if is_unresolved(v) { token_size } else { v.len() }) + 3)
                    .sum::<usize>()
        }

        // an empty condition block still counts as `{}`
        let conditions = serde_json::to_string(&self.conditions.to_json())
            .map(|json| json.len())
            .unwrap_or_default();

        format!(r#""Effect": "{}","#, self.effect).len()
            + count("Action", self.actions.direct(), options.action_estimate)
            + count("NotAction", self.not_actions.direct(), options.action_estimate)
            + count("Resource", self.resources.direct(), options.arn_estimate)
            + count("NotResource", self.not_resources.direct(), options.arn_estimate)
            + (self.principals.len() + self.not_principals.len()) * options.arn_estimate
            + conditions
    }
}

/// A frozen statement. Cheap to clone and safe to share between threads;
/// it only exposes read access.
#[derive(Debug, Clone)]
pub struct FrozenPolicyStatement(Arc<PolicyStatement>);

impl Deref for FrozenPolicyStatement {
    type Target = PolicyStatement;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FrozenPolicyStatement {
    /// A new, unfrozen statement with the same fields.
    pub fn thaw(&self) -> Result<PolicyStatement, PolicyError> {
        self.0.copy(PolicyStatementProps::default())
    }
}

fn non_empty(values: &Slice<String>) -> Option<StringOrList> {
    if values.is_empty() {
        None
    } else {
        Some(StringOrList::new(values.iter().cloned().collect()))
    }
}

fn validate_actions(actions: &[String]) -> Result<(), PolicyError> {
    match actions
        .iter()
        .find(|a| !is_unresolved(a) && !ACTION_PATTERN.is_match(a))
    {
        Some(invalid) => Err(PolicyError::InvalidAction(invalid.clone())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests;
