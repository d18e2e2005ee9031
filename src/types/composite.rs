//! Several principals rendered into a single statement.

use std::fmt::{Display, Formatter, Result as FmtResult};

use itertools::Itertools;
use tracing::debug;

use crate::error::PolicyError;
use crate::traits::StatementSink;

use super::condition::identity_key;
use super::fragment::{PrincipalPolicyFragment, merge_principal};
use super::principal::Principal;

/// A principal made up of other principals.
///
/// The members' principal entries are merged per principal type. Members must
/// not carry conditions when rendered as one fragment, since a single
/// statement cannot express different conditions for different principals.
#[derive(Debug, Clone)]
pub struct CompositePrincipal {
    principals: Vec<Principal>,
    assume_role_action: String,
}

impl Display for CompositePrincipal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "CompositePrincipal({})", self.principals.iter().join(", "))
    }
}

impl CompositePrincipal {
    /// Create a composite of at least one principal. The composite assumes
    /// roles with the first member's assume-role action.
    pub fn new<I: IntoIterator<Item = Principal>>(principals: I) -> Result<Self, PolicyError> {
        let principals: Vec<Principal> = principals.into_iter().collect();
        let assume_role_action = principals
            .first()
            .ok_or(PolicyError::EmptyComposite)?
            .assume_role_action()
            .to_string();
        Ok(CompositePrincipal {
            principals,
            assume_role_action,
        })
    }

    pub fn add_principals<I: IntoIterator<Item = Principal>>(
        &mut self,
        principals: I,
    ) -> &mut Self {
        self.principals.extend(principals);
        self
    }

    pub fn principals(&self) -> &[Principal] {
        &self.principals
    }

    pub fn assume_role_action(&self) -> &str {
        &self.assume_role_action
    }

    pub fn policy_fragment(&self) -> Result<PrincipalPolicyFragment, PolicyError> {
        let fragments = self
            .principals
            .iter()
            .map(Principal::policy_fragment)
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(conditioned) = fragments.iter().find(|f| !f.conditions.is_empty()) {
            return Err(PolicyError::CompositeConditions(conditioned.to_string()));
        }

        let mut principals = Vec::new();
        for fragment in &fragments {
            merge_principal(&mut principals, &fragment.principals)?;
        }
        Ok(PrincipalPolicyFragment::new(principals, Vec::new()))
    }

    /// Each member adds its own statement, with its own action and conditions.
    pub fn add_to_assume_role_policy(
        &self,
        doc: &mut dyn StatementSink,
    ) -> Result<(), PolicyError> {
        debug!(
            event = "AssumeRole",
            phase = "Composite",
            members = self.principals.len()
        );
        for principal in &self.principals {
            principal.add_to_assume_role_policy(doc)?;
        }
        Ok(())
    }

    pub(crate) fn dedupe_string(&self) -> String {
        let members: Vec<String> = self.principals.iter().map(Principal::dedupe_string).collect();
        format!("CompositePrincipal:{}", identity_key(&members))
    }
}
