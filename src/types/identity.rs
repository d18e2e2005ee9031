//! Principals named by an identifier: ARNs, accounts, canonical users and
//! organizations.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::fragment::{PrincipalPolicyFragment, PrincipalProps};
use super::principal::Principal;
use super::principal_type::PrincipalType;

pub(crate) const PRINCIPAL_ORG_ID: &str = "aws:PrincipalOrgID";
const DEFAULT_PARTITION: &str = "aws";

fn org_condition(org_id: &str) -> Condition {
    Condition::new("StringEquals", PRINCIPAL_ORG_ID, [org_id])
}

/// A principal given by ARN, e.g. an IAM user or role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ArnPrincipal {
    arn: String,
}

impl Display for ArnPrincipal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "ArnPrincipal({})", self.arn)
    }
}

impl ArnPrincipal {
    pub fn new<T: Into<String>>(arn: T) -> Self {
        ArnPrincipal { arn: arn.into() }
    }

    pub fn arn(&self) -> &str {
        &self.arn
    }

    pub fn policy_fragment(&self) -> PrincipalPolicyFragment {
        PrincipalPolicyFragment::new(
            vec![PrincipalProps::new(PrincipalType::Aws, [self.arn.as_str()])],
            Vec::new(),
        )
    }

    pub(crate) fn dedupe_string(&self) -> String {
        format!("ArnPrincipal:{}", self.arn)
    }

    /// This principal, restricted to members of the given organization.
    pub fn in_organization(&self, org_id: &str) -> Principal {
        Principal::Arn(self.clone()).with_conditions([org_condition(org_id)])
    }
}

/// The root of an AWS account, rendered as `arn:{partition}:iam::{account}:root`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AccountPrincipal {
    account_id: String,
    partition: String,
}

impl Display for AccountPrincipal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "AccountPrincipal({})", self.account_id)
    }
}

impl AccountPrincipal {
    pub fn new<T: Into<String>>(account_id: T) -> Self {
        AccountPrincipal {
            account_id: account_id.into(),
            partition: DEFAULT_PARTITION.to_string(),
        }
    }

    /// Use a partition other than `aws`, e.g. `aws-cn` or `aws-us-gov`.
    pub fn with_partition<T: Into<String>>(mut self, partition: T) -> Self {
        self.partition = partition.into();
        self
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn arn(&self) -> String {
        format!("arn:{}:iam::{}:root", self.partition, self.account_id)
    }

    pub fn policy_fragment(&self) -> PrincipalPolicyFragment {
        ArnPrincipal::new(self.arn()).policy_fragment()
    }

    pub(crate) fn dedupe_string(&self) -> String {
        format!("ArnPrincipal:{}", self.arn())
    }

    /// This account, restricted to members of the given organization.
    pub fn in_organization(&self, org_id: &str) -> Principal {
        Principal::Account(self.clone()).with_conditions([org_condition(org_id)])
    }
}

/// An S3 canonical user id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CanonicalUserPrincipal {
    canonical_user_id: String,
}

impl Display for CanonicalUserPrincipal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "CanonicalUserPrincipal({})", self.canonical_user_id)
    }
}

impl CanonicalUserPrincipal {
    pub fn new<T: Into<String>>(canonical_user_id: T) -> Self {
        CanonicalUserPrincipal {
            canonical_user_id: canonical_user_id.into(),
        }
    }

    pub fn policy_fragment(&self) -> PrincipalPolicyFragment {
        PrincipalPolicyFragment::new(
            vec![PrincipalProps::new(
                PrincipalType::CanonicalUser,
                [self.canonical_user_id.as_str()],
            )],
            Vec::new(),
        )
    }

    pub(crate) fn dedupe_string(&self) -> String {
        format!("CanonicalUserPrincipal:{}", self.canonical_user_id)
    }
}

/// Every principal in an AWS organization: `AWS: "*"` restricted by
/// `aws:PrincipalOrgID`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OrganizationPrincipal {
    organization_id: String,
}

impl Display for OrganizationPrincipal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "OrganizationPrincipal({})", self.organization_id)
    }
}

impl OrganizationPrincipal {
    pub fn new<T: Into<String>>(organization_id: T) -> Self {
        OrganizationPrincipal {
            organization_id: organization_id.into(),
        }
    }

    pub fn policy_fragment(&self) -> PrincipalPolicyFragment {
        PrincipalPolicyFragment::new(
            vec![PrincipalProps::new(PrincipalType::Aws, ["*"])],
            vec![org_condition(&self.organization_id)],
        )
    }

    pub(crate) fn dedupe_string(&self) -> String {
        format!("OrganizationPrincipal:{}", self.organization_id)
    }
}
