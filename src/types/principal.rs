//! The principal sum type.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};

use tracing::debug;

use crate::error::PolicyError;
use crate::statement::{PolicyStatement, PolicyStatementProps};
use crate::traits::StatementSink;

use super::composite::CompositePrincipal;
use super::condition::{Condition, identity_key};
use super::federated::{ASSUME_ROLE, FederatedPrincipal};
use super::fragment::{PrincipalPolicyFragment, PrincipalProps};
use super::identity::{
    AccountPrincipal, ArnPrincipal, CanonicalUserPrincipal, OrganizationPrincipal,
};
use super::service::{ServicePrincipal, ServicePrincipalOpts};
use super::wrapper::{PrincipalWithConditions, SessionTagsPrincipal};

/// Anything that can appear in the `Principal` element of a statement.
///
/// Principals are values: two principals are equal when they render the same
/// identity (see [`Principal::dedupe_string`]), and combinators such as
/// [`Principal::with_conditions`] return new principals.
#[derive(Debug, Clone)]
pub enum Principal {
    Arn(ArnPrincipal),
    Account(AccountPrincipal),
    Service(ServicePrincipal),
    Federated(FederatedPrincipal),
    CanonicalUser(CanonicalUserPrincipal),
    Organization(OrganizationPrincipal),
    /// Any AWS principal: `{"AWS": "*"}`
    Any,
    /// The bare `"*"` principal
    Star,
    Composite(CompositePrincipal),
    WithConditions(PrincipalWithConditions),
    SessionTags(SessionTagsPrincipal),
    /// A principal read back from IAM policy JSON
    Json(PrincipalPolicyFragment),
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Principal::Arn(p) => write!(f, "{p}"),
            Principal::Account(p) => write!(f, "{p}"),
            Principal::Service(p) => write!(f, "{p}"),
            Principal::Federated(p) => write!(f, "{p}"),
            Principal::CanonicalUser(p) => write!(f, "{p}"),
            Principal::Organization(p) => write!(f, "{p}"),
            Principal::Any => write!(f, "AnyPrincipal"),
            Principal::Star => write!(f, "StarPrincipal"),
            Principal::Composite(p) => write!(f, "{p}"),
            Principal::WithConditions(p) => write!(f, "{p}"),
            Principal::SessionTags(p) => write!(f, "{p}"),
            Principal::Json(fragment) => write!(f, "JsonPrincipal({fragment})"),
        }
    }
}

impl PartialEq for Principal {
    fn eq(&self, other: &Self) -> bool {
        self.dedupe_string() == other.dedupe_string()
    }
}

impl Eq for Principal {}

impl Hash for Principal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dedupe_string().hash(state);
    }
}

impl Principal {
    pub fn arn<T: Into<String>>(arn: T) -> Self {
        Principal::Arn(ArnPrincipal::new(arn))
    }

    pub fn account<T: Into<String>>(account_id: T) -> Self {
        Principal::Account(AccountPrincipal::new(account_id))
    }

    pub fn service<T: Into<String>>(service: T) -> Self {
        Principal::Service(ServicePrincipal::new(service))
    }

    pub fn service_with_opts<T: Into<String>>(service: T, opts: ServicePrincipalOpts) -> Self {
        Principal::Service(ServicePrincipal::with_opts(service, opts))
    }

    pub fn federated<T, I>(federated: T, conditions: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = Condition>,
    {
        Principal::Federated(FederatedPrincipal::new(federated, conditions))
    }

    pub fn web_identity<T, I>(identity_provider: T, conditions: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = Condition>,
    {
        Principal::Federated(FederatedPrincipal::web_identity(identity_provider, conditions))
    }

    pub fn open_id_connect<T, I>(provider_arn: T, conditions: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = Condition>,
    {
        Principal::Federated(FederatedPrincipal::open_id_connect(provider_arn, conditions))
    }

    pub fn saml<T, I>(provider_arn: T, conditions: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = Condition>,
    {
        Principal::Federated(FederatedPrincipal::saml(provider_arn, conditions))
    }

    pub fn saml_console<T, I>(provider_arn: T, conditions: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = Condition>,
    {
        Principal::Federated(FederatedPrincipal::saml_console(provider_arn, conditions))
    }

    pub fn canonical_user<T: Into<String>>(canonical_user_id: T) -> Self {
        Principal::CanonicalUser(CanonicalUserPrincipal::new(canonical_user_id))
    }

    pub fn organization<T: Into<String>>(organization_id: T) -> Self {
        Principal::Organization(OrganizationPrincipal::new(organization_id))
    }

    pub fn composite<I: IntoIterator<Item = Principal>>(
        principals: I,
    ) -> Result<Self, PolicyError> {
        Ok(Principal::Composite(CompositePrincipal::new(principals)?))
    }

    /// What this principal contributes to a statement. Fails for composites
    /// whose members carry conditions.
    pub fn policy_fragment(&self) -> Result<PrincipalPolicyFragment, PolicyError> {
        Ok(match self {
            Principal::Arn(p) => p.policy_fragment(),
            Principal::Account(p) => p.policy_fragment(),
            Principal::Service(p) => p.policy_fragment(),
            Principal::Federated(p) => p.policy_fragment(),
            Principal::CanonicalUser(p) => p.policy_fragment(),
            Principal::Organization(p) => p.policy_fragment(),
            Principal::Any => ArnPrincipal::new("*").policy_fragment(),
            Principal::Star => {
                PrincipalPolicyFragment::new(vec![PrincipalProps::star()], Vec::new())
            }
            Principal::Composite(p) => p.policy_fragment()?,
            Principal::WithConditions(p) => p.policy_fragment()?,
            Principal::SessionTags(p) => p.policy_fragment()?,
            Principal::Json(fragment) => fragment.clone(),
        })
    }

    /// The action this principal uses to assume a role.
    pub fn assume_role_action(&self) -> &str {
        match self {
            Principal::Federated(p) => p.assume_role_action(),
            Principal::Composite(p) => p.assume_role_action(),
            Principal::WithConditions(p) => p.assume_role_action(),
            Principal::SessionTags(p) => p.assume_role_action(),
            _ => ASSUME_ROLE,
        }
    }

    /// The account this principal belongs to, when known.
    pub fn principal_account(&self) -> Option<&str> {
        match self {
            Principal::Account(p) => Some(p.account_id()),
            Principal::WithConditions(p) => p.wrapped().principal_account(),
            Principal::SessionTags(p) => p.wrapped().principal_account(),
            _ => None,
        }
    }

    /// A string that is identical for principals that render identically.
    pub fn dedupe_string(&self) -> String {
        match self {
            Principal::Arn(p) => p.dedupe_string(),
            Principal::Account(p) => p.dedupe_string(),
            Principal::Service(p) => p.dedupe_string(),
            Principal::Federated(p) => p.dedupe_string(),
            Principal::CanonicalUser(p) => p.dedupe_string(),
            Principal::Organization(p) => p.dedupe_string(),
            Principal::Any => ArnPrincipal::new("*").dedupe_string(),
            Principal::Star => "StarPrincipal".to_string(),
            Principal::Composite(p) => p.dedupe_string(),
            Principal::WithConditions(p) => p.dedupe_string(),
            Principal::SessionTags(p) => p.dedupe_string(),
            Principal::Json(fragment) => format!("JsonPrincipal:{}", identity_key(fragment)),
        }
    }

    /// A new principal that only applies under the given conditions, on top of
    /// any conditions this principal already carries.
    pub fn with_conditions<I: IntoIterator<Item = Condition>>(&self, conditions: I) -> Principal {
        Principal::WithConditions(PrincipalWithConditions::new(self.clone(), conditions))
    }

    /// A new principal that may pass session tags when assuming a role.
    pub fn with_session_tags(&self) -> Principal {
        Principal::SessionTags(SessionTagsPrincipal::new(self.clone()))
    }

    /// Add the statements that let this principal assume a role to `doc`.
    ///
    /// Composite and wrapping principals recurse into their members so that
    /// each contributes its own action and conditions.
    pub fn add_to_assume_role_policy(
        &self,
        doc: &mut dyn StatementSink,
    ) -> Result<(), PolicyError> {
        match self {
            Principal::Composite(p) => p.add_to_assume_role_policy(doc),
            Principal::WithConditions(p) => p.add_to_assume_role_policy(doc),
            Principal::SessionTags(p) => p.add_to_assume_role_policy(doc),
            _ => {
                debug!(
                    event = "AssumeRole",
                    phase = "Statement",
                    principal = self.to_string(),
                    action = self.assume_role_action()
                );
                let statement = PolicyStatement::from_props(
                    PolicyStatementProps::new()
                        .actions([self.assume_role_action()])
                        .principals([self.clone()]),
                )?;
                doc.add_statements(vec![statement])
            }
        }
    }
}

impl From<ArnPrincipal> for Principal {
    fn from(principal: ArnPrincipal) -> Self {
        Principal::Arn(principal)
    }
}

impl From<AccountPrincipal> for Principal {
    fn from(principal: AccountPrincipal) -> Self {
        Principal::Account(principal)
    }
}

impl From<ServicePrincipal> for Principal {
    fn from(principal: ServicePrincipal) -> Self {
        Principal::Service(principal)
    }
}

impl From<FederatedPrincipal> for Principal {
    fn from(principal: FederatedPrincipal) -> Self {
        Principal::Federated(principal)
    }
}

impl From<CompositePrincipal> for Principal {
    fn from(principal: CompositePrincipal) -> Self {
        Principal::Composite(principal)
    }
}

impl From<PrincipalWithConditions> for Principal {
    fn from(principal: PrincipalWithConditions) -> Self {
        Principal::WithConditions(principal)
    }
}

impl From<PrincipalPolicyFragment> for Principal {
    fn from(fragment: PrincipalPolicyFragment) -> Self {
        Principal::Json(fragment)
    }
}
