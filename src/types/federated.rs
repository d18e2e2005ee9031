//! Federated principals: web identity, OpenID Connect and SAML.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use super::condition::{Condition, ConditionMap, identity_key};
use super::fragment::{PrincipalPolicyFragment, PrincipalProps};
use super::principal_type::PrincipalType;

pub const ASSUME_ROLE: &str = "sts:AssumeRole";
pub const ASSUME_ROLE_WITH_WEB_IDENTITY: &str = "sts:AssumeRoleWithWebIdentity";
pub const ASSUME_ROLE_WITH_SAML: &str = "sts:AssumeRoleWithSAML";
pub const SAML_SIGN_IN_URL: &str = "https://signin.aws.amazon.com/saml";

/// How a federated principal was constructed. Only affects how it is displayed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FederatedKind {
    #[default]
    Federated,
    WebIdentity,
    OpenIdConnect,
    Saml,
    SamlConsole,
}

/// A principal authenticated by an external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FederatedPrincipal {
    federated: String,
    conditions: Vec<Condition>,
    assume_role_action: String,
    #[serde(default)]
    kind: FederatedKind,
}

impl Display for FederatedPrincipal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self.kind {
            FederatedKind::Federated => "FederatedPrincipal",
            FederatedKind::WebIdentity => "WebIdentityPrincipal",
            FederatedKind::OpenIdConnect => "OpenIdConnectPrincipal",
            FederatedKind::Saml => "SamlPrincipal",
            FederatedKind::SamlConsole => "SamlConsolePrincipal",
        };
        write!(f, "{name}({})", self.federated)
    }
}

impl FederatedPrincipal {
    /// A federated principal assumed with `sts:AssumeRole`.
    pub fn new<T, I>(federated: T, conditions: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = Condition>,
    {
        FederatedPrincipal {
            federated: federated.into(),
            conditions: conditions.into_iter().collect(),
            assume_role_action: ASSUME_ROLE.to_string(),
            kind: FederatedKind::Federated,
        }
    }

    pub fn with_assume_role_action<T: Into<String>>(mut self, action: T) -> Self {
        self.assume_role_action = action.into();
        self
    }

    /// A web identity provider such as `cognito-identity.amazonaws.com` or
    /// `accounts.google.com`.
    pub fn web_identity<T, I>(identity_provider: T, conditions: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = Condition>,
    {
        FederatedPrincipal {
            kind: FederatedKind::WebIdentity,
            ..Self::new(identity_provider, conditions)
                .with_assume_role_action(ASSUME_ROLE_WITH_WEB_IDENTITY)
        }
    }

    /// Users authenticated through the OpenID Connect provider with the given ARN.
    pub fn open_id_connect<T, I>(provider_arn: T, conditions: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = Condition>,
    {
        FederatedPrincipal {
            kind: FederatedKind::OpenIdConnect,
            ..Self::web_identity(provider_arn, conditions)
        }
    }

    /// Users authenticated through the SAML provider with the given ARN.
    pub fn saml<T, I>(provider_arn: T, conditions: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = Condition>,
    {
        FederatedPrincipal {
            kind: FederatedKind::Saml,
            ..Self::new(provider_arn, conditions).with_assume_role_action(ASSUME_ROLE_WITH_SAML)
        }
    }

    /// Like [`FederatedPrincipal::saml`], restricted to AWS Management Console sign-in.
    pub fn saml_console<T, I>(provider_arn: T, conditions: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = Condition>,
    {
        let mut merged = ConditionMap::from_conditions(conditions);
        merged.add_condition(Condition::new(
            "StringEquals",
            "SAML:aud",
            [SAML_SIGN_IN_URL],
        ));
        FederatedPrincipal {
            kind: FederatedKind::SamlConsole,
            ..Self::saml(provider_arn, merged.to_conditions())
        }
    }

    pub fn federated(&self) -> &str {
        &self.federated
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn assume_role_action(&self) -> &str {
        &self.assume_role_action
    }

    pub fn policy_fragment(&self) -> PrincipalPolicyFragment {
        PrincipalPolicyFragment::new(
            vec![PrincipalProps::new(
                PrincipalType::Federated,
                [self.federated.as_str()],
            )],
            self.conditions.clone(),
        )
    }

    pub(crate) fn dedupe_string(&self) -> String {
        format!(
            "FederatedPrincipal:{}",
            identity_key(&(&self.federated, &self.assume_role_action, &self.conditions))
        )
    }
}
