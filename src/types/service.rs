//! AWS service principals.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use super::condition::{Condition, identity_key};
use super::fragment::{PrincipalPolicyFragment, PrincipalProps};
use super::principal_type::PrincipalType;

/// Options carried by a service principal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ServicePrincipalOpts {
    /// The region the service principal is used in, if it matters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Conditions that always accompany the principal.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// A service principal, e.g. `lambda.amazonaws.com`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ServicePrincipal {
    service: String,
    #[serde(default)]
    opts: ServicePrincipalOpts,
}

impl Display for ServicePrincipal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "ServicePrincipal({})", self.service)
    }
}

impl ServicePrincipal {
    pub fn new<T: Into<String>>(service: T) -> Self {
        Self::with_opts(service, ServicePrincipalOpts::default())
    }

    pub fn with_opts<T: Into<String>>(service: T, opts: ServicePrincipalOpts) -> Self {
        ServicePrincipal {
            service: service.into(),
            opts,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn opts(&self) -> &ServicePrincipalOpts {
        &self.opts
    }

    pub fn policy_fragment(&self) -> PrincipalPolicyFragment {
        PrincipalPolicyFragment::new(
            vec![PrincipalProps::new(
                PrincipalType::Service,
                [self.service.as_str()],
            )],
            self.opts.conditions.clone(),
        )
    }

    pub(crate) fn dedupe_string(&self) -> String {
        format!("ServicePrincipal:{}", identity_key(&(&self.service, &self.opts)))
    }
}
