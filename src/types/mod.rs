//! Value types for building policy statements.
//!
//! Principals render into a [`PrincipalPolicyFragment`]: principal entries
//! keyed by [`PrincipalType`] (`AWS`, `Service`, `Federated`, `CanonicalUser`
//! or the bare `*`) plus the conditions that must accompany them.
//!
//! The JSON schema types in this module describe the two serialized forms:
//! IAM policy JSON and its fully expanded block form.

mod composite;
mod condition;
mod effect;
mod federated;
mod fragment;
mod identity;
mod json;
mod ordered_set;
mod principal;
mod principal_type;
mod service;
mod wrapper;

pub use composite::CompositePrincipal;
pub use condition::{Condition, ConditionMap};
pub use effect::Effect;
pub use federated::{
    ASSUME_ROLE, ASSUME_ROLE_WITH_SAML, ASSUME_ROLE_WITH_WEB_IDENTITY, FederatedKind,
    FederatedPrincipal, SAML_SIGN_IN_URL,
};
pub use fragment::{PrincipalPolicyFragment, PrincipalProps, merge_principal};
pub use identity::{AccountPrincipal, ArnPrincipal, CanonicalUserPrincipal, OrganizationPrincipal};
pub use json::{
    ConditionJson, DocumentBlock, DocumentJson, POLICY_VERSION, PrincipalJson, StatementBlock,
    StatementJson, StringOrList,
};
pub use ordered_set::OrderedSet;
pub use principal::Principal;
pub use principal_type::PrincipalType;
pub use service::{ServicePrincipal, ServicePrincipalOpts};
pub use wrapper::{PrincipalWithConditions, SessionTagsPrincipal, TAG_SESSION};

pub(crate) use condition::conditions_key;
pub(crate) use fragment::principal_json;
