//! IAM principal type names.
//!
//! These are the keys of the `Principal` element in IAM policy JSON, e.g.
//! `{"AWS": "arn:aws:iam::123456789012:root"}` or `{"Service": "s3.amazonaws.com"}`.

use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::error::PolicyError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumIter,
)]
pub enum PrincipalType {
    /// IAM users, roles, accounts and `*`
    #[serde(rename = "AWS")]
    #[strum(serialize = "AWS")]
    Aws,
    Federated,
    Service,
    CanonicalUser,
    /// The bare `"*"` principal
    #[serde(rename = "*")]
    #[strum(serialize = "*")]
    Any,
}

impl FromStr for PrincipalType {
    type Err = PolicyError;

    /// Principal type names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrincipalType::iter()
            .find(|t| t.as_ref().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                PolicyError::InvalidPrincipalType(format!(
                    "{s}, valid values are: {}",
                    PrincipalType::iter().map(|t| t.to_string()).join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        aws = { PrincipalType::Aws, "AWS" },
        federated = { PrincipalType::Federated, "Federated" },
        service = { PrincipalType::Service, "Service" },
        canonical = { PrincipalType::CanonicalUser, "CanonicalUser" },
        any = { PrincipalType::Any, "*" },
    )]
    fn test_principal_type_names(principal_type: PrincipalType, name: &str) {
        assert_eq!(principal_type.as_ref(), name);
        assert_eq!(principal_type.to_string(), name);
        assert_eq!(PrincipalType::from_str(name).unwrap(), principal_type);
        assert_eq!(
            serde_json::to_value(principal_type).unwrap(),
            serde_json::json!(name)
        );
    }

    #[parameterized(
        lower = { "aws", PrincipalType::Aws },
        upper = { "SERVICE", PrincipalType::Service },
        mixed = { "canonicaluser", PrincipalType::CanonicalUser },
    )]
    fn test_from_str_ignores_case(name: &str, expected: PrincipalType) {
        assert_eq!(name.parse::<PrincipalType>().unwrap(), expected);
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "User".parse::<PrincipalType>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid principal type: User, valid values are: AWS, Federated, Service, CanonicalUser, *"
        );
    }
}
