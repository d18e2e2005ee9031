//! Principal policy fragments and the principal merge algorithm.

use std::fmt::{Display, Formatter, Result as FmtResult};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

use super::condition::{Condition, ConditionMap, conditions_key};
use super::json::{ConditionJson, PrincipalJson, StringOrList};
use super::principal_type::PrincipalType;

/// One principal type and the identifiers given for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PrincipalProps {
    #[serde(rename = "type")]
    pub principal_type: PrincipalType,
    pub identifiers: Vec<String>,
}

impl PrincipalProps {
    pub fn new<I, S>(principal_type: PrincipalType, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PrincipalProps {
            principal_type,
            identifiers: identifiers.into_iter().map(Into::into).collect(),
        }
    }

    /// The `"*"` principal, which may only stand alone.
    pub fn star() -> Self {
        PrincipalProps::new(PrincipalType::Any, ["*"])
    }

    pub fn is_star(&self) -> bool {
        self.principal_type == PrincipalType::Any && self.identifiers == ["*"]
    }
}

/// What a principal contributes to a statement: principal entries plus the
/// conditions that must accompany them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrincipalPolicyFragment {
    pub principals: Vec<PrincipalProps>,
    pub conditions: Vec<Condition>,
}

impl Display for PrincipalPolicyFragment {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let principals = self
            .principals
            .iter()
            .map(|p| format!("{}: [{}]", p.principal_type, p.identifiers.join(",")))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{ principals: {{ {principals} }}")?;
        if !self.conditions.is_empty() {
            write!(f, ", conditions: {{ {} }}", conditions_key(&self.conditions))?;
        }
        write!(f, " }}")
    }
}

impl PrincipalPolicyFragment {
    pub fn new(principals: Vec<PrincipalProps>, conditions: Vec<Condition>) -> Self {
        PrincipalPolicyFragment {
            principals,
            conditions,
        }
    }

    pub fn principal_json(&self) -> PrincipalJson {
        principal_json(&self.principals)
    }

    pub fn conditions_json(&self) -> ConditionJson {
        ConditionMap::from_conditions(self.conditions.iter().cloned()).to_json()
    }

    /// Build a fragment from the IAM JSON `Principal` element and an optional
    /// `Condition` element.
    pub fn from_principal_json(
        principal: &PrincipalJson,
        conditions: Option<&ConditionJson>,
    ) -> Self {
        let principals = match principal {
            PrincipalJson::Star => vec![PrincipalProps::star()],
            PrincipalJson::Typed(typed) => typed
                .iter()
                .map(|(principal_type, identifiers)| {
                    PrincipalProps::new(*principal_type, identifiers.as_slice().iter().cloned())
                })
                .collect(),
        };
        let conditions = conditions
            .map(|json| ConditionMap::from_json(json).to_conditions())
            .unwrap_or_default();
        PrincipalPolicyFragment::new(principals, conditions)
    }
}

fn has_star(principals: &[PrincipalProps]) -> bool {
    principals.iter().any(PrincipalProps::is_star)
}

/// Merge `source` principal entries into `target`.
///
/// Entries of a type already present in `target` have their identifiers
/// unioned, existing identifiers first. New types are appended. The `"*"`
/// principal cannot be combined with anything else.
pub fn merge_principal(
    target: &mut Vec<PrincipalProps>,
    source: &[PrincipalProps],
) -> Result<(), PolicyError> {
    if (has_star(target) && !source.is_empty()) || (has_star(source) && !target.is_empty()) {
        return Err(PolicyError::StarPrincipalConflict {
            target: principal_json_string(target),
            merged: principal_json_string(source),
        });
    }

    for props in source {
        match target
            .iter_mut()
            .find(|existing| existing.principal_type == props.principal_type)
        {
            Some(existing) => {
                let mut identifiers: IndexSet<String> = existing.identifiers.drain(..).collect();
                identifiers.extend(props.identifiers.iter().cloned());
                existing.identifiers = identifiers.into_iter().collect();
            }
            None => target.push(props.clone()),
        }
    }
    Ok(())
}

/// Render principal entries in the IAM JSON shorthand.
pub(crate) fn principal_json(principals: &[PrincipalProps]) -> PrincipalJson {
    if let [single] = principals {
        if single.is_star() {
            return PrincipalJson::Star;
        }
    }

    let mut typed: IndexMap<PrincipalType, Vec<String>> = IndexMap::new();
    for props in principals {
        typed
            .entry(props.principal_type)
            .or_default()
            .extend(props.identifiers.iter().cloned());
    }
    PrincipalJson::Typed(
        typed
            .into_iter()
            .map(|(principal_type, identifiers)| (principal_type, StringOrList::new(identifiers)))
            .collect(),
    )
}

fn principal_json_string(principals: &[PrincipalProps]) -> String {
    serde_json::to_string(&principal_json(principals)).unwrap_or_default()
}
