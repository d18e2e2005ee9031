//! Conditions and the (test, variable) keyed condition map.

use std::fmt::{Display, Formatter, Result as FmtResult};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PolicyError;

use super::json::{ConditionJson, StringOrList};

/// A single IAM condition, e.g. `StringEquals aws:SourceAccount ["123456789012"]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Condition {
    /// The condition operator, e.g. `StringEquals`
    pub test: String,
    /// The context key, e.g. `aws:SourceAccount`
    pub variable: String,
    pub values: Vec<String>,
}

impl Condition {
    pub fn new<T, V, I, S>(test: T, variable: V, values: I) -> Self
    where
        T: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Condition {
            test: test.into(),
            variable: variable.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} {} [{}]",
            self.test,
            self.variable,
            self.values.join(",")
        )
    }
}

/// Conditions keyed by operator and then by context key.
///
/// There is at most one condition per (test, variable) pair. Adding a
/// condition for a pair that already exists replaces its values; it does not
/// union them. Iteration follows first insertion of the operator, then first
/// insertion of the context key within that operator.
#[derive(Debug, Clone, Default)]
pub struct ConditionMap {
    tests: IndexMap<String, IndexMap<String, Condition>>,
}

impl PartialEq for ConditionMap {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for ConditionMap {}

impl ConditionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_conditions<I: IntoIterator<Item = Condition>>(conditions: I) -> Self {
        let mut map = ConditionMap::new();
        map.add_conditions(conditions);
        map
    }

    pub fn add_condition(&mut self, condition: Condition) {
        self.tests
            .entry(condition.test.clone())
            .or_default()
            .insert(condition.variable.clone(), condition);
    }

    pub fn add_conditions<I: IntoIterator<Item = Condition>>(&mut self, conditions: I) {
        for condition in conditions {
            self.add_condition(condition);
        }
    }

    pub fn get(&self, test: &str, variable: &str) -> Option<&Condition> {
        self.tests.get(test).and_then(|vars| vars.get(variable))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.tests.values().flat_map(|vars| vars.values())
    }

    /// Flatten the map into a list, in map iteration order.
    pub fn to_conditions(&self) -> Vec<Condition> {
        self.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tests.values().map(|vars| vars.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render as the IAM JSON `Condition` element.
    pub fn to_json(&self) -> ConditionJson {
        let mut json: IndexMap<String, IndexMap<String, StringOrList>> = IndexMap::new();
        for condition in self.iter() {
            json.entry(condition.test.clone()).or_default().insert(
                condition.variable.clone(),
                StringOrList::new(condition.values.clone()),
            );
        }
        ConditionJson::from(json)
    }

    pub fn from_json(json: &ConditionJson) -> Self {
        let mut map = ConditionMap::new();
        for (test, vars) in json.as_map() {
            for (variable, values) in vars {
                map.add_condition(Condition::new(test, variable, values.as_slice().to_vec()));
            }
        }
        map
    }

    /// Parse the conditions for one operator from an object of context key to
    /// value(s), e.g. `{"aws:SourceAccount": "123456789012"}`.
    pub fn conditions_from_object(key: &str, value: &Value) -> Result<Vec<Condition>, PolicyError> {
        let Value::Object(fields) = value else {
            return Err(PolicyError::InvalidCondition(
                "A Condition should be represented as a map of operator to value".to_string(),
            ));
        };

        fields
            .iter()
            .map(|(variable, field)| {
                let values = StringOrList::from_value(field).map_err(|_| {
                    PolicyError::InvalidCondition(format!(
                        "Fields must be either a string or an array of strings. Got {field} for key {variable}"
                    ))
                })?;
                Ok(Condition::new(key, variable, values.into_vec()))
            })
            .collect()
    }
}

/// Render conditions compactly, for messages.
pub(crate) fn conditions_key(conditions: &[Condition]) -> String {
    conditions
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Render a value as JSON for identity strings. Distinct values never share a
/// rendering, which the compact message form cannot guarantee.
pub(crate) fn identity_key<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
