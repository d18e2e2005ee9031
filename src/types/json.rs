//! Schema types for the two serialized forms of a policy.
//!
//! IAM policy JSON (`StatementJson`, `DocumentJson`) collapses single-element
//! lists to scalars and omits empty fields. The block form (`StatementBlock`,
//! `DocumentBlock`) is its fully expanded twin, as consumed by
//! infrastructure-as-code backends.
//!
//! Untyped input is parsed through `serde_json::Value` at this boundary so that
//! shape errors carry the same messages no matter which element they occur in.

use indexmap::{IndexMap, IndexSet};
use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::PolicyError;

use super::condition::Condition;
use super::effect::Effect;
use super::fragment::PrincipalProps;
use super::principal_type::PrincipalType;

/// The IAM policy language version emitted in documents.
pub const POLICY_VERSION: &str = "2012-10-17";

const STRING_OR_LIST: &str = "Fields must be either a string or an array of strings";

// Format errors are re-wrapped by the caller, so only their message is kept.
fn de_error<E: DeError>(err: PolicyError) -> E {
    match err {
        PolicyError::InvalidFormat(message) => E::custom(message),
        other => E::custom(other),
    }
}

/// A field that is either a single string or a list of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringOrList(Vec<String>);

impl StringOrList {
    pub fn new(values: Vec<String>) -> Self {
        StringOrList(values)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub fn from_value(value: &Value) -> Result<Self, PolicyError> {
        match value {
            Value::String(s) => Ok(StringOrList(vec![s.clone()])),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    _ => Err(PolicyError::InvalidFormat(STRING_OR_LIST.to_string())),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(StringOrList),
            _ => Err(PolicyError::InvalidFormat(STRING_OR_LIST.to_string())),
        }
    }

    // Appends values not already present, keeping first-seen order.
    fn merge(&mut self, other: StringOrList) {
        let merged: IndexSet<String> = self.0.drain(..).chain(other.0).collect();
        self.0 = merged.into_iter().collect();
    }
}

impl Serialize for StringOrList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.as_slice() {
            [single] => serializer.serialize_str(single),
            values => values.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for StringOrList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        StringOrList::from_value(&value).map_err(de_error)
    }
}

/// The `Principal` / `NotPrincipal` element: the bare `"*"` or a map of
/// principal type to identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalJson {
    Star,
    Typed(IndexMap<PrincipalType, StringOrList>),
}

impl PrincipalJson {
    pub fn from_value(value: &Value) -> Result<Self, PolicyError> {
        match value {
            Value::String(s) if s == "*" => Ok(PrincipalJson::Star),
            Value::String(s) => Err(PolicyError::InvalidPrincipalType(s.clone())),
            Value::Object(fields) => {
                let mut typed: IndexMap<PrincipalType, StringOrList> = IndexMap::new();
                for (key, identifiers) in fields {
                    let principal_type = key.parse::<PrincipalType>()?;
                    let identifiers = StringOrList::from_value(identifiers)?;
                    // "AWS" and "aws" name the same type
                    match typed.get_mut(&principal_type) {
                        Some(existing) => existing.merge(identifiers),
                        None => {
                            typed.insert(principal_type, identifiers);
                        }
                    }
                }
                Ok(PrincipalJson::Typed(typed))
            }
            other => Err(PolicyError::InvalidFormat(format!(
                "JSON IAM principal should be an object, got {other}"
            ))),
        }
    }
}

impl Serialize for PrincipalJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PrincipalJson::Star => serializer.serialize_str("*"),
            PrincipalJson::Typed(typed) => {
                let mut map = serializer.serialize_map(Some(typed.len()))?;
                for (principal_type, identifiers) in typed {
                    map.serialize_entry(principal_type.as_ref(), identifiers)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for PrincipalJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        PrincipalJson::from_value(&value).map_err(de_error)
    }
}

/// The `Condition` element: operator to context key to value(s).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConditionJson(IndexMap<String, IndexMap<String, StringOrList>>);

impl ConditionJson {
    pub fn as_map(&self) -> &IndexMap<String, IndexMap<String, StringOrList>> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_value(value: &Value) -> Result<Self, PolicyError> {
        let Value::Object(tests) = value else {
            return Err(PolicyError::InvalidCondition(
                "A Condition should be represented as a map of operator to value".to_string(),
            ));
        };

        let mut json = IndexMap::new();
        for (test, fields) in tests {
            let Value::Object(fields) = fields else {
                return Err(PolicyError::InvalidCondition(format!(
                    "Invalid event pattern field {{ {test}: {fields} }}. All fields must be objects"
                )));
            };
            let mut vars = IndexMap::new();
            for (variable, values) in fields {
                vars.insert(variable.clone(), StringOrList::from_value(values)?);
            }
            json.insert(test.clone(), vars);
        }
        Ok(ConditionJson(json))
    }
}

impl From<IndexMap<String, IndexMap<String, StringOrList>>> for ConditionJson {
    fn from(json: IndexMap<String, IndexMap<String, StringOrList>>) -> Self {
        ConditionJson(json)
    }
}

impl<'de> Deserialize<'de> for ConditionJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ConditionJson::from_value(&value).map_err(de_error)
    }
}

/// One statement in IAM policy JSON. Fields serialize in a fixed order and
/// absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatementJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_action: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionJson>,
    pub effect: Effect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<PrincipalJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_principal: Option<PrincipalJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_resource: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

impl StatementJson {
    /// Parse one statement. Unknown keys are ignored and `null` counts as
    /// absent. Errors keep the variant of the element that failed.
    pub fn from_value(value: &Value) -> Result<Self, PolicyError> {
        let Value::Object(fields) = value else {
            return Err(PolicyError::InvalidFormat(format!(
                "JSON IAM statement should be an object, got {value}"
            )));
        };

        fn field<T>(
            fields: &serde_json::Map<String, Value>,
            key: &str,
            parse: impl Fn(&Value) -> Result<T, PolicyError>,
        ) -> Result<Option<T>, PolicyError> {
            match fields.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(value) => parse(value).map(Some),
            }
        }

        let effect = field(fields, "Effect", |value| match value {
            Value::String(s) => s
                .parse::<Effect>()
                .map_err(|_| PolicyError::InvalidFormat(format!("Invalid effect: {s}"))),
            other => Err(PolicyError::InvalidFormat(format!(
                "Effect should be a string, got {other}"
            ))),
        })?;
        let sid = field(fields, "Sid", |value| match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(PolicyError::InvalidFormat(format!(
                "Sid should be a string, got {other}"
            ))),
        })?;

        Ok(StatementJson {
            action: field(fields, "Action", StringOrList::from_value)?,
            not_action: field(fields, "NotAction", StringOrList::from_value)?,
            condition: field(fields, "Condition", ConditionJson::from_value)?,
            effect: effect.unwrap_or_default(),
            principal: field(fields, "Principal", PrincipalJson::from_value)?,
            not_principal: field(fields, "NotPrincipal", PrincipalJson::from_value)?,
            resource: field(fields, "Resource", StringOrList::from_value)?,
            not_resource: field(fields, "NotResource", StringOrList::from_value)?,
            sid,
        })
    }
}

impl<'de> Deserialize<'de> for StatementJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        StatementJson::from_value(&value).map_err(de_error)
    }
}

/// A full IAM policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DocumentJson {
    pub statement: Vec<StatementJson>,
    pub version: String,
}

/// One statement in block form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub principals: Vec<PrincipalProps>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_principals: Vec<PrincipalProps>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub condition: Vec<Condition>,
    #[serde(default)]
    pub effect: Effect,
}

/// A full policy document in block form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentBlock {
    pub statement: Vec<StatementBlock>,
}
