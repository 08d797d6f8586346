// ABOUTME: Custom serde deserializers for spec-file types.
// ABOUTME: Handles stack names, stringified parameters, and the two stack-entry shapes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use nonempty::NonEmpty;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use super::StackDefinition;
use crate::types::StackName;

/// A stack definition as written, before its name is settled.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
struct RawStack {
    #[serde(default, deserialize_with = "deserialize_stack_name_option")]
    stack_name: Option<StackName>,

    template_path: PathBuf,

    #[serde(default)]
    template_bucket: Option<String>,

    #[serde(default, deserialize_with = "deserialize_parameters")]
    parameters: BTreeMap<String, String>,

    #[serde(default)]
    output_checks: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_mapping")]
    tags: Mapping,

    #[serde(default, deserialize_with = "deserialize_mapping")]
    settings: Mapping,
}

impl RawStack {
    fn into_definition(self, name: StackName) -> StackDefinition {
        StackDefinition {
            name,
            template_path: self.template_path,
            template_bucket: self.template_bucket,
            parameters: self.parameters,
            output_checks: self.output_checks,
            tags: self.tags,
            settings: self.settings,
        }
    }
}

fn deserialize_stack_name_option<'de, D>(deserializer: D) -> Result<Option<StackName>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    opt.map(|s| StackName::new(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// Parameter values are handed to the provider as strings; scalars are stringified.
fn deserialize_parameters<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: BTreeMap<String, Value> = BTreeMap::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(serde::de::Error::custom(format!(
                        "parameter {key} must be a string, number, or boolean"
                    )));
                }
            };
            Ok((key, value))
        })
        .collect()
}

/// Kept loosely typed; tag types are checked when the stack deploys.
fn deserialize_mapping<'de, D>(deserializer: D) -> Result<Mapping, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<Mapping> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

pub fn deserialize_stacks<'de, D>(deserializer: D) -> Result<NonEmpty<StackDefinition>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let entries: Vec<Mapping> = Vec::deserialize(deserializer)?;
    let stacks = entries
        .into_iter()
        .map(stack_entry)
        .collect::<Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)?;

    NonEmpty::from_vec(stacks)
        .ok_or_else(|| serde::de::Error::custom("at least one stack is required"))
}

/// Accept either `{StackName: x, TemplatePath: ...}` or `{x: {TemplatePath: ...}}`.
fn stack_entry(entry: Mapping) -> Result<StackDefinition, String> {
    if entry.contains_key("TemplatePath") {
        let raw: RawStack =
            serde_yaml::from_value(Value::Mapping(entry)).map_err(|e| e.to_string())?;
        let name = raw
            .stack_name
            .clone()
            .ok_or_else(|| "stack definition is missing StackName".to_string())?;
        return Ok(raw.into_definition(name));
    }

    let mut pairs = entry.into_iter();
    match (pairs.next(), pairs.next()) {
        (Some((Value::String(key), body)), None) => named_definition(&key, body),
        _ => Err(
            "stack entry must be a definition or a single-key mapping of name to definition"
                .to_string(),
        ),
    }
}

/// Build a definition from a `Name: {...}` body; `StackName` defaults to the key.
pub(crate) fn named_definition(key: &str, body: Value) -> Result<StackDefinition, String> {
    let raw: RawStack = serde_yaml::from_value(body).map_err(|e| format!("stack {key}: {e}"))?;
    let name = match raw.stack_name.clone() {
        Some(name) => name,
        None => StackName::new(key).map_err(|e| format!("stack {key}: {e}"))?,
    };
    Ok(raw.into_definition(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn plain_entry_requires_stack_name() {
        let err = stack_entry(mapping("TemplatePath: a.yml")).unwrap_err();
        assert!(err.contains("StackName"));
    }

    #[test]
    fn named_entry_defaults_stack_name_to_key() {
        let def = stack_entry(mapping("Bucket:\n  TemplatePath: a.yml")).unwrap();
        assert_eq!(def.name.as_str(), "Bucket");
    }

    #[test]
    fn named_entry_keeps_explicit_stack_name() {
        let def =
            stack_entry(mapping("Bucket:\n  TemplatePath: a.yml\n  StackName: AppBucket")).unwrap();
        assert_eq!(def.name.as_str(), "AppBucket");
    }

    #[test]
    fn multi_key_entry_without_template_is_rejected() {
        assert!(stack_entry(mapping("A: {}\nB: {}")).is_err());
    }

    #[test]
    fn scalar_parameters_are_stringified() {
        let def = stack_entry(mapping(
            "Bucket:\n  TemplatePath: a.yml\n  Parameters:\n    Count: 3\n    Enabled: true\n    Name: x",
        ))
        .unwrap();
        assert_eq!(def.parameters["Count"], "3");
        assert_eq!(def.parameters["Enabled"], "true");
        assert_eq!(def.parameters["Name"], "x");
    }

    #[test]
    fn list_parameter_is_rejected() {
        let err = stack_entry(mapping(
            "Bucket:\n  TemplatePath: a.yml\n  Parameters:\n    Subnets: [a, b]",
        ))
        .unwrap_err();
        assert!(err.contains("Subnets"));
    }
}
