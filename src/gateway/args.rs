// ABOUTME: Arguments passed to create/update stack calls.
// ABOUTME: Typed passthrough settings and the reserved-argument collision check.

use serde_yaml::Value;
use thiserror::Error;

use crate::types::StackName;

/// Argument names the engine sets itself. Settings may not override them.
pub const RESERVED_ARGUMENTS: [&str; 5] = [
    "StackName",
    "TemplateBody",
    "TemplateURL",
    "Parameters",
    "Tags",
];

/// Where the provider should read the template from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Inline template text.
    Body(String),
    /// Pre-signed URL of an uploaded template.
    Url(String),
}

/// Fully resolved arguments for a create or update call.
#[derive(Debug, Clone, PartialEq)]
pub struct StackArgs {
    pub stack_name: StackName,
    pub template: TemplateSource,
    pub parameters: Vec<(String, String)>,
    pub tags: Vec<(String, String)>,
    pub settings: Vec<Setting>,
}

impl StackArgs {
    /// Look up a parameter value by key.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A passthrough create/update argument taken from a stack's `Settings`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting {
    Capabilities(Vec<String>),
    NotificationArns(Vec<String>),
    ResourceTypes(Vec<String>),
    RoleArn(String),
    StackPolicyBody(String),
    StackPolicyUrl(String),
    DisableRollback(bool),
    OnFailure(String),
    TimeoutInMinutes(i32),
    EnableTerminationProtection(bool),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingError {
    #[error("{0} is already set by cfnbot; refusing to overwrite it from Settings")]
    Reserved(String),

    #[error("unsupported setting: {0}")]
    Unsupported(String),

    #[error("setting {name} must be {expected}")]
    WrongType { name: String, expected: &'static str },
}

impl Setting {
    pub fn parse(name: &str, value: &Value) -> Result<Self, SettingError> {
        if RESERVED_ARGUMENTS.contains(&name) {
            return Err(SettingError::Reserved(name.to_string()));
        }

        let setting = match name {
            "Capabilities" => Setting::Capabilities(string_list(name, value)?),
            "NotificationARNs" => Setting::NotificationArns(string_list(name, value)?),
            "ResourceTypes" => Setting::ResourceTypes(string_list(name, value)?),
            "RoleARN" => Setting::RoleArn(string(name, value)?),
            "StackPolicyBody" => Setting::StackPolicyBody(string(name, value)?),
            "StackPolicyURL" => Setting::StackPolicyUrl(string(name, value)?),
            "DisableRollback" => Setting::DisableRollback(boolean(name, value)?),
            "OnFailure" => Setting::OnFailure(string(name, value)?),
            "TimeoutInMinutes" => {
                let minutes = value
                    .as_i64()
                    .and_then(|m| i32::try_from(m).ok())
                    .filter(|m| *m > 0)
                    .ok_or_else(|| wrong_type(name, "a positive integer"))?;
                Setting::TimeoutInMinutes(minutes)
            }
            "EnableTerminationProtection" => {
                Setting::EnableTerminationProtection(boolean(name, value)?)
            }
            other => return Err(SettingError::Unsupported(other.to_string())),
        };

        Ok(setting)
    }

    /// Argument name as the provider spells it.
    pub fn name(&self) -> &'static str {
        match self {
            Setting::Capabilities(_) => "Capabilities",
            Setting::NotificationArns(_) => "NotificationARNs",
            Setting::ResourceTypes(_) => "ResourceTypes",
            Setting::RoleArn(_) => "RoleARN",
            Setting::StackPolicyBody(_) => "StackPolicyBody",
            Setting::StackPolicyUrl(_) => "StackPolicyURL",
            Setting::DisableRollback(_) => "DisableRollback",
            Setting::OnFailure(_) => "OnFailure",
            Setting::TimeoutInMinutes(_) => "TimeoutInMinutes",
            Setting::EnableTerminationProtection(_) => "EnableTerminationProtection",
        }
    }

    /// Settings the provider only accepts when creating a stack.
    pub fn is_create_only(&self) -> bool {
        matches!(
            self,
            Setting::OnFailure(_)
                | Setting::TimeoutInMinutes(_)
                | Setting::EnableTerminationProtection(_)
        )
    }
}

fn wrong_type(name: &str, expected: &'static str) -> SettingError {
    SettingError::WrongType {
        name: name.to_string(),
        expected,
    }
}

fn string(name: &str, value: &Value) -> Result<String, SettingError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| wrong_type(name, "a string"))
}

fn boolean(name: &str, value: &Value) -> Result<bool, SettingError> {
    value.as_bool().ok_or_else(|| wrong_type(name, "a boolean"))
}

fn string_list(name: &str, value: &Value) -> Result<Vec<String>, SettingError> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Sequence(items) => items
            .iter()
            .map(|item| string(name, item))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| wrong_type(name, "a list of strings")),
        _ => Err(wrong_type(name, "a list of strings")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn reserved_names_are_rejected() {
        for name in RESERVED_ARGUMENTS {
            assert_eq!(
                Setting::parse(name, &yaml("x")),
                Err(SettingError::Reserved(name.to_string()))
            );
        }
    }

    #[test]
    fn capabilities_accept_list_or_single_string() {
        assert_eq!(
            Setting::parse("Capabilities", &yaml("[CAPABILITY_IAM, CAPABILITY_NAMED_IAM]")),
            Ok(Setting::Capabilities(vec![
                "CAPABILITY_IAM".to_string(),
                "CAPABILITY_NAMED_IAM".to_string()
            ]))
        );
        assert_eq!(
            Setting::parse("Capabilities", &yaml("CAPABILITY_IAM")),
            Ok(Setting::Capabilities(vec!["CAPABILITY_IAM".to_string()]))
        );
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        assert!(matches!(
            Setting::parse("DisableRollback", &yaml("\"yes\"")),
            Err(SettingError::WrongType { .. })
        ));
        assert!(matches!(
            Setting::parse("TimeoutInMinutes", &yaml("-5")),
            Err(SettingError::WrongType { .. })
        ));
        assert!(matches!(
            Setting::parse("Capabilities", &yaml("[1, 2]")),
            Err(SettingError::WrongType { .. })
        ));
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(
            Setting::parse("Frobnicate", &yaml("true")),
            Err(SettingError::Unsupported("Frobnicate".to_string()))
        );
    }

    #[test]
    fn create_only_settings() {
        assert!(Setting::OnFailure("DELETE".to_string()).is_create_only());
        assert!(!Setting::RoleArn("arn".to_string()).is_create_only());
    }
}
