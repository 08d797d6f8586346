// ABOUTME: Validated CloudFormation stack name.
// ABOUTME: Enforces the provider's naming rules and group namespacing.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Maximum stack name length accepted by CloudFormation.
pub const MAX_STACK_NAME_LEN: usize = 128;

/// Separator placed between a group name and a stack name.
pub const NAMESPACE_SEPARATOR: char = '-';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StackNameError {
    #[error("stack name cannot be empty")]
    Empty,

    #[error("stack name exceeds maximum length of 128 characters")]
    TooLong,

    #[error("stack name must start with a letter")]
    StartsWithNonLetter,

    #[error("invalid character in stack name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StackName(String);

impl StackName {
    pub fn new(value: &str) -> Result<Self, StackNameError> {
        let first = value.chars().next().ok_or(StackNameError::Empty)?;

        if value.len() > MAX_STACK_NAME_LEN {
            return Err(StackNameError::TooLong);
        }

        if !first.is_ascii_alphabetic() {
            return Err(StackNameError::StartsWithNonLetter);
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' {
                return Err(StackNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    /// Prefix this name with a group namespace, e.g. `Dev` + `Bucket` -> `Dev-Bucket`.
    pub fn namespaced(&self, namespace: &str) -> Result<Self, StackNameError> {
        Self::new(&format!("{namespace}{NAMESPACE_SEPARATOR}{}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for StackName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl Serialize for StackName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StackName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        StackName::new(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_mixed_case_with_hyphens() {
        let name = StackName::new("SomeApp-Bucket2").unwrap();
        assert_eq!(name.as_str(), "SomeApp-Bucket2");
    }

    #[test]
    fn rejects_leading_digit() {
        assert_eq!(
            StackName::new("1bucket"),
            Err(StackNameError::StartsWithNonLetter)
        );
    }

    #[test]
    fn rejects_underscore() {
        assert_eq!(
            StackName::new("my_stack"),
            Err(StackNameError::InvalidChar('_'))
        );
    }

    #[test]
    fn rejects_overlong_name() {
        let long = "a".repeat(129);
        assert_eq!(StackName::new(&long), Err(StackNameError::TooLong));
        assert!(StackName::new(&"a".repeat(128)).is_ok());
    }

    #[test]
    fn namespacing_prefixes_group() {
        let name = StackName::new("Bucket").unwrap();
        assert_eq!(name.namespaced("Dev").unwrap().as_str(), "Dev-Bucket");
    }
}
