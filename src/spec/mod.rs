// ABOUTME: Spec-file types and parsing for cfnbot.yml.
// ABOUTME: Classifies the document layout once and resolves it into stack groups.

mod deserialize;
mod path;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nonempty::NonEmpty;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::deploy::{DEFAULT_GROUP, GroupError, Stack, StackGroup};
use crate::error::{Error, Result};
use crate::gateway::WaitPolicy;
use crate::types::StackName;

use deserialize::{deserialize_stacks, named_definition};
pub use path::expand_template_path;

pub const SPEC_FILENAME: &str = "cfnbot.yml";
pub const SPEC_FILENAME_ALT: &str = "cfnbot.yaml";
pub const SPEC_FILENAME_DIR: &str = ".cfnbot/spec.yml";

const STACKS_KEY: &str = "Stacks";

/// The three document shapes a spec file may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecLayout {
    /// Top-level keys are group names; `Default` must hold a non-empty `Stacks` list.
    Groups,
    /// A single `Stacks` list in an implicit `Default` group.
    Stacks,
    /// One stack whose name is the only top-level key.
    Single,
}

/// A parsed spec document.
#[derive(Debug, Clone)]
pub struct SpecFile {
    document: Mapping,
    layout: SpecLayout,
    base_dir: Option<PathBuf>,
}

/// One group as written in the spec file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupDefinition {
    #[serde(skip)]
    pub name: String,

    #[serde(deserialize_with = "deserialize_stacks")]
    pub stacks: NonEmpty<StackDefinition>,

    #[serde(default)]
    pub template_bucket: Option<String>,

    #[serde(default, alias = "Profile")]
    pub credential_profile: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    #[serde(default = "default_wait_timeout", with = "humantime_serde")]
    pub wait_timeout: Duration,

    /// Directory relative template paths are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// One stack as written in the spec file, with its name settled.
#[derive(Debug, Clone)]
pub struct StackDefinition {
    pub name: StackName,
    pub template_path: PathBuf,
    pub template_bucket: Option<String>,
    pub parameters: BTreeMap<String, String>,
    pub output_checks: Vec<String>,
    pub tags: Mapping,
    pub settings: Mapping,
}

fn default_poll_interval() -> Duration {
    WaitPolicy::default().poll_interval
}

fn default_wait_timeout() -> Duration {
    WaitPolicy::default().timeout
}

impl SpecFile {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let document = match serde_yaml::from_str::<Value>(yaml)? {
            Value::Mapping(document) => document,
            _ => return Err(Error::InvalidSpec("document must be a mapping".to_string())),
        };
        let layout = classify(&document)?;
        tracing::debug!("spec file parsed as {:?} layout", layout);

        Ok(SpecFile {
            document,
            layout,
            base_dir: None,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::SpecNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let mut spec = Self::from_yaml(&content)?;
        spec.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);
        Ok(spec)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(SPEC_FILENAME),
            dir.join(SPEC_FILENAME_ALT),
            dir.join(SPEC_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::SpecNotFound(dir.to_path_buf()))
    }

    pub fn layout(&self) -> SpecLayout {
        self.layout
    }

    /// Names of the groups this document defines.
    pub fn group_names(&self) -> Vec<String> {
        match self.layout {
            SpecLayout::Groups => self
                .document
                .keys()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            SpecLayout::Stacks | SpecLayout::Single => vec![DEFAULT_GROUP.to_string()],
        }
    }

    /// Select a group by name, or `Default` when none is given.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownGroup` if the document has no such group, and
    /// `Error::InvalidSpec` if the group's definition is malformed.
    pub fn group(&self, name: Option<&str>) -> Result<GroupDefinition> {
        let name = name.unwrap_or(DEFAULT_GROUP);

        let mut group = match self.layout {
            SpecLayout::Groups => {
                let body = self.document.get(name).ok_or_else(|| self.unknown_group(name))?;
                serde_yaml::from_value::<GroupDefinition>(body.clone())
                    .map_err(|e| Error::InvalidSpec(format!("group {name}: {e}")))?
            }
            _ if name != DEFAULT_GROUP => return Err(self.unknown_group(name)),
            SpecLayout::Stacks => {
                serde_yaml::from_value::<GroupDefinition>(Value::Mapping(self.document.clone()))
                    .map_err(|e| Error::InvalidSpec(e.to_string()))?
            }
            SpecLayout::Single => {
                let (key, body) = self
                    .document
                    .iter()
                    .next()
                    .ok_or_else(|| Error::InvalidSpec("document is empty".to_string()))?;
                let key = key
                    .as_str()
                    .ok_or_else(|| Error::InvalidSpec("stack name must be a string".to_string()))?;
                let stack = named_definition(key, body.clone()).map_err(Error::InvalidSpec)?;
                GroupDefinition::single(stack)
            }
        };

        group.name = name.to_string();
        group.base_dir = self.base_dir.clone();
        Ok(group)
    }

    fn unknown_group(&self, name: &str) -> Error {
        Error::UnknownGroup {
            name: name.to_string(),
            available: self.group_names(),
        }
    }
}

fn classify(document: &Mapping) -> Result<SpecLayout> {
    let has_default_stacks = document
        .get(DEFAULT_GROUP)
        .and_then(|group| group.get(STACKS_KEY))
        .and_then(Value::as_sequence)
        .is_some_and(|stacks| !stacks.is_empty());
    if has_default_stacks {
        return Ok(SpecLayout::Groups);
    }

    if document.len() == 1 {
        if document.get(STACKS_KEY).is_some_and(Value::is_sequence) {
            return Ok(SpecLayout::Stacks);
        }
        let is_reserved = document
            .keys()
            .any(|k| k.as_str() == Some(DEFAULT_GROUP) || k.as_str() == Some(STACKS_KEY));
        if !is_reserved {
            return Ok(SpecLayout::Single);
        }
    }

    Err(Error::InvalidSpec(
        "document is not in any known layout".to_string(),
    ))
}

impl GroupDefinition {
    fn single(stack: StackDefinition) -> Self {
        GroupDefinition {
            name: DEFAULT_GROUP.to_string(),
            stacks: NonEmpty::new(stack),
            template_bucket: None,
            credential_profile: None,
            region: None,
            poll_interval: default_poll_interval(),
            wait_timeout: default_wait_timeout(),
            base_dir: None,
        }
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            poll_interval: self.poll_interval,
            timeout: self.wait_timeout,
        }
    }

    /// Build the group, namespacing each stack name once as it is attached.
    pub fn into_group(self) -> std::result::Result<StackGroup, GroupError> {
        let mut group = StackGroup::new(&self.name).with_wait_policy(self.wait_policy());
        if let Some(profile) = self.credential_profile {
            group = group.with_profile(profile);
        }
        if let Some(region) = self.region {
            group = group.with_region(region);
        }
        if let Some(bucket) = self.template_bucket {
            group = group.with_template_bucket(bucket);
        }

        for definition in self.stacks {
            group.push(definition.into_stack(self.base_dir.as_deref()))?;
        }

        Ok(group)
    }
}

impl StackDefinition {
    /// Build the stack, expanding `~` and `$VAR` in the template path.
    pub fn into_stack(self, base_dir: Option<&Path>) -> Stack {
        let template_path = expand_template_path(&self.template_path, base_dir);

        let mut stack = Stack::new(self.name, template_path)
            .with_parameters(self.parameters)
            .with_output_checks(self.output_checks)
            .with_tags(self.tags)
            .with_settings(self.settings);
        if let Some(bucket) = self.template_bucket {
            stack = stack.with_template_bucket(bucket);
        }
        stack
    }
}
