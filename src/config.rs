//! Lowering configuration
//!
//! Loaded from a JSON file (`hostbind.json`) where every field is optional.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BindError;

/// How `value instanceof T` is lowered for an opaque `T`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceOfPolicy {
    /// Hard translation error
    Reject,
    /// Unconditionally `true`. An operand other than a reference or literal
    /// is still evaluated once, since property reads may run getters.
    #[default]
    AlwaysTrue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoweringConfig {
    /// Object that unqualified static members are read from. `None` emits bare names.
    pub default_target: Option<String>,
    /// Prefix that binding expressions may put in front of schema type names
    pub type_prefix: String,
    pub instanceof: InstanceOfPolicy,
}

impl Default for LoweringConfig {
    fn default() -> Self {
        Self {
            default_target: Some("window".to_string()),
            type_prefix: "Js".to_string(),
            instanceof: InstanceOfPolicy::default(),
        }
    }
}

impl LoweringConfig {
    pub fn from_json(source: &str) -> Result<Self, BindError> {
        let config: LoweringConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, BindError> {
        let source = fs::read_to_string(path)?;
        Self::from_json(&source)
            .map_err(|e| BindError::config_error(format!("{}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> Result<(), BindError> {
        if let Some(target) = &self.default_target {
            let valid = !target.is_empty()
                && target
                    .split('.')
                    .all(|part| !part.is_empty() && part.chars().all(is_name_char));
            if !valid {
                return Err(BindError::config_error(format!(
                    "default_target '{}' is not a dotted identifier path",
                    target
                )));
            }
        }
        Ok(())
    }

    /// Schema name for a type name written in a binding expression
    pub fn strip_prefix<'a>(&self, name: &'a str) -> Option<&'a str> {
        if self.type_prefix.is_empty() {
            return None;
        }
        name.strip_prefix(self.type_prefix.as_str())
            .filter(|rest| !rest.is_empty())
    }
}

fn is_name_char(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphanumeric()
}
