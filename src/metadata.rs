//! Binding metadata
//!
//! A serialisable description of every type and member a schema binds, with
//! the host-side shape each operation lowers to. Consumed by
//! [`check_metadata`](crate::contract::check_metadata) and by external tools.

use serde::{Deserialize, Serialize};

use crate::config::LoweringConfig;
use crate::descriptor::{MemberDescriptor, MemberScope, MemberShape};
use crate::error::BindError;
use crate::schema::Schema;
use crate::value::ValueKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingMetadata {
    pub default_target: Option<String>,
    pub types: Vec<TypeMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    /// Wrapping a host value in this type leaves no trace in lowered output
    pub erase_construction: bool,
    pub members: Vec<MemberMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberMetadata {
    pub name: String,
    /// The type that declared the member
    pub owner: String,
    pub scope: MemberScope,
    pub shape: MemberShape,
    pub value_kind: ValueKind,
    /// Path from the default target for static members, e.g. `history.length`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_path: Option<String>,
    pub lowering: LoweringShape,
}

/// Host-side patterns for each operation: `q` is the receiver, `v` the value,
/// `args...` the positional arguments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoweringShape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call: Option<String>,
}

impl LoweringShape {
    /// The patterns a member with this name, scope and shape lowers to
    pub fn expected(name: &str, scope: MemberScope, shape: MemberShape) -> Self {
        let access = match scope {
            MemberScope::Instance => format!("q.{}", name),
            MemberScope::Static => name.to_string(),
        };
        match shape {
            MemberShape::Attribute { readonly } => Self {
                get: Some(access.clone()),
                set: (!readonly).then(|| format!("{} = v", access)),
                call: None,
            },
            MemberShape::Method { .. } => Self {
                get: None,
                set: None,
                call: Some(format!("{}(args...)", access)),
            },
        }
    }
}

impl MemberMetadata {
    fn from_descriptor(descriptor: &MemberDescriptor) -> Self {
        let name = descriptor.name().to_string();
        let lowering = LoweringShape::expected(&name, descriptor.scope(), descriptor.shape());
        Self {
            owner: descriptor.id().owner().to_string(),
            scope: descriptor.scope(),
            shape: descriptor.shape(),
            value_kind: descriptor.kind().clone(),
            global_path: descriptor.is_static().then(|| descriptor.global_path()),
            lowering,
            name,
        }
    }
}

impl BindingMetadata {
    /// Describe every interface of `schema`, inherited members included
    pub fn from_schema(schema: &Schema, config: &LoweringConfig) -> Self {
        let types = schema
            .interfaces()
            .map(|iface| TypeMetadata {
                name: iface.name.to_string(),
                parent: iface.parent.as_ref().map(|p| p.to_string()),
                global: iface.global.as_ref().map(|g| g.to_string()),
                qualifier: iface
                    .qualifier
                    .as_ref()
                    .map(|(ty, member)| format!("{}.{}", ty, member)),
                erase_construction: true,
                members: schema
                    .visible_members(iface.name.as_str())
                    .into_iter()
                    .map(|(_, def)| MemberMetadata::from_descriptor(&def.descriptor))
                    .collect(),
            })
            .collect();

        Self {
            default_target: config.default_target.clone(),
            types,
        }
    }

    pub fn to_json(&self) -> Result<String, BindError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(source: &str) -> Result<Self, BindError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeMetadata> {
        self.types.iter().find(|t| t.name == name)
    }
}

impl TypeMetadata {
    pub fn member(&self, name: &str) -> Option<&MemberMetadata> {
        self.members.iter().find(|m| m.name == name)
    }
}
