//! Lowering contract checks over binding metadata

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::descriptor::{MemberScope, MemberShape};
use crate::metadata::{BindingMetadata, LoweringShape, MemberMetadata, TypeMetadata};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractViolation {
    pub type_name: String,
    pub member: Option<String>,
    pub message: String,
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "{}.{}: {}", self.type_name, member, self.message),
            None => write!(f, "{}: {}", self.type_name, self.message),
        }
    }
}

/// Every violation of the lowering contract found in `metadata`; empty when it holds
pub fn check_metadata(metadata: &BindingMetadata) -> Vec<ContractViolation> {
    let types: FxHashMap<&str, &TypeMetadata> = metadata
        .types
        .iter()
        .map(|t| (t.name.as_str(), t))
        .collect();
    let mut violations = Vec::new();

    let mut seen_types = FxHashSet::default();
    for ty in &metadata.types {
        let mut report = |member: Option<&str>, message: String| {
            violations.push(ContractViolation {
                type_name: ty.name.clone(),
                member: member.map(str::to_string),
                message,
            });
        };

        if !seen_types.insert(ty.name.as_str()) {
            report(None, "type is described more than once".to_string());
        }
        if !ty.erase_construction {
            report(None, "construction must be erased".to_string());
        }
        if let Some(parent) = &ty.parent {
            if !types.contains_key(parent.as_str()) {
                report(None, format!("parent '{}' is not described", parent));
            }
        }

        let lineage = lineage(&types, ty);
        let mut seen_members = FxHashSet::default();
        for member in &ty.members {
            let name = Some(member.name.as_str());
            if !seen_members.insert(member.name.as_str()) {
                report(name, "member is listed more than once".to_string());
            }
            if !lineage.contains(member.owner.as_str()) {
                report(
                    name,
                    format!("owner '{}' is neither the type nor an ancestor", member.owner),
                );
            }
            for message in check_member(member) {
                report(name, message);
            }
        }
    }

    violations
}

fn check_member(member: &MemberMetadata) -> Vec<String> {
    let mut problems = Vec::new();

    if let MemberShape::Attribute { readonly: true } = member.shape {
        if member.lowering.set.is_some() {
            problems.push("read-only attribute carries a setter".to_string());
        }
    }

    let expected = LoweringShape::expected(&member.name, member.scope, member.shape);
    for (op, found, want) in [
        ("get", &member.lowering.get, &expected.get),
        ("set", &member.lowering.set, &expected.set),
        ("call", &member.lowering.call, &expected.call),
    ] {
        if found != want {
            problems.push(format!(
                "{} lowers to {} but must lower to {}",
                op,
                describe(found),
                describe(want)
            ));
        }
    }

    match (member.scope, &member.global_path) {
        (MemberScope::Static, None) => {
            problems.push("static member has no global path".to_string());
        }
        (MemberScope::Static, Some(path)) => {
            let last = path.rsplit('.').next().unwrap_or(path);
            if last != member.name {
                problems.push(format!("global path '{}' does not end in the member name", path));
            }
        }
        (MemberScope::Instance, Some(_)) => {
            problems.push("instance member has a global path".to_string());
        }
        (MemberScope::Instance, None) => {}
    }

    problems
}

/// The type and all its described ancestors
fn lineage<'a>(types: &FxHashMap<&str, &'a TypeMetadata>, ty: &'a TypeMetadata) -> FxHashSet<&'a str> {
    let mut names = FxHashSet::default();
    let mut current = Some(ty);
    while let Some(t) = current {
        if !names.insert(t.name.as_str()) {
            break;
        }
        current = t
            .parent
            .as_deref()
            .and_then(|p| types.get(p).copied());
    }
    names
}

fn describe(pattern: &Option<String>) -> String {
    match pattern {
        Some(p) => format!("'{}'", p),
        None => "nothing".to_string(),
    }
}
