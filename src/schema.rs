//! Schema resolution
//!
//! Turns a parsed [`SchemaFile`] into interfaces with shared member
//! descriptors. Authoring defects (unknown types, inheritance cycles,
//! duplicate or inconsistent members) are reported here as `SchemaError`s.

use std::rc::Rc;

use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::{ExtendedValue, InterfaceDecl, MemberDecl, SchemaFile, TypeRef};
use crate::descriptor::{MemberDescriptor, MemberShape};
use crate::error::BindError;
use crate::lexer::Span;
use crate::parser::Parser;
use crate::registry::MemberRegistry;
use crate::string_dict::StringDict;
use crate::value::{CheapClone, FxIndexMap, JsString, ValueKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: JsString,
    pub kind: ValueKind,
    pub nullable: bool,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<Param>,
    pub returns: ValueKind,
    pub returns_nullable: bool,
}

impl Signature {
    /// Parameter that receives the argument at `position`; the variadic
    /// parameter receives every argument past the fixed ones
    pub fn param_for(&self, position: usize) -> Option<&Param> {
        self.params
            .get(position)
            .or_else(|| self.params.last().filter(|p| p.variadic))
    }
}

#[derive(Debug, Clone)]
pub struct MemberDef {
    pub descriptor: Rc<MemberDescriptor>,
    /// Present for methods
    pub signature: Option<Signature>,
    /// Attribute value may be null
    pub nullable: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct InterfaceDef {
    pub name: JsString,
    pub parent: Option<JsString>,
    /// Name of the host global when this interface describes it (`[Global=window]`)
    pub global: Option<JsString>,
    /// `[Qualifier=Type.member]`: the member static members are reached through
    pub qualifier: Option<(JsString, JsString)>,
    /// Members declared by this interface, in declaration order
    pub members: FxIndexMap<JsString, MemberDef>,
    pub span: Span,
}

impl InterfaceDef {
    pub fn member(&self, name: &str) -> Option<&MemberDef> {
        self.members.get(name)
    }

    pub fn is_global(&self) -> bool {
        self.global.is_some()
    }
}

pub struct Schema {
    interfaces: FxIndexMap<JsString, InterfaceDef>,
    registry: MemberRegistry,
    global: Option<JsString>,
}

impl Schema {
    /// Parse and resolve schema source text
    pub fn parse(source: &str) -> Result<Schema, BindError> {
        let mut dict = StringDict::with_common_strings();
        let file = Parser::new(source, &mut dict).parse_schema()?;
        Self::resolve(&file, dict)
    }

    pub fn resolve(file: &SchemaFile, dict: StringDict) -> Result<Schema, BindError> {
        let mut decls: FxIndexMap<JsString, &InterfaceDecl> = FxIndexMap::default();
        for decl in &file.interfaces {
            if decls.insert(decl.name.name.cheap_clone(), decl).is_some() {
                return Err(error_at(
                    format!("Duplicate interface '{}'", decl.name.name),
                    decl.name.span,
                ));
            }
        }

        for decl in decls.values() {
            if let Some(parent) = &decl.parent {
                if !decls.contains_key(parent.name.as_str()) {
                    return Err(error_at(
                        format!(
                            "Interface '{}' extends unknown interface '{}'",
                            decl.name.name, parent.name
                        ),
                        parent.span,
                    ));
                }
            }
        }

        let order = inheritance_order(&decls)?;

        let mut registry = MemberRegistry::with_dict(dict);
        for decl in &order {
            registry.declare_type(
                decl.name.name.as_str(),
                decl.parent.as_ref().map(|p| p.name.as_str()),
            );
        }

        let mut schema = Schema {
            interfaces: FxIndexMap::default(),
            registry,
            global: None,
        };

        let mut pending = Vec::new();
        for decl in &order {
            schema.declare_interface(decl, &decls, &mut pending)?;
        }
        schema.resolve_qualifiers(pending)?;

        // Keep source order for emitters
        schema
            .interfaces
            .sort_by_cached_key(|name, _| decls.get_index_of(name.as_str()));

        debug!(
            "resolved schema: {} interfaces, {} member ids",
            schema.interfaces.len(),
            schema.registry.len()
        );
        Ok(schema)
    }

    fn declare_interface(
        &mut self,
        decl: &InterfaceDecl,
        decls: &FxIndexMap<JsString, &InterfaceDecl>,
        pending: &mut Vec<(JsString, JsString)>,
    ) -> Result<(), BindError> {
        let name = decl.name.name.cheap_clone();
        let mut global = None;
        let mut qualifier = None;

        for attr in &decl.attributes {
            match (attr.name.name.as_str(), &attr.value) {
                ("Global", Some(ExtendedValue::Identifier(id))) => {
                    if let Some(existing) = &self.global {
                        return Err(error_at(
                            format!(
                                "Only one [Global] interface is allowed ('{}' already is)",
                                existing
                            ),
                            attr.span,
                        ));
                    }
                    global = Some(id.name.cheap_clone());
                    self.global = Some(name.cheap_clone());
                }
                ("Global", _) => {
                    return Err(error_at("[Global] requires a name: [Global=window]", attr.span));
                }
                ("Qualifier", Some(ExtendedValue::Path(ty, member))) => {
                    if !decls.contains_key(ty.name.as_str()) {
                        return Err(error_at(
                            format!("Qualifier refers to unknown interface '{}'", ty.name),
                            ty.span,
                        ));
                    }
                    qualifier = Some((ty.name.cheap_clone(), member.name.cheap_clone()));
                }
                ("Qualifier", _) => {
                    return Err(error_at(
                        "[Qualifier] requires a member path: [Qualifier=Window.history]",
                        attr.span,
                    ));
                }
                (other, _) => {
                    warn!("ignoring unknown extended attribute [{}] on {}", other, name);
                }
            }
        }

        if global.is_some() && qualifier.is_some() {
            return Err(error_at(
                format!("Interface '{}' cannot be both [Global] and [Qualifier]", name),
                decl.span,
            ));
        }

        let mut members: FxIndexMap<JsString, MemberDef> = FxIndexMap::default();
        for member in &decl.members {
            let member_name = member.name().name.cheap_clone();
            if members.contains_key(member_name.as_str()) {
                return Err(error_at(
                    format!("Duplicate member '{}.{}'", name, member_name),
                    member.name().span,
                ));
            }
            if global.is_some() && member.is_static() {
                return Err(error_at(
                    format!(
                        "'static' is redundant in [Global] interface '{}' (member '{}')",
                        name, member_name
                    ),
                    member.span(),
                ));
            }

            let def = self.declare_member(&name, decl, member, decls, global.is_some())?;
            if member.is_static() && qualifier.is_some() {
                pending.push((name.cheap_clone(), member_name.cheap_clone()));
            }
            members.insert(member_name, def);
        }

        self.interfaces.insert(
            name.cheap_clone(),
            InterfaceDef {
                name,
                parent: decl.parent.as_ref().map(|p| p.name.cheap_clone()),
                global,
                qualifier,
                members,
                span: decl.span,
            },
        );
        Ok(())
    }

    fn declare_member(
        &mut self,
        owner: &JsString,
        decl: &InterfaceDecl,
        member: &MemberDecl,
        decls: &FxIndexMap<JsString, &InterfaceDecl>,
        in_global: bool,
    ) -> Result<MemberDef, BindError> {
        let (kind, shape, signature, nullable) = match member {
            MemberDecl::Attribute(attr) => {
                let kind = resolve_kind(&attr.ty, decls)?;
                if kind == ValueKind::Void {
                    return Err(error_at(
                        format!("Attribute '{}.{}' cannot be void", owner, attr.name.name),
                        attr.ty.name.span,
                    ));
                }
                let shape = MemberShape::Attribute {
                    readonly: attr.readonly,
                };
                (kind, shape, None, attr.ty.nullable)
            }
            MemberDecl::Operation(op) => {
                let mut params = Vec::with_capacity(op.params.len());
                for (i, param) in op.params.iter().enumerate() {
                    if param.variadic && i + 1 != op.params.len() {
                        return Err(error_at(
                            format!(
                                "Variadic parameter '{}' of '{}.{}' must be last",
                                param.name.name, owner, op.name.name
                            ),
                            param.span,
                        ));
                    }
                    let kind = resolve_kind(&param.ty, decls)?;
                    if kind == ValueKind::Void {
                        return Err(error_at(
                            format!("Parameter '{}' cannot be void", param.name.name),
                            param.ty.name.span,
                        ));
                    }
                    params.push(Param {
                        name: param.name.name.cheap_clone(),
                        kind,
                        nullable: param.ty.nullable,
                        variadic: param.variadic,
                    });
                }
                let variadic = params.last().is_some_and(|p| p.variadic);
                let arity = if variadic {
                    params.len().saturating_sub(1)
                } else {
                    params.len()
                };
                let returns = resolve_kind(&op.return_type, decls)?;
                let signature = Signature {
                    params,
                    returns: returns.clone(),
                    returns_nullable: op.return_type.nullable,
                };
                let shape = MemberShape::Method { arity, variadic };
                (returns, shape, Some(signature), false)
            }
        };

        let member_name = &member.name().name;
        if let Some(parent) = &decl.parent {
            if let Some((ancestor, inherited)) =
                self.find_member(parent.name.as_str(), member_name.as_str())
            {
                let same_shape = match (inherited.descriptor.shape(), shape) {
                    (MemberShape::Attribute { .. }, MemberShape::Attribute { .. }) => true,
                    (a, b) => a == b,
                };
                if inherited.descriptor.kind() != &kind || !same_shape {
                    return Err(error_at(
                        format!(
                            "'{}.{}' redeclares '{}.{}' with a different type or shape",
                            owner, member_name, ancestor.name, member_name
                        ),
                        member.span(),
                    ));
                }
            }
        }

        let id = self.registry.id(owner.as_str(), member_name.as_str());
        let mut descriptor = MemberDescriptor::new(id, kind, shape);
        if member.is_static() || in_global {
            descriptor = descriptor.into_static();
        }

        Ok(MemberDef {
            descriptor: Rc::new(descriptor),
            signature,
            nullable,
            span: member.span(),
        })
    }

    /// Attach qualifiers to static members, following qualifier chains
    fn resolve_qualifiers(&mut self, pending: Vec<(JsString, JsString)>) -> Result<(), BindError> {
        let mut waiting: FxHashSet<(JsString, JsString)> = pending.iter().cloned().collect();

        while !waiting.is_empty() {
            let mut progressed = false;

            for key in &pending {
                if !waiting.contains(key) {
                    continue;
                }
                let (iface_name, member_name) = key;
                let Some((q_type, q_member)) = self
                    .interfaces
                    .get(iface_name.as_str())
                    .and_then(|i| i.qualifier.clone())
                else {
                    continue;
                };

                let found = self.find_member(q_type.as_str(), q_member.as_str());
                let problem = match found {
                    None => Some("does not name a member".to_string()),
                    Some((_, def)) if def.descriptor.shape().is_method() => {
                        Some("names a method, not an attribute".to_string())
                    }
                    Some((_, def)) => match def.descriptor.kind().object_type() {
                        Some(ty) if self.is_subtype(iface_name.as_str(), ty.as_str()) => None,
                        _ => Some(format!(
                            "has type {}, not '{}'",
                            def.descriptor.kind(),
                            iface_name
                        )),
                    },
                };
                if let Some(problem) = problem {
                    let message = format!(
                        "Qualifier '{}.{}' of '{}' {}",
                        q_type, q_member, iface_name, problem
                    );
                    return Err(match self.interfaces.get(iface_name.as_str()) {
                        Some(iface) => error_at(message, iface.span),
                        None => BindError::schema_error(message),
                    });
                }
                let Some((owner, def)) = found else {
                    continue;
                };
                let (target_key, qualifier) = (
                    (owner.name.cheap_clone(), q_member.cheap_clone()),
                    def.descriptor.cheap_clone(),
                );
                if target_key == *key {
                    return Err(BindError::schema_error(format!(
                        "'{}.{}' cannot qualify itself",
                        iface_name, member_name
                    )));
                }
                if waiting.contains(&target_key) {
                    continue;
                }

                if let Some(def) = self
                    .interfaces
                    .get_mut(iface_name.as_str())
                    .and_then(|i| i.members.get_mut(member_name.as_str()))
                {
                    let descriptor = (*def.descriptor).clone().qualified(qualifier);
                    def.descriptor = Rc::new(descriptor);
                }
                waiting.remove(key);
                progressed = true;
            }

            if !progressed {
                let mut names: Vec<String> =
                    waiting.iter().map(|(i, m)| format!("{}.{}", i, m)).collect();
                names.sort();
                return Err(BindError::schema_error(format!(
                    "Cyclic qualifiers: {}",
                    names.join(", ")
                )));
            }
        }
        Ok(())
    }

    // ============ QUERIES ============

    pub fn interface(&self, name: &str) -> Option<&InterfaceDef> {
        self.interfaces.get(name)
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceDef> {
        self.interfaces.values()
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// The `[Global]` interface, if any
    pub fn global_interface(&self) -> Option<&InterfaceDef> {
        self.global.as_ref().and_then(|g| self.interfaces.get(g.as_str()))
    }

    pub fn registry(&self) -> &MemberRegistry {
        &self.registry
    }

    /// `name` followed by its ancestors, nearest first
    pub fn ancestors(&self, name: &str) -> Vec<&InterfaceDef> {
        let mut chain = Vec::new();
        let mut current = self.interfaces.get(name);
        while let Some(iface) = current {
            // Cycles are rejected during resolution; the bound is belt and braces
            if chain.len() > self.interfaces.len() {
                break;
            }
            chain.push(iface);
            current = iface
                .parent
                .as_ref()
                .and_then(|p| self.interfaces.get(p.as_str()));
        }
        chain
    }

    /// Interfaces that inherit from `name`, excluding `name` itself
    pub fn descendants(&self, name: &str) -> Vec<&InterfaceDef> {
        self.interfaces
            .values()
            .filter(|i| i.name != name && self.is_subtype(i.name.as_str(), name))
            .collect()
    }

    pub fn is_subtype(&self, ty: &str, ancestor: &str) -> bool {
        self.ancestors(ty).iter().any(|i| i.name == ancestor)
    }

    /// Find a member through the inheritance chain, returning the declaring interface
    pub fn find_member(&self, ty: &str, name: &str) -> Option<(&InterfaceDef, &MemberDef)> {
        self.ancestors(ty)
            .into_iter()
            .find_map(|iface| iface.members.get(name).map(|def| (iface, def)))
    }

    pub fn descriptor(&self, ty: &str, name: &str) -> Option<Rc<MemberDescriptor>> {
        self.find_member(ty, name)
            .map(|(_, def)| def.descriptor.cheap_clone())
    }

    /// All members visible on `ty`, nearest declaration first, each name once
    pub fn visible_members(&self, ty: &str) -> Vec<(&InterfaceDef, &MemberDef)> {
        let mut seen = FxHashSet::default();
        let mut members = Vec::new();
        for iface in self.ancestors(ty) {
            for (name, def) in &iface.members {
                if seen.insert(name.cheap_clone()) {
                    members.push((iface, def));
                }
            }
        }
        members
    }
}

fn error_at(message: impl Into<String>, span: Span) -> BindError {
    BindError::schema_error_at(message, span.line, span.column)
}

fn resolve_kind(
    ty: &TypeRef,
    decls: &FxIndexMap<JsString, &InterfaceDecl>,
) -> Result<ValueKind, BindError> {
    let kind = ValueKind::from_type_name(&ty.name.name);
    if let ValueKind::Object(name) = &kind {
        if !decls.contains_key(name.as_str()) {
            return Err(error_at(format!("Unknown type '{}'", name), ty.name.span));
        }
    }
    Ok(kind)
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    InProgress,
    Done,
}

/// Declarations ordered so that every parent precedes its children
fn inheritance_order<'a>(
    decls: &FxIndexMap<JsString, &'a InterfaceDecl>,
) -> Result<Vec<&'a InterfaceDecl>, BindError> {
    let mut state: FxHashMap<JsString, Visit> = FxHashMap::default();
    let mut order = Vec::with_capacity(decls.len());

    for decl in decls.values() {
        let mut path = Vec::new();
        let mut current = Some(*decl);

        // Walk up to the first visited ancestor, then emit the path top-down
        while let Some(d) = current {
            match state.get(d.name.name.as_str()) {
                Some(Visit::Done) => break,
                Some(Visit::InProgress) => {
                    return Err(error_at(
                        format!("Inheritance cycle through '{}'", d.name.name),
                        d.name.span,
                    ));
                }
                None => {}
            }
            state.insert(d.name.name.cheap_clone(), Visit::InProgress);
            path.push(d);
            current = d
                .parent
                .as_ref()
                .and_then(|p| decls.get(p.name.as_str()).copied());
        }

        for d in path.into_iter().rev() {
            state.insert(d.name.name.cheap_clone(), Visit::Done);
            order.push(d);
        }
    }

    Ok(order)
}
