//! Rust emitter
//!
//! Generates typed bindings for a resolved schema: one opaque wrapper per
//! interface, a table of shared member descriptors built once per thread, and
//! one `<Type>Api` trait per interface whose provided methods forward to the
//! descriptors. Each trait is implemented for its interface and every
//! descendant, so inherited members are available without overriding.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::descriptor::{MemberDescriptor, MemberShape};
use crate::registry::MemberId;
use crate::schema::{InterfaceDef, MemberDef, Schema};
use crate::value::{CheapClone, JsString, ValueKind};

/// Provided methods of `Opaque`; generated methods must not shadow them
const OPAQUE_METHODS: &[&str] = &[
    "wrap",
    "cast",
    "get",
    "get_as",
    "set",
    "call",
    "host",
    "into_host",
    "from_host",
    "instance_of",
    "class_object",
];

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe",
    "unsized", "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers
const RESERVED: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Generate the Rust binding module for `schema`
pub fn generate_rust(schema: &Schema) -> String {
    let mut emitter = RustGen {
        schema,
        out: String::new(),
    };
    emitter.emit();
    emitter.out
}

struct RustGen<'s> {
    schema: &'s Schema,
    out: String,
}

impl RustGen<'_> {
    fn line(&mut self, indent: usize, text: &str) {
        for _ in 0..indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn emit(&mut self) {
        self.line(0, "// Generated by hostbind. Do not edit.");
        self.line(0, "#![allow(dead_code, unused_imports, clippy::upper_case_acronyms)]");
        self.blank();
        self.line(0, "use std::rc::Rc;");
        self.blank();
        self.line(
            0,
            "use hostbind::{Arg, Expr, HostArg, MemberDescriptor, MemberId, MemberShape, Opaque, ValueKind};",
        );
        self.blank();

        let schema = self.schema;
        for iface in schema.interfaces() {
            self.emit_wrapper(iface);
        }
        self.emit_members_table();
        for iface in schema.interfaces() {
            self.emit_statics(iface);
            self.emit_api_trait(iface);
        }
    }

    fn emit_wrapper(&mut self, iface: &InterfaceDef) {
        let header = match &iface.parent {
            Some(parent) => format!("/// Host interface `{}` (extends `{}`)", iface.name, parent),
            None => format!("/// Host interface `{}`", iface.name),
        };
        self.line(0, "hostbind::opaque_type!(");
        self.line(1, &header);
        self.line(1, iface.name.as_str());
        self.line(0, ");");
        self.blank();
    }

    // ============ DESCRIPTOR TABLE ============

    fn emit_members_table(&mut self) {
        let schema = self.schema;

        self.line(0, "/// Shared member descriptors, built once per thread");
        self.line(0, "pub struct Members {");
        for iface in schema.interfaces() {
            self.line(
                1,
                &format!(
                    "pub {}: {}Members,",
                    field_name(iface.name.as_str()),
                    iface.name
                ),
            );
        }
        self.line(0, "}");
        self.blank();

        for iface in schema.interfaces() {
            self.line(0, &format!("pub struct {}Members {{", iface.name));
            for (name, _) in own_members(iface) {
                self.line(
                    1,
                    &format!("pub {}: Rc<MemberDescriptor>,", field_name(name.as_str())),
                );
            }
            self.line(0, "}");
            self.blank();
        }

        self.line(0, "impl Members {");
        self.line(1, "fn new() -> Self {");
        for def in construction_order(schema) {
            self.emit_descriptor(&def.descriptor);
        }
        self.line(2, "Self {");
        for iface in schema.interfaces() {
            self.line(
                3,
                &format!(
                    "{}: {}Members {{",
                    field_name(iface.name.as_str()),
                    iface.name
                ),
            );
            for (name, def) in own_members(iface) {
                self.line(
                    4,
                    &format!(
                        "{}: {},",
                        field_name(name.as_str()),
                        local_name(def.descriptor.id())
                    ),
                );
            }
            self.line(3, "},");
        }
        self.line(2, "}");
        self.line(1, "}");
        self.line(0, "}");
        self.blank();

        self.line(0, "thread_local! {");
        self.line(1, "static MEMBERS: Rc<Members> = Rc::new(Members::new());");
        self.line(0, "}");
        self.blank();
        self.line(0, "/// The descriptor table for the current thread");
        self.line(0, "pub fn members() -> Rc<Members> {");
        self.line(1, "MEMBERS.with(Rc::clone)");
        self.line(0, "}");
        self.blank();
    }

    fn emit_descriptor(&mut self, descriptor: &MemberDescriptor) {
        let id = descriptor.id();
        let args = format!(
            "MemberId::new({:?}.into(), {:?}.into()), {}, {}",
            id.owner().as_str(),
            id.name().as_str(),
            kind_literal(descriptor.kind()),
            shape_literal(descriptor.shape())
        );
        let constructor = match descriptor.qualifier() {
            Some(qualifier) => {
                let base = format!(
                    "MemberDescriptor::instance(Some(Rc::clone(&{})), {})",
                    local_name(qualifier.id()),
                    args
                );
                if descriptor.is_static() {
                    format!("{}.into_static()", base)
                } else {
                    base
                }
            }
            None if descriptor.is_static() => format!("MemberDescriptor::global({})", args),
            None => format!("MemberDescriptor::new({})", args),
        };
        self.line(
            2,
            &format!("let {} = Rc::new({});", local_name(id), constructor),
        );
    }

    // ============ ACCESSORS ============

    /// Static members become associated functions of the wrapper
    fn emit_statics(&mut self, iface: &InterfaceDef) {
        let statics: Vec<_> = own_members(iface)
            .filter(|(_, def)| def.descriptor.is_static())
            .collect();
        if statics.is_empty() {
            return;
        }

        self.line(0, &format!("impl {} {{", iface.name));
        for (name, def) in statics {
            let table = format!(
                "members().{}.{}",
                field_name(iface.name.as_str()),
                field_name(name.as_str())
            );
            self.emit_accessor(iface, name, def, &table, false);
        }
        self.line(0, "}");
        self.blank();
    }

    fn emit_api_trait(&mut self, iface: &InterfaceDef) {
        let supertrait = match &iface.parent {
            Some(parent) => format!("{}Api", parent),
            None => "Opaque".to_string(),
        };
        self.line(
            0,
            &format!("/// Members of `{}`, available on every descendant", iface.name),
        );
        self.line(
            0,
            &format!("pub trait {}Api: {} {{", iface.name, supertrait),
        );
        let instance: Vec<_> = own_members(iface)
            .filter(|(_, def)| !def.descriptor.is_static())
            .collect();
        for (name, def) in instance {
            let table = format!(
                "members().{}.{}",
                field_name(iface.name.as_str()),
                field_name(name.as_str())
            );
            self.emit_accessor(iface, name, def, &table, true);
        }
        self.line(0, "}");
        self.blank();

        let schema = self.schema;
        self.line(0, &format!("impl {}Api for {} {{}}", iface.name, iface.name));
        for descendant in schema.descendants(iface.name.as_str()) {
            self.line(
                0,
                &format!("impl {}Api for {} {{}}", iface.name, descendant.name),
            );
        }
        self.blank();
    }

    fn emit_accessor(
        &mut self,
        iface: &InterfaceDef,
        name: &JsString,
        def: &MemberDef,
        table: &str,
        instance: bool,
    ) {
        let descriptor = &def.descriptor;
        let method = method_name(name.as_str());
        let (receiver, prefix) = if instance {
            ("&self, ", "self.")
        } else {
            ("", "")
        };
        let receiver_only = receiver.trim_end_matches(", ");
        let vis = if instance { "" } else { "pub " };

        match descriptor.shape() {
            MemberShape::Attribute { readonly } => {
                let (ret, body) = match (descriptor.kind().object_type(), instance) {
                    (Some(ty), true) => (ty.to_string(), format!("self.get_as(&{})", table)),
                    (Some(ty), false) => (
                        ty.to_string(),
                        format!("{}::from_host({}.with_global())", ty, table),
                    ),
                    (None, true) => ("Expr".to_string(), format!("self.get(&{})", table)),
                    (None, false) => ("Expr".to_string(), format!("{}.with_global()", table)),
                };
                self.line(
                    1,
                    &format!("/// `{}.{}`: {}", iface.name, name, descriptor.kind()),
                );
                self.line(
                    1,
                    &format!("{}fn {}({}) -> {} {{", vis, method, receiver_only, ret),
                );
                self.line(2, &body);
                self.line(1, "}");

                if !readonly {
                    let (param, value) = value_param(descriptor.kind(), "value");
                    let body = if instance {
                        format!("self.set(&{}, {})", table, value)
                    } else {
                        format!("{}.assign_global({})", table, value)
                    };
                    self.blank();
                    self.line(
                        1,
                        &format!(
                            "{}fn {}({}{}) -> Expr {{",
                            vis,
                            method_name(&format!("set_{}", snake_case(name.as_str()))),
                            receiver,
                            param
                        ),
                    );
                    self.line(2, &body);
                    self.line(1, "}");
                }
            }
            MemberShape::Method { .. } => {
                let mut params = Vec::new();
                let mut args = Vec::new();
                if let Some(signature) = &def.signature {
                    for param in &signature.params {
                        let param_name = field_name(param.name.as_str());
                        if param.variadic {
                            params.push(format!("{}: Vec<Expr>", param_name));
                            args.push(format!("Arg::Variadic({})", param_name));
                        } else {
                            let (decl, value) = value_param(&param.kind, &param_name);
                            params.push(decl);
                            args.push(format!("Arg::Value({})", value));
                        }
                    }
                }
                let call = if instance {
                    format!("{}call(&{}, vec![{}])", prefix, table, args.join(", "))
                } else {
                    format!("{}.call_global(vec![{}])", table, args.join(", "))
                };
                let (ret, body) = match descriptor.kind().object_type() {
                    Some(ty) => (ty.to_string(), format!("{}::from_host({})", ty, call)),
                    None => ("Expr".to_string(), call),
                };
                let mut signature = params.join(", ");
                if instance {
                    signature = if signature.is_empty() {
                        "&self".to_string()
                    } else {
                        format!("&self, {}", signature)
                    };
                }
                self.line(
                    1,
                    &format!("/// `{}.{}(..)` returning {}", iface.name, name, descriptor.kind()),
                );
                self.line(
                    1,
                    &format!("{}fn {}({}) -> {} {{", vis, method, signature, ret),
                );
                self.line(2, &body);
                self.line(1, "}");
            }
        }
        self.blank();
    }
}

/// Own members of every interface, each after the descriptor that qualifies it
fn construction_order(schema: &Schema) -> Vec<&MemberDef> {
    let mut queue: VecDeque<&MemberDef> = schema
        .interfaces()
        .flat_map(|iface| own_members(iface).map(|(_, def)| def))
        .collect();
    let mut built: FxHashSet<MemberId> = FxHashSet::default();
    let mut order = Vec::with_capacity(queue.len());

    // Qualifier chains are acyclic after resolution; the stall counter only guards the loop
    let mut stalled = 0;
    while let Some(def) = queue.pop_front() {
        let ready = def
            .descriptor
            .qualifier()
            .is_none_or(|q| built.contains(q.id()));
        if ready {
            built.insert(def.descriptor.id().cheap_clone());
            order.push(def);
            stalled = 0;
        } else {
            queue.push_back(def);
            stalled += 1;
            if stalled > queue.len() {
                break;
            }
        }
    }
    order
}

/// Members declared by `iface` itself; redeclarations of inherited members
/// share the ancestor's descriptor and are emitted there
fn own_members(iface: &InterfaceDef) -> impl Iterator<Item = (&JsString, &MemberDef)> {
    iface
        .members
        .iter()
        .filter(move |(_, def)| def.descriptor.id().owner() == &iface.name)
}

/// Parameter declaration and the expression that turns it into an `Expr`
fn value_param(kind: &ValueKind, name: &str) -> (String, String) {
    if kind.is_object() {
        (
            format!("{}: impl Into<HostArg>", name),
            format!("Into::<HostArg>::into({}).0", name),
        )
    } else {
        (
            format!("{}: impl Into<Expr>", name),
            format!("Into::<Expr>::into({})", name),
        )
    }
}

fn kind_literal(kind: &ValueKind) -> String {
    match kind {
        ValueKind::String => "ValueKind::String".to_string(),
        ValueKind::Number => "ValueKind::Number".to_string(),
        ValueKind::Boolean => "ValueKind::Boolean".to_string(),
        ValueKind::Object(name) => format!("ValueKind::Object({:?}.into())", name.as_str()),
        ValueKind::Function => "ValueKind::Function".to_string(),
        ValueKind::TypedArray(name) => {
            format!("ValueKind::TypedArray({:?}.into())", name.as_str())
        }
        ValueKind::Any => "ValueKind::Any".to_string(),
        ValueKind::Void => "ValueKind::Void".to_string(),
    }
}

fn shape_literal(shape: MemberShape) -> String {
    match shape {
        MemberShape::Attribute { readonly } => {
            format!("MemberShape::Attribute {{ readonly: {} }}", readonly)
        }
        MemberShape::Method { arity, variadic } => format!(
            "MemberShape::Method {{ arity: {}, variadic: {} }}",
            arity, variadic
        ),
    }
}

/// Local variable holding a descriptor while the table is built
fn local_name(id: &MemberId) -> String {
    format!(
        "{}_{}",
        snake_case(id.owner().as_str()),
        snake_case(id.name().as_str())
    )
}

/// `cssRules` → `css_rules`, `HTMLElement` → `html_element`
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && i > 0 {
            let prev = chars.get(i - 1).copied().unwrap_or('_');
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev != '_' && (prev.is_lowercase() || next_lower) {
                out.push('_');
            }
        }
        out.extend(ch.to_lowercase());
    }
    out
}

/// Snake-cased and escaped for use as a field, parameter or local
pub fn field_name(name: &str) -> String {
    escape(snake_case(name))
}

/// Like [`field_name`], also avoiding the provided methods of `Opaque`
fn method_name(name: &str) -> String {
    let snake = snake_case(name);
    if OPAQUE_METHODS.contains(&snake.as_str()) {
        format!("{}_", snake)
    } else {
        escape(snake)
    }
}

fn escape(name: String) -> String {
    if RESERVED.contains(&name.as_str()) {
        format!("{}_", name)
    } else if RUST_KEYWORDS.contains(&name.as_str()) {
        format!("r#{}", name)
    } else {
        name
    }
}
