//! Tests for schema resolution
//!
//! Resolution builds shared descriptors and rejects authoring defects with a SchemaError.

use hostbind::{BindError, MemberScope, MemberShape, Schema, ValueKind};

const DOM: &str = include_str!("../schemas/dom.idl");

#[allow(clippy::unwrap_used)]
fn schema(source: &str) -> Schema {
    Schema::parse(source).unwrap()
}

fn schema_error(source: &str) -> String {
    match Schema::parse(source) {
        Ok(_) => panic!("expected a schema error"),
        Err(BindError::SchemaError { message, .. }) => message,
        Err(other) => panic!("expected a schema error, got {}", other),
    }
}

#[test]
fn test_shipped_schema_resolves() {
    let dom = schema(DOM);
    for name in [
        "Window",
        "History",
        "Location",
        "Node",
        "Element",
        "HTMLElement",
        "HTMLFormElement",
        "HTMLSelectElement",
        "StyleSheet",
        "CSSStyleSheet",
        "CSSRuleList",
        "CSSRule",
        "Event",
        "UIEvent",
        "MouseEvent",
        "CanvasRenderingContext2D",
    ] {
        assert!(dom.interface(name).is_some(), "missing {}", name);
    }
    assert_eq!(
        dom.global_interface().map(|i| i.name.as_str()),
        Some("Window")
    );
}

#[test]
fn test_interfaces_keep_source_order() {
    let s = schema("interface B : A {}; interface A {};");
    let names: Vec<_> = s.interfaces().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["B", "A"]);
}

#[test]
fn test_inherited_members_share_descriptor_identity() {
    let dom = schema(DOM);
    let on_form = dom.descriptor("HTMLFormElement", "title");
    let on_element = dom.descriptor("HTMLElement", "title");
    assert!(on_form.is_some());
    assert_eq!(on_form, on_element);
    assert_eq!(
        on_form.map(|d| d.id().owner().to_string()),
        Some("HTMLElement".to_string())
    );
}

#[test]
fn test_registry_canonicalises_through_inheritance() {
    let dom = schema(DOM);
    let sheet_href = dom.registry().lookup("StyleSheet", "href").cloned();
    let css_href = dom.registry().lookup("CSSStyleSheet", "href").cloned();
    assert!(sheet_href.is_some());
    assert_eq!(sheet_href, css_href);
}

#[test]
fn test_ancestors_and_descendants() {
    let dom = schema(DOM);
    let chain: Vec<_> = dom
        .ancestors("MouseEvent")
        .into_iter()
        .map(|i| i.name.as_str())
        .collect();
    assert_eq!(chain, vec!["MouseEvent", "UIEvent", "Event"]);

    let mut below: Vec<_> = dom
        .descendants("Element")
        .into_iter()
        .map(|i| i.name.as_str())
        .collect();
    below.sort();
    assert_eq!(below, vec!["HTMLElement", "HTMLFormElement", "HTMLSelectElement"]);

    assert!(dom.is_subtype("HTMLSelectElement", "Node"));
    assert!(!dom.is_subtype("Node", "Element"));
}

#[test]
fn test_member_kinds_and_shapes() {
    let dom = schema(DOM);

    let rules = dom.descriptor("CSSStyleSheet", "cssRules");
    assert_eq!(
        rules.as_ref().map(|d| d.kind().clone()),
        Some(ValueKind::Object("CSSRuleList".into()))
    );

    let insert = dom.descriptor("CSSStyleSheet", "insertRule");
    assert_eq!(
        insert.map(|d| d.shape()),
        Some(MemberShape::Method {
            arity: 2,
            variadic: false
        })
    );

    let append = dom.descriptor("HTMLElement", "append");
    assert_eq!(
        append.map(|d| d.shape()),
        Some(MemberShape::Method {
            arity: 0,
            variadic: true
        })
    );

    let disabled = dom.descriptor("StyleSheet", "disabled");
    assert_eq!(
        disabled.map(|d| d.shape()),
        Some(MemberShape::Attribute { readonly: false })
    );
}

#[test]
fn test_signatures_record_nullability() {
    let dom = schema(DOM);
    let (_, def) = dom
        .find_member("History", "pushState")
        .unwrap_or_else(|| panic!("pushState missing"));
    let signature = def.signature.as_ref().unwrap_or_else(|| panic!("no signature"));
    let url = &signature.params[2];
    assert_eq!(url.name, "url");
    assert!(url.nullable);

    let (_, href) = dom
        .find_member("StyleSheet", "href")
        .unwrap_or_else(|| panic!("href missing"));
    assert!(href.nullable);
    assert!(href.signature.is_none());
}

#[test]
fn test_global_members_are_static() {
    let dom = schema(DOM);
    let history = dom.descriptor("Window", "history");
    assert_eq!(history.map(|d| d.scope()), Some(MemberScope::Static));
    assert_eq!(
        dom.global_interface().map(|w| w.name.as_str()),
        Some("Window")
    );
    assert!(dom.interface("Window").is_some_and(|w| w.is_global()));
    assert!(!dom.interface("Node").is_some_and(|n| n.is_global()));
}

#[test]
fn test_registry_lists_own_members_in_order() {
    let dom = schema(DOM);
    let names: Vec<&str> = dom
        .registry()
        .declared_by("CSSStyleSheet")
        .map(|id| id.name().as_str())
        .collect();
    assert_eq!(names, ["ownerRule", "cssRules", "insertRule", "deleteRule"]);
}

#[test]
fn test_qualified_statics() {
    let dom = schema(DOM);
    let length = dom.descriptor("History", "length");
    assert_eq!(
        length.as_ref().map(|d| d.global_path()),
        Some("history.length".to_string())
    );
    assert_eq!(
        length
            .as_ref()
            .and_then(|d| d.qualifier())
            .map(|q| q.id().to_string()),
        Some("Window.history".to_string())
    );
}

#[test]
fn test_qualifier_chains_resolve_in_any_order() {
    let s = schema(
        "[Qualifier=B.inner] interface C { static readonly attribute number value; };
         [Qualifier=Top.b] interface B { static readonly attribute C inner; };
         [Global=self] interface Top { readonly attribute B b; };",
    );
    let value = s.descriptor("C", "value");
    assert_eq!(
        value.map(|d| d.global_path()),
        Some("b.inner.value".to_string())
    );
}

#[test]
fn test_duplicate_interface() {
    let message = schema_error("interface A {}; interface A {};");
    assert!(message.contains("Duplicate interface"), "{}", message);
}

#[test]
fn test_unknown_parent() {
    let message = schema_error("interface A : Missing {};");
    assert!(message.contains("unknown interface 'Missing'"), "{}", message);
}

#[test]
fn test_unknown_type() {
    let message = schema_error("interface A { readonly attribute Missing m; };");
    assert!(message.contains("Unknown type 'Missing'"), "{}", message);
}

#[test]
fn test_inheritance_cycle() {
    let message = schema_error("interface A : B {}; interface B : C {}; interface C : A {};");
    assert!(message.contains("Inheritance cycle"), "{}", message);
}

#[test]
fn test_duplicate_member() {
    let message = schema_error(
        "interface A { readonly attribute number x; void x(); };",
    );
    assert!(message.contains("Duplicate member 'A.x'"), "{}", message);
}

#[test]
fn test_inconsistent_redeclaration() {
    let message = schema_error(
        "interface A { readonly attribute number x; };
         interface B : A { readonly attribute string x; };",
    );
    assert!(message.contains("redeclares 'A.x'"), "{}", message);

    let message = schema_error(
        "interface A { void f(number a); };
         interface B : A { void f(number a, number b); };",
    );
    assert!(message.contains("redeclares 'A.f'"), "{}", message);
}

#[test]
fn test_consistent_redeclaration_is_allowed() {
    let s = schema(
        "interface A { readonly attribute number x; };
         interface B : A { attribute number x; };",
    );
    let on_b = s.descriptor("B", "x");
    assert_eq!(
        on_b.as_ref().map(|d| d.id().clone()),
        s.descriptor("A", "x").map(|d| d.id().clone())
    );
    assert_eq!(
        on_b.map(|d| d.shape()),
        Some(MemberShape::Attribute { readonly: false })
    );
}

#[test]
fn test_variadic_must_be_last() {
    let message = schema_error("interface A { void f(any... rest, number n); };");
    assert!(message.contains("must be last"), "{}", message);
}

#[test]
fn test_unknown_qualifier() {
    let message = schema_error(
        "[Global=window] interface Window {};
         [Qualifier=Window.missing] interface H { static void go(); };",
    );
    assert!(message.contains("does not name a member"), "{}", message);

    let message = schema_error("[Qualifier=Nope.x] interface H {};");
    assert!(message.contains("unknown interface 'Nope'"), "{}", message);
}

#[test]
fn test_qualifier_must_be_an_attribute_of_the_type() {
    let message = schema_error(
        "[Global=window] interface Window { void alert(string m); };
         [Qualifier=Window.alert] interface H { static readonly attribute number y; };",
    );
    assert!(message.contains("names a method, not an attribute"), "{}", message);

    let message = schema_error(
        "[Global=window] interface Window { readonly attribute number innerWidth; };
         [Qualifier=Window.innerWidth] interface H { static readonly attribute number y; };",
    );
    assert!(message.contains("has type number, not 'H'"), "{}", message);

    let message = schema_error(
        "interface Other {};
         [Global=window] interface Window { readonly attribute Other other; };
         [Qualifier=Window.other] interface H { static readonly attribute number y; };",
    );
    assert!(message.contains("has type Other, not 'H'"), "{}", message);
}

#[test]
fn test_qualifier_may_have_an_ancestor_type() {
    let s = schema(
        "interface Base {};
         [Global=window] interface Window { readonly attribute Base current; };
         [Qualifier=Window.current] interface Derived : Base {
             static readonly attribute number depth;
         };",
    );
    assert_eq!(
        s.descriptor("Derived", "depth").map(|d| d.global_path()),
        Some("current.depth".to_string())
    );
}

#[test]
fn test_cyclic_qualifiers() {
    let message = schema_error(
        "[Qualifier=B.y] interface A { static readonly attribute B x; };
         [Qualifier=A.x] interface B { static readonly attribute A y; };",
    );
    assert!(message.contains("Cyclic qualifiers"), "{}", message);
}

#[test]
fn test_static_inside_global() {
    let message = schema_error("[Global=window] interface Window { static void f(); };");
    assert!(message.contains("[Global]"), "{}", message);
}

#[test]
fn test_single_global() {
    let message = schema_error("[Global=a] interface A {}; [Global=b] interface B {};");
    assert!(message.contains("Only one [Global]"), "{}", message);
}

#[test]
fn test_void_attribute() {
    let message = schema_error("interface A { readonly attribute void x; };");
    assert!(message.contains("cannot be void"), "{}", message);
}

#[test]
fn test_schema_error_carries_location() {
    match Schema::parse("interface A {\n  readonly attribute Missing m;\n};") {
        Err(BindError::SchemaError {
            location: Some(location),
            ..
        }) => assert_eq!(location.line, 2),
        other => panic!("unexpected result: {:?}", other.err()),
    }
}

#[test]
fn test_unknown_extended_attribute_is_ignored() {
    let s = schema("[Exposed=Window] interface A {};");
    assert!(s.interface("A").is_some());
}

#[test]
fn test_visible_members_prefer_nearest() {
    let s = schema(
        "interface A { readonly attribute number x; readonly attribute number y; };
         interface B : A { attribute number x; void z(); };",
    );
    let names: Vec<_> = s
        .visible_members("B")
        .into_iter()
        .map(|(iface, def)| format!("{}:{}", iface.name, def.descriptor.name()))
        .collect();
    assert_eq!(names, vec!["B:x", "B:z", "A:y"]);
}
