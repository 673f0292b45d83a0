//! Tests for the lowering contract
//!
//! Typed operations lower to plain host operations: wrappers vanish, member
//! reads are single property reads, calls keep their argument order.

use hostbind::{
    Arg, BindError, Bindings, Expr, InstanceOfPolicy, LoweringConfig, Opaque, Schema, opaque_type,
    to_js,
};

const DOM: &str = include_str!("../schemas/dom.idl");

opaque_type!(CSSStyleSheet);
opaque_type!(Node);

#[allow(clippy::unwrap_used)]
fn dom() -> Bindings {
    Bindings::from_source(DOM).unwrap()
}

#[allow(clippy::unwrap_used)]
fn dom_with(config: LoweringConfig) -> Bindings {
    Bindings::with_config(DOM, config).unwrap()
}

#[allow(clippy::unwrap_used)]
fn lower(bindings: &Bindings, source: &str) -> String {
    bindings.lower(source).unwrap()
}

#[test]
fn test_with_host_lowers_to_property_read() {
    assert_eq!(lower(&dom(), "JsCSSStyleSheet.href.with(sheet)"), "sheet.href");
}

#[test]
fn test_method_call_is_unchanged() {
    let source = r#"styleSheet.insertRule("body{color:red}", 0)"#;
    assert_eq!(lower(&dom(), source), source);
}

#[test]
fn test_typed_method_call_is_unchanged() {
    let bindings = dom();
    let mut translator = bindings.translator();
    translator
        .bind("styleSheet", "CSSStyleSheet")
        .unwrap_or_else(|e| panic!("{}", e));
    let source = r#"styleSheet.insertRule("body{color:red}", 0)"#;
    let typed = translator
        .translate_source(source)
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(
        to_js(&typed.expr, bindings.config()).ok().as_deref(),
        Some(source)
    );
}

#[test]
fn test_qualified_static_uses_default_target() {
    assert_eq!(lower(&dom(), "JsHistory.length.with()"), "window.history.length");
    assert_eq!(lower(&dom(), "JsHistory.length"), "window.history.length");
    assert_eq!(lower(&dom(), "JsHistory.go(-1)"), "window.history.go(-1)");
}

#[test]
fn test_global_members() {
    assert_eq!(lower(&dom(), "JsWindow.innerWidth"), "window.innerWidth");
    assert_eq!(
        lower(&dom(), r#"JsWindow.alert("hi")"#),
        r#"window.alert("hi")"#
    );
}

#[test]
fn test_custom_and_absent_default_target() {
    let bare = dom_with(LoweringConfig {
        default_target: None,
        ..LoweringConfig::default()
    });
    assert_eq!(lower(&bare, "JsHistory.length.with()"), "history.length");
    assert_eq!(lower(&bare, "JsWindow.innerWidth"), "innerWidth");

    let worker = dom_with(LoweringConfig {
        default_target: Some("self".to_string()),
        ..LoweringConfig::default()
    });
    assert_eq!(lower(&worker, "JsWindow.innerWidth"), "self.innerWidth");
}

#[test]
fn test_static_assignment() {
    assert_eq!(
        lower(&dom(), r#"JsLocation.href = "/home""#),
        r#"window.location.href = "/home""#
    );
}

#[test]
fn test_wrapper_construction_is_erased() {
    let bindings = dom();
    assert_eq!(lower(&bindings, "new JsNode(x)"), lower(&bindings, "x"));
    assert_eq!(
        lower(&bindings, "new JsCSSStyleSheet(new JsStyleSheet(s)).cssRules"),
        "s.cssRules"
    );
}

#[test]
fn test_n_arguments_in_order() {
    let bindings = dom();
    let mut translator = bindings.translator();
    translator
        .bind("ctx", "CanvasRenderingContext2D")
        .unwrap_or_else(|e| panic!("{}", e));
    let typed = translator
        .translate_source("ctx.setTransform(1, 2, 3, 4, 5, 6)")
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(
        to_js(&typed.expr, bindings.config()).ok().as_deref(),
        Some("ctx.setTransform(1, 2, 3, 4, 5, 6)")
    );
}

#[test]
fn test_variadic_arguments_expand_in_place() {
    let bindings = dom();
    let mut translator = bindings.translator();
    translator
        .bind("ctx", "CanvasRenderingContext2D")
        .unwrap_or_else(|e| panic!("{}", e));
    translator
        .bind("el", "HTMLElement")
        .unwrap_or_else(|e| panic!("{}", e));

    for (source, expected) in [
        ("ctx.setLineDash(4, 2, 1)", "ctx.setLineDash(4, 2, 1)"),
        ("ctx.setLineDash()", "ctx.setLineDash()"),
        (r#"el.append("a", "b")"#, r#"el.append("a", "b")"#),
    ] {
        let typed = translator
            .translate_source(source)
            .unwrap_or_else(|e| panic!("{}: {}", source, e));
        assert_eq!(
            to_js(&typed.expr, bindings.config()).ok().as_deref(),
            Some(expected)
        );
    }
}

#[test]
fn test_lowering_is_idempotent() {
    let bindings = dom();
    let expr = bindings
        .translate("JsCSSStyleSheet.cssRules.with(sheet).item(0)")
        .unwrap_or_else(|e| panic!("{}", e));
    let first = to_js(&expr, bindings.config()).ok();
    let second = to_js(&expr, bindings.config()).ok();
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn test_class_object_is_rejected() {
    let bindings = dom();
    let expr = bindings
        .translate("JsNode.class")
        .unwrap_or_else(|e| panic!("{}", e));
    assert!(matches!(
        to_js(&expr, bindings.config()),
        Err(BindError::TranslationError { .. })
    ));
    assert!(matches!(
        to_js(&Node::class_object(), bindings.config()),
        Err(BindError::TranslationError { .. })
    ));
}

#[test]
fn test_instanceof_always_true() {
    let bindings = dom();
    assert_eq!(lower(&bindings, "x instanceof JsNode"), "true");
    // Getters and calls may have effects, so the operand is kept
    assert_eq!(
        lower(&bindings, "x.parentNode instanceof JsNode"),
        "(x.parentNode, true)"
    );
    assert_eq!(
        lower(&bindings, "x.cloneNode(true) instanceof JsNode"),
        "(x.cloneNode(true), true)"
    );
}

#[test]
fn test_instanceof_reject() {
    let bindings = dom_with(LoweringConfig {
        instanceof: InstanceOfPolicy::Reject,
        ..LoweringConfig::default()
    });
    assert!(matches!(
        bindings.lower("x instanceof JsNode"),
        Err(BindError::TranslationError { .. })
    ));
}

#[test]
fn test_wrappers_lower_through_descriptors() {
    let schema = Schema::parse(DOM).unwrap_or_else(|e| panic!("{}", e));
    let config = LoweringConfig::default();
    let href = schema
        .descriptor("CSSStyleSheet", "href")
        .unwrap_or_else(|| panic!("href missing"));
    let insert = schema
        .descriptor("CSSStyleSheet", "insertRule")
        .unwrap_or_else(|| panic!("insertRule missing"));

    let sheet = CSSStyleSheet::wrap(Expr::ident("sheet"));
    assert_eq!(
        to_js(&sheet.get(&href), &config).ok().as_deref(),
        Some("sheet.href")
    );
    assert_eq!(
        to_js(&href.with(&sheet), &config).ok().as_deref(),
        Some("sheet.href")
    );

    let call = sheet.call(
        &insert,
        vec![
            Arg::Value(Expr::string("body{color:red}")),
            Arg::Value(Expr::number(0.0)),
        ],
    );
    assert_eq!(
        to_js(&call, &config).ok().as_deref(),
        Some(r#"sheet.insertRule("body{color:red}", 0)"#)
    );
}

#[test]
fn test_cast_between_wrappers_is_erased() {
    let node = Node::wrap(Expr::ident("n"));
    let sheet: CSSStyleSheet = node.cast();
    assert_eq!(
        to_js(sheet.host(), &LoweringConfig::default()).ok().as_deref(),
        Some("n")
    );
}

#[test]
fn test_assignment_value_is_lowered() {
    let bindings = dom();
    let mut translator = bindings.translator();
    translator
        .bind("el", "HTMLElement")
        .unwrap_or_else(|e| panic!("{}", e));
    let typed = translator
        .translate_source(r#"el.title = "Hello \"there\"""#)
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(
        to_js(&typed.expr, bindings.config()).ok().as_deref(),
        Some(r#"el.title = "Hello \"there\"""#)
    );
}
