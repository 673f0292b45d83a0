//! Tests for the in-memory host
//!
//! Lowered operations run against a JSON object tree; the event log shows
//! exactly which host operations a binding performed, and in which order.

use hostbind::host::object;
use hostbind::{BindError, Bindings, HostEvent, JsonHost, MemberId};
use serde_json::{Value, json};

const DOM: &str = include_str!("../schemas/dom.idl");

#[allow(clippy::unwrap_used)]
fn dom() -> Bindings {
    Bindings::from_source(DOM).unwrap()
}

#[allow(clippy::unwrap_used)]
fn host() -> JsonHost {
    JsonHost::new(json!({
        "window": {
            "innerWidth": 800,
            "name": "main",
            "history": { "length": 3 },
            "location": { "href": "/start" }
        },
        "sheet": { "href": "site.css", "rules": [] },
        "a": { "x": 1 },
        "b": { "y": "two" },
        "obj": {}
    }))
    .unwrap()
}

fn eval(bindings: &Bindings, host: &mut JsonHost, source: &str) -> Result<Value, BindError> {
    let expr = bindings.translate(source)?;
    host.eval(&expr, bindings.config())
}

fn id(owner: &str, name: &str) -> MemberId {
    MemberId::new(owner.into(), name.into())
}

fn host_message(result: Result<Value, BindError>) -> String {
    match result {
        Err(BindError::Host { message }) => message,
        other => panic!("expected a host error, got {:?}", other),
    }
}

#[test]
fn test_globals_must_be_an_object() {
    assert!(JsonHost::new(json!([1, 2])).is_err());
}

#[test]
fn test_qualified_static_read() {
    let bindings = dom();
    let mut host = host();
    let value = eval(&bindings, &mut host, "JsHistory.length").unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(value, json!(3));
    assert_eq!(
        host.events(),
        &[
            HostEvent::Get(id("Window", "history")),
            HostEvent::Get(id("History", "length")),
        ]
    );
}

#[test]
fn test_assignment_writes_through() {
    let bindings = dom();
    let mut host = host();
    let value = eval(&bindings, &mut host, r#"JsLocation.href = "/home""#)
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(value, json!("/home"));
    assert_eq!(host.globals().pointer("/window/location/href"), Some(&json!("/home")));
    assert_eq!(
        host.take_events().last(),
        Some(&HostEvent::Set(id("Location", "href"), json!("/home")))
    );
    assert!(host.events().is_empty());
}

#[test]
fn test_typed_receiver_through_translator() {
    let bindings = dom();
    let mut translator = bindings.translator();
    translator
        .bind("sheet", "CSSStyleSheet")
        .unwrap_or_else(|e| panic!("{}", e));
    let typed = translator
        .translate_source("sheet.href")
        .unwrap_or_else(|e| panic!("{}", e));

    let mut host = host();
    let value = host
        .eval(&typed.expr, bindings.config())
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(value, json!("site.css"));
    assert_eq!(host.events(), &[HostEvent::Get(id("StyleSheet", "href"))]);
}

#[test]
fn test_native_method_receives_receiver_and_arguments() {
    let bindings = dom();
    let mut host = host();
    host.define_method("insertRule", |sheet, args| {
        let rule = args.first().cloned().unwrap_or(Value::Null);
        let rules = sheet
            .get_mut("rules")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| BindError::host_error("receiver has no rules"))?;
        rules.push(rule);
        Ok(Value::from(rules.len()))
    });

    let value = eval(&bindings, &mut host, r#"sheet.insertRule("body{}", 0)"#)
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(value, json!(1));
    assert_eq!(host.globals().pointer("/sheet/rules"), Some(&json!(["body{}"])));

    let Some(HostEvent::Call(member, args)) = host.events().last() else {
        panic!("expected a call event, got {:?}", host.events());
    };
    assert_eq!(member.name().as_str(), "insertRule");
    assert_eq!(args.first(), Some(&json!("body{}")));
    assert_eq!(args.get(1).and_then(Value::as_f64), Some(0.0));
}

#[test]
fn test_arguments_are_evaluated_in_order() {
    let bindings = dom();
    let mut host = host();
    host.define_method("pair", |_, args| Ok(Value::Array(args.to_vec())));

    let value = eval(&bindings, &mut host, "obj.pair(a.x, b.y)").unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(value, json!([1, "two"]));
    let names: Vec<String> = host
        .events()
        .iter()
        .map(|event| match event {
            HostEvent::Get(m) => format!("get {}", m.name()),
            HostEvent::Set(m, _) => format!("set {}", m.name()),
            HostEvent::Call(m, _) => format!("call {}", m.name()),
        })
        .collect();
    assert_eq!(names, ["get x", "get y", "call pair"]);
}

#[test]
fn test_arguments_are_read_when_evaluated() {
    let bindings = dom();
    let mut host = host();
    host.define_method("pair", |_, args| Ok(Value::Array(args.to_vec())));

    let value = eval(&bindings, &mut host, "obj.pair(a.x, a.x = 2)")
        .unwrap_or_else(|e| panic!("{}", e));
    let numbers: Vec<Option<f64>> = value
        .as_array()
        .map(|items| items.iter().map(Value::as_f64).collect())
        .unwrap_or_default();
    assert_eq!(numbers, [Some(1.0), Some(2.0)]);
    assert_eq!(host.globals().pointer("/a/x").and_then(Value::as_f64), Some(2.0));
}

#[test]
fn test_receiver_is_fixed_before_arguments() {
    let bindings = dom();
    let mut host = JsonHost::new(json!({
        "a": { "o": { "tag": "old" } },
        "n": { "tag": "new" }
    }))
    .unwrap_or_else(|e| panic!("{}", e));
    host.define_method("who", |receiver, _| {
        Ok(receiver.get("tag").cloned().unwrap_or(Value::Null))
    });

    let value = eval(&bindings, &mut host, "a.o.who(a.o = n)").unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(value, json!("old"));
    assert_eq!(host.globals().pointer("/a/o/tag"), Some(&json!("new")));
}

#[test]
fn test_receiver_mutated_by_arguments_is_still_live() {
    let bindings = dom();
    let mut host = JsonHost::new(json!({ "a": { "o": { "tag": "old" } } }))
        .unwrap_or_else(|e| panic!("{}", e));
    host.define_method("rename", |receiver, args| {
        if let (Some(map), Some(tag)) = (receiver.as_object_mut(), args.first()) {
            map.insert("renamed".to_string(), tag.clone());
        }
        Ok(receiver.get("tag").cloned().unwrap_or(Value::Null))
    });

    let value = eval(&bindings, &mut host, r#"a.o.rename(a.o.tag = "mid")"#)
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(value, json!("mid"));
    assert_eq!(host.globals().pointer("/a/o/renamed"), Some(&json!("mid")));
}

#[test]
fn test_pure_instanceof_touches_nothing() {
    let bindings = dom();
    let mut host = host();
    let value = eval(&bindings, &mut host, "sheet instanceof JsNode")
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(value, json!(true));
    assert!(host.events().is_empty());
}

#[test]
fn test_instanceof_keeps_property_reads() {
    let bindings = dom();
    let mut host = host();
    let value = eval(&bindings, &mut host, "sheet.href instanceof JsNode")
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(value, json!(true));
    assert_eq!(host.events(), &[HostEvent::Get(MemberId::dynamic("href".into()))]);
}

#[test]
fn test_impure_instanceof_evaluates_operand_once() {
    let bindings = dom();
    let mut host = host();
    host.define_method("make", |_, _| Ok(json!({})));
    let value = eval(&bindings, &mut host, "obj.make() instanceof JsNode")
        .unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(value, json!(true));
    assert_eq!(host.events(), &[HostEvent::Call(MemberId::dynamic("make".into()), vec![])]);
}

#[test]
fn test_host_errors_pass_through() {
    let bindings = dom();
    let mut host = host();
    assert_eq!(
        host_message(eval(&bindings, &mut host, "missing.length")),
        "Cannot read properties of missing (reading 'length')"
    );
    assert_eq!(
        host_message(eval(&bindings, &mut host, "sheet.nothing()")),
        "nothing is not a function"
    );
    assert_eq!(
        host_message(eval(&bindings, &mut host, "a.x.y = 2")),
        "Cannot set properties of a.x (setting 'y')"
    );
}

#[test]
fn test_native_errors_pass_through() {
    let bindings = dom();
    let mut host = host();
    host.define_method("fail", |_, _| Err(BindError::host_error("boom")));
    assert_eq!(host_message(eval(&bindings, &mut host, "obj.fail()")), "boom");
}

#[test]
fn test_string_length() {
    let bindings = dom();
    let mut host = JsonHost::new(object([("s", json!("héllo"))])).unwrap_or_else(|e| panic!("{}", e));
    host.define_method("trim", |receiver, _| {
        Ok(Value::from(receiver.as_str().unwrap_or_default().trim()))
    });
    assert_eq!(
        eval(&bindings, &mut host, "s.trim().length").unwrap_or_else(|e| panic!("{}", e)),
        json!(5)
    );
}
