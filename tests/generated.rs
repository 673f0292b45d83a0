//! Checked-in emitter output for a small schema
//!
//! `fixtures/mini_bindings.rs` is compiled as part of this test, so a change
//! to the emitter that breaks the generated API fails the build, and the
//! text comparison below catches any other drift. Regenerate the fixture with
//! `hostbind gen tests/fixtures/mini.idl` when the output changes on purpose.

#[path = "fixtures/mini_bindings.rs"]
mod mini_bindings;

use hostbind::{Bindings, Expr, LoweringConfig, Opaque, to_js};
use mini_bindings::{Element, ElementApi, History, Node, NodeApi, Window};

const MINI: &str = include_str!("fixtures/mini.idl");
const MINI_BINDINGS: &str = include_str!("fixtures/mini_bindings.rs");

fn js(expr: &Expr) -> String {
    to_js(expr, &LoweringConfig::default()).unwrap_or_else(|e| panic!("{}", e))
}

#[test]
fn test_fixture_matches_emitter() {
    let bindings = Bindings::from_source(MINI).unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(bindings.rust(), MINI_BINDINGS);
}

#[test]
fn test_generated_statics() {
    assert_eq!(js(&History::length()), "window.history.length");
    assert_eq!(js(&History::go(2.0)), "window.history.go(2)");
    assert_eq!(js(Window::history().host()), "window.history");
    assert_eq!(js(&Window::name()), "window.name");
    assert_eq!(
        js(&Window::set_name(Expr::string("main"))),
        r#"window.name = "main""#
    );
}

#[test]
fn test_generated_instance_members() {
    let el = Element::wrap(Expr::ident("el"));
    let child = Node::wrap(Expr::ident("x"));

    assert_eq!(js(&el.id()), "el.id");
    assert_eq!(js(&el.set_id(Expr::string("main"))), r#"el.id = "main""#);
    assert_eq!(js(el.append_child(&child).host()), "el.appendChild(x)");
    assert_eq!(js(el.parent_node().parent_node().host()), "el.parentNode.parentNode");
    assert_eq!(
        js(&el.append(vec![Expr::ident("a"), Expr::ident("b")])),
        "el.append(a, b)"
    );
}

#[test]
fn test_descriptors_are_shared() {
    let first = mini_bindings::members();
    let second = mini_bindings::members();
    assert!(std::rc::Rc::ptr_eq(&first, &second));
    assert!(std::rc::Rc::ptr_eq(
        first.history.length.qualifier().unwrap_or_else(|| panic!("unqualified")),
        &first.window.history
    ));
}
