// Generated by hostbind. Do not edit.
#![allow(dead_code, unused_imports, clippy::upper_case_acronyms)]

use std::rc::Rc;

use hostbind::{Arg, Expr, HostArg, MemberDescriptor, MemberId, MemberShape, Opaque, ValueKind};

hostbind::opaque_type!(
    /// Host interface `Window`
    Window
);

hostbind::opaque_type!(
    /// Host interface `History`
    History
);

hostbind::opaque_type!(
    /// Host interface `Node`
    Node
);

hostbind::opaque_type!(
    /// Host interface `Element` (extends `Node`)
    Element
);

/// Shared member descriptors, built once per thread
pub struct Members {
    pub window: WindowMembers,
    pub history: HistoryMembers,
    pub node: NodeMembers,
    pub element: ElementMembers,
}

pub struct WindowMembers {
    pub history: Rc<MemberDescriptor>,
    pub name: Rc<MemberDescriptor>,
}

pub struct HistoryMembers {
    pub length: Rc<MemberDescriptor>,
    pub go: Rc<MemberDescriptor>,
}

pub struct NodeMembers {
    pub parent_node: Rc<MemberDescriptor>,
    pub append_child: Rc<MemberDescriptor>,
}

pub struct ElementMembers {
    pub id: Rc<MemberDescriptor>,
    pub append: Rc<MemberDescriptor>,
}

impl Members {
    fn new() -> Self {
        let window_history = Rc::new(MemberDescriptor::global(MemberId::new("Window".into(), "history".into()), ValueKind::Object("History".into()), MemberShape::Attribute { readonly: true }));
        let window_name = Rc::new(MemberDescriptor::global(MemberId::new("Window".into(), "name".into()), ValueKind::String, MemberShape::Attribute { readonly: false }));
        let history_length = Rc::new(MemberDescriptor::instance(Some(Rc::clone(&window_history)), MemberId::new("History".into(), "length".into()), ValueKind::Number, MemberShape::Attribute { readonly: true }).into_static());
        let history_go = Rc::new(MemberDescriptor::instance(Some(Rc::clone(&window_history)), MemberId::new("History".into(), "go".into()), ValueKind::Void, MemberShape::Method { arity: 1, variadic: false }).into_static());
        let node_parent_node = Rc::new(MemberDescriptor::new(MemberId::new("Node".into(), "parentNode".into()), ValueKind::Object("Node".into()), MemberShape::Attribute { readonly: true }));
        let node_append_child = Rc::new(MemberDescriptor::new(MemberId::new("Node".into(), "appendChild".into()), ValueKind::Object("Node".into()), MemberShape::Method { arity: 1, variadic: false }));
        let element_id = Rc::new(MemberDescriptor::new(MemberId::new("Element".into(), "id".into()), ValueKind::String, MemberShape::Attribute { readonly: false }));
        let element_append = Rc::new(MemberDescriptor::new(MemberId::new("Element".into(), "append".into()), ValueKind::Void, MemberShape::Method { arity: 0, variadic: true }));
        Self {
            window: WindowMembers {
                history: window_history,
                name: window_name,
            },
            history: HistoryMembers {
                length: history_length,
                go: history_go,
            },
            node: NodeMembers {
                parent_node: node_parent_node,
                append_child: node_append_child,
            },
            element: ElementMembers {
                id: element_id,
                append: element_append,
            },
        }
    }
}

thread_local! {
    static MEMBERS: Rc<Members> = Rc::new(Members::new());
}

/// The descriptor table for the current thread
pub fn members() -> Rc<Members> {
    MEMBERS.with(Rc::clone)
}

impl Window {
    /// `Window.history`: History
    pub fn history() -> History {
        History::from_host(members().window.history.with_global())
    }

    /// `Window.name`: string
    pub fn name() -> Expr {
        members().window.name.with_global()
    }

    pub fn set_name(value: impl Into<Expr>) -> Expr {
        members().window.name.assign_global(Into::<Expr>::into(value))
    }

}

/// Members of `Window`, available on every descendant
pub trait WindowApi: Opaque {
}

impl WindowApi for Window {}

impl History {
    /// `History.length`: number
    pub fn length() -> Expr {
        members().history.length.with_global()
    }

    /// `History.go(..)` returning void
    pub fn go(delta: impl Into<Expr>) -> Expr {
        members().history.go.call_global(vec![Arg::Value(Into::<Expr>::into(delta))])
    }

}

/// Members of `History`, available on every descendant
pub trait HistoryApi: Opaque {
}

impl HistoryApi for History {}

/// Members of `Node`, available on every descendant
pub trait NodeApi: Opaque {
    /// `Node.parentNode`: Node
    fn parent_node(&self) -> Node {
        self.get_as(&members().node.parent_node)
    }

    /// `Node.appendChild(..)` returning Node
    fn append_child(&self, node: impl Into<HostArg>) -> Node {
        Node::from_host(self.call(&members().node.append_child, vec![Arg::Value(Into::<HostArg>::into(node).0)]))
    }

}

impl NodeApi for Node {}
impl NodeApi for Element {}

/// Members of `Element`, available on every descendant
pub trait ElementApi: NodeApi {
    /// `Element.id`: string
    fn id(&self) -> Expr {
        self.get(&members().element.id)
    }

    fn set_id(&self, value: impl Into<Expr>) -> Expr {
        self.set(&members().element.id, Into::<Expr>::into(value))
    }

    /// `Element.append(..)` returning void
    fn append(&self, nodes: Vec<Expr>) -> Expr {
        self.call(&members().element.append, vec![Arg::Variadic(nodes)])
    }

}

impl ElementApi for Element {}

