//! String dictionary for interning host member and type names.
//!
//! Every name read from a schema or a binding expression goes through the
//! dictionary, so identical names share one `Rc<str>` and compare cheaply.

use rustc_hash::FxHashMap;

use crate::value::{CheapClone, JsString};

/// A dictionary for deduplicating JsString instances.
///
/// Strings inserted into the dictionary are stored once and subsequent
/// requests for the same string return a cheap clone of the existing instance.
pub struct StringDict {
    /// Using Box<str> as key to avoid double-indirection through Rc.
    strings: FxHashMap<Box<str>, JsString>,
}

impl StringDict {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self {
            strings: FxHashMap::default(),
        }
    }

    /// Create a dictionary pre-populated with common host member names.
    pub fn with_common_strings() -> Self {
        let mut dict = Self::new();
        for s in COMMON_STRINGS {
            dict.get_or_insert(s);
        }
        dict
    }

    /// Get an existing string or insert a new one.
    pub fn get_or_insert(&mut self, s: &str) -> JsString {
        if let Some(existing) = self.strings.get(s) {
            return existing.cheap_clone();
        }
        let js_str = JsString::from(s);
        self.strings.insert(s.into(), js_str.cheap_clone());
        js_str
    }

    /// Get an existing string without inserting.
    pub fn get(&self, s: &str) -> Option<JsString> {
        self.strings.get(s).map(|s| s.cheap_clone())
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringDict {
    fn default() -> Self {
        Self::new()
    }
}

/// Names that appear in almost every DOM/CSSOM schema.
const COMMON_STRINGS: &[&str] = &[
    // Schema keywords that are also names
    "string",
    "number",
    "boolean",
    "function",
    "any",
    "void",
    // Globals
    "window",
    "document",
    "history",
    "location",
    "navigator",
    "screen",
    // Node
    "nodeName",
    "nodeType",
    "nodeValue",
    "parentNode",
    "childNodes",
    "firstChild",
    "lastChild",
    "previousSibling",
    "nextSibling",
    "ownerDocument",
    "appendChild",
    "removeChild",
    "insertBefore",
    "replaceChild",
    "cloneNode",
    // Element
    "id",
    "className",
    "tagName",
    "style",
    "title",
    "lang",
    "dir",
    "getAttribute",
    "setAttribute",
    "removeAttribute",
    "getElementsByTagName",
    // Collections
    "length",
    "item",
    "namedItem",
    // Forms
    "action",
    "method",
    "target",
    "elements",
    "submit",
    "reset",
    "name",
    "value",
    "disabled",
    "add",
    "remove",
    "selectedIndex",
    "options",
    // Stylesheets
    "href",
    "type",
    "media",
    "cssRules",
    "cssText",
    "insertRule",
    "deleteRule",
    "ownerNode",
    "parentStyleSheet",
    // Events
    "bubbles",
    "cancelable",
    "currentTarget",
    "eventPhase",
    "timeStamp",
    "preventDefault",
    "stopPropagation",
    "initEvent",
    "clientX",
    "clientY",
    "screenX",
    "screenY",
    "button",
    "altKey",
    "ctrlKey",
    "shiftKey",
    "metaKey",
    "relatedTarget",
    "detail",
    "view",
    // History / Location
    "back",
    "forward",
    "go",
    "reload",
    "replace",
    "assign",
    "hash",
    "host",
    "hostname",
    "pathname",
    "port",
    "protocol",
    "search",
];
