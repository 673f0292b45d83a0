//! Typed bindings to an untyped host object model
//!
//! A schema declares host interfaces and their members. Each member becomes a
//! shared [`MemberDescriptor`]; opaque wrappers give host values a static type;
//! and every typed operation lowers to a plain host operation with the
//! wrappers erased.
//!
//! # Example
//!
//! ```
//! use hostbind::Bindings;
//!
//! let bindings = Bindings::from_source(
//!     r#"
//!     [Global=window]
//!     interface Window {
//!         readonly attribute History history;
//!     };
//!     [Qualifier=Window.history]
//!     interface History {
//!         static readonly attribute number length;
//!     };
//!     "#,
//! ).unwrap();
//!
//! assert_eq!(bindings.lower("JsHistory.length.with()").unwrap(), "window.history.length");
//! ```

pub mod ast;
pub mod codegen;
pub mod config;
pub mod contract;
pub mod descriptor;
pub mod error;
pub mod expr;
pub mod host;
pub mod lexer;
pub mod lower;
pub mod metadata;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod string_dict;
pub mod translate;
pub mod value;
pub mod wrapper;

pub use config::{InstanceOfPolicy, LoweringConfig};
pub use contract::{ContractViolation, check_metadata};
pub use descriptor::{HostArg, MemberDescriptor, MemberScope, MemberShape};
pub use error::BindError;
pub use expr::{Arg, Expr, HostOp, OpKind};
pub use host::{HostEvent, JsonHost};
pub use lower::{Backend, JsEmitter, lower, to_js};
pub use metadata::BindingMetadata;
pub use registry::{MemberId, MemberRegistry};
pub use schema::Schema;
pub use translate::{Translator, Typed};
pub use value::{CheapClone, JsString, ValueKind};
pub use wrapper::{HostObject, Js, Opaque};

use std::path::Path;

/// A resolved schema together with the lowering configuration
pub struct Bindings {
    schema: Schema,
    config: LoweringConfig,
}

impl Bindings {
    /// Resolve schema source with the default configuration
    pub fn from_source(source: &str) -> Result<Self, BindError> {
        Self::with_config(source, LoweringConfig::default())
    }

    pub fn with_config(source: &str, config: LoweringConfig) -> Result<Self, BindError> {
        config.validate()?;
        Ok(Self {
            schema: Schema::parse(source)?,
            config,
        })
    }

    /// Read and resolve a schema file; errors carry the file name
    pub fn load(path: &Path, config: LoweringConfig) -> Result<Self, BindError> {
        let source = std::fs::read_to_string(path)?;
        Self::with_config(&source, config).map_err(|e| e.with_file(path))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &LoweringConfig {
        &self.config
    }

    pub fn translator(&self) -> Translator<'_> {
        Translator::new(&self.schema, &self.config)
    }

    /// Translate one binding expression to a typed expression
    pub fn translate(&self, source: &str) -> Result<Expr, BindError> {
        self.translator()
            .translate_source(source)
            .map(|typed| typed.expr)
    }

    /// Translate and lower one binding expression to host source text
    pub fn lower(&self, source: &str) -> Result<String, BindError> {
        let expr = self.translate(source)?;
        to_js(&expr, &self.config)
    }

    pub fn metadata(&self) -> BindingMetadata {
        BindingMetadata::from_schema(&self.schema, &self.config)
    }

    /// Generated Rust bindings module
    pub fn rust(&self) -> String {
        codegen::generate_rust(&self.schema)
    }

    /// Contract violations in this schema's metadata
    pub fn check(&self) -> Vec<ContractViolation> {
        check_metadata(&self.metadata())
    }
}
