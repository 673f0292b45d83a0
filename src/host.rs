//! In-memory host
//!
//! [`JsonHost`] evaluates lowered operations against a tree of JSON values with
//! native methods registered by name. Every operation it performs is recorded
//! in an event log, so callers can see exactly what a binding did.

use std::fmt;
use std::rc::Rc;

use log::trace;
use rustc_hash::FxHashMap;
use serde_json::{Map, Number, Value};

use crate::config::LoweringConfig;
use crate::error::BindError;
use crate::expr::{Expr, Literal};
use crate::lower::{Backend, lower};
use crate::registry::MemberId;
use crate::value::{CheapClone, JsString};

/// Native method signature: the receiver (mutable) and positional arguments
pub type NativeFn = Rc<dyn Fn(&mut Value, &[Value]) -> Result<Value, BindError>>;

/// Native method wrapper
#[derive(Clone)]
pub struct NativeMethod {
    pub name: JsString,
    pub func: NativeFn,
}

impl fmt::Debug for NativeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeMethod")
            .field("name", &self.name)
            .finish()
    }
}

/// One host operation, in the order it happened
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Get(MemberId),
    Set(MemberId, Value),
    Call(MemberId, Vec<Value>),
}

/// Result of a lowered operation: a location in the host tree or a temporary
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Place(Vec<JsString>),
    Value(Value),
    /// A call receiver: the object the place held when it was evaluated, and
    /// the length of the write log at that moment
    Receiver {
        path: Vec<JsString>,
        snapshot: Value,
        mark: usize,
    },
}

pub struct JsonHost {
    root: Value,
    methods: FxHashMap<JsString, NativeMethod>,
    events: Vec<HostEvent>,
    /// Paths assigned during the current evaluation
    writes: Vec<Vec<JsString>>,
}

impl JsonHost {
    /// `globals` must be a JSON object; its keys are the named host values
    pub fn new(globals: Value) -> Result<Self, BindError> {
        if !globals.is_object() {
            return Err(BindError::host_error("host globals must be a JSON object"));
        }
        Ok(Self {
            root: globals,
            methods: FxHashMap::default(),
            events: Vec::new(),
            writes: Vec::new(),
        })
    }

    /// Register a native method. Methods are found by name on any receiver.
    pub fn define_method<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&mut Value, &[Value]) -> Result<Value, BindError> + 'static,
    {
        let name = JsString::from(name);
        self.methods.insert(
            name.cheap_clone(),
            NativeMethod {
                name,
                func: Rc::new(func),
            },
        );
    }

    pub fn globals(&self) -> &Value {
        &self.root
    }

    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    /// Lower `expr` against this host and return the resulting value
    pub fn eval(&mut self, expr: &Expr, config: &LoweringConfig) -> Result<Value, BindError> {
        self.writes.clear();
        let result = lower(expr, self, config)?;
        Ok(self.resolve(result))
    }

    fn lookup(&self, path: &[JsString]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.root, |value, key| value.get(key.as_str()))
    }

    fn lookup_mut(&mut self, path: &[JsString]) -> Option<&mut Value> {
        path.iter()
            .try_fold(&mut self.root, |value, key| value.get_mut(key.as_str()))
    }

    fn resolve(&self, value: HostValue) -> Value {
        match value {
            HostValue::Place(path) => self.lookup(&path).cloned().unwrap_or(Value::Null),
            HostValue::Value(value) => value,
            HostValue::Receiver { snapshot, .. } => snapshot,
        }
    }

    /// Whether an assignment since `mark` rebound `path` or one of its parents
    fn replaced_since(&self, path: &[JsString], mark: usize) -> bool {
        self.writes
            .get(mark..)
            .unwrap_or_default()
            .iter()
            .any(|written| path.starts_with(written))
    }

    fn describe(path: &[JsString]) -> String {
        if path.is_empty() {
            return "globalThis".to_string();
        }
        path.iter()
            .map(JsString::as_str)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl Backend for JsonHost {
    type Output = HostValue;

    fn global(&mut self, target: Option<&str>) -> Result<HostValue, BindError> {
        let path = target
            .map(|t| t.split('.').map(JsString::from).collect())
            .unwrap_or_default();
        Ok(HostValue::Place(path))
    }

    fn reference(&mut self, name: &JsString) -> Result<HostValue, BindError> {
        Ok(HostValue::Place(vec![name.cheap_clone()]))
    }

    fn literal(&mut self, literal: &Literal) -> Result<HostValue, BindError> {
        let value = match literal {
            Literal::String(s) => Value::String(s.to_string()),
            // NaN and the infinities have no JSON form
            Literal::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Literal::Boolean(b) => Value::Bool(*b),
            Literal::Null | Literal::Undefined => Value::Null,
        };
        Ok(HostValue::Value(value))
    }

    fn get(&mut self, target: HostValue, member: &MemberId) -> Result<HostValue, BindError> {
        trace!("host get {}", member);
        self.events.push(HostEvent::Get(member.cheap_clone()));
        let name = member.name();
        match target {
            HostValue::Place(mut path) | HostValue::Receiver { mut path, .. } => {
                match self.lookup(&path) {
                    Some(Value::Object(_)) => {}
                    _ => {
                        return Err(BindError::host_error(format!(
                            "Cannot read properties of {} (reading '{}')",
                            Self::describe(&path),
                            name
                        )));
                    }
                }
                path.push(name.cheap_clone());
                Ok(HostValue::Place(path))
            }
            HostValue::Value(Value::Object(map)) => Ok(HostValue::Value(
                map.get(name.as_str()).cloned().unwrap_or(Value::Null),
            )),
            HostValue::Value(Value::String(s)) if name == "length" => {
                Ok(HostValue::Value(Value::from(s.encode_utf16().count())))
            }
            HostValue::Value(other) => Err(BindError::host_error(format!(
                "Cannot read properties of {} (reading '{}')",
                other, name
            ))),
        }
    }

    fn set(
        &mut self,
        target: HostValue,
        member: &MemberId,
        value: HostValue,
    ) -> Result<HostValue, BindError> {
        let value = self.resolve(value);
        trace!("host set {} = {}", member, value);
        self.events
            .push(HostEvent::Set(member.cheap_clone(), value.clone()));
        let name = member.name();
        match target {
            HostValue::Place(path) | HostValue::Receiver { path, .. } => {
                let described = Self::describe(&path);
                match self.lookup_mut(&path) {
                    Some(Value::Object(map)) => {
                        map.insert(name.to_string(), value.clone());
                        let mut written = path;
                        written.push(name.cheap_clone());
                        self.writes.push(written);
                    }
                    _ => {
                        return Err(BindError::host_error(format!(
                            "Cannot set properties of {} (setting '{}')",
                            described, name
                        )));
                    }
                }
            }
            // Writes to temporaries are not observable
            HostValue::Value(Value::Object(_)) => {}
            HostValue::Value(other) => {
                return Err(BindError::host_error(format!(
                    "Cannot set properties of {} (setting '{}')",
                    other, name
                )));
            }
        }
        Ok(HostValue::Value(value))
    }

    fn call(
        &mut self,
        target: HostValue,
        member: &MemberId,
        args: Vec<HostValue>,
    ) -> Result<HostValue, BindError> {
        let args: Vec<Value> = args.into_iter().map(|a| self.resolve(a)).collect();
        trace!("host call {}({} args)", member, args.len());
        self.events
            .push(HostEvent::Call(member.cheap_clone(), args.clone()));

        let Some(method) = self.methods.get(member.name().as_str()) else {
            return Err(BindError::host_error(format!(
                "{} is not a function",
                member.name()
            )));
        };
        let func = method.func.clone();

        match target {
            HostValue::Place(path) => {
                let described = Self::describe(&path);
                let Some(receiver) = self.lookup_mut(&path) else {
                    return Err(BindError::host_error(format!(
                        "Cannot read properties of {} (reading '{}')",
                        described,
                        member.name()
                    )));
                };
                func(receiver, &args).map(HostValue::Value)
            }
            HostValue::Receiver {
                path,
                snapshot,
                mark,
            } => {
                if self.replaced_since(&path, mark) {
                    // The arguments rebound the place: the call sees the old object
                    let mut receiver = snapshot;
                    return func(&mut receiver, &args).map(HostValue::Value);
                }
                let Some(receiver) = self.lookup_mut(&path) else {
                    return Err(BindError::host_error(format!(
                        "Cannot read properties of {} (reading '{}')",
                        Self::describe(&path),
                        member.name()
                    )));
                };
                func(receiver, &args).map(HostValue::Value)
            }
            HostValue::Value(mut receiver) => func(&mut receiver, &args).map(HostValue::Value),
        }
    }

    fn always_true(&mut self, _operand: Option<HostValue>) -> Result<HostValue, BindError> {
        Ok(HostValue::Value(Value::Bool(true)))
    }

    fn receiver(&mut self, target: HostValue) -> Result<HostValue, BindError> {
        Ok(match target {
            HostValue::Place(path) => match self.lookup(&path) {
                Some(snapshot) => HostValue::Receiver {
                    snapshot: snapshot.clone(),
                    mark: self.writes.len(),
                    path,
                },
                None => HostValue::Place(path),
            },
            other => other,
        })
    }

    /// Arguments are read when they are evaluated, not when the call happens
    fn argument(&mut self, value: HostValue) -> Result<HostValue, BindError> {
        Ok(HostValue::Value(self.resolve(value)))
    }
}

/// Build a JSON object from key/value pairs
pub fn object<I, K>(entries: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    Value::Object(
        entries
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect::<Map<String, Value>>(),
    )
}
