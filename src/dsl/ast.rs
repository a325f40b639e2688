//! Abstract Syntax Tree for the DSL.
//!
//! A script is a list of statements; each statement is an ordered chain of
//! call events (`track(id=1).set_track(mute=true)` is one statement with two
//! calls). Method names are resolved to [`Method`] while parsing, so an
//! unknown method is a syntax error rather than a runtime lookup failure.

use std::fmt;

use super::value::Value;

/// A complete parsed script.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    pub statements: Vec<Statement>,
}

impl Script {
    /// All call events in evaluation order.
    pub fn calls(&self) -> impl Iterator<Item = &CallEvent> {
        self.statements.iter().flat_map(|s| s.calls.iter())
    }
}

/// One statement: a head call followed by zero or more chained calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub calls: Vec<CallEvent>,
    pub line: usize,
}

/// A single call in a statement chain.
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    /// `track(...)`: reference or creation, decided by its arguments.
    Track(Args),
    /// A side-effecting method, either chained (`.add_fx(...)`) or, for the
    /// utility methods, a statement head (`get_tracks()`).
    Method { method: Method, args: Args },
    /// `filter(collection, predicate)`.
    Filter {
        collection: String,
        predicate: Predicate,
    },
    /// `map(collection, ref)`.
    Map {
        collection: String,
        func: FunctionRef,
    },
    /// `for_each(collection, ref)`.
    ForEach {
        collection: String,
        func: FunctionRef,
    },
}

impl CallEvent {
    /// The DSL name of the call, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            CallEvent::Track(_) => "track",
            CallEvent::Method { method, .. } => method.name(),
            CallEvent::Filter { .. } => "filter",
            CallEvent::Map { .. } => "map",
            CallEvent::ForEach { .. } => "for_each",
        }
    }
}

/// The closed set of side-effecting operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    NewClip,
    AddFx,
    SetTrack,
    Delete,
    DeleteClip,
    SetClip,
    MoveClip,
    AddAutomation,
    Store,
    GetTracks,
    GetFxChain,
}

impl Method {
    /// Resolve a DSL method name, including legacy aliases.
    pub fn from_name(name: &str) -> Option<Method> {
        let method = match name {
            "new_clip" | "newClip" => Method::NewClip,
            "add_fx" | "addFX" | "addFx" | "add_instrument" | "addInstrument" => Method::AddFx,
            "set_track" | "setTrack" | "set_volume" | "setVolume" | "set_pan" | "setPan"
            | "set_mute" | "setMute" | "set_solo" | "setSolo" | "set_name" | "setName" => {
                Method::SetTrack
            }
            "delete" => Method::Delete,
            "delete_clip" | "deleteClip" => Method::DeleteClip,
            "set_clip" | "setClip" => Method::SetClip,
            "move_clip" | "moveClip" | "set_clip_position" | "setClipPosition" => Method::MoveClip,
            "add_automation" | "addAutomation" => Method::AddAutomation,
            "store" => Method::Store,
            "get_tracks" | "getTracks" => Method::GetTracks,
            "get_fx_chain" | "getFxChain" | "getFXChain" => Method::GetFxChain,
            _ => return None,
        };
        Some(method)
    }

    /// Canonical snake_case name.
    pub fn name(&self) -> &'static str {
        match self {
            Method::NewClip => "new_clip",
            Method::AddFx => "add_fx",
            Method::SetTrack => "set_track",
            Method::Delete => "delete",
            Method::DeleteClip => "delete_clip",
            Method::SetClip => "set_clip",
            Method::MoveClip => "move_clip",
            Method::AddAutomation => "add_automation",
            Method::Store => "store",
            Method::GetTracks => "get_tracks",
            Method::GetFxChain => "get_fx_chain",
        }
    }

    /// Whether the method may start a statement on its own.
    pub fn is_statement_head(&self) -> bool {
        matches!(self, Method::Store | Method::GetTracks | Method::GetFxChain)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Keyword arguments in source order. Keys are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Args {
    entries: Vec<(String, Value)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an argument. Returns `false` if the key was already present.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> bool {
        let key = key.into();
        if self.contains(&key) {
            return false;
        }
        self.entries.push((key, value));
        true
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Args {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut args = Args::new();
        for (k, v) in iter {
            args.insert(k, v);
        }
        args
    }
}

/// A comparison operator in a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    In,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::LtEq => "<=",
            CompareOp::GtEq => ">=",
            CompareOp::In => "in",
        }
    }

    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            CompareOp::Lt | CompareOp::Gt | CompareOp::LtEq | CompareOp::GtEq
        )
    }
}

/// `binder.field op literal`, e.g. `track.name == "Bass"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub binder: String,
    pub field: String,
    pub op: CompareOp,
    pub literal: Value,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Value::String(s) => write!(
                f,
                "{}.{} {} \"{}\"",
                self.binder,
                self.field,
                self.op.symbol(),
                s
            ),
            other => write!(
                f,
                "{}.{} {} {}",
                self.binder,
                self.field,
                self.op.symbol(),
                other
            ),
        }
    }
}

/// The second argument of `map` / `for_each`.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionRef {
    /// `@name`: a named function. Not executable.
    Named(String),
    /// `track.add_fx(fxname="ReaEQ")`: a method applied per element.
    MethodCall {
        binder: String,
        method: Method,
        args: Args,
    },
}
