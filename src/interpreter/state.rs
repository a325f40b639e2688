//! Per-run execution state.

use std::collections::BTreeMap;

use tracing::debug;

use super::error::InterpretError;
use crate::action::Action;
use crate::config::ClipDefaults;
use crate::dsl::Value;
use crate::session::{Item, Session};

/// A named, ordered list of items.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    name: String,
    items: Vec<Item>,
}

impl Collection {
    pub fn new(name: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Name bound to each element while iterating this collection.
    pub fn iteration_var(&self) -> String {
        iteration_var(&self.name)
    }
}

/// Derive the iteration variable from a collection name: `tracks` → `track`,
/// `clips_filtered` → `clip`, `fx_chain` → `fx`, `buses` → `buse`.
pub fn iteration_var(collection: &str) -> String {
    let mut base = collection;
    while let Some(stripped) = base
        .strip_suffix("_filtered")
        .or_else(|| base.strip_suffix("_mapped"))
    {
        base = stripped;
    }

    match base {
        "tracks" => "track".to_string(),
        "clips" => "clip".to_string(),
        "fx_chain" | "fx" => "fx".to_string(),
        _ => match base.strip_suffix('s') {
            Some(singular) if !singular.is_empty() => singular.to_string(),
            _ => "item".to_string(),
        },
    }
}

/// The one variable binding live while a predicate or per-element call runs.
#[derive(Debug, Clone, Copy)]
pub struct IterationContext<'a> {
    pub var: &'a str,
    pub item: &'a Item,
}

/// Named collections: the session views plus anything derived or stored.
#[derive(Debug, Clone, Default)]
pub struct DataStore {
    collections: BTreeMap<String, Collection>,
}

impl DataStore {
    pub fn from_session(session: &Session) -> Self {
        let mut store = Self::default();
        store.insert(tracks_collection(session));
        store.insert(Collection::new(
            "clips",
            session.clips().into_iter().map(Item::Clip).collect(),
        ));
        store
    }

    pub fn insert(&mut self, collection: Collection) {
        self.collections
            .insert(collection.name().to_string(), collection);
    }

    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }
}

fn tracks_collection(session: &Session) -> Collection {
    Collection::new(
        "tracks",
        session.tracks().iter().cloned().map(Item::Track).collect(),
    )
}

/// Everything one `execute` call mutates. Created fresh per run.
#[derive(Debug)]
pub struct InterpreterState<'s> {
    pub session: &'s Session,
    pub clip_defaults: ClipDefaults,
    pub current_track: Option<usize>,
    /// Next index for an implicitly created track.
    pub track_counter: usize,
    pub store: DataStore,
    pub actions: Vec<Action>,
}

impl<'s> InterpreterState<'s> {
    pub fn new(session: &'s Session, clip_defaults: ClipDefaults) -> Self {
        Self {
            session,
            clip_defaults,
            current_track: None,
            track_counter: session.track_count(),
            store: DataStore::from_session(session),
            actions: Vec::new(),
        }
    }

    /// Look up a collection. `fx_chain` falls back to the current track's
    /// chain when it has not been loaded explicitly.
    pub fn resolve(&self, name: &str) -> Result<Collection, InterpretError> {
        if let Some(collection) = self.store.get(name) {
            return Ok(collection.clone());
        }
        if name == "fx_chain" {
            if let Some(track) = self.current_track {
                return Ok(self.fx_chain_of(track));
            }
        }
        Err(InterpretError::NoCollectionFound(name.to_string()))
    }

    fn fx_chain_of(&self, track: usize) -> Collection {
        Collection::new(
            "fx_chain",
            self.session
                .fx_chain(track)
                .into_iter()
                .map(Item::Fx)
                .collect(),
        )
    }

    pub fn require_track(&self, method: &'static str) -> Result<usize, InterpretError> {
        self.current_track
            .ok_or(InterpretError::NoTrackContext { method })
    }

    pub fn emit(&mut self, action: Action) {
        debug!(action = action.kind(), track = action.track(), "emit");
        self.actions.push(action);
    }

    /// `get_tracks()`: reload `tracks` from the snapshot.
    pub fn refresh_tracks(&mut self) {
        self.store.insert(tracks_collection(self.session));
    }

    /// `get_fx_chain()`: load the chain of `track` into `fx_chain`.
    pub fn load_fx_chain(&mut self, track: usize) {
        let chain = self.fx_chain_of(track);
        debug!(track, fx = chain.len(), "loaded fx chain");
        self.store.insert(chain);
    }

    /// `store(name=..., value=...)`: arrays become one item per element.
    pub fn store_literal(&mut self, name: &str, value: &Value) {
        let items = match value {
            Value::Array(elements) => elements.iter().cloned().map(Item::Literal).collect(),
            other => vec![Item::Literal(other.clone())],
        };
        self.store.insert(Collection::new(name, items));
    }
}
