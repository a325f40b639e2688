//! Typed view of a DAW session snapshot.
//!
//! Snapshots come from several producers, so every field is optional and
//! unknown fields are kept in `extra` where predicates can still reach them.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::dsl::Value;

/// A track as reported by the DAW.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
    /// 0-based index. Filled from the array position when absent.
    #[serde(deserialize_with = "whole_index")]
    pub index: Option<usize>,
    pub name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub selected: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub muted: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub soloed: bool,
    pub volume_db: Option<f64>,
    pub pan: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub clips: Vec<Clip>,
    #[serde(deserialize_with = "null_as_default")]
    pub fx: Vec<FxUnit>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A clip on a track.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Clip {
    /// Per-track index.
    #[serde(deserialize_with = "whole_index")]
    pub index: Option<usize>,
    /// Start in seconds.
    #[serde(alias = "start")]
    pub position: Option<f64>,
    pub bar: Option<f64>,
    pub length: Option<f64>,
    pub name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub selected: bool,
    pub color: Option<String>,
    /// Owning track, stamped when clips are flattened.
    #[serde(deserialize_with = "whole_index")]
    pub track: Option<usize>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One plugin in a track's effect chain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FxUnit {
    #[serde(deserialize_with = "whole_index")]
    pub index: Option<usize>,
    pub name: Option<String>,
    pub enabled: Option<bool>,
    /// Owning track, stamped when the chain is loaded.
    #[serde(deserialize_with = "whole_index")]
    pub track: Option<usize>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// `null` reads as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An index written as an integer or a whole-number float (`2` or `2.0`).
fn whole_index<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n < 9.0e15 => Ok(Some(n as usize)),
        Some(n) => Err(D::Error::custom(format!(
            "expected a non-negative whole-number index, got {n}"
        ))),
    }
}

/// One element of a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Track(Track),
    Clip(Clip),
    Fx(FxUnit),
    /// A literal written with `store(...)`.
    Literal(Value),
}

fn index_value(i: usize) -> Value {
    Value::Number(i as f64)
}

fn extra_field(extra: &BTreeMap<String, serde_json::Value>, name: &str) -> Option<Value> {
    extra.get(name).map(Value::from)
}

impl Item {
    /// Look up a field by its DSL name. `None` when the item has no such
    /// field, which predicates treat as a non-match.
    pub fn field(&self, name: &str) -> Option<Value> {
        match self {
            Item::Track(t) => match name {
                "index" => t.index.map(index_value),
                "name" => t.name.clone().map(Value::String),
                "selected" => Some(Value::Bool(t.selected)),
                "muted" | "mute" => Some(Value::Bool(t.muted)),
                "soloed" | "solo" => Some(Value::Bool(t.soloed)),
                "volume_db" | "volume" => t.volume_db.map(Value::Number),
                "pan" => t.pan.map(Value::Number),
                "clip_count" => Some(index_value(t.clips.len())),
                "fx_count" => Some(index_value(t.fx.len())),
                _ => extra_field(&t.extra, name),
            },
            Item::Clip(c) => match name {
                "index" | "clip" => c.index.map(index_value),
                "position" | "start" => c.position.map(Value::Number),
                "bar" => c.bar.map(Value::Number),
                "length" => c.length.map(Value::Number),
                "name" => c.name.clone().map(Value::String),
                "selected" => Some(Value::Bool(c.selected)),
                "color" => c.color.clone().map(Value::String),
                "track" => c.track.map(index_value),
                _ => extra_field(&c.extra, name),
            },
            Item::Fx(fx) => match name {
                "index" => fx.index.map(index_value),
                "name" => fx.name.clone().map(Value::String),
                "enabled" => fx.enabled.map(Value::Bool),
                "track" => fx.track.map(index_value),
                _ => extra_field(&fx.extra, name),
            },
            Item::Literal(Value::Object(fields)) => fields.get(name).cloned(),
            Item::Literal(_) => None,
        }
    }

    /// The track this item targets in a track-level broadcast: its owning
    /// track for clips and fx, its own index for tracks.
    pub fn target_track(&self) -> Option<usize> {
        match self {
            Item::Track(t) => t.index,
            Item::Clip(c) => c.track,
            Item::Fx(fx) => fx.track,
            Item::Literal(_) => match self.field("track").or_else(|| self.field("index")) {
                Some(Value::Number(n)) if n >= 0.0 && n.fract() == 0.0 => Some(n as usize),
                _ => None,
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Item::Track(_) => "track",
            Item::Clip(_) => "clip",
            Item::Fx(_) => "fx",
            Item::Literal(_) => "literal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn track_deserializes_with_defaults() {
        let t: Track = serde_json::from_value(json!({"name": "Bass"})).unwrap();
        assert_eq!(t.name.as_deref(), Some("Bass"));
        assert_eq!(t.index, None);
        assert!(!t.muted);
        assert!(t.clips.is_empty());
    }

    #[test]
    fn clip_accepts_start_alias() {
        let c: Clip = serde_json::from_value(json!({"start": 4.0, "length": 2.0})).unwrap();
        assert_eq!(c.position, Some(4.0));
    }

    #[test]
    fn unknown_fields_are_reachable() {
        let t: Track = serde_json::from_value(json!({"name": "Keys", "armed": true})).unwrap();
        let item = Item::Track(t);
        assert_eq!(item.field("armed"), Some(Value::Bool(true)));
        assert_eq!(item.field("missing"), None);
    }

    #[test]
    fn clip_fields() {
        let clip = Clip {
            index: Some(2),
            position: Some(8.0),
            length: Some(1.2),
            track: Some(1),
            ..Default::default()
        };
        let item = Item::Clip(clip);
        assert_eq!(item.field("length"), Some(Value::Number(1.2)));
        assert_eq!(item.field("track"), Some(Value::Number(1.0)));
        assert_eq!(item.field("name"), None);
        assert_eq!(item.target_track(), Some(1));
    }

    #[test]
    fn literal_object_target_track() {
        let v = Value::from(&json!({"track": 3, "label": "x"}));
        let item = Item::Literal(v);
        assert_eq!(item.target_track(), Some(3));
        assert_eq!(item.field("label"), Some(Value::String("x".into())));
    }
}
