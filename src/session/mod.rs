//! Session state adapter.
//!
//! Loads a JSON snapshot of the DAW session and exposes it as the read-only
//! collections the interpreter works on: `tracks`, `clips` (flattened across
//! tracks) and a per-track `fx` chain.

pub mod model;

pub use model::{Clip, FxUnit, Item, Track};

use serde::Deserialize;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid session snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// An immutable, normalized session snapshot.
///
/// Every track, clip and fx unit carries an index after loading, and every
/// clip and fx unit is stamped with its owning track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    tracks: Vec<Track>,
}

#[derive(Deserialize)]
struct TrackList {
    #[serde(default)]
    tracks: Option<Vec<Track>>,
}

impl Session {
    /// A session with no tracks.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        let mut session = Self { tracks };
        session.normalize();
        session
    }

    /// Load from either `{"state": {"tracks": [...]}}` or `{"tracks": [...]}`.
    /// A snapshot with neither yields an empty session.
    pub fn from_json(snapshot: &serde_json::Value) -> Result<Self, SessionError> {
        let container = snapshot
            .get("state")
            .filter(|state| state.get("tracks").is_some())
            .unwrap_or(snapshot);

        let tracks = if container.get("tracks").is_some() {
            let list = TrackList::deserialize(container)?;
            list.tracks.unwrap_or_default()
        } else {
            Vec::new()
        };

        let session = Self::from_tracks(tracks);
        debug!(
            tracks = session.track_count(),
            clips = session.clips().len(),
            "loaded session snapshot"
        );
        Ok(session)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SessionError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json(&value)
    }

    fn normalize(&mut self) {
        for (pos, track) in self.tracks.iter_mut().enumerate() {
            let track_index = *track.index.get_or_insert(pos);
            for (clip_pos, clip) in track.clips.iter_mut().enumerate() {
                clip.index.get_or_insert(clip_pos);
                clip.track = Some(track_index);
            }
            for (fx_pos, fx) in track.fx.iter_mut().enumerate() {
                fx.index.get_or_insert(fx_pos);
                fx.track = Some(track_index);
            }
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Look up a track by its index (not its array position).
    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.iter().find(|t| t.index == Some(index))
    }

    /// Every clip in track order, then clip order.
    pub fn clips(&self) -> Vec<Clip> {
        self.tracks
            .iter()
            .flat_map(|t| t.clips.iter().cloned())
            .collect()
    }

    /// The effect chain of the track at `index`, empty if there is no such
    /// track.
    pub fn fx_chain(&self, index: usize) -> Vec<FxUnit> {
        self.track(index)
            .map(|t| t.fx.clone())
            .unwrap_or_default()
    }

    /// Index of the first selected track.
    pub fn selected_track_index(&self) -> Option<usize> {
        self.tracks.iter().find(|t| t.selected).and_then(|t| t.index)
    }
}
