//! Action records: the output handed to the DAW executor.
//!
//! Each action serializes as one flat JSON object with an `action`
//! discriminant, e.g. `{"action": "delete_track", "track": 0}`. Optional
//! fields are omitted rather than written as `null`.

use serde::Serialize;

/// One imperative instruction for the DAW executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    CreateTrack {
        #[serde(skip_serializing_if = "Option::is_none")]
        instrument: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        index: usize,
    },
    CreateClipAtBar {
        track: usize,
        bar: i64,
        length_bars: i64,
    },
    CreateClip {
        track: usize,
        position: f64,
        length: f64,
    },
    AddTrackFx {
        track: usize,
        fxname: String,
    },
    AddInstrument {
        track: usize,
        fxname: String,
    },
    SetTrack {
        track: usize,
        #[serde(flatten)]
        props: TrackProps,
    },
    DeleteTrack {
        track: usize,
    },
    DeleteClip {
        track: usize,
        #[serde(flatten)]
        clip: ClipRef,
    },
    SetClip {
        track: usize,
        #[serde(flatten)]
        clip: ClipRef,
        #[serde(flatten)]
        props: ClipProps,
    },
    SetClipPosition {
        track: usize,
        #[serde(flatten)]
        to: ClipDestination,
        #[serde(flatten)]
        from: ClipSource,
    },
    AddAutomation {
        track: usize,
        param: String,
        #[serde(flatten)]
        body: AutomationBody,
    },
}

impl Action {
    /// The wire discriminant.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::CreateTrack { .. } => "create_track",
            Action::CreateClipAtBar { .. } => "create_clip_at_bar",
            Action::CreateClip { .. } => "create_clip",
            Action::AddTrackFx { .. } => "add_track_fx",
            Action::AddInstrument { .. } => "add_instrument",
            Action::SetTrack { .. } => "set_track",
            Action::DeleteTrack { .. } => "delete_track",
            Action::DeleteClip { .. } => "delete_clip",
            Action::SetClip { .. } => "set_clip",
            Action::SetClipPosition { .. } => "set_clip_position",
            Action::AddAutomation { .. } => "add_automation",
        }
    }

    /// The track the action targets (the new index for `create_track`).
    pub fn track(&self) -> usize {
        match self {
            Action::CreateTrack { index, .. } => *index,
            Action::CreateClipAtBar { track, .. }
            | Action::CreateClip { track, .. }
            | Action::AddTrackFx { track, .. }
            | Action::AddInstrument { track, .. }
            | Action::SetTrack { track, .. }
            | Action::DeleteTrack { track }
            | Action::DeleteClip { track, .. }
            | Action::SetClip { track, .. }
            | Action::SetClipPosition { track, .. }
            | Action::AddAutomation { track, .. } => *track,
        }
    }
}

/// Track properties set by `set_track`. Only the given ones are written.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TrackProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_db: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    /// `#rrggbb`, or a name the color table does not know.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TrackProps {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Clip properties set by `set_clip`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ClipProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
}

impl ClipProps {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Exactly one way of naming a clip on a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipRef {
    /// Per-track clip index.
    Clip(usize),
    /// Start position in seconds.
    Position(f64),
    Bar(i64),
}

/// Where `move_clip` puts the clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipDestination {
    Position(f64),
    Bar(i64),
}

/// Which clip `move_clip` moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipSource {
    Clip(usize),
    OldPosition(f64),
}

/// The two forms of `add_automation`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AutomationBody {
    Curve(CurveSpec),
    Points {
        points: Vec<AutomationPoint>,
        #[serde(skip_serializing_if = "Option::is_none")]
        shape: Option<i64>,
    },
}

/// A named automation curve with optional timing, range and oscillator
/// parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CurveSpec {
    pub curve: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_bar: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_bar: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freq: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<f64>,
}

/// One automation point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AutomationPoint {
    #[serde(flatten)]
    pub at: PointTime,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointTime {
    /// Seconds.
    Time(f64),
    Bar(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(action: &Action) -> serde_json::Value {
        serde_json::to_value(action).unwrap()
    }

    #[test]
    fn create_track_omits_missing_fields() {
        let a = Action::CreateTrack {
            instrument: Some("Serum".into()),
            name: None,
            index: 0,
        };
        assert_eq!(
            wire(&a),
            json!({"action": "create_track", "instrument": "Serum", "index": 0})
        );
    }

    #[test]
    fn field_order_is_stable() {
        let a = Action::CreateClipAtBar {
            track: 0,
            bar: 1,
            length_bars: 4,
        };
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            r#"{"action":"create_clip_at_bar","track":0,"bar":1,"length_bars":4}"#
        );
    }

    #[test]
    fn set_track_flattens_props() {
        let a = Action::SetTrack {
            track: 2,
            props: TrackProps {
                mute: Some(false),
                color: Some("#ff0000".into()),
                ..Default::default()
            },
        };
        assert_eq!(
            wire(&a),
            json!({"action": "set_track", "track": 2, "mute": false, "color": "#ff0000"})
        );
    }

    #[test]
    fn clip_actions_carry_one_identifier() {
        let a = Action::SetClip {
            track: 1,
            clip: ClipRef::Position(5.0),
            props: ClipProps {
                name: Some("Short Clip".into()),
                ..Default::default()
            },
        };
        assert_eq!(
            wire(&a),
            json!({"action": "set_clip", "track": 1, "position": 5.0, "name": "Short Clip"})
        );

        let d = Action::DeleteClip {
            track: 0,
            clip: ClipRef::Clip(3),
        };
        assert_eq!(wire(&d), json!({"action": "delete_clip", "track": 0, "clip": 3}));
    }

    #[test]
    fn move_clip_wire_format() {
        let a = Action::SetClipPosition {
            track: 0,
            to: ClipDestination::Position(8.0),
            from: ClipSource::OldPosition(4.0),
        };
        assert_eq!(
            wire(&a),
            json!({"action": "set_clip_position", "track": 0, "position": 8.0, "old_position": 4.0})
        );
    }

    #[test]
    fn automation_curve_and_points() {
        let curve = Action::AddAutomation {
            track: 0,
            param: "volume".into(),
            body: AutomationBody::Curve(CurveSpec {
                curve: "fade_in".into(),
                start: Some(0.0),
                end: Some(4.0),
                ..Default::default()
            }),
        };
        assert_eq!(
            wire(&curve),
            json!({"action": "add_automation", "track": 0, "param": "volume", "curve": "fade_in", "start": 0.0, "end": 4.0})
        );

        let points = Action::AddAutomation {
            track: 0,
            param: "pan".into(),
            body: AutomationBody::Points {
                points: vec![
                    AutomationPoint {
                        at: PointTime::Time(0.0),
                        value: -1.0,
                    },
                    AutomationPoint {
                        at: PointTime::Bar(2.0),
                        value: 1.0,
                    },
                ],
                shape: Some(1),
            },
        };
        assert_eq!(
            wire(&points),
            json!({
                "action": "add_automation", "track": 0, "param": "pan",
                "points": [{"time": 0.0, "value": -1.0}, {"bar": 2.0, "value": 1.0}],
                "shape": 1
            })
        );
    }

    #[test]
    fn kind_matches_wire_tag() {
        let a = Action::DeleteTrack { track: 4 };
        assert_eq!(wire(&a)["action"], a.kind());
        assert_eq!(a.track(), 4);
    }
}
