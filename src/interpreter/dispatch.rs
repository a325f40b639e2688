//! Side-effect dispatch: one handler per [`Method`].
//!
//! Every track- and clip-level handler runs in one of two modes. With no
//! pending collection it targets the current track (single-target). With a
//! pending collection from `filter`, or the one-element collection
//! `for_each` hands it, it emits one action per element (broadcast).

use tracing::{debug, warn};

use super::color::resolve_color;
use super::error::InterpretError;
use super::state::{Collection, InterpreterState};
use crate::action::{
    Action, AutomationBody, AutomationPoint, ClipDestination, ClipProps, ClipRef, ClipSource,
    CurveSpec, PointTime, TrackProps,
};
use crate::config::ClipDefaults;
use crate::dsl::{Args, Method, Value};
use crate::session::Item;

const CLIP_IDENTIFIERS: &str = "clip, position or bar";
const MOVE_SOURCES: &str = "clip or old_position";

/// `track(...)`: reference an existing track or create a new one.
pub fn track(state: &mut InterpreterState<'_>, args: &Args) -> Result<(), InterpretError> {
    const METHOD: &str = "track";
    warn_unknown(
        METHOD,
        args,
        &["id", "selected", "instrument", "name", "index"],
    );

    if let Some(id) = integer(args, METHOD, "id")? {
        if id < 1 {
            return Err(InterpretError::invalid(METHOD, "id", "track ids start at 1"));
        }
        state.current_track = Some((id - 1) as usize);
        debug!(track = id - 1, "track reference by id");
        return Ok(());
    }

    if boolean(args, METHOD, "selected")? == Some(true) {
        let index = state
            .session
            .selected_track_index()
            .ok_or(InterpretError::NoSelectedTrack)?;
        state.current_track = Some(index);
        debug!(track = index, "track reference by selection");
        return Ok(());
    }

    let instrument = string(args, METHOD, "instrument")?;
    let name = string(args, METHOD, "name")?;
    let index = match index(args, METHOD, "index")? {
        Some(explicit) => {
            state.track_counter = explicit + 1;
            explicit
        }
        None => {
            let next = state.track_counter;
            state.track_counter += 1;
            next
        }
    };

    state.current_track = Some(index);
    state.emit(Action::CreateTrack {
        instrument,
        name,
        index,
    });
    Ok(())
}

/// Run a chained or per-element method call.
pub fn apply(
    state: &mut InterpreterState<'_>,
    method: Method,
    args: &Args,
    pending: Option<&Collection>,
) -> Result<(), InterpretError> {
    let defaults = state.clip_defaults;
    match method {
        Method::Store => store(state, args),
        Method::GetTracks => {
            state.refresh_tracks();
            Ok(())
        }
        Method::GetFxChain => {
            let track = state.require_track(method.name())?;
            state.load_fx_chain(track);
            Ok(())
        }
        Method::NewClip => {
            warn_unknown(
                method.name(),
                args,
                &["bar", "length_bars", "start", "position", "length"],
            );
            for_targets(state, method, pending, |track, _| {
                new_clip(args, &defaults, track).map(Some)
            })
        }
        Method::AddFx => {
            warn_unknown(method.name(), args, &["fxname", "instrument"]);
            for_targets(state, method, pending, |track, _| add_fx(args, track).map(Some))
        }
        Method::SetTrack => {
            warn_unknown(
                method.name(),
                args,
                &["name", "volume_db", "pan", "mute", "solo", "selected", "color"],
            );
            let props = track_props(args)?;
            for_targets(state, method, pending, |track, _| {
                Ok(Some(Action::SetTrack {
                    track,
                    props: props.clone(),
                }))
            })
        }
        Method::Delete => for_targets(state, method, pending, |track, _| {
            Ok(Some(Action::DeleteTrack { track }))
        }),
        Method::DeleteClip => {
            warn_unknown(method.name(), args, &["clip", "position", "bar"]);
            for_targets(state, method, pending, |track, item| {
                Ok(clip_ref(method, args, item)?.map(|clip| Action::DeleteClip { track, clip }))
            })
        }
        Method::SetClip => {
            warn_unknown(
                method.name(),
                args,
                &["clip", "position", "bar", "name", "color", "selected", "length"],
            );
            let props = clip_props(args)?;
            for_targets(state, method, pending, |track, item| {
                Ok(clip_ref(method, args, item)?.map(|clip| Action::SetClip {
                    track,
                    clip,
                    props: props.clone(),
                }))
            })
        }
        Method::MoveClip => {
            warn_unknown(
                method.name(),
                args,
                &["position", "bar", "clip", "old_position"],
            );
            let to = clip_destination(args)?;
            for_targets(state, method, pending, |track, item| {
                Ok(move_source(args, item)?.map(|from| Action::SetClipPosition { track, to, from }))
            })
        }
        Method::AddAutomation => {
            let (param, body) = automation(args)?;
            for_targets(state, method, pending, |track, _| {
                Ok(Some(Action::AddAutomation {
                    track,
                    param: param.clone(),
                    body: body.clone(),
                }))
            })
        }
    }
}

/// Build one action per target. Single-target mode uses the current track;
/// broadcast mode uses each element's track and skips elements that don't
/// have one. `build` may also decline an element by returning `None`.
fn for_targets<F>(
    state: &mut InterpreterState<'_>,
    method: Method,
    pending: Option<&Collection>,
    mut build: F,
) -> Result<(), InterpretError>
where
    F: FnMut(usize, Option<&Item>) -> Result<Option<Action>, InterpretError>,
{
    let Some(collection) = pending else {
        let track = single_target(state, method)?;
        if let Some(action) = build(track, None)? {
            state.emit(action);
        }
        return Ok(());
    };

    let mut actions = Vec::with_capacity(collection.len());
    for item in collection.items() {
        let Some(track) = item.target_track() else {
            warn!(
                method = method.name(),
                collection = collection.name(),
                kind = item.kind(),
                "skipping element without a track"
            );
            continue;
        };
        match build(track, Some(item))? {
            Some(action) => actions.push(action),
            None => warn!(
                method = method.name(),
                collection = collection.name(),
                track,
                "skipping element without a clip identifier"
            ),
        }
    }

    debug!(
        method = method.name(),
        collection = collection.name(),
        elements = collection.len(),
        actions = actions.len(),
        "broadcast"
    );
    for action in actions {
        state.emit(action);
    }
    Ok(())
}

/// The current track. `new_clip` alone falls back to the selected track.
fn single_target(state: &InterpreterState<'_>, method: Method) -> Result<usize, InterpretError> {
    if let Some(track) = state.current_track {
        return Ok(track);
    }
    if method == Method::NewClip {
        if let Some(selected) = state.session.selected_track_index() {
            return Ok(selected);
        }
    }
    Err(InterpretError::NoTrackContext {
        method: method.name(),
    })
}

fn store(state: &mut InterpreterState<'_>, args: &Args) -> Result<(), InterpretError> {
    const METHOD: &str = "store";
    let name = string(args, METHOD, "name")?.ok_or(InterpretError::MissingArgument {
        method: METHOD,
        argument: "name",
    })?;
    let value = args.get("value").ok_or(InterpretError::MissingArgument {
        method: METHOD,
        argument: "value",
    })?;
    state.store_literal(&name, value);
    debug!(name = %name, "stored literal");
    Ok(())
}

fn new_clip(args: &Args, defaults: &ClipDefaults, track: usize) -> Result<Action, InterpretError> {
    const METHOD: &str = "new_clip";

    if let Some(bar) = integer(args, METHOD, "bar")? {
        let length_bars = integer(args, METHOD, "length_bars")?.unwrap_or(defaults.length_bars);
        if length_bars <= 0 {
            return Err(InterpretError::invalid(METHOD, "length_bars", "must be positive"));
        }
        return Ok(Action::CreateClipAtBar {
            track,
            bar,
            length_bars,
        });
    }

    let position = match number(args, METHOD, "start")? {
        Some(start) => Some(start),
        None => number(args, METHOD, "position")?,
    };
    let Some(position) = position else {
        return Err(InterpretError::MissingArgument {
            method: METHOD,
            argument: "bar, start or position",
        });
    };
    if position < 0.0 {
        return Err(InterpretError::invalid(METHOD, "position", "must not be negative"));
    }
    let length = number(args, METHOD, "length")?.unwrap_or(defaults.length_seconds);
    if length <= 0.0 {
        return Err(InterpretError::invalid(METHOD, "length", "must be positive"));
    }

    Ok(Action::CreateClip {
        track,
        position,
        length,
    })
}

fn add_fx(args: &Args, track: usize) -> Result<Action, InterpretError> {
    const METHOD: &str = "add_fx";
    match (
        string(args, METHOD, "fxname")?,
        string(args, METHOD, "instrument")?,
    ) {
        (Some(fxname), None) => Ok(Action::AddTrackFx { track, fxname }),
        (None, Some(fxname)) => Ok(Action::AddInstrument { track, fxname }),
        (Some(_), Some(_)) => Err(InterpretError::invalid(
            METHOD,
            "instrument",
            "give either fxname or instrument, not both",
        )),
        (None, None) => Err(InterpretError::MissingArgument {
            method: METHOD,
            argument: "fxname or instrument",
        }),
    }
}

fn track_props(args: &Args) -> Result<TrackProps, InterpretError> {
    const METHOD: &str = "set_track";
    let props = TrackProps {
        name: string(args, METHOD, "name")?,
        volume_db: number(args, METHOD, "volume_db")?,
        pan: number(args, METHOD, "pan")?,
        mute: boolean(args, METHOD, "mute")?,
        solo: boolean(args, METHOD, "solo")?,
        selected: boolean(args, METHOD, "selected")?,
        color: color(args, METHOD)?,
    };
    if props.is_empty() {
        return Err(InterpretError::MissingArgument {
            method: METHOD,
            argument: "at least one of name, volume_db, pan, mute, solo, selected or color",
        });
    }
    Ok(props)
}

fn clip_props(args: &Args) -> Result<ClipProps, InterpretError> {
    const METHOD: &str = "set_clip";
    let props = ClipProps {
        name: string(args, METHOD, "name")?,
        color: color(args, METHOD)?,
        selected: boolean(args, METHOD, "selected")?,
        length: number(args, METHOD, "length")?,
    };
    if props.length.is_some_and(|l| l <= 0.0) {
        return Err(InterpretError::invalid(METHOD, "length", "must be positive"));
    }
    if props.is_empty() {
        return Err(InterpretError::MissingArgument {
            method: METHOD,
            argument: "at least one of name, color, selected or length",
        });
    }
    Ok(props)
}

/// Which clip a clip-level call targets. A clip element identifies itself
/// (by position, else index); otherwise exactly one of `clip`, `position`
/// or `bar` must be given.
fn clip_ref(
    method: Method,
    args: &Args,
    item: Option<&Item>,
) -> Result<Option<ClipRef>, InterpretError> {
    if let Some(Item::Clip(clip)) = item {
        return Ok(clip
            .position
            .map(ClipRef::Position)
            .or(clip.index.map(ClipRef::Clip)));
    }

    let m = method.name();
    let clip = match (
        index(args, m, "clip")?,
        number(args, m, "position")?,
        integer(args, m, "bar")?,
    ) {
        (Some(index), None, None) => ClipRef::Clip(index),
        (None, Some(position), None) => ClipRef::Position(position),
        (None, None, Some(bar)) => ClipRef::Bar(bar),
        (clip, position, bar) => {
            return Err(InterpretError::AmbiguousClipIdentifier {
                method: m,
                expected: CLIP_IDENTIFIERS,
                found: [clip.is_some(), position.is_some(), bar.is_some()]
                    .iter()
                    .filter(|present| **present)
                    .count(),
            })
        }
    };
    Ok(Some(clip))
}

fn clip_destination(args: &Args) -> Result<ClipDestination, InterpretError> {
    const METHOD: &str = "move_clip";
    if let Some(position) = number(args, METHOD, "position")? {
        if position < 0.0 {
            return Err(InterpretError::invalid(METHOD, "position", "must not be negative"));
        }
        return Ok(ClipDestination::Position(position));
    }
    if let Some(bar) = integer(args, METHOD, "bar")? {
        return Ok(ClipDestination::Bar(bar));
    }
    Err(InterpretError::MissingArgument {
        method: METHOD,
        argument: "position or bar",
    })
}

fn move_source(args: &Args, item: Option<&Item>) -> Result<Option<ClipSource>, InterpretError> {
    const METHOD: &str = "move_clip";
    if let Some(Item::Clip(clip)) = item {
        return Ok(clip
            .position
            .map(ClipSource::OldPosition)
            .or(clip.index.map(ClipSource::Clip)));
    }

    let source = match (
        index(args, METHOD, "clip")?,
        number(args, METHOD, "old_position")?,
    ) {
        (Some(index), None) => ClipSource::Clip(index),
        (None, Some(old)) => ClipSource::OldPosition(old),
        (clip, old) => {
            return Err(InterpretError::AmbiguousClipIdentifier {
                method: METHOD,
                expected: MOVE_SOURCES,
                found: usize::from(clip.is_some()) + usize::from(old.is_some()),
            })
        }
    };
    Ok(Some(source))
}

/// `add_automation`: the curve form wins when both are present.
fn automation(args: &Args) -> Result<(String, AutomationBody), InterpretError> {
    const METHOD: &str = "add_automation";
    let param = string(args, METHOD, "param")?.ok_or(InterpretError::MissingArgument {
        method: METHOD,
        argument: "param",
    })?;

    if let Some(curve) = string(args, METHOD, "curve")? {
        let spec = CurveSpec {
            curve,
            start: number(args, METHOD, "start")?,
            end: number(args, METHOD, "end")?,
            start_bar: number(args, METHOD, "start_bar")?,
            end_bar: number(args, METHOD, "end_bar")?,
            from: number(args, METHOD, "from")?,
            to: number(args, METHOD, "to")?,
            freq: number(args, METHOD, "freq")?,
            amplitude: number(args, METHOD, "amplitude")?,
            phase: number(args, METHOD, "phase")?,
        };
        return Ok((param, AutomationBody::Curve(spec)));
    }

    let Some(raw) = args.get("points") else {
        return Err(InterpretError::MissingArgument {
            method: METHOD,
            argument: "curve or points",
        });
    };
    let points = automation_points(raw)?;
    let shape = integer(args, METHOD, "shape")?;
    Ok((param, AutomationBody::Points { points, shape }))
}

fn automation_points(raw: &Value) -> Result<Vec<AutomationPoint>, InterpretError> {
    let malformed = |reason: String| InterpretError::MalformedAutomationPoints(reason);

    let elements = raw
        .as_array()
        .ok_or_else(|| malformed(format!("expected an array, got {}", raw.type_name())))?;
    if elements.is_empty() {
        return Err(malformed("no points given".to_string()));
    }

    elements
        .iter()
        .enumerate()
        .map(|(i, element)| {
            let fields = element.as_object().ok_or_else(|| {
                malformed(format!("point {i}: expected {{time|bar, value}}, got {}", element.type_name()))
            })?;
            let value = fields
                .get("value")
                .and_then(Value::as_number)
                .ok_or_else(|| malformed(format!("point {i}: missing numeric value")))?;
            let at = match (
                fields.get("time").and_then(Value::as_number),
                fields.get("bar").and_then(Value::as_number),
            ) {
                (Some(time), None) => PointTime::Time(time),
                (None, Some(bar)) => PointTime::Bar(bar),
                _ => {
                    return Err(malformed(format!(
                        "point {i}: needs exactly one numeric time or bar"
                    )))
                }
            };
            Ok(AutomationPoint { at, value })
        })
        .collect()
}

// --- Argument access ---

fn warn_unknown(method: &'static str, args: &Args, known: &[&str]) {
    for (key, _) in args.iter() {
        if !known.contains(&key) {
            warn!(method, argument = key, "ignoring unknown argument");
        }
    }
}

fn number(args: &Args, method: &'static str, key: &str) -> Result<Option<f64>, InterpretError> {
    match args.get(key) {
        None => Ok(None),
        Some(v) => v.to_number().map(Some).ok_or_else(|| {
            InterpretError::invalid(method, key, format!("expected a number, got {}", v.type_name()))
        }),
    }
}

fn integer(args: &Args, method: &'static str, key: &str) -> Result<Option<i64>, InterpretError> {
    match number(args, method, key)? {
        None => Ok(None),
        Some(n) if n.fract() == 0.0 && n.abs() < 1e15 => Ok(Some(n as i64)),
        Some(n) => Err(InterpretError::invalid(
            method,
            key,
            format!("expected a whole number, got {n}"),
        )),
    }
}

fn index(args: &Args, method: &'static str, key: &str) -> Result<Option<usize>, InterpretError> {
    match integer(args, method, key)? {
        None => Ok(None),
        Some(n) if n >= 0 => Ok(Some(n as usize)),
        Some(n) => Err(InterpretError::invalid(
            method,
            key,
            format!("expected a non-negative index, got {n}"),
        )),
    }
}

fn string(args: &Args, method: &'static str, key: &str) -> Result<Option<String>, InterpretError> {
    match args.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(v) => Err(InterpretError::invalid(
            method,
            key,
            format!("expected a string, got {}", v.type_name()),
        )),
    }
}

fn boolean(args: &Args, method: &'static str, key: &str) -> Result<Option<bool>, InterpretError> {
    match args.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(v) => Err(InterpretError::invalid(
            method,
            key,
            format!("expected true or false, got {}", v.type_name()),
        )),
    }
}

fn color(args: &Args, method: &'static str) -> Result<Option<String>, InterpretError> {
    match args.get("color") {
        None => Ok(None),
        Some(v) => resolve_color(v).map(Some).ok_or_else(|| {
            InterpretError::invalid(method, "color", format!("not a color: {v}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use assert_approx_eq::assert_approx_eq;
    use serde_json::json;

    fn session() -> Session {
        Session::from_json(&json!({
            "tracks": [
                {"name": "Drums", "clips": [{"position": 0.0, "length": 4.0}, {"position": 4.0, "length": 1.0}]},
                {"name": "Bass", "selected": true, "clips": [{"length": 2.0}]}
            ]
        }))
        .unwrap()
    }

    fn args(pairs: &[(&str, Value)]) -> Args {
        pairs.iter().cloned().collect()
    }

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    fn n(v: f64) -> Value {
        Value::Number(v)
    }

    #[test]
    fn track_creation_uses_counter() {
        let session = session();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        track(&mut state, &args(&[("instrument", s("Serum"))])).unwrap();
        track(&mut state, &args(&[("name", s("Pad"))])).unwrap();
        assert_eq!(
            state.actions,
            vec![
                Action::CreateTrack {
                    instrument: Some("Serum".into()),
                    name: None,
                    index: 2
                },
                Action::CreateTrack {
                    instrument: None,
                    name: Some("Pad".into()),
                    index: 3
                },
            ]
        );
        assert_eq!(state.current_track, Some(3));
        assert_eq!(state.track_counter, 4);
    }

    #[test]
    fn explicit_index_advances_counter() {
        let session = Session::empty();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        track(&mut state, &args(&[("index", n(5.0))])).unwrap();
        track(&mut state, &Args::new()).unwrap();
        assert_eq!(state.actions[1].track(), 6);
    }

    #[test]
    fn track_reference_emits_nothing() {
        let session = session();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        track(&mut state, &args(&[("id", n(2.0))])).unwrap();
        assert_eq!(state.current_track, Some(1));
        track(&mut state, &args(&[("selected", Value::Bool(true))])).unwrap();
        assert_eq!(state.current_track, Some(1));
        assert!(state.actions.is_empty());
    }

    #[test]
    fn track_id_zero_is_invalid() {
        let session = session();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        let err = track(&mut state, &args(&[("id", n(0.0))])).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn selected_without_selection() {
        let session = Session::empty();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        let err = track(&mut state, &args(&[("selected", Value::Bool(true))])).unwrap_err();
        assert_eq!(err, InterpretError::NoSelectedTrack);
    }

    #[test]
    fn selected_false_creates() {
        let session = Session::empty();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        track(&mut state, &args(&[("selected", Value::Bool(false))])).unwrap();
        assert_eq!(state.actions.len(), 1);
    }

    #[test]
    fn new_clip_defaults_come_from_config() {
        let session = Session::empty();
        let defaults = ClipDefaults {
            length_bars: 2,
            length_seconds: 1.5,
        };
        let mut state = InterpreterState::new(&session, defaults);
        state.current_track = Some(0);
        apply(&mut state, Method::NewClip, &args(&[("bar", n(3.0))]), None).unwrap();
        apply(&mut state, Method::NewClip, &args(&[("start", n(8.0))]), None).unwrap();
        assert_eq!(
            state.actions[0],
            Action::CreateClipAtBar {
                track: 0,
                bar: 3,
                length_bars: 2
            }
        );
        match &state.actions[1] {
            Action::CreateClip {
                position, length, ..
            } => {
                assert_approx_eq!(*position, 8.0);
                assert_approx_eq!(*length, 1.5);
            }
            other => panic!("expected CreateClip, got {other:?}"),
        }
    }

    #[test]
    fn new_clip_falls_back_to_selected_track() {
        let session = session();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        apply(&mut state, Method::NewClip, &args(&[("bar", n(1.0))]), None).unwrap();
        assert_eq!(state.actions[0].track(), 1);
    }

    #[test]
    fn new_clip_requires_placement() {
        let session = Session::empty();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        state.current_track = Some(0);
        let err = apply(&mut state, Method::NewClip, &args(&[("length", n(2.0))]), None).unwrap_err();
        assert_eq!(err.kind(), "missing_argument");
    }

    #[test]
    fn fractional_bar_is_invalid() {
        let session = Session::empty();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        state.current_track = Some(0);
        let err = apply(&mut state, Method::NewClip, &args(&[("bar", n(1.5))]), None).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn add_fx_and_instrument() {
        let session = Session::empty();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        state.current_track = Some(0);
        apply(&mut state, Method::AddFx, &args(&[("fxname", s("ReaEQ"))]), None).unwrap();
        apply(&mut state, Method::AddFx, &args(&[("instrument", s("Serum"))]), None).unwrap();
        assert_eq!(state.actions[0].kind(), "add_track_fx");
        assert_eq!(state.actions[1].kind(), "add_instrument");

        let both = args(&[("fxname", s("ReaEQ")), ("instrument", s("Serum"))]);
        assert!(apply(&mut state, Method::AddFx, &both, None).is_err());
        assert!(apply(&mut state, Method::AddFx, &Args::new(), None).is_err());
    }

    #[test]
    fn set_track_resolves_color_and_requires_props() {
        let session = Session::empty();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        state.current_track = Some(0);
        apply(
            &mut state,
            Method::SetTrack,
            &args(&[("color", s("Red")), ("volume_db", n(-3.0))]),
            None,
        )
        .unwrap();
        match &state.actions[0] {
            Action::SetTrack { props, .. } => {
                assert_eq!(props.color.as_deref(), Some("#ff0000"));
                assert_eq!(props.volume_db, Some(-3.0));
                assert_eq!(props.name, None);
            }
            other => panic!("expected SetTrack, got {other:?}"),
        }
        let err = apply(&mut state, Method::SetTrack, &Args::new(), None).unwrap_err();
        assert_eq!(err.kind(), "missing_argument");
    }

    #[test]
    fn set_track_rejects_wrong_types() {
        let session = Session::empty();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        state.current_track = Some(0);
        let err = apply(&mut state, Method::SetTrack, &args(&[("mute", s("yes"))]), None).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn single_target_needs_track_context() {
        let session = Session::empty();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        let err = apply(&mut state, Method::Delete, &Args::new(), None).unwrap_err();
        assert_eq!(err, InterpretError::NoTrackContext { method: "delete" });
    }

    #[test]
    fn clip_identifier_must_be_unique() {
        let session = Session::empty();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        state.current_track = Some(0);

        let err = apply(&mut state, Method::DeleteClip, &Args::new(), None).unwrap_err();
        assert_eq!(
            err,
            InterpretError::AmbiguousClipIdentifier {
                method: "delete_clip",
                expected: CLIP_IDENTIFIERS,
                found: 0
            }
        );

        let two = args(&[("clip", n(0.0)), ("bar", n(2.0))]);
        let err = apply(&mut state, Method::DeleteClip, &two, None).unwrap_err();
        assert_eq!(err.kind(), "ambiguous_clip_identifier");

        apply(&mut state, Method::DeleteClip, &args(&[("bar", n(2.0))]), None).unwrap();
        assert_eq!(
            state.actions,
            vec![Action::DeleteClip {
                track: 0,
                clip: ClipRef::Bar(2)
            }]
        );
    }

    #[test]
    fn broadcast_over_clips_uses_clip_identity() {
        let session = session();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        let clips = state.resolve("clips").unwrap();
        apply(
            &mut state,
            Method::SetClip,
            &args(&[("name", s("X"))]),
            Some(&clips),
        )
        .unwrap();
        let refs: Vec<_> = state
            .actions
            .iter()
            .map(|a| match a {
                Action::SetClip { track, clip, .. } => (*track, *clip),
                other => panic!("expected SetClip, got {other:?}"),
            })
            .collect();
        assert_eq!(
            refs,
            vec![
                (0, ClipRef::Position(0.0)),
                (0, ClipRef::Position(4.0)),
                (1, ClipRef::Clip(0)),
            ]
        );
    }

    #[test]
    fn broadcast_over_tracks_uses_args_for_clip_identity() {
        let session = session();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        let tracks = state.resolve("tracks").unwrap();
        apply(
            &mut state,
            Method::DeleteClip,
            &args(&[("bar", n(1.0))]),
            Some(&tracks),
        )
        .unwrap();
        assert_eq!(state.actions.len(), 2);
        assert_eq!(state.actions[1].track(), 1);
    }

    #[test]
    fn broadcast_skips_items_without_track() {
        let session = Session::empty();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        state.store_literal("labels", &Value::Array(vec![s("a"), s("b")]));
        let labels = state.resolve("labels").unwrap();
        apply(&mut state, Method::Delete, &Args::new(), Some(&labels)).unwrap();
        assert!(state.actions.is_empty());
    }

    #[test]
    fn move_clip_single_target() {
        let session = Session::empty();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        state.current_track = Some(2);
        apply(
            &mut state,
            Method::MoveClip,
            &args(&[("position", n(16.0)), ("clip", n(1.0))]),
            None,
        )
        .unwrap();
        assert_eq!(
            state.actions[0],
            Action::SetClipPosition {
                track: 2,
                to: ClipDestination::Position(16.0),
                from: ClipSource::Clip(1)
            }
        );

        let err = apply(&mut state, Method::MoveClip, &args(&[("clip", n(1.0))]), None).unwrap_err();
        assert_eq!(err.kind(), "missing_argument");

        let err = apply(&mut state, Method::MoveClip, &args(&[("bar", n(3.0))]), None).unwrap_err();
        assert_eq!(err.kind(), "ambiguous_clip_identifier");
    }

    #[test]
    fn automation_curve_wins_over_points() {
        let session = Session::empty();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        state.current_track = Some(0);
        let a = args(&[
            ("param", s("volume")),
            ("curve", s("fade_in")),
            ("start", n(0.0)),
            ("end", n(4.0)),
            ("points", Value::Array(vec![])),
        ]);
        apply(&mut state, Method::AddAutomation, &a, None).unwrap();
        match &state.actions[0] {
            Action::AddAutomation {
                body: AutomationBody::Curve(spec),
                ..
            } => {
                assert_eq!(spec.curve, "fade_in");
                assert_eq!(spec.end, Some(4.0));
                assert_eq!(spec.freq, None);
            }
            other => panic!("expected curve automation, got {other:?}"),
        }
    }

    #[test]
    fn automation_points_are_validated() {
        let bad = Value::Array(vec![Value::Number(1.0)]);
        assert_eq!(
            automation_points(&bad).unwrap_err().kind(),
            "malformed_automation_points"
        );
        assert!(automation_points(&Value::Array(vec![])).is_err());
        assert!(automation_points(&s("[{time=0, value=1}]")).is_err());

        let good = Value::from(&json!([{"time": 0, "value": -60}, {"bar": 2, "value": 0}]));
        let points = automation_points(&good).unwrap();
        assert_eq!(points[0].at, PointTime::Time(0.0));
        assert_eq!(points[1].at, PointTime::Bar(2.0));
        assert_approx_eq!(points[0].value, -60.0);
    }

    #[test]
    fn automation_requires_param_and_body() {
        assert!(automation(&args(&[("curve", s("fade_in"))])).is_err());
        let err = automation(&args(&[("param", s("pan"))])).unwrap_err();
        assert_eq!(err.kind(), "missing_argument");
    }

    #[test]
    fn store_and_get_fx_chain() {
        let session = Session::from_json(&json!({"tracks": [{"fx": [{"name": "ReaEQ"}]}]})).unwrap();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        apply(
            &mut state,
            Method::Store,
            &args(&[("name", s("favorites")), ("value", Value::Array(vec![s("ReaEQ")]))]),
            None,
        )
        .unwrap();
        assert_eq!(state.resolve("favorites").unwrap().len(), 1);

        assert!(apply(&mut state, Method::GetFxChain, &Args::new(), None).is_err());
        state.current_track = Some(0);
        apply(&mut state, Method::GetFxChain, &Args::new(), None).unwrap();
        assert_eq!(state.store.get("fx_chain").map(Collection::len), Some(1));
        assert!(state.actions.is_empty());
    }
}
