//! `filter`, `map` and `for_each`.

use tracing::{debug, warn};

use super::dispatch;
use super::error::InterpretError;
use super::predicate::evaluate;
use super::state::{Collection, InterpreterState, IterationContext};
use crate::dsl::{FunctionRef, Predicate};
use crate::session::Item;

/// Keep the elements of `collection` that satisfy `predicate`, in order.
/// The result is named `<collection>_filtered`.
pub fn filter(
    state: &InterpreterState<'_>,
    collection: &str,
    predicate: &Predicate,
) -> Result<Collection, InterpretError> {
    let source = state.resolve(collection)?;
    let var = source.iteration_var();
    if predicate.binder != var {
        warn!(
            collection,
            binder = %predicate.binder,
            expected = %var,
            "predicate binder does not name the iteration variable; nothing will match"
        );
    }

    let matched: Vec<Item> = source
        .items()
        .iter()
        .filter(|&item| evaluate(predicate, &IterationContext { var: &var, item }))
        .cloned()
        .collect();

    debug!(
        collection,
        predicate = %predicate,
        total = source.len(),
        matched = matched.len(),
        "filter"
    );
    Ok(Collection::new(format!("{collection}_filtered"), matched))
}

/// Pass-through: the elements of `collection`, unchanged, as
/// `<collection>_mapped`. Method-call transforms are not applied.
pub fn map(
    state: &InterpreterState<'_>,
    collection: &str,
    func: &FunctionRef,
) -> Result<Collection, InterpretError> {
    let source = state.resolve(collection)?;
    if let FunctionRef::Named(name) = func {
        return Err(InterpretError::UnsupportedFunctionReference {
            operator: "map",
            name: name.clone(),
        });
    }
    debug!(collection, elements = source.len(), "map (pass-through)");
    Ok(Collection::new(
        format!("{collection}_mapped"),
        source.items().to_vec(),
    ))
}

/// Invoke a method once per element of `collection`.
///
/// Each call sees a one-element pending collection, so handlers take the
/// target track (and clip) from the element itself. A failing element is
/// logged and skipped; its partial output is discarded. The current track
/// is restored afterwards.
pub fn for_each(
    state: &mut InterpreterState<'_>,
    collection: &str,
    func: &FunctionRef,
) -> Result<(), InterpretError> {
    let source = state.resolve(collection)?;
    let (binder, method, args) = match func {
        FunctionRef::Named(name) => {
            return Err(InterpretError::UnsupportedFunctionReference {
                operator: "for_each",
                name: name.clone(),
            });
        }
        FunctionRef::MethodCall {
            binder,
            method,
            args,
        } => (binder, *method, args),
    };

    let var = source.iteration_var();
    if *binder != var {
        debug!(collection, binder = %binder, expected = %var, "for_each binder differs from iteration variable");
    }

    let saved_track = state.current_track;
    let mut failed = 0usize;
    for (i, item) in source.items().iter().enumerate() {
        let single = Collection::new(source.name(), vec![item.clone()]);
        state.current_track = item.target_track().or(saved_track);

        let checkpoint = state.actions.len();
        if let Err(err) = dispatch::apply(state, method, args, Some(&single)) {
            state.actions.truncate(checkpoint);
            failed += 1;
            warn!(
                collection,
                element = i,
                method = method.name(),
                error = %err,
                "for_each element failed; skipping"
            );
        }
    }
    state.current_track = saved_track;

    debug!(
        collection,
        method = method.name(),
        elements = source.len(),
        failed,
        "for_each"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::config::ClipDefaults;
    use crate::dsl::{Args, CompareOp, Method, Value};
    use crate::session::Session;
    use serde_json::json;

    fn session() -> Session {
        Session::from_json(&json!({
            "tracks": [
                {"name": "Drums", "muted": true},
                {"name": "Bass"},
                {"name": "Keys", "muted": true}
            ]
        }))
        .unwrap()
    }

    fn muted() -> Predicate {
        Predicate {
            binder: "track".into(),
            field: "muted".into(),
            op: CompareOp::Eq,
            literal: Value::Bool(true),
        }
    }

    #[test]
    fn filter_keeps_matching_in_order() {
        let session = session();
        let state = InterpreterState::new(&session, ClipDefaults::default());
        let result = filter(&state, "tracks", &muted()).unwrap();
        assert_eq!(result.name(), "tracks_filtered");
        let indices: Vec<_> = result.items().iter().map(Item::target_track).collect();
        assert_eq!(indices, vec![Some(0), Some(2)]);
    }

    #[test]
    fn filter_unknown_collection() {
        let session = session();
        let state = InterpreterState::new(&session, ClipDefaults::default());
        let err = filter(&state, "buses", &muted()).unwrap_err();
        assert_eq!(err.kind(), "no_collection_found");
    }

    #[test]
    fn filter_with_wrong_binder_matches_nothing() {
        let session = session();
        let state = InterpreterState::new(&session, ClipDefaults::default());
        let mut p = muted();
        p.binder = "clip".into();
        assert!(filter(&state, "tracks", &p).unwrap().is_empty());
    }

    #[test]
    fn map_is_pass_through() {
        let session = session();
        let state = InterpreterState::new(&session, ClipDefaults::default());
        let func = FunctionRef::MethodCall {
            binder: "track".into(),
            method: Method::SetTrack,
            args: Args::new(),
        };
        let mapped = map(&state, "tracks", &func).unwrap();
        assert_eq!(mapped.name(), "tracks_mapped");
        assert_eq!(mapped.len(), 3);
        assert!(state.actions.is_empty());
    }

    #[test]
    fn named_references_are_unsupported() {
        let session = session();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        let func = FunctionRef::Named("louder".into());
        assert_eq!(
            map(&state, "tracks", &func).unwrap_err(),
            InterpretError::UnsupportedFunctionReference {
                operator: "map",
                name: "louder".into()
            }
        );
        assert_eq!(
            for_each(&mut state, "tracks", &func).unwrap_err().kind(),
            "unsupported_function_reference"
        );
    }

    #[test]
    fn for_each_runs_per_element_and_restores_track() {
        let session = session();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        state.current_track = Some(7);
        let func = FunctionRef::MethodCall {
            binder: "track".into(),
            method: Method::AddFx,
            args: [("fxname", Value::String("ReaEQ".into()))].into_iter().collect(),
        };
        for_each(&mut state, "tracks", &func).unwrap();
        let tracks: Vec<_> = state.actions.iter().map(Action::track).collect();
        assert_eq!(tracks, vec![0, 1, 2]);
        assert_eq!(state.current_track, Some(7));
    }

    #[test]
    fn for_each_swallows_element_failures() {
        let session = session();
        let mut state = InterpreterState::new(&session, ClipDefaults::default());
        let func = FunctionRef::MethodCall {
            binder: "track".into(),
            method: Method::DeleteClip,
            args: Args::new(),
        };
        for_each(&mut state, "tracks", &func).unwrap();
        assert!(state.actions.is_empty());
    }
}
