//! Interpreter: [`Script`] + [`Session`] → ordered [`Action`]s.
//!
//! Statements run strictly in order. Within a statement, a `filter` head
//! hands its result to the next chained call as an explicit pending
//! collection; the call consumes it and nothing else can see it.

pub mod color;
pub mod dispatch;
pub mod error;
pub mod functional;
pub mod predicate;
pub mod state;

pub use error::{Failure, InterpretError};
pub use state::{Collection, InterpreterState};

use tracing::{debug, info, warn};

use crate::action::Action;
use crate::config::ClipDefaults;
use crate::dsl::{CallEvent, Dsl, Script, Statement};
use crate::session::Session;

/// Runs scripts against one session snapshot.
///
/// Each run gets fresh [`InterpreterState`]; nothing carries over between
/// runs, so one interpreter can be reused for many scripts.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    session: Session,
    clip_defaults: ClipDefaults,
}

impl Interpreter {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            clip_defaults: ClipDefaults::default(),
        }
    }

    pub fn with_clip_defaults(mut self, clip_defaults: ClipDefaults) -> Self {
        self.clip_defaults = clip_defaults;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Parse and execute DSL source.
    pub fn run(&self, source: &str) -> Result<Vec<Action>, Failure> {
        debug!(dsl = %Dsl::preview(source), "parsing");
        let script = Dsl::parse(source).map_err(|err| {
            warn!(error = %err, dsl = %Dsl::preview(source), "syntax error");
            Failure::from(err)
        })?;
        self.execute(&script)
    }

    /// Execute a parsed script.
    ///
    /// Stops at the first failing statement. The failure carries the actions
    /// of the statements before it; the failing statement contributes none.
    pub fn execute(&self, script: &Script) -> Result<Vec<Action>, Failure> {
        let mut state = InterpreterState::new(&self.session, self.clip_defaults);

        for statement in &script.statements {
            let checkpoint = state.actions.len();
            if let Err(error) = execute_statement(&mut state, statement) {
                state.actions.truncate(checkpoint);
                warn!(
                    line = statement.line,
                    kind = error.kind(),
                    error = %error,
                    kept = state.actions.len(),
                    "statement failed"
                );
                return Err(Failure::new(error, state.actions));
            }
        }

        if state.actions.is_empty() {
            return Err(InterpretError::NoActionsProduced.into());
        }

        info!(
            statements = script.statements.len(),
            calls = script.calls().count(),
            actions = state.actions.len(),
            "interpreted script"
        );
        Ok(state.actions)
    }
}

/// One-shot helper: parse `source` and run it against `session`.
pub fn translate(source: &str, session: &Session) -> Result<Vec<Action>, Failure> {
    Interpreter::new(session.clone()).run(source)
}

fn execute_statement(
    state: &mut InterpreterState<'_>,
    statement: &Statement,
) -> Result<(), InterpretError> {
    let mut pending: Option<Collection> = None;
    for call in &statement.calls {
        debug!(
            line = statement.line,
            call = call.name(),
            pending = pending.as_ref().map(Collection::len),
            "dispatch"
        );
        pending = execute_call(state, call, pending)?;
    }
    Ok(())
}

/// Run one call and return the pending collection for the next call.
fn execute_call(
    state: &mut InterpreterState<'_>,
    call: &CallEvent,
    pending: Option<Collection>,
) -> Result<Option<Collection>, InterpretError> {
    match call {
        CallEvent::Track(args) => {
            dispatch::track(state, args)?;
            Ok(None)
        }
        CallEvent::Filter {
            collection,
            predicate,
        } => {
            let result = functional::filter(state, collection, predicate)?;
            state.store.insert(result.clone());
            state.current_track = None;
            Ok(Some(result))
        }
        CallEvent::Map { collection, func } => {
            let mapped = functional::map(state, collection, func)?;
            state.store.insert(mapped);
            Ok(None)
        }
        CallEvent::ForEach { collection, func } => {
            functional::for_each(state, collection, func)?;
            Ok(None)
        }
        CallEvent::Method { method, args } if method.is_statement_head() => {
            dispatch::apply(state, *method, args, None)?;
            Ok(pending)
        }
        CallEvent::Method { method, args } => match pending {
            Some(matched) if matched.is_empty() => {
                debug!(
                    method = method.name(),
                    collection = matched.name(),
                    "filter matched nothing; skipping"
                );
                Ok(None)
            }
            pending => {
                dispatch::apply(state, *method, args, pending.as_ref())?;
                Ok(None)
            }
        },
    }
}
