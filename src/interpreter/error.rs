//! Interpretation errors.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::action::Action;
use crate::dsl::SyntaxError;

/// Why a script could not be (fully) turned into actions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpretError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("no track context for {method} call")]
    NoTrackContext { method: &'static str },

    #[error("no selected track found in session")]
    NoSelectedTrack,

    #[error("collection '{0}' not found")]
    NoCollectionFound(String),

    #[error("{method} requires exactly one of {expected} (got {found})")]
    AmbiguousClipIdentifier {
        method: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("{operator} does not support function references (@{name})")]
    UnsupportedFunctionReference {
        operator: &'static str,
        name: String,
    },

    #[error("malformed automation points: {0}")]
    MalformedAutomationPoints(String),

    #[error("{method} requires {argument}")]
    MissingArgument {
        method: &'static str,
        argument: &'static str,
    },

    #[error("{method}: invalid {argument}: {reason}")]
    InvalidArgument {
        method: &'static str,
        argument: String,
        reason: String,
    },

    #[error("script produced no actions")]
    NoActionsProduced,
}

impl InterpretError {
    /// Stable machine-readable name.
    pub fn kind(&self) -> &'static str {
        match self {
            InterpretError::Syntax(_) => "syntax_error",
            InterpretError::NoTrackContext { .. } => "no_track_context",
            InterpretError::NoSelectedTrack => "no_selected_track",
            InterpretError::NoCollectionFound(_) => "no_collection_found",
            InterpretError::AmbiguousClipIdentifier { .. } => "ambiguous_clip_identifier",
            InterpretError::UnsupportedFunctionReference { .. } => "unsupported_function_reference",
            InterpretError::MalformedAutomationPoints(_) => "malformed_automation_points",
            InterpretError::MissingArgument { .. } => "missing_argument",
            InterpretError::InvalidArgument { .. } => "invalid_argument",
            InterpretError::NoActionsProduced => "no_actions_produced",
        }
    }

    pub(crate) fn invalid(
        method: &'static str,
        argument: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        InterpretError::InvalidArgument {
            method,
            argument: argument.into(),
            reason: reason.into(),
        }
    }
}

impl Serialize for InterpretError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("InterpretError", 2)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

/// A failed run: the error plus the actions appended by statements that
/// completed before it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error}")]
pub struct Failure {
    pub error: InterpretError,
    pub partial: Vec<Action>,
}

impl Failure {
    pub fn new(error: InterpretError, partial: Vec<Action>) -> Self {
        Self { error, partial }
    }
}

impl From<InterpretError> for Failure {
    fn from(error: InterpretError) -> Self {
        Self::new(error, Vec::new())
    }
}

impl From<SyntaxError> for Failure {
    fn from(error: SyntaxError) -> Self {
        Self::new(error.into(), Vec::new())
    }
}

impl Serialize for Failure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Failure", 3)?;
        s.serialize_field("kind", self.error.kind())?;
        s.serialize_field("message", &self.error.to_string())?;
        s.serialize_field("partial", &self.partial)?;
        s.end()
    }
}
