//! tracklang: a chained-call DSL for editing a DAW session.
//!
//! Scripts such as `filter(tracks, track.muted == true).set_track(mute=false)`
//! are parsed ([`dsl`]), run against a session snapshot ([`session`]) by the
//! [`interpreter`], and come out as flat [`action::Action`] records.

pub mod action;
pub mod config;
pub mod dsl;
pub mod interpreter;
pub mod session;

pub use action::Action;
pub use dsl::Dsl;
pub use interpreter::{translate, Failure, InterpretError, Interpreter};
pub use session::Session;
