//! Trazar - live-updating learning curve charts.
//!
//! A training loop drives a [`Session`]; the session turns configuration
//! and appended metric points into JSON-carrying signals on a
//! [`DisplaySink`]; a [`Chart`] on the far side of the sink replays those
//! signals into an SVG rendering. The crate provides:
//! - A validated chart configuration with metric routing (`config`)
//! - The session driver with backlog, flush, and finalize semantics (`session`)
//! - The wire protocol: scaffolding, directives, and signal decoding (`display`)
//! - The renderer state machine and SVG emitter (`render`)
//! - An epoch-end callback that infers settings from metric names (`callback`)
//!
//! # Example
//!
//! ```
//! use trazar::config::SettingsBuilder;
//! use trazar::display::RecordingSink;
//! use trazar::session::Session;
//!
//! let settings = SettingsBuilder::new().build().unwrap();
//! let mut session = Session::with_settings(RecordingSink::new(), settings).unwrap();
//!
//! for epoch in 0..5 {
//!     let loss = 1.0 / (epoch + 1) as f64;
//!     session.append(epoch as f64, [("loss", loss)]).unwrap();
//!     session.draw().unwrap();
//! }
//! session.finalize().unwrap();
//! ```

pub mod callback;
pub mod config;
pub mod display;
pub mod point;
pub mod render;
pub mod session;

pub use callback::{CurveOverrides, LearningCurveCallback};
pub use config::{ConfigError, Settings, SettingsBuilder};
pub use display::{Content, DisplaySink, Signal, UpdateHandle};
pub use point::DataPoint;
pub use render::{Chart, ChartState};
pub use session::{Session, SessionError};
