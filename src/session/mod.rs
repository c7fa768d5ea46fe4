//! Driver-side chart session.
//!
//! A [`Session`] lives inside the training process and owns the driver half
//! of the protocol: it accumulates appended points, validates configuration
//! changes, and emits setup/append signals through the [`DisplaySink`]
//! boundary. The lifecycle is construct → configure (0+ times) → append (N
//! times) interleaved with draw → finalize.
//!
//! The session is driven synchronously by a single training-loop thread;
//! calls are never concurrent with each other by contract, so there is no
//! internal locking.
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
//! for epoch in 0..10 {
//!     session.append(epoch as f64, [("loss", 1.0 / (epoch + 1) as f64)]).unwrap();
//!     session.draw().unwrap();
//! }
//! session.finalize().unwrap();
//! ```


use std::ops::{Deref, DerefMut};
use std::time::Duration;

use uuid::Uuid;

use crate::config::{ConfigError, Settings};
use crate::display::{
    append_call, inline_script, setup_call, Content, DisplaySink, UpdateHandle, CLIENT_SHIM,
    FREEZE_SCRIPT, HANDLE_BOOTSTRAP, STYLE_SHEET,
};
use crate::point::DataPoint;

/// Delay inserted before a reconfigure signal, giving a slow remote
/// rendering surface time to settle. A bounded wait, not a retry loop.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Errors from session operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("session is finalized; no further appends, draws, or reconfigures are accepted")]
    Finalized,

    #[error("session has no active settings; call configure first")]
    NotConfigured,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Driver-side state for one live chart.
///
/// Holds the full appended history (used for the finalize snapshot) and the
/// backlog of points not yet flushed by [`draw`](Session::draw). All side
/// effects go through the sink/handle abstraction.
pub struct Session<S: DisplaySink> {
    sink: S,
    handle: S::Handle,
    settings: Option<Settings>,
    scaffolded: bool,
    debug: bool,
    settle_delay: Duration,
    points: Vec<DataPoint>,
    backlog: Vec<DataPoint>,
    finalized: bool,
}

impl<S: DisplaySink + std::fmt::Debug> std::fmt::Debug for Session<S>
where
    S::Handle: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("sink", &self.sink)
            .field("handle", &self.handle)
            .field("settings", &self.settings)
            .field("scaffolded", &self.scaffolded)
            .field("debug", &self.debug)
            .field("settle_delay", &self.settle_delay)
            .field("points", &self.points)
            .field("backlog", &self.backlog)
            .field("finalized", &self.finalized)
            .finish()
    }
}

impl<S: DisplaySink> Session<S> {
    /// Create an unconfigured session awaiting [`configure`](Session::configure).
    ///
    /// Opens the persistent update handle immediately; the page scaffolding
    /// is emitted by the first successful configure, once a chart id
    /// exists.
    pub fn new(mut sink: S) -> Self {
        let handle = sink.open_handle(Content::Javascript(HANDLE_BOOTSTRAP.to_string()));
        Self {
            sink,
            handle,
            settings: None,
            scaffolded: false,
            debug: false,
            settle_delay: DEFAULT_SETTLE_DELAY,
            points: Vec::new(),
            backlog: Vec::new(),
            finalized: false,
        }
    }

    /// Create a session with an initial, validated configuration.
    ///
    /// Emits the page scaffolding (styles, client shim, the named svg
    /// container, and the embedded setup call) and opens the update handle.
    pub fn with_settings(mut sink: S, settings: Settings) -> Result<Self> {
        settings.validate()?;
        sink.show(Content::Html(scaffolding(&settings)));
        let handle = sink.open_handle(Content::Javascript(HANDLE_BOOTSTRAP.to_string()));
        Ok(Self {
            sink,
            handle,
            settings: Some(settings),
            scaffolded: true,
            debug: false,
            settle_delay: DEFAULT_SETTLE_DELAY,
            points: Vec::new(),
            backlog: Vec::new(),
            finalized: false,
        })
    }

    /// Switch append directives to the inline-script embedding.
    ///
    /// Trades stack-trace visibility in the host's developer console for a
    /// different embedding mechanism; behaviorally identical otherwise.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Override the settle delay inserted before reconfigure signals.
    /// Tests and hosts with a synchronous rendering surface set this to
    /// zero.
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Replace the active settings, atomically.
    ///
    /// Validation runs first; on failure the previous settings remain
    /// active. On success a setup signal goes out: embedded in the
    /// scaffolding for the first configuration, through the update handle
    /// (after the settle delay) for reconfigures. The chart id established
    /// by the first configuration is preserved across reconfigures so the
    /// renderer keeps addressing the same chart instance.
    pub fn configure(&mut self, mut settings: Settings) -> Result<()> {
        if self.finalized {
            return Err(SessionError::Finalized);
        }
        settings.validate().map_err(SessionError::Config)?;

        if let Some(active) = &self.settings {
            settings.id = active.id;
        }

        if self.scaffolded {
            std::thread::sleep(self.settle_delay);
            let directive = setup_call(settings.id, &settings);
            self.handle.update(if self.debug {
                Content::Html(inline_script(&directive))
            } else {
                Content::Javascript(directive)
            });
        } else {
            self.sink.show(Content::Html(scaffolding(&settings)));
            self.scaffolded = true;
        }

        self.settings = Some(settings);
        Ok(())
    }

    /// Append one row of measurements without touching the sink.
    ///
    /// Metrics absent from `y` are simply missing from the row; the
    /// renderer skips them. Values may be NaN, which travels as the
    /// "absent" sentinel. Appending is never a configuration error; the
    /// only failure is a finalized session.
    pub fn append<I, K>(&mut self, x: f64, y: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        if self.finalized {
            return Err(SessionError::Finalized);
        }
        let row = DataPoint::new(x, y);
        self.points.push(row.clone());
        self.backlog.push(row);
        Ok(())
    }

    /// Flush the backlog as one append signal.
    ///
    /// A no-op when the backlog is empty: no signal is emitted, which
    /// bounds signal volume to one per non-empty flush.
    pub fn draw(&mut self) -> Result<()> {
        if self.finalized {
            return Err(SessionError::Finalized);
        }
        if self.backlog.is_empty() {
            return Ok(());
        }
        let settings = self.settings.as_ref().ok_or(SessionError::NotConfigured)?;

        let directive = append_call(settings.id, &self.backlog);
        self.handle.update(if self.debug {
            Content::Html(inline_script(&directive))
        } else {
            Content::Javascript(directive)
        });
        self.backlog.clear();
        Ok(())
    }

    /// Flush remaining points and freeze the chart.
    ///
    /// Emits the no-op rebinding of the append entry point, then one
    /// self-contained snapshot carrying the entire history as static
    /// markup, so the rendering is reproducible from a saved document
    /// without the live session. Idempotent: repeat calls are no-ops.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }
        if !self.backlog.is_empty() {
            self.draw()?;
        }

        if let Some(settings) = &self.settings {
            self.handle.update(Content::Javascript(FREEZE_SCRIPT.to_string()));
            let snapshot = inline_script(&append_call(settings.id, &self.points));
            self.handle.update(Content::Html(snapshot));
        }

        self.finalized = true;
        Ok(())
    }

    /// Move the session into a guard that finalizes on scope exit.
    pub fn scoped(self) -> SessionGuard<S> {
        SessionGuard { session: self }
    }

    /// The active settings, if configured.
    #[must_use]
    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    /// Chart id established by the first configuration.
    #[must_use]
    pub fn chart_id(&self) -> Option<Uuid> {
        self.settings.as_ref().map(|settings| settings.id)
    }

    /// Full appended history.
    #[must_use]
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Number of points appended since the last flush.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.backlog.len()
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

fn scaffolding(settings: &Settings) -> String {
    format!(
        "<style>{STYLE_SHEET}</style>\
         <script>{CLIENT_SHIM}</script>\
         <svg id=\"{id}\" class=\"learning-curve\"></svg>\
         <script>{setup}</script>",
        id = settings.id,
        setup = setup_call(settings.id, settings),
    )
}

/// Scoped-acquisition wrapper: finalizes the session when dropped.
///
/// Finalize errors on the drop path are discarded; call
/// [`Session::finalize`] explicitly to observe them.
pub struct SessionGuard<S: DisplaySink> {
    session: Session<S>,
}

impl<S: DisplaySink> Deref for SessionGuard<S> {
    type Target = Session<S>;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl<S: DisplaySink> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

impl<S: DisplaySink> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        let _ = self.session.finalize();
    }
}
