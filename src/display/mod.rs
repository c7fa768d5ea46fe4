//! The sink/handle boundary and the wire protocol.
//!
//! The driver half ([`crate::session::Session`]) never talks to a concrete
//! host document. It produces [`Content`] and hands it to a [`DisplaySink`]:
//! `show` displays content once, `open_handle` displays content and returns
//! a persistent [`UpdateHandle`] whose `update` replaces what the handle
//! last showed. Signals are fire-and-forget; there is no acknowledgement or
//! backpressure channel, so drops or delays on the sink side are invisible
//! to the driver.
//!
//! The wire contract with the renderer is two entry points, both carried as
//! JSON-argument call directives:
//!
//! - `setupLearningCurve(chartId, settings)`
//! - `appendLearningCurve(chartId, points)`
//!
//! plus a no-op rebinding of the append entry point emitted at finalize
//! time, which freezes the rendered output against any later driver
//! activity. [`Signal`] is the typed decode of this contract, consumed by
//! [`crate::render::Chart`].

#[cfg(test)]
mod tests;

use serde::Serialize;
use uuid::Uuid;

use crate::config::Settings;
use crate::point::DataPoint;

/// Entry point that (re)configures a chart.
pub const SETUP_ENTRY: &str = "setupLearningCurve";

/// Entry point that appends data points to a configured chart.
pub const APPEND_ENTRY: &str = "appendLearningCurve";

/// Rebinds the append entry point to a no-op, freezing the chart.
pub const FREEZE_SCRIPT: &str = "window.appendLearningCurve = function () {};";

/// Placeholder content used to open an update handle before there is
/// anything to show through it.
pub const HANDLE_BOOTSTRAP: &str = "void(0);";

/// Style sheet included in the chart scaffolding.
pub const STYLE_SHEET: &str = "\
svg.learning-curve { font: 10px sans-serif; }
svg.learning-curve .background { fill: #ebebeb; }
svg.learning-curve .facet-background { fill: #b3b3b3; }
svg.learning-curve .facet text { fill: #ffffff; }
svg.learning-curve .grid line { stroke: #ffffff; }
svg.learning-curve .grid .domain { stroke: none; }
svg.learning-curve .line { fill: none; stroke-width: 1.5px; }
svg.learning-curve .legend rect { fill: #ebebeb; }
";

/// Client-side shim included in the chart scaffolding.
///
/// Queues entry-point calls until the host-embedded renderer installs its
/// own implementations, so directives sent to a slow-initializing remote
/// surface are replayed rather than lost.
pub const CLIENT_SHIM: &str = "\
(function () {
  'use strict';
  const queue = [];
  window.setupLearningCurve = function () { queue.push(['setup', arguments]); };
  window.appendLearningCurve = function () { queue.push(['append', arguments]); };
  window.__learningCurveQueue = queue;
})();
";

/// Renderable content handed to the sink.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Static markup, shown as-is
    Html(String),
    /// An executable directive evaluated by the host
    Javascript(String),
}

impl Content {
    /// The raw markup or directive text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Content::Html(text) | Content::Javascript(text) => text,
        }
    }
}

/// A persistent display slot whose content can be replaced in place.
pub trait UpdateHandle {
    fn update(&mut self, content: Content);
}

/// Abstract host document: shows content, optionally through a persistent
/// handle.
pub trait DisplaySink {
    type Handle: UpdateHandle;

    /// Display content once.
    fn show(&mut self, content: Content);

    /// Display content and return a handle for later in-place updates.
    fn open_handle(&mut self, content: Content) -> Self::Handle;
}

fn call_directive<A: Serialize + ?Sized>(entry: &str, chart_id: Uuid, args: &A) -> String {
    // Sample's serde impl keeps NaN out of the payload, so this cannot fail
    // on the types this crate sends.
    let json = serde_json::to_string(args).unwrap_or_else(|_| "null".to_string());
    format!("window.{entry}({chart_id:?}, {json});", chart_id = chart_id.to_string())
}

/// Build the `setupLearningCurve` call text.
#[must_use]
pub fn setup_call(chart_id: Uuid, settings: &Settings) -> String {
    call_directive(SETUP_ENTRY, chart_id, settings)
}

/// Build the `appendLearningCurve` call text.
#[must_use]
pub fn append_call(chart_id: Uuid, points: &[DataPoint]) -> String {
    call_directive(APPEND_ENTRY, chart_id, points)
}

/// Wrap a directive in an inline script tag.
///
/// Used for the debug embedding mode and for the finalize snapshot, where
/// the directive must survive inside a static document.
#[must_use]
pub fn inline_script(directive: &str) -> String {
    format!("<script>{directive}</script>")
}

/// Typed decode of the wire contract.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// `setupLearningCurve`: configure or reconfigure a chart
    Setup { chart_id: Uuid, settings: Settings },
    /// `appendLearningCurve`: new data points since the last flush
    Append { chart_id: Uuid, points: Vec<DataPoint> },
    /// The append entry point was rebound to a no-op; the next append
    /// payload is the finalize snapshot
    Freeze,
}

impl Signal {
    /// Decode every recognized signal carried by a piece of content.
    ///
    /// Html content may embed several directives in `<script>` tags (the
    /// scaffolding embeds the initial setup call); unrecognized text, such
    /// as the handle bootstrap, decodes to nothing.
    #[must_use]
    pub fn decode_all(content: &Content) -> Vec<Signal> {
        let mut signals = Vec::new();
        match content {
            Content::Javascript(text) => {
                if let Some(signal) = Self::decode_directive(text) {
                    signals.push(signal);
                }
            }
            Content::Html(markup) => {
                for body in script_bodies(markup) {
                    if let Some(signal) = Self::decode_directive(body) {
                        signals.push(signal);
                    }
                }
            }
        }
        signals
    }

    fn decode_directive(text: &str) -> Option<Signal> {
        let text = text.trim();
        if text == FREEZE_SCRIPT {
            return Some(Signal::Freeze);
        }

        if let Some(args) = call_args(text, SETUP_ENTRY) {
            let (chart_id, settings) =
                serde_json::from_str::<(Uuid, Settings)>(&format!("[{args}]")).ok()?;
            return Some(Signal::Setup { chart_id, settings });
        }
        if let Some(args) = call_args(text, APPEND_ENTRY) {
            let (chart_id, points) =
                serde_json::from_str::<(Uuid, Vec<DataPoint>)>(&format!("[{args}]")).ok()?;
            return Some(Signal::Append { chart_id, points });
        }
        None
    }
}

/// Argument text of a `window.<entry>(...)` call, if `text` is one.
fn call_args<'a>(text: &'a str, entry: &str) -> Option<&'a str> {
    let rest = text.strip_prefix("window.")?.strip_prefix(entry)?;
    let rest = rest.strip_prefix('(')?;
    let rest = rest.trim_end();
    rest.strip_suffix(");").or_else(|| rest.strip_suffix(')'))
}

/// Bodies of every `<script>` tag in a piece of markup.
fn script_bodies(markup: &str) -> impl Iterator<Item = &str> {
    markup.split("<script>").skip(1).filter_map(|chunk| chunk.split("</script>").next())
}

/// In-memory sink that records everything shown or updated.
///
/// The standard test double for driving the protocol end to end: a session
/// writes into it, and the recorded content can be replayed into a
/// [`crate::render::Chart`].
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: std::sync::Arc<std::sync::Mutex<Vec<SinkEvent>>>,
}

/// One recorded sink interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Shown(Content),
    HandleOpened(Content),
    Updated(Content),
}

impl SinkEvent {
    /// The content carried by the event.
    #[must_use]
    pub fn content(&self) -> &Content {
        match self {
            SinkEvent::Shown(content)
            | SinkEvent::HandleOpened(content)
            | SinkEvent::Updated(content) => content,
        }
    }
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events in order.
    #[must_use]
    pub fn events(&self) -> Vec<SinkEvent> {
        self.log.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Every decoded signal, across all recorded events, in order.
    #[must_use]
    pub fn signals(&self) -> Vec<Signal> {
        self.events().iter().flat_map(|event| Signal::decode_all(event.content())).collect()
    }
}

/// Handle half of [`RecordingSink`]; shares the same event log.
#[derive(Debug, Clone)]
pub struct RecordingHandle {
    log: std::sync::Arc<std::sync::Mutex<Vec<SinkEvent>>>,
}

impl UpdateHandle for RecordingHandle {
    fn update(&mut self, content: Content) {
        if let Ok(mut events) = self.log.lock() {
            events.push(SinkEvent::Updated(content));
        }
    }
}

impl DisplaySink for RecordingSink {
    type Handle = RecordingHandle;

    fn show(&mut self, content: Content) {
        if let Ok(mut events) = self.log.lock() {
            events.push(SinkEvent::Shown(content));
        }
    }

    fn open_handle(&mut self, content: Content) -> Self::Handle {
        if let Ok(mut events) = self.log.lock() {
            events.push(SinkEvent::HandleOpened(content));
        }
        RecordingHandle { log: std::sync::Arc::clone(&self.log) }
    }
}
