//! Display-side chart state machine.
//!
//! A [`Chart`] is the stateful renderer instance keyed by chart id. It
//! consumes the decoded wire signals ([`Signal`]) and owns the visual
//! representation: panel layout, scales, routed series, and the legend.
//!
//! States: `Uninitialized → Configured → Finalized`. The first setup
//! signal binds the chart id and enters `Configured`; appends are
//! transient updates; the freeze-then-snapshot pair emitted at finalize
//! time makes the state terminal, after which no signal alters the output.
//!
//! The renderer has no return channel to the driver, so data problems
//! (a non-positive value offered to a log-scale facet) are recovered
//! locally: the offending point is dropped and a [`DataError`] is recorded
//! on the chart, queryable through [`Chart::warnings`].

pub mod layout;
pub mod scale;

mod svg;


use std::collections::BTreeMap;

use uuid::Uuid;

use crate::config::{Scale, Settings};
use crate::display::{Content, Signal};
use crate::point::DataPoint;

/// Renderer-side data problems, recorded rather than propagated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error(
        "non-positive value {value} for line {line:?} on log-scale facet {facet:?} \
         at x = {x}; point dropped"
    )]
    NonPositiveOnLogScale { facet: String, line: String, x: f64, value: f64 },
}

/// Lifecycle state of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartState {
    /// No setup signal received yet
    Uninitialized,
    /// Configured and accepting appends
    Configured,
    /// Snapshot received; terminal
    Finalized,
}

/// Expand-only observation window backing a dynamic axis bound.
///
/// Never contracts, even across reconfigures, so dynamic limits cannot
/// jitter back when later values are smaller.
#[derive(Debug, Clone, Copy, Default)]
struct ObservedWindow {
    lo: Option<f64>,
    hi: Option<f64>,
}

impl ObservedWindow {
    fn expand(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.lo = Some(self.lo.map_or(value, |lo| lo.min(value)));
        self.hi = Some(self.hi.map_or(value, |hi| hi.max(value)));
    }
}

/// One stateful chart instance.
#[derive(Debug, Default)]
pub struct Chart {
    state: ChartStateInner,
    chart_id: Option<Uuid>,
    settings: Option<Settings>,
    /// Raw point history, retained across reconfigures so metric keys that
    /// regain a mapping can be drawn again
    history: Vec<DataPoint>,
    observed_x: ObservedWindow,
    /// Per facet key; survives reconfigure
    observed_y: BTreeMap<String, ObservedWindow>,
    warnings: Vec<DataError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ChartStateInner {
    #[default]
    Uninitialized,
    Configured,
    /// Freeze received; the next append payload is the snapshot
    Frozen,
    Finalized,
}

impl Chart {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> ChartState {
        match self.state {
            ChartStateInner::Uninitialized => ChartState::Uninitialized,
            ChartStateInner::Configured | ChartStateInner::Frozen => ChartState::Configured,
            ChartStateInner::Finalized => ChartState::Finalized,
        }
    }

    #[must_use]
    pub fn chart_id(&self) -> Option<Uuid> {
        self.chart_id
    }

    #[must_use]
    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    /// Raw received history, including points no mapping currently routes.
    #[must_use]
    pub fn history(&self) -> &[DataPoint] {
        &self.history
    }

    /// Diagnostics recorded while ingesting data.
    #[must_use]
    pub fn warnings(&self) -> &[DataError] {
        &self.warnings
    }

    /// Feed one piece of sink content to the chart, decoding every signal
    /// it carries.
    pub fn apply_content(&mut self, content: &Content) {
        for signal in Signal::decode_all(content) {
            self.apply(signal);
        }
    }

    /// Advance the state machine by one signal.
    ///
    /// Signals for other chart ids are ignored, as is everything after
    /// finalization.
    pub fn apply(&mut self, signal: Signal) {
        if self.state == ChartStateInner::Finalized {
            return;
        }
        match signal {
            Signal::Setup { chart_id, settings } => self.apply_setup(chart_id, settings),
            Signal::Append { chart_id, points } => self.apply_append(chart_id, points),
            Signal::Freeze => {
                if self.state == ChartStateInner::Configured {
                    self.state = ChartStateInner::Frozen;
                }
            }
        }
    }

    fn apply_setup(&mut self, chart_id: Uuid, settings: Settings) {
        match self.chart_id {
            None => self.chart_id = Some(chart_id),
            Some(bound) if bound != chart_id => return,
            Some(_) => {}
        }

        self.settings = Some(settings);
        if self.state == ChartStateInner::Uninitialized {
            self.state = ChartStateInner::Configured;
        }

        // Reconcile: points received before this (re)configuration expand
        // the dynamic bounds under the new mappings. Windows only widen, so
        // unmapping a metric never takes an expansion back. Warnings were
        // recorded at first ingest and are not repeated here.
        let history = std::mem::take(&mut self.history);
        for point in &history {
            self.ingest(point, false);
        }
        self.history = history;
    }

    fn apply_append(&mut self, chart_id: Uuid, points: Vec<DataPoint>) {
        match self.state {
            ChartStateInner::Uninitialized => return,
            ChartStateInner::Configured => {
                if self.chart_id != Some(chart_id) {
                    return;
                }
                for point in &points {
                    self.ingest(point, true);
                }
                self.history.extend(points);
            }
            ChartStateInner::Frozen => {
                if self.chart_id != Some(chart_id) {
                    return;
                }
                // The self-contained snapshot: replaces the incremental
                // history wholesale and ends the stream.
                for point in &points {
                    self.ingest(point, false);
                }
                self.history = points;
                self.state = ChartStateInner::Finalized;
            }
            ChartStateInner::Finalized => {}
        }
    }

    /// Route one point through the mappings, expanding dynamic bounds.
    fn ingest(&mut self, point: &DataPoint, record_warnings: bool) {
        let Some(settings) = &self.settings else { return };

        for (metric, sample) in &point.y {
            if sample.is_absent() {
                continue;
            }
            let Some(mapping) = settings.mappings.get(metric) else {
                // Unmapped metric: retained in history, never drawn.
                continue;
            };
            let Some(facet) = settings.facet_config.get(&mapping.facet) else {
                continue;
            };

            let value = sample.value();
            if facet.scale == Scale::Log10 && value <= 0.0 {
                if record_warnings {
                    self.warnings.push(DataError::NonPositiveOnLogScale {
                        facet: mapping.facet.clone(),
                        line: mapping.line.clone(),
                        x: point.x,
                        value,
                    });
                }
                continue;
            }

            self.observed_x.expand(point.x);
            self.observed_y.entry(mapping.facet.clone()).or_default().expand(value);
        }
    }

    /// The plotted series for a `(facet, line)` pair, in append order.
    ///
    /// Absent samples, unmapped metrics, and log-dropped values are
    /// skipped, not plotted.
    #[must_use]
    pub fn series(&self, facet_key: &str, line_key: &str) -> Vec<(f64, f64)> {
        let Some(settings) = &self.settings else {
            return Vec::new();
        };
        let log_scale = settings
            .facet_config
            .get(facet_key)
            .is_some_and(|facet| facet.scale == Scale::Log10);

        let mut series = Vec::new();
        for point in &self.history {
            for (metric, sample) in &point.y {
                if sample.is_absent() {
                    continue;
                }
                let Some(mapping) = settings.mappings.get(metric) else { continue };
                if mapping.facet != facet_key || mapping.line != line_key {
                    continue;
                }
                let value = sample.value();
                if log_scale && value <= 0.0 {
                    continue;
                }
                series.push((point.x, value));
            }
        }
        series
    }

    /// Effective x domain: fixed sides from the configuration, dynamic
    /// sides from the expand-only observation window.
    #[must_use]
    pub fn x_domain(&self) -> (f64, f64) {
        let limit = self
            .settings
            .as_ref()
            .map(|settings| settings.x_axis_config.limit)
            .unwrap_or(crate::config::Limit::UNBOUNDED);
        let lo = limit.min().or(self.observed_x.lo).unwrap_or(0.0);
        let hi = limit.max().or(self.observed_x.hi).unwrap_or(1.0);
        (lo, hi)
    }

    /// Effective y domain for a facet, in data space.
    #[must_use]
    pub fn y_domain(&self, facet_key: &str) -> (f64, f64) {
        let facet = self.settings.as_ref().and_then(|s| s.facet_config.get(facet_key));
        let observed = self.observed_y.get(facet_key).copied().unwrap_or_default();

        let limit = facet.map(|f| f.limit).unwrap_or(crate::config::Limit::UNBOUNDED);
        let log_scale = facet.is_some_and(|f| f.scale == Scale::Log10);
        let (fallback_lo, fallback_hi) = if log_scale { (1.0, 10.0) } else { (0.0, 1.0) };

        let lo = limit.min().or(observed.lo).unwrap_or(fallback_lo);
        let hi = limit.max().or(observed.hi).unwrap_or(fallback_hi);
        (lo, hi)
    }

    /// Render the chart statically as an SVG document.
    ///
    /// Deterministic in the chart's data: feeding the same points through
    /// the incremental path or a finalize snapshot yields identical
    /// output.
    #[must_use]
    pub fn render(&self) -> String {
        svg::document(self)
    }
}
