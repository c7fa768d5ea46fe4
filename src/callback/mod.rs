//! Epoch-driven charting callback with metric-name inference.
//!
//! [`LearningCurveCallback`] sits between a training loop and a
//! [`Session`]: the loop reports its per-epoch metric logs and the
//! callback derives chart settings from the metric names it sees,
//! appends every epoch, flushes on a configurable interval, and
//! finalizes when training ends.
//!
//! Inference is name-based. A `val_` prefix selects the `validation`
//! line and strips the prefix to find the facet; anything else plots
//! on the `train` line under its own name. A few well-known facet
//! names (`loss`, the accuracy family, `lr`) carry curated display
//! names, limits, and scales.
//!
//! # Example
//!
//! ```
//! use trazar::callback::{CurveOverrides, LearningCurveCallback};
//! use trazar::display::RecordingSink;
//!
//! let sink = RecordingSink::new();
//! let mut callback =
//!     LearningCurveCallback::new(sink, CurveOverrides::default(), 1).unwrap();
//!
//! callback.on_train_begin(Some(10)).unwrap();
//! for epoch in 0..10 {
//!     let loss = 1.0 / (epoch + 1) as f64;
//!     callback
//!         .on_epoch_end(epoch, &[("loss".to_string(), loss)].into())
//!         .unwrap();
//! }
//! callback.on_train_end().unwrap();
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::config::{
    self, AxisSpec, ConfigError, FacetSpec, Limit, LineSpec, MappingEntry, Scale, Settings,
    SettingsBuilder,
};
use crate::display::DisplaySink;
use crate::session::{self, Session};

#[cfg(test)]
mod tests;

/// Facet keys that plot as a shared "Accuracy" panel on the unit interval.
const ACCURACY_FACETS: [&str; 5] = [
    "acc",
    "accuracy",
    "binary_accuracy",
    "categorical_accuracy",
    "sparse_categorical_accuracy",
];

/// Partial routing entry; absent fields are filled by inference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingOverride {
    pub line: Option<String>,
    pub facet: Option<String>,
}

/// Partial line styling; absent fields are filled by inference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineOverride {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Partial facet configuration; absent fields are filled by inference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetOverride {
    pub name: Option<String>,
    pub limit: Option<Limit>,
    pub scale: Option<Scale>,
}

/// Partial x-axis configuration; absent fields are filled by inference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisOverride {
    pub name: Option<String>,
    pub limit: Option<Limit>,
}

/// Caller-supplied settings fragments that take precedence over inference.
///
/// Every field is optional. Supplying a table replaces the inferred key
/// set for that section, and each entry in it is still completed
/// field-by-field, so `{"loss": {}}` is a valid mapping override.
#[derive(Debug, Clone, Default)]
pub struct CurveOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub mappings: Option<BTreeMap<String, MappingOverride>>,
    pub line_config: Option<BTreeMap<String, LineOverride>>,
    pub facet_config: Option<BTreeMap<String, FacetOverride>>,
    pub x_axis_config: Option<AxisOverride>,
}

impl CurveOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Routing rule for a raw metric name.
#[must_use]
pub fn infer_mapping(metric: &str) -> MappingEntry {
    match metric.strip_prefix("val_") {
        Some(facet) => MappingEntry::new("validation", facet),
        None => MappingEntry::new("train", metric),
    }
}

/// Display defaults for a line key.
#[must_use]
pub fn infer_line(line_key: &str) -> LineSpec {
    match line_key {
        "train" => LineSpec::new("Train", "#F8766D"),
        "validation" => LineSpec::new("Validation", "#00BFC4"),
        other => LineSpec::new(other, "#333333"),
    }
}

/// Display defaults for a facet key.
#[must_use]
pub fn infer_facet(facet_key: &str) -> FacetSpec {
    if facet_key == "loss" {
        FacetSpec::new("Loss", Limit::UNBOUNDED, Scale::Log10)
    } else if ACCURACY_FACETS.contains(&facet_key) {
        FacetSpec::new("Accuracy", Limit(Some(0.0), Some(1.0)), Scale::Linear)
    } else if facet_key == "lr" {
        FacetSpec::new("Learning Rate", Limit(Some(0.0), None), Scale::Linear)
    } else {
        FacetSpec::new(facet_key, Limit::UNBOUNDED, Scale::Linear)
    }
}

/// Build validated [`Settings`] from observed metric names and overrides.
///
/// The mapping key set comes from the override table when one was given,
/// otherwise from `metrics`. Line and facet tables default to the keys
/// the mappings reference. An unbounded upper x limit is pinned to
/// `max_epochs - 1` when the epoch budget is known.
pub fn infer_settings(
    metrics: &BTreeSet<String>,
    overrides: &CurveOverrides,
    max_epochs: Option<usize>,
) -> config::Result<Settings> {
    let mut mappings = BTreeMap::new();
    match &overrides.mappings {
        Some(table) => {
            for (metric, partial) in table {
                let inferred = infer_mapping(metric);
                let line = partial.line.clone().unwrap_or(inferred.line);
                let facet = partial.facet.clone().unwrap_or(inferred.facet);
                mappings.insert(metric.clone(), MappingEntry::new(line, facet));
            }
        }
        None => {
            for metric in metrics {
                mappings.insert(metric.clone(), infer_mapping(metric));
            }
        }
    }

    let mut line_config = BTreeMap::new();
    match &overrides.line_config {
        Some(table) => {
            for (line_key, partial) in table {
                let inferred = infer_line(line_key);
                let name = partial.name.clone().unwrap_or(inferred.name);
                let color = partial.color.clone().unwrap_or(inferred.color);
                line_config.insert(line_key.clone(), LineSpec::new(name, color));
            }
        }
        None => {
            for entry in mappings.values() {
                line_config
                    .entry(entry.line.clone())
                    .or_insert_with(|| infer_line(&entry.line));
            }
        }
    }

    let mut facet_config = BTreeMap::new();
    match &overrides.facet_config {
        Some(table) => {
            for (facet_key, partial) in table {
                let inferred = infer_facet(facet_key);
                facet_config.insert(
                    facet_key.clone(),
                    FacetSpec::new(
                        partial.name.clone().unwrap_or(inferred.name),
                        partial.limit.unwrap_or(inferred.limit),
                        partial.scale.unwrap_or(inferred.scale),
                    ),
                );
            }
        }
        None => {
            for entry in mappings.values() {
                facet_config
                    .entry(entry.facet.clone())
                    .or_insert_with(|| infer_facet(&entry.facet));
            }
        }
    }

    let partial_axis = overrides.x_axis_config.clone().unwrap_or_default();
    let mut limit = partial_axis.limit.unwrap_or(Limit(Some(0.0), None));
    if limit.1.is_none() {
        if let Some(epochs) = max_epochs {
            limit.1 = Some(epochs.saturating_sub(1) as f64);
        }
    }
    let name = partial_axis.name.unwrap_or_else(|| "Epoch".to_string());

    let mut builder = SettingsBuilder::new()
        .mappings(mappings)
        .line_config(line_config)
        .facet_config(facet_config)
        .x_axis_config(AxisSpec::new(name, limit));
    if let Some(width) = overrides.width {
        builder = builder.width(width);
    }
    if let Some(height) = overrides.height {
        builder = builder.height(height);
    }
    builder.build()
}

/// Drives a [`Session`] from epoch-end metric logs.
///
/// In dynamic mode (no explicit mapping override) the settings are
/// re-inferred and the session reconfigured whenever an epoch reports
/// a metric name not seen before. With an explicit mapping table the
/// configuration is fixed at train begin and never revisited.
pub struct LearningCurveCallback<S: DisplaySink> {
    session: Session<S>,
    overrides: CurveOverrides,
    draw_interval: usize,
    observed: BTreeSet<String>,
    dynamic: bool,
    max_epochs: Option<usize>,
}

impl<S: DisplaySink + std::fmt::Debug> std::fmt::Debug for LearningCurveCallback<S>
where
    S::Handle: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningCurveCallback")
            .field("session", &self.session)
            .field("overrides", &self.overrides)
            .field("draw_interval", &self.draw_interval)
            .field("observed", &self.observed)
            .field("dynamic", &self.dynamic)
            .field("max_epochs", &self.max_epochs)
            .finish()
    }
}

impl<S: DisplaySink> LearningCurveCallback<S> {
    /// Creates a callback over `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDrawInterval`] when `draw_interval`
    /// is zero.
    pub fn new(
        sink: S,
        overrides: CurveOverrides,
        draw_interval: usize,
    ) -> config::Result<Self> {
        if draw_interval == 0 {
            return Err(ConfigError::InvalidDrawInterval(draw_interval));
        }
        let dynamic = overrides.mappings.is_none();
        Ok(Self {
            session: Session::new(sink),
            overrides,
            draw_interval,
            observed: BTreeSet::new(),
            dynamic,
            max_epochs: None,
        })
    }

    /// Sets the settling wait applied before reconfigure directives.
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.session = self.session.settle_delay(delay);
        self
    }

    /// Records the epoch budget and, with a fixed mapping table,
    /// configures the session up front.
    pub fn on_train_begin(&mut self, max_epochs: Option<usize>) -> session::Result<()> {
        self.max_epochs = max_epochs;
        if !self.dynamic {
            let settings = infer_settings(&self.observed, &self.overrides, self.max_epochs)?;
            self.session.configure(settings)?;
        }
        Ok(())
    }

    /// Feeds one epoch of metric logs into the session.
    ///
    /// Reconfigures first when dynamic inference sees a new metric name,
    /// appends the point, and flushes on every `draw_interval`-th epoch.
    pub fn on_epoch_end(
        &mut self,
        epoch: usize,
        logs: &BTreeMap<String, f64>,
    ) -> session::Result<()> {
        if self.dynamic && logs.keys().any(|key| !self.observed.contains(key)) {
            self.observed.extend(logs.keys().cloned());
            let settings = infer_settings(&self.observed, &self.overrides, self.max_epochs)?;
            self.session.configure(settings)?;
        }

        self.session
            .append(epoch as f64, logs.iter().map(|(key, value)| (key.clone(), *value)))?;

        if epoch % self.draw_interval == 0 {
            self.session.draw()?;
        }
        Ok(())
    }

    /// Flushes any backlog and emits the static snapshot.
    pub fn on_train_end(&mut self) -> session::Result<()> {
        self.session.finalize()
    }

    #[must_use]
    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    /// Whether settings are re-inferred as new metric names appear.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    #[must_use]
    pub fn into_session(self) -> Session<S> {
        self.session
    }
}
