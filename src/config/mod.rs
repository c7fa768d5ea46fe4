//! Chart configuration: facets, lines, axes, and metric routing.
//!
//! A chart is described by [`Settings`]: a set of facets (sub-panels, one
//! per metric family), a set of lines (named series drawn in every facet),
//! a shared x-axis, and a `mappings` table that routes raw metric keys to
//! a `(facet, line)` pair.
//!
//! Settings are built through [`SettingsBuilder`], where every field has a
//! stated default, and are validated as a whole before they are applied.
//! Validation failures are [`ConfigError`]s and never leave partial state
//! behind.
//!
//! # Example
//!
//! ```
//! use trazar::config::SettingsBuilder;
//!
//! let settings = SettingsBuilder::new().width(800).build().unwrap();
//! assert_eq!(settings.width, 800);
//! // Default facet set is a single "loss" facet, 200px per facet + 90px
//! // for the x-axis and legend.
//! assert_eq!(settings.height, 290);
//! ```

mod error;


use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use error::{ConfigError, Result};

/// An axis limit: `(min, max)`, either side optionally unbounded.
///
/// An unbounded side (`None`, `null` on the wire) is computed dynamically
/// by the renderer from observed data and only ever expands, never shrinks
/// back. Serializes as a two-element JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limit(pub Option<f64>, pub Option<f64>);

impl Limit {
    /// Both sides computed dynamically from data.
    pub const UNBOUNDED: Limit = Limit(None, None);

    /// Lower bound, if fixed.
    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.0
    }

    /// Upper bound, if fixed.
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.1
    }

    /// True when at least one side must be computed from data.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.0.is_none() || self.1.is_none()
    }
}

/// Y-scale of a facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    /// Plain linear scale
    Linear,
    /// Base-10 logarithmic scale; plotted values must be positive
    Log10,
}

/// Presentation of one line (series), keyed by a line key such as "train".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSpec {
    /// Display name shown in the legend
    pub name: String,
    /// Stroke color, CSS/SVG compatible
    pub color: String,
}

impl LineSpec {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self { name: name.into(), color: color.into() }
    }
}

/// Presentation of one facet (sub-panel), keyed by a facet key such as "loss".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetSpec {
    /// Display name shown on the facet strip
    pub name: String,
    /// Y-axis limit
    pub limit: Limit,
    /// Y-axis scale
    pub scale: Scale,
}

impl FacetSpec {
    pub fn new(name: impl Into<String>, limit: Limit, scale: Scale) -> Self {
        Self { name: name.into(), limit, scale }
    }
}

/// Routing rule from a raw metric key to a `(facet, line)` pair.
///
/// Both keys must exist in the line and facet configuration of the same
/// [`Settings`]; `validate` enforces this referential integrity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Line key within the facet
    pub line: String,
    /// Facet key the metric is drawn in
    pub facet: String,
}

impl MappingEntry {
    pub fn new(line: impl Into<String>, facet: impl Into<String>) -> Self {
        Self { line: line.into(), facet: facet.into() }
    }
}

/// Shared x-axis description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    /// Axis label
    pub name: String,
    /// X-axis limit, shared by all facets
    pub limit: Limit,
}

impl AxisSpec {
    pub fn new(name: impl Into<String>, limit: Limit) -> Self {
        Self { name: name.into(), limit }
    }
}

/// Complete chart configuration.
///
/// Immutable once applied to a session, except through an explicit
/// reconfigure. Field names are camelCase on the wire (`lineConfig`,
/// `facetConfig`, `xAxisConfig`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Chart identity; keys the renderer instance inside the host document
    pub id: Uuid,
    /// Chart width in pixels
    pub width: u32,
    /// Panel stack height in pixels
    pub height: u32,
    /// Metric key -> (facet, line) routing table
    pub mappings: BTreeMap<String, MappingEntry>,
    /// Line key -> presentation
    pub line_config: BTreeMap<String, LineSpec>,
    /// Facet key -> presentation
    pub facet_config: BTreeMap<String, FacetSpec>,
    /// Shared x-axis
    pub x_axis_config: AxisSpec,
}

impl Settings {
    /// Check all validation rules without mutating anything.
    ///
    /// Rules: positive dimensions, and every mapping's `line`/`facet` must
    /// reference an existing key in `line_config`/`facet_config`.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(ConfigError::InvalidWidth(self.width));
        }
        if self.height == 0 {
            return Err(ConfigError::InvalidHeight(self.height));
        }

        for (metric, entry) in &self.mappings {
            if !self.line_config.contains_key(&entry.line) {
                return Err(ConfigError::UnknownLineKey {
                    metric: metric.clone(),
                    line: entry.line.clone(),
                });
            }
            if !self.facet_config.contains_key(&entry.facet) {
                return Err(ConfigError::UnknownFacetKey {
                    metric: metric.clone(),
                    facet: entry.facet.clone(),
                });
            }
        }

        Ok(())
    }

    /// Default height for a given facet count: 200px per facet plus 90px
    /// for the x-axis and legend.
    #[must_use]
    pub fn default_height(facet_count: usize) -> u32 {
        facet_count as u32 * 200 + 90
    }
}

/// Builder for [`Settings`] with per-call fresh defaults.
///
/// Defaults: width 600, height derived from the facet count, a
/// train/validation line pair, a single linear "loss" facet with `[0, ∞)`
/// limits, mappings routing `loss`/`val_loss` into it, and an "Epoch"
/// x-axis starting at zero.
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    width: u32,
    height: Option<u32>,
    mappings: BTreeMap<String, MappingEntry>,
    line_config: BTreeMap<String, LineSpec>,
    facet_config: BTreeMap<String, FacetSpec>,
    x_axis_config: AxisSpec,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsBuilder {
    pub fn new() -> Self {
        let mut line_config = BTreeMap::new();
        line_config.insert("train".to_string(), LineSpec::new("Train", "#F8766D"));
        line_config.insert("validation".to_string(), LineSpec::new("Validation", "#00BFC4"));

        let mut facet_config = BTreeMap::new();
        facet_config
            .insert("loss".to_string(), FacetSpec::new("loss", Limit(Some(0.0), None), Scale::Linear));

        let mut mappings = BTreeMap::new();
        mappings.insert("loss".to_string(), MappingEntry::new("train", "loss"));
        mappings.insert("val_loss".to_string(), MappingEntry::new("validation", "loss"));

        Self {
            width: 600,
            height: None,
            mappings,
            line_config,
            facet_config,
            x_axis_config: AxisSpec::new("Epoch", Limit(Some(0.0), None)),
        }
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Replace the routing table wholesale.
    pub fn mappings(mut self, mappings: BTreeMap<String, MappingEntry>) -> Self {
        self.mappings = mappings;
        self
    }

    /// Replace the line configuration wholesale.
    pub fn line_config(mut self, line_config: BTreeMap<String, LineSpec>) -> Self {
        self.line_config = line_config;
        self
    }

    /// Replace the facet configuration wholesale.
    pub fn facet_config(mut self, facet_config: BTreeMap<String, FacetSpec>) -> Self {
        self.facet_config = facet_config;
        self
    }

    pub fn x_axis_config(mut self, x_axis_config: AxisSpec) -> Self {
        self.x_axis_config = x_axis_config;
        self
    }

    /// Validate and produce [`Settings`] with a fresh chart id.
    pub fn build(self) -> Result<Settings> {
        let height = self
            .height
            .unwrap_or_else(|| Settings::default_height(self.facet_config.len()));

        let settings = Settings {
            id: Uuid::new_v4(),
            width: self.width,
            height,
            mappings: self.mappings,
            line_config: self.line_config,
            facet_config: self.facet_config,
            x_axis_config: self.x_axis_config,
        };
        settings.validate()?;
        Ok(settings)
    }
}
