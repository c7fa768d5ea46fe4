//! Chart geometry: margins, panel stacking, legend and axis bands.
//!
//! Each facet panel gets an equal share of the height remaining after the
//! legend, x-label, and x-axis bands are reserved at the bottom.

/// Outer margin around each facet panel.
pub const MARGIN_TOP: f64 = 10.0;
pub const MARGIN_RIGHT: f64 = 10.0;
pub const MARGIN_BOTTOM: f64 = 10.0;
pub const MARGIN_LEFT: f64 = 35.0;

/// Inner margin between a panel's background and its axis area.
pub const AXIS_MARGIN_TOP: f64 = 10.0;
pub const AXIS_MARGIN_RIGHT: f64 = 15.0;
pub const AXIS_MARGIN_BOTTOM: f64 = 10.0;
pub const AXIS_MARGIN_LEFT: f64 = 15.0;

/// Width of the facet label strip on the right edge of each panel.
pub const FACET_WIDTH: f64 = 30.0;

/// Height reserved for the legend band.
pub const LEGEND_HEIGHT: f64 = 40.0;

/// Height reserved for the shared x-axis.
pub const X_AXIS_HEIGHT: f64 = 30.0;

/// Height reserved for the x-axis label.
pub const X_LABEL_HEIGHT: f64 = 20.0;

/// Requested major tick count for the shared x-axis.
pub const X_TICK_COUNT: usize = 6;
/// Grid tick budget for the shared x-axis.
pub const X_GRID_MAX: usize = 19;

/// Requested major tick count for each facet's y-axis.
pub const Y_TICK_COUNT: usize = 3;
/// Grid tick budget for each facet's y-axis.
pub const Y_GRID_MAX: usize = 9;

/// Resolved geometry for one facet panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelGeometry {
    /// Vertical offset of the panel within the chart
    pub y_offset: f64,
    /// Panel background size, inside the outer margin
    pub graph_width: f64,
    pub graph_height: f64,
    /// Plotting area size, inside the axis margin
    pub axis_width: f64,
    pub axis_height: f64,
    /// Whether this panel draws the shared x-axis (bottom panel only)
    pub draws_x_axis: bool,
}

/// Geometry of facet panel `index` out of `facet_count`, stacked top to
/// bottom inside a `width` x `height` chart.
#[must_use]
pub fn panel_geometry(width: u32, height: u32, facet_count: usize, index: usize) -> PanelGeometry {
    let facet_count = facet_count.max(1);
    let inner_height = f64::from(height) - LEGEND_HEIGHT - X_LABEL_HEIGHT - X_AXIS_HEIGHT;
    let panel_height = (inner_height / facet_count as f64).round();

    let graph_width = f64::from(width) - FACET_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let graph_height = panel_height - MARGIN_TOP - MARGIN_BOTTOM;

    PanelGeometry {
        y_offset: index as f64 * panel_height,
        graph_width,
        graph_height,
        axis_width: graph_width - AXIS_MARGIN_LEFT - AXIS_MARGIN_RIGHT,
        axis_height: graph_height - AXIS_MARGIN_TOP - AXIS_MARGIN_BOTTOM,
        draws_x_axis: index + 1 == facet_count,
    }
}

/// Vertical position where the x-label band starts.
#[must_use]
pub fn x_label_offset(height: u32) -> f64 {
    f64::from(height) - LEGEND_HEIGHT - X_LABEL_HEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panels_share_height_equally() {
        let first = panel_geometry(600, 490, 2, 0);
        let second = panel_geometry(600, 490, 2, 1);
        assert_eq!(first.graph_height, second.graph_height);
        assert_eq!(second.y_offset, first.y_offset + 200.0);
    }

    #[test]
    fn test_only_bottom_panel_draws_x_axis() {
        assert!(!panel_geometry(600, 490, 2, 0).draws_x_axis);
        assert!(panel_geometry(600, 490, 2, 1).draws_x_axis);
        assert!(panel_geometry(600, 290, 1, 0).draws_x_axis);
    }

    #[test]
    fn test_default_single_facet_geometry() {
        // 290px default height for one facet: 200px panel after the 90px
        // of legend + labels + axis.
        let geometry = panel_geometry(600, 290, 1, 0);
        assert_eq!(geometry.y_offset, 0.0);
        assert_eq!(geometry.graph_height, 200.0 - MARGIN_TOP - MARGIN_BOTTOM);
        assert_eq!(geometry.graph_width, 600.0 - FACET_WIDTH - MARGIN_LEFT - MARGIN_RIGHT);
    }
}
