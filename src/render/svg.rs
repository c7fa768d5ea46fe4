//! Static SVG emission for a chart's current state.
//!
//! Output is fully determined by the chart's settings and history, so an
//! incremental replay and a finalize snapshot of the same points produce
//! byte-identical documents.

use std::fmt::Write;

use crate::config::Scale;

use super::layout::{
    panel_geometry, x_label_offset, AXIS_MARGIN_LEFT, AXIS_MARGIN_TOP, FACET_WIDTH, MARGIN_LEFT,
    MARGIN_RIGHT, MARGIN_TOP, X_GRID_MAX, X_LABEL_HEIGHT, X_TICK_COUNT, Y_GRID_MAX, Y_TICK_COUNT,
};
use super::scale::AxisScale;
use super::Chart;

/// Format a coordinate or tick value without float noise.
fn fmt(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        // Avoid "-0".
        "0".to_string()
    } else {
        format!("{rounded}")
    }
}

pub(super) fn document(chart: &Chart) -> String {
    let Some(settings) = chart.settings() else {
        return r#"<svg class="learning-curve"></svg>"#.to_string();
    };

    let facet_count = settings.facet_config.len();
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<svg id="{id}" class="learning-curve" width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"#,
        id = settings.id,
        w = settings.width,
        h = settings.height,
    );

    let (x_lo, x_hi) = chart.x_domain();

    for (index, (facet_key, facet)) in settings.facet_config.iter().enumerate() {
        let geometry = panel_geometry(settings.width, settings.height, facet_count, index);

        let x_scale =
            AxisScale::new((x_lo, x_hi), (0.0, geometry.axis_width), X_TICK_COUNT, X_GRID_MAX);

        let (y_lo, y_hi) = chart.y_domain(facet_key);
        let log_scale = facet.scale == Scale::Log10;
        let y_domain = if log_scale { (y_lo.log10(), y_hi.log10()) } else { (y_lo, y_hi) };
        let y_scale =
            AxisScale::new(y_domain, (geometry.axis_height, 0.0), Y_TICK_COUNT, Y_GRID_MAX);

        let _ = write!(out, r#"<g transform="translate(0, {})">"#, fmt(geometry.y_offset));
        let _ =
            write!(out, r#"<g transform="translate({}, {})">"#, fmt(MARGIN_LEFT), fmt(MARGIN_TOP));
        let _ = write!(
            out,
            r#"<rect class="background" width="{}" height="{}"/>"#,
            fmt(geometry.graph_width),
            fmt(geometry.graph_height),
        );

        // Grid: verticals from the x scale, horizontals from the y scale;
        // minor ticks at half opacity.
        let _ = write!(out, r#"<g class="grid">"#);
        for &tick in x_scale.all_grid_ticks() {
            let x = AXIS_MARGIN_LEFT + x_scale.position(tick);
            let opacity = if x_scale.is_major(tick) { "1.0" } else { "0.5" };
            let _ = write!(
                out,
                r#"<line x1="{x}" y1="0" x2="{x}" y2="{h}" stroke-opacity="{opacity}"/>"#,
                x = fmt(x),
                h = fmt(geometry.graph_height),
            );
        }
        for &tick in y_scale.all_grid_ticks() {
            let y = AXIS_MARGIN_TOP + y_scale.position(tick);
            let opacity = if y_scale.is_major(tick) { "1.0" } else { "0.5" };
            let _ = write!(
                out,
                r#"<line x1="0" y1="{y}" x2="{w}" y2="{y}" stroke-opacity="{opacity}"/>"#,
                y = fmt(y),
                w = fmt(geometry.graph_width),
            );
        }
        let _ = write!(out, "</g>");

        // Y-axis tick labels; log facets label the back-transformed value.
        let _ = write!(out, r#"<g class="axis">"#);
        for &tick in y_scale.major_ticks() {
            let y = AXIS_MARGIN_TOP + y_scale.position(tick);
            let label = if log_scale { fmt(10f64.powf(tick)) } else { fmt(tick) };
            let _ = write!(
                out,
                r#"<text x="-4" y="{y}" text-anchor="end" dominant-baseline="middle">{label}</text>"#,
                y = fmt(y),
            );
        }
        if geometry.draws_x_axis {
            for &tick in x_scale.major_ticks() {
                let x = AXIS_MARGIN_LEFT + x_scale.position(tick);
                let _ = write!(
                    out,
                    r#"<text x="{x}" y="{y}" text-anchor="middle">{label}</text>"#,
                    x = fmt(x),
                    y = fmt(geometry.graph_height + 12.0),
                    label = fmt(tick),
                );
            }
        }
        let _ = write!(out, "</g>");

        // Series lines, one path per line key, skipped points omitted.
        for (line_key, line) in &settings.line_config {
            let series = chart.series(facet_key, line_key);
            if series.is_empty() {
                continue;
            }
            let mut path = String::new();
            for (i, (x, y)) in series.iter().enumerate() {
                let px = AXIS_MARGIN_LEFT + x_scale.position(*x);
                let transformed = if log_scale { y.log10() } else { *y };
                let py = AXIS_MARGIN_TOP + y_scale.position(transformed);
                let command = if i == 0 { 'M' } else { 'L' };
                let _ = write!(path, "{command}{},{}", fmt(px), fmt(py));
            }
            let _ = write!(out, r#"<path class="line" stroke="{}" d="{path}"/>"#, line.color);
        }
        let _ = write!(out, "</g>");

        // Facet label strip on the right edge.
        let _ = write!(
            out,
            r#"<g class="facet" transform="translate({x}, {y})"><rect class="facet-background" width="{w}" height="{h}"/><text transform="translate(15, {mid}) rotate(90)" text-anchor="middle">{name}</text></g>"#,
            x = fmt(MARGIN_LEFT + geometry.graph_width),
            y = fmt(MARGIN_TOP),
            w = fmt(FACET_WIDTH),
            h = fmt(geometry.graph_height),
            mid = fmt(geometry.graph_height / 2.0),
            name = facet.name,
        );
        let _ = write!(out, "</g>");
    }

    // X-axis label, centered under the bottom panel.
    let plot_width = f64::from(settings.width) - MARGIN_LEFT - MARGIN_RIGHT;
    let _ = write!(
        out,
        r#"<text text-anchor="middle" transform="translate({x}, {y})">{name}</text>"#,
        x = fmt(MARGIN_LEFT + (plot_width - FACET_WIDTH) / 2.0),
        y = fmt(x_label_offset(settings.height) + 14.0),
        name = settings.x_axis_config.name,
    );

    // Legend: a swatch and name per line, in key order.
    let _ = write!(
        out,
        r#"<g class="legend" transform="translate({x}, {y})">"#,
        x = fmt(MARGIN_LEFT),
        y = fmt(x_label_offset(settings.height) + X_LABEL_HEIGHT),
    );
    let mut offset = 0.0;
    for line in settings.line_config.values() {
        let _ = write!(
            out,
            r#"<rect width="25" height="25" x="{x}"/><line x1="{x1}" x2="{x2}" y1="12.5" y2="12.5" stroke="{color}"/>"#,
            x = fmt(offset),
            x1 = fmt(offset + 2.0),
            x2 = fmt(offset + 23.0),
            color = line.color,
        );
        offset += 30.0;
        let _ = write!(out, r#"<text x="{x}" y="19">{name}</text>"#, x = fmt(offset), name = line.name);
        offset += line.name.chars().count() as f64 * 6.0 + 20.0;
    }
    let _ = write!(out, "</g>");

    let _ = write!(out, "</svg>");
    out
}
