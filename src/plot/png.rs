//! Error-bar scatter + overlay curve rendering to a PNG file.
//!
//! The renderer is intentionally data-driven: it receives the series, an
//! optional overlay polyline, and a `PlotStyle`, and only draws. Where the
//! overlay came from (fit vs exact asymptote) is the pipeline's business.
//!
//! Plot elements, matching the reference macros:
//! - data: blue filled circles with vertical error bars
//! - overlay: colored line (green for fits, red for exact references)
//! - dashed-gray-style light gridlines, titled axes, positioned legend

use plotters::prelude::*;

use crate::domain::{LegendPos, Overlay, PlotStyle, Series};
use crate::error::PostError;

const DATA_COLOR: RGBColor = RGBColor(31, 64, 214); // blue
const GRID_COLOR: RGBColor = RGBColor(160, 160, 160);
const MARKER_SIZE: u32 = 4;

/// Render the series (with error bars) and optional overlay to
/// `style.path`.
pub fn render_png(series: &Series, overlay: Option<&Overlay>, style: &PlotStyle) -> Result<(), PostError> {
    let (x_range, y_range) = resolve_ranges(series, overlay, style);

    let to_write_err = |message: String| PostError::FileWrite {
        path: style.path.clone(),
        message,
    };

    let root = BitMapBackend::new(&style.path, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| to_write_err(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&style.title, ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(44)
        .y_label_area_size(56)
        .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)
        .map_err(|e| to_write_err(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc(&style.x_label)
        .y_desc(&style.y_label)
        .light_line_style(GRID_COLOR.mix(0.4))
        .bold_line_style(GRID_COLOR.mix(0.8))
        .label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| to_write_err(e.to_string()))?;

    // Overlay first so data markers stay on top where they cross.
    if let Some(overlay) = overlay {
        let (r, g, b) = overlay.color;
        let color = RGBColor(r, g, b);
        chart
            .draw_series(LineSeries::new(
                overlay.points.iter().copied(),
                color.stroke_width(2),
            ))
            .map_err(|e| to_write_err(e.to_string()))?
            .label(overlay.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2)));
    }

    if let Some(err) = &series.err {
        chart
            .draw_series(series.x.iter().zip(series.y.iter()).zip(err.iter()).map(
                |((&x, &y), &e)| {
                    ErrorBar::new_vertical(x, y - e, y, y + e, DATA_COLOR.filled(), 6)
                },
            ))
            .map_err(|e| to_write_err(e.to_string()))?;
    }

    chart
        .draw_series(
            series
                .points()
                .into_iter()
                .map(|(x, y)| Circle::new((x, y), MARKER_SIZE, DATA_COLOR.filled())),
        )
        .map_err(|e| to_write_err(e.to_string()))?
        .label(style.data_label.clone())
        .legend(|(x, y)| Circle::new((x + 9, y), MARKER_SIZE, DATA_COLOR.filled()));

    chart
        .configure_series_labels()
        .position(legend_position(style.legend))
        .border_style(BLACK)
        .background_style(WHITE.mix(0.85))
        .label_font(("sans-serif", 16))
        .draw()
        .map_err(|e| to_write_err(e.to_string()))?;

    root.present().map_err(|e| to_write_err(e.to_string()))?;
    Ok(())
}

fn legend_position(pos: LegendPos) -> SeriesLabelPosition {
    match pos {
        LegendPos::UpperRight => SeriesLabelPosition::UpperRight,
        LegendPos::UpperCenter => SeriesLabelPosition::UpperMiddle,
        LegendPos::LowerCenter => SeriesLabelPosition::LowerMiddle,
    }
}

/// Fixed ranges from the style where given, otherwise data bounds
/// (including error bars and the overlay) padded by 5%.
fn resolve_ranges(
    series: &Series,
    overlay: Option<&Overlay>,
    style: &PlotStyle,
) -> ((f64, f64), (f64, f64)) {
    let x_range = style.x_range.unwrap_or_else(|| {
        let xs = series
            .x
            .iter()
            .copied()
            .chain(overlay.iter().flat_map(|o| o.points.iter().map(|p| p.0)));
        padded_bounds(xs)
    });

    let y_range = style.y_range.unwrap_or_else(|| {
        let zero = vec![0.0; series.y.len()];
        let err = series.err.as_deref().unwrap_or(&zero);
        let ys = series
            .y
            .iter()
            .zip(err.iter())
            .flat_map(|(&y, &e)| [y - e, y + e])
            .chain(overlay.iter().flat_map(|o| o.points.iter().map(|p| p.1)));
        padded_bounds(ys)
    });

    (x_range, y_range)
}

fn padded_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    if hi - lo < 1e-12 {
        return (lo - 0.5, hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn style(path: PathBuf) -> PlotStyle {
        PlotStyle {
            title: "test".to_string(),
            x_label: "x".to_string(),
            y_label: "y".to_string(),
            x_range: None,
            y_range: None,
            legend: LegendPos::UpperRight,
            data_label: "data".to_string(),
            width: 640,
            height: 480,
            path,
        }
    }

    #[test]
    fn writes_a_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.png");

        let series = Series {
            x: vec![1.0, 2.0, 3.0],
            y: vec![1.5, 2.5, 3.5],
            err: Some(vec![0.1, 0.1, 0.2]),
        };
        let overlay = Overlay {
            label: "fit".to_string(),
            points: vec![(1.0, 1.4), (3.0, 3.6)],
            color: (60, 160, 60),
        };

        render_png(&series, Some(&overlay), &style(path.clone())).unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        assert!(meta.len() > 0);
    }

    #[test]
    fn unwritable_path_maps_to_file_write_error() {
        let series = Series {
            x: vec![1.0],
            y: vec![1.0],
            err: None,
        };
        let err = render_png(
            &series,
            None,
            &style(PathBuf::from("/nonexistent-dir/plot.png")),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn padded_bounds_handles_degenerate_input() {
        assert_eq!(padded_bounds([2.0, 2.0].into_iter()), (1.5, 2.5));
        assert_eq!(padded_bounds(std::iter::empty::<f64>()), (0.0, 1.0));
    }
}
