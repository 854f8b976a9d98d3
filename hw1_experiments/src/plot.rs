//! PNG figures for the sweep and the DAgger comparison.

use crate::compare::EnvironmentComparison;
use crate::metrics::EvalSummary;
use crate::settings::FigureSize;
use crate::sweep::SweepPoint;
use anyhow::{anyhow, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use tracing::{info, warn};

const STEEL_BLUE: RGBColor = RGBColor(70, 130, 180);
const GRAY: RGBColor = RGBColor(128, 128, 128);
const EXPERT_GREEN: RGBColor = RGBColor(0, 128, 0);
const BC_RED: RGBColor = RGBColor(255, 0, 0);

const FONT: &str = "sans-serif";
/// Half-width of the error bar caps, in pixels
const CAP_WIDTH: u32 = 10;

/// Pad a value range so markers and error bars don't sit on the frame
fn padded_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if lo > hi {
        return (0.0, 1.0);
    }

    let span = hi - lo;
    let pad = if span > 0.0 { span * 0.08 } else { (hi.abs() * 0.05).max(1.0) };
    (lo - pad, hi + pad)
}

/// Bounds for a log-scaled axis: half a decade of slack on each side
fn log_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (lo / 10f64.sqrt(), hi * 10f64.sqrt())
}

fn error_bounds(evals: &[EvalSummary]) -> impl Iterator<Item = f64> + '_ {
    evals.iter().flat_map(|e| [e.lower(), e.upper()])
}

/// Error-bar plot of BC return against training steps, log-scaled x axis.
/// Overwrites `path`.
pub fn draw_sweep_figure(
    path: &Path,
    size: FigureSize,
    env_name: &str,
    points: &[SweepPoint],
) -> Result<()> {
    if points.is_empty() {
        return Err(anyhow!("No sweep results to plot"));
    }
    if points.iter().any(|p| p.train_steps == 0) {
        return Err(anyhow!("Step counts must be positive on a log axis"));
    }

    let evals: Vec<EvalSummary> = points.iter().map(SweepPoint::eval).collect();
    let (x_lo, x_hi) = log_range(points.iter().map(|p| p.train_steps as f64));
    let (y_lo, y_hi) = padded_range(error_bounds(&evals));

    let root = BitMapBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("BC Performance vs Training Steps ({})", env_name),
            (FONT, 40).into_font(),
        )
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(100)
        .build_cartesian_2d((x_lo..x_hi).log_scale(), y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc("Number of Training Steps")
        .y_desc("Eval Average Return")
        .axis_desc_style((FONT, 26))
        .label_style((FONT, 20))
        .bold_line_style(BLACK.mix(0.3))
        .light_line_style(BLACK.mix(0.08))
        .draw()?;

    chart.draw_series(points.iter().map(|p| {
        ErrorBar::new_vertical(
            p.train_steps as f64,
            p.mean - p.std,
            p.mean,
            p.mean + p.std,
            GRAY.stroke_width(2),
            CAP_WIDTH,
        )
    }))?;

    chart.draw_series(LineSeries::new(
        points.iter().map(|p| (p.train_steps as f64, p.mean)),
        STEEL_BLUE.stroke_width(3),
    ))?;

    chart.draw_series(
        points
            .iter()
            .map(|p| Circle::new((p.train_steps as f64, p.mean), 8, STEEL_BLUE.filled())),
    )?;

    root.present()?;
    info!("Figure saved to: {:?}", path);
    Ok(())
}

/// Side-by-side panels, one per environment: DAgger learning curve with error
/// bars plus expert and BC reference lines. Overwrites `path`.
pub fn draw_comparison_figure(
    path: &Path,
    size: FigureSize,
    comparisons: &[EnvironmentComparison],
) -> Result<()> {
    if comparisons.is_empty() {
        return Err(anyhow!("No environments to plot"));
    }

    let root = BitMapBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((1, comparisons.len()));
    for (panel, comparison) in panels.iter().zip(comparisons) {
        draw_comparison_panel(panel, comparison)?;
    }

    root.present()?;
    info!("Figure saved to: {:?}", path);
    Ok(())
}

fn draw_comparison_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    comparison: &EnvironmentComparison,
) -> Result<()> {
    let iterations = &comparison.dagger.iterations;
    let expert = comparison.expert_return();
    let bc = comparison.bc.mean;

    let x_lo = -0.5;
    let x_hi = iterations.len().saturating_sub(1) as f64 + 0.5;
    let (y_lo, y_hi) = padded_range(error_bounds(iterations).chain(expert).chain(bc));

    let mut chart = ChartBuilder::on(area)
        .caption(&comparison.env_name, (FONT, 32).into_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc("DAgger Iteration")
        .y_desc("Eval Average Return")
        .axis_desc_style((FONT, 22))
        .label_style((FONT, 18))
        .bold_line_style(BLACK.mix(0.3))
        .light_line_style(BLACK.mix(0.08))
        .draw()?;

    chart.draw_series(iterations.iter().enumerate().map(|(i, e)| {
        ErrorBar::new_vertical(
            i as f64,
            e.lower(),
            e.mean,
            e.upper(),
            STEEL_BLUE.stroke_width(2),
            CAP_WIDTH,
        )
    }))?;

    chart
        .draw_series(LineSeries::new(
            iterations.iter().enumerate().map(|(i, e)| (i as f64, e.mean)),
            STEEL_BLUE.stroke_width(3),
        ))?
        .label("DAgger")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], STEEL_BLUE.stroke_width(3)));

    chart.draw_series(
        iterations
            .iter()
            .enumerate()
            .map(|(i, e)| Circle::new((i as f64, e.mean), 6, STEEL_BLUE.filled())),
    )?;

    match expert {
        Some(expert) => {
            chart
                .draw_series(DashedLineSeries::new(
                    vec![(x_lo, expert), (x_hi, expert)],
                    12,
                    8,
                    EXPERT_GREEN.stroke_width(3),
                ))?
                .label(format!("Expert ({:.0})", expert))
                .legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], EXPERT_GREEN.stroke_width(3))
                });
        }
        None => warn!("No expert return for {}, skipping its reference line", comparison.env_name),
    }

    match bc {
        Some(bc) => {
            chart
                .draw_series(DashedLineSeries::new(
                    vec![(x_lo, bc), (x_hi, bc)],
                    3,
                    5,
                    BC_RED.stroke_width(3),
                ))?
                .label(format!("BC ({:.0})", bc))
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BC_RED.stroke_width(3)));
        }
        None => warn!("No BC return for {}, skipping its reference line", comparison.env_name),
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .label_font((FONT, 18))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

/// Open a written figure in an external viewer without waiting for it
pub fn open_in_viewer(viewer: &str, path: &Path) {
    match std::process::Command::new(viewer).arg(path).spawn() {
        Ok(_) => info!("Opened {:?} with {}", path, viewer),
        Err(e) => warn!("Could not open {:?} with {}: {}", path, viewer, e),
    }
}
