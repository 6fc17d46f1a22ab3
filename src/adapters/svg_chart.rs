//! Standalone SVG charts for backtest and sweep output.
//!
//! Both charts share one frame: a value axis on the left labelled at
//! max/mid/min, an x axis labelled at first/middle/last, a dashed
//! horizontal line for the buy-and-hold level, and the data as a path.

use crate::domain::backtest::ValuePoint;
use crate::domain::sweep::SweepResult;

const CHART_WIDTH: f64 = 600.0;
const CHART_HEIGHT: f64 = 300.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 40.0;

const STRATEGY_COLOR: &str = "#2563eb";
const BASELINE_COLOR: &str = "#dc2626";

struct Frame {
    min: f64,
    max: f64,
    count: usize,
}

impl Frame {
    fn new(values: impl Iterator<Item = f64>, baseline: f64, count: usize) -> Self {
        let (min, max) = values
            .chain(std::iter::once(baseline))
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        Frame { min, max, count }
    }

    fn plot_width(&self) -> f64 {
        CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height(&self) -> f64 {
        CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn x(&self, i: usize) -> f64 {
        MARGIN_LEFT + (i as f64 / (self.count.saturating_sub(1)).max(1) as f64) * self.plot_width()
    }

    fn y(&self, v: f64) -> f64 {
        let range = (self.max - self.min).max(1.0);
        MARGIN_TOP + self.plot_height() - ((v - self.min) / range) * self.plot_height()
    }

    fn path(&self, values: impl Iterator<Item = f64>) -> String {
        let mut data = String::new();
        for (i, v) in values.enumerate() {
            let cmd = if i == 0 { "M" } else { " L" };
            data.push_str(&format!("{} {:.1} {:.1}", cmd, self.x(i), self.y(v)));
        }
        data
    }
}

fn fmt_amount(value: f64) -> String {
    format!("{:.0}", value)
}

fn open_svg(svg: &mut String, title: &str) {
    svg.push_str(&format!(
        r##"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"##,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"18\" font-size=\"13\" fill=\"#333\">{}</text>\n",
        MARGIN_LEFT, title
    ));
}

fn axes(svg: &mut String, frame: &Frame, x_labels: [String; 3]) {
    let bottom = CHART_HEIGHT - MARGIN_BOTTOM;
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, bottom
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        bottom,
        CHART_WIDTH - MARGIN_RIGHT,
        bottom
    ));

    let mid = (frame.max + frame.min) / 2.0;
    for (value, y) in [
        (frame.max, MARGIN_TOP + 5.0),
        (mid, MARGIN_TOP + frame.plot_height() / 2.0),
        (frame.min, bottom - 5.0),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            MARGIN_LEFT - 5.0,
            y,
            fmt_amount(value)
        ));
    }

    let [first, middle, last] = x_labels;
    for (label, x) in [
        (first, MARGIN_LEFT),
        (middle, MARGIN_LEFT + frame.plot_width() / 2.0),
        (last, CHART_WIDTH - MARGIN_RIGHT),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            x, CHART_HEIGHT - 5.0, label
        ));
    }
}

fn baseline_line(svg: &mut String, frame: &Frame, baseline: f64) {
    let y = frame.y(baseline);
    svg.push_str(&format!(
        "  <line class=\"baseline\" x1=\"{}\" y1=\"{:.1}\" x2=\"{}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\" stroke-dasharray=\"4 3\"/>\n",
        MARGIN_LEFT,
        y,
        CHART_WIDTH - MARGIN_RIGHT,
        y,
        BASELINE_COLOR
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"{}\">buy &amp; hold {}</text>\n",
        CHART_WIDTH - MARGIN_RIGHT,
        y - 4.0,
        BASELINE_COLOR,
        fmt_amount(baseline)
    ));
}

/// Portfolio value over time against the buy-and-hold final value.
///
/// Returns an empty string when there is nothing to plot.
pub fn trajectory_chart(trajectory: &[ValuePoint], baseline: f64) -> String {
    let (Some(first), Some(last)) = (trajectory.first(), trajectory.last()) else {
        return String::new();
    };
    let frame = Frame::new(trajectory.iter().map(|p| p.value), baseline, trajectory.len());
    let middle = trajectory[trajectory.len() / 2].date;

    let mut svg = String::new();
    open_svg(&mut svg, "Portfolio value");
    axes(
        &mut svg,
        &frame,
        [first.date.to_string(), middle.to_string(), last.date.to_string()],
    );
    baseline_line(&mut svg, &frame, baseline);
    svg.push_str(&format!(
        "  <path class=\"strategy\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
        frame.path(trajectory.iter().map(|p| p.value)),
        STRATEGY_COLOR
    ));
    svg.push_str("</svg>\n");
    svg
}

/// Final value per SMA window with the best window marked.
pub fn sweep_chart(result: &SweepResult, baseline: f64) -> String {
    let windows: Vec<usize> = result.final_values.keys().copied().collect();
    let (Some(&first), Some(&last)) = (windows.first(), windows.last()) else {
        return String::new();
    };
    let frame = Frame::new(result.final_values.values().copied(), baseline, windows.len());
    let middle = windows[windows.len() / 2];

    let mut svg = String::new();
    open_svg(&mut svg, "Final value by SMA window");
    axes(
        &mut svg,
        &frame,
        [first.to_string(), middle.to_string(), last.to_string()],
    );
    baseline_line(&mut svg, &frame, baseline);
    svg.push_str(&format!(
        "  <path class=\"strategy\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
        frame.path(result.final_values.values().copied()),
        STRATEGY_COLOR
    ));

    if let Some(i) = windows.iter().position(|&w| w == result.best_window) {
        svg.push_str(&format!(
            "  <circle class=\"best\" cx=\"{:.1}\" cy=\"{:.1}\" r=\"4\" fill=\"{}\"/>\n",
            frame.x(i),
            frame.y(result.best_value),
            STRATEGY_COLOR
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#333\">SMA({})</text>\n",
            frame.x(i),
            frame.y(result.best_value) - 8.0,
            result.best_window
        ));
    }
    svg.push_str("</svg>\n");
    svg
}
