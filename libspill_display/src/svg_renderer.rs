use std::fmt::Write;
use std::path::Path;

use super::error::RenderError;
use super::readout_window::{PlaneReadout, ReadoutWindow};
use super::renderer::EventDisplayRenderer;

const PANEL_WIDTH: f64 = 640.0;
const PANEL_HEIGHT: f64 = 420.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;
const MARKER_RADIUS: f64 = 1.5;

/// Viridis anchors, low to high
const PALETTE: [(f64, f64, f64); 5] = [
    (68.0, 1.0, 84.0),
    (59.0, 82.0, 139.0),
    (33.0, 145.0, 140.0),
    (94.0, 201.0, 98.0),
    (253.0, 231.0, 37.0),
];

/// Colour of a value already scaled to [0, 1]
fn palette_color(frac: f64) -> String {
    let frac = frac.clamp(0.0, 1.0) * (PALETTE.len() - 1) as f64;
    let lo = frac.floor() as usize;
    let hi = (lo + 1).min(PALETTE.len() - 1);
    let t = frac - lo as f64;
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    let (r0, g0, b0) = PALETTE[lo];
    let (r1, g1, b1) = PALETTE[hi];
    format!("#{:02x}{:02x}{:02x}", mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

/// Scatter display of start time vs channel, one panel per plane, coloured by log ADC integral
#[derive(Debug, Clone)]
pub struct SvgDisplayRenderer {
    tick_ns: u64,
}

impl SvgDisplayRenderer {
    pub fn new(tick_ns: u64) -> Self {
        Self {
            tick_ns: tick_ns.max(1),
        }
    }

    fn draw_panel(&self, svg: &mut String, plane: &PlaneReadout, y0: f64) -> Result<(), std::fmt::Error> {
        let plot_w = PANEL_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = PANEL_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let left = MARGIN_LEFT;
        let top = y0 + MARGIN_TOP;

        writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="14" text-anchor="middle">TP Start Time vs Channel for {} ({} TPs)</text>"#,
            PANEL_WIDTH / 2.0,
            y0 + 24.0,
            plane.name,
            plane.n_samples()
        )?;
        writeln!(
            svg,
            r#"<rect x="{left}" y="{top}" width="{plot_w}" height="{plot_h}" fill="none" stroke="black"/>"#
        )?;

        let span_ticks = (plane.end_ns.saturating_sub(plane.start_ns) / self.tick_ns).max(1) as f64;
        let span_channels = plane.last_channel.saturating_sub(plane.first_channel).max(1) as f64;

        // axes
        writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="12" text-anchor="middle">Channel</text>"#,
            left + plot_w / 2.0,
            top + plot_h + 38.0
        )?;
        writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="12" text-anchor="middle" transform="rotate(-90 {} {})">Relative Start Time (ticks)</text>"#,
            left - 55.0,
            top + plot_h / 2.0,
            left - 55.0,
            top + plot_h / 2.0
        )?;
        for (label, x) in [
            (plane.first_channel, left),
            (plane.last_channel, left + plot_w),
        ] {
            writeln!(
                svg,
                r#"<text x="{x}" y="{}" font-size="10" text-anchor="middle">{label}</text>"#,
                top + plot_h + 16.0
            )?;
        }
        for (label, y) in [(0.0, top + plot_h), (span_ticks, top)] {
            writeln!(
                svg,
                r#"<text x="{}" y="{y}" font-size="10" text-anchor="end">{label}</text>"#,
                left - 6.0
            )?;
        }

        if plane.is_empty() {
            writeln!(
                svg,
                r#"<text x="{}" y="{}" font-size="14" text-anchor="middle" fill="gray">no primitives</text>"#,
                left + plot_w / 2.0,
                top + plot_h / 2.0
            )?;
            return Ok(());
        }

        let log_adc = |adc: u64| ((adc.max(1)) as f64).ln();
        let (lo, hi) = plane.samples().fold((f64::MAX, f64::MIN), |(lo, hi), tp| {
            let v = log_adc(tp.adc_integral);
            (lo.min(v), hi.max(v))
        });
        let range = if hi > lo { hi - lo } else { 1.0 };

        for tp in plane.samples() {
            let rel_ticks = tp.time_start_ns.saturating_sub(plane.start_ns) / self.tick_ns;
            let x = left + tp.channel.saturating_sub(plane.first_channel) as f64 / span_channels * plot_w;
            let y = top + plot_h - rel_ticks as f64 / span_ticks * plot_h;
            let color = palette_color((log_adc(tp.adc_integral) - lo) / range);
            writeln!(
                svg,
                r#"<circle cx="{x:.2}" cy="{y:.2}" r="{MARKER_RADIUS}" fill="{color}"/>"#
            )?;
        }
        Ok(())
    }

    /// The full SVG document for a window
    pub fn to_svg(&self, window: &ReadoutWindow) -> Result<String, std::fmt::Error> {
        let n_panels = window.planes.len().max(1);
        let height = PANEL_HEIGHT * n_panels as f64 + 30.0;
        let mut svg = String::new();
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{PANEL_WIDTH}" height="{height}" font-family="sans-serif">"#
        )?;
        writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
        writeln!(
            svg,
            r#"<text x="10" y="20" font-size="14">{} at {} ns</text>"#,
            window.key, window.trigger_timestamp_ns
        )?;
        for (idx, plane) in window.planes.iter().enumerate() {
            self.draw_panel(&mut svg, plane, 30.0 + PANEL_HEIGHT * idx as f64)?;
        }
        writeln!(svg, "</svg>")?;
        Ok(svg)
    }
}

impl EventDisplayRenderer for SvgDisplayRenderer {
    fn extension(&self) -> &'static str {
        "svg"
    }

    fn render(&mut self, window: &ReadoutWindow, path: &Path) -> Result<(), RenderError> {
        let svg = self.to_svg(window)?;
        std::fs::write(path, svg)?;
        Ok(())
    }
}
