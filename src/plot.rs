//! Comparison figure: one line per (model, run), fixed styling, PNG output.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use crate::catalog::{RunId, RunKind};
use crate::series::Series;

// ─────────────────────────────────────────────────────────────────────
// Fixed figure settings
// ─────────────────────────────────────────────────────────────────────
pub const TITLE:  &str = "Greenland ice sea level contribution after Goelzer et al 2020";
pub const Y_DESC: &str = "mm eustatic SLE";

pub const DPI:        f64        = 150.0;
pub const FIGURE_IN:  (f64, f64) = (10.0, 6.0);
pub const FONT_PT:    f64        = 16.0;
pub const LINE_WIDTH: u32        = 2;
pub const DASH_PX:    u32        = 14;
pub const GAP_PX:     u32        = 8;

/// Indexed by model position, wrapping past the last entry.
pub const MODEL_COLORS: [RGBColor; 3] = [RED, BLUE, BLACK];
pub const GRID_COLOR:   RGBColor      = RGBColor(0xcc, 0xcc, 0xcc);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

/// Indexed by [`RunKind::index`].
pub const RUN_STYLES: [LineStyle; 2] = [LineStyle::Solid, LineStyle::Dashed];

pub fn figure_px() -> (u32, u32) {
    ((FIGURE_IN.0 * DPI).round() as u32, (FIGURE_IN.1 * DPI).round() as u32)
}

fn pt_to_px(pt: f64) -> f64 {
    pt * DPI / 72.0
}

/// Color by model, dash pattern by run.
pub fn style_for(model_index: usize, kind: RunKind) -> (RGBColor, LineStyle) {
    (MODEL_COLORS[model_index % MODEL_COLORS.len()], RUN_STYLES[kind.index()])
}

// ─────────────────────────────────────────────────────────────────────
// Figure model
// ─────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct Line {
    pub id:     RunId,
    pub series: Series,
    pub color:  RGBColor,
    pub style:  LineStyle,
}

impl Line {
    pub fn label(&self) -> String {
        self.id.label()
    }

    /// (decimal year, value) runs with NaN samples cut out.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut out = Vec::new();
        let mut cur = Vec::new();
        for (x, &y) in self.series.decimal_years().into_iter().zip(self.series.values()) {
            if y.is_finite() {
                cur.push((x, y));
            } else if !cur.is_empty() {
                out.push(std::mem::take(&mut cur));
            }
        }
        if !cur.is_empty() {
            out.push(cur);
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct Figure {
    pub title:  String,
    pub y_desc: String,
    lines:      Vec<Line>,
}

impl Default for Figure {
    fn default() -> Self {
        Figure { title: TITLE.to_string(), y_desc: Y_DESC.to_string(), lines: Vec::new() }
    }
}

impl Figure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Data extent padded by 5% on each side.
    pub fn bounds(&self) -> Option<((f64, f64), (f64, f64))> {
        let pts: Vec<(f64, f64)> = self.lines.iter().flat_map(Line::segments).flatten().collect();
        if pts.is_empty() {
            return None;
        }
        let (mut x0, mut x1, mut y0, mut y1) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for &(x, y) in &pts {
            x0 = x0.min(x);
            x1 = x1.max(x);
            y0 = y0.min(y);
            y1 = y1.max(y);
        }
        Some((pad(x0, x1), pad(y0, y1)))
    }

    pub fn draw<DB>(&self, root: DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let ((x0, x1), (y0, y1)) = self.bounds().unwrap_or(((0.0, 1.0), (0.0, 1.0)));
        let font = pt_to_px(FONT_PT);

        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", font * 1.2))
            .margin(20)
            .x_label_area_size((font * 2.0) as u32)
            .y_label_area_size((font * 4.0) as u32)
            .build_cartesian_2d(x0..x1, y0..y1)?;

        chart
            .configure_mesh()
            .light_line_style(&TRANSPARENT)
            .bold_line_style(GRID_COLOR.mix(0.8).stroke_width(LINE_WIDTH / 2))
            .axis_style(BLACK.stroke_width(1))
            .y_desc(self.y_desc.as_str())
            .x_label_formatter(&|v| format!("{:.0}", v))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .label_style(("sans-serif", font))
            .axis_desc_style(("sans-serif", font))
            .draw()?;

        for line in &self.lines {
            let style = line.color.stroke_width(LINE_WIDTH);
            let mut labelled = false;
            for seg in line.segments() {
                let anno = match line.style {
                    LineStyle::Solid  => chart.draw_series(LineSeries::new(seg, style))?,
                    LineStyle::Dashed => chart.draw_series(DashedLineSeries::new(seg, DASH_PX, GAP_PX, style))?,
                };
                if labelled { continue }
                labelled = true;
                anno.label(line.label());
                match line.style {
                    LineStyle::Solid => {
                        anno.legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], style));
                    }
                    LineStyle::Dashed => {
                        anno.legend(move |(x, y)| {
                            EmptyElement::at((x, y))
                                + PathElement::new(vec![(0, 0), (11, 0)], style)
                                + PathElement::new(vec![(19, 0), (30, 0)], style)
                        });
                    }
                }
            }
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .label_font(("sans-serif", font))
            .position(SeriesLabelPosition::UpperLeft)
            .draw()?;

        root.present()?;
        Ok(())
    }

    /// Renders to `path`, overwriting it. Parent directories are created.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let root = BitMapBackend::new(path, figure_px()).into_drawing_area();
        self.draw(root).with_context(|| format!("rendering {}", path.display()))?;
        info!(path = %path.display(), lines = self.lines.len(), "figure written");
        Ok(())
    }
}

fn pad(lo: f64, hi: f64) -> (f64, f64) {
    if hi - lo <= f64::EPSILON * lo.abs().max(1.0) {
        return (lo - 1.0, hi + 1.0);
    }
    let m = 0.05 * (hi - lo);
    (lo - m, hi + m)
}
