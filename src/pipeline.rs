//! Discovery → load → splice → draw, one figure per institution.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::catalog::{self, RunId, RunKind};
use crate::config::{PlotConfig, Selection};
use crate::error::IsmResult;
use crate::export;
use crate::normalize::splice;
use crate::plot::{style_for, Figure, Line};
use crate::series::load_series;
use crate::telemetry::timeit;

/// Loads every model of `institution` and lays out its spliced lines:
/// per model, the rebased historical run followed by its projection.
pub fn institution_figure(cfg: &PlotConfig, institution: &str) -> IsmResult<Figure> {
    let models = catalog::list_models(&cfg.root, institution)?;
    debug!(institution, ?models, "models");

    let mut fig = Figure::new();
    for (j, model) in models.iter().enumerate() {
        let ids = RunKind::ALL.map(|kind| RunId::new(institution, model, cfg.runs.name(kind)));
        let historical = load_series(&cfg.root, &ids[0], &cfg.layout)?;
        let projection = load_series(&cfg.root, &ids[1], &cfg.layout)?;
        let (historical, projection) = splice(&historical, &projection)?;

        for ((kind, id), series) in RunKind::ALL.into_iter().zip(ids).zip([historical, projection]) {
            let (color, style) = style_for(j, kind);
            fig.push(Line { id, series, color, style });
        }
    }
    Ok(fig)
}

/// Draws every selected institution; returns the figure paths written.
pub fn run(cfg: &PlotConfig) -> Result<Vec<PathBuf>> {
    let institutions = timeit("discover", || catalog::list_institutions(&cfg.root))
        .with_context(|| format!("listing institutions under {}", cfg.root.display()))?;
    debug!(?institutions, "institutions");

    if let Selection::Only(wanted) = &cfg.institutions {
        for w in wanted.iter().filter(|w| !institutions.contains(w)) {
            warn!(institution = %w, root = %cfg.root.display(), "requested institution not in catalog");
        }
    }

    let mut written = Vec::new();
    for institution in institutions.iter().filter(|i| cfg.institutions.selects(i)) {
        let fig = timeit("load+splice", || institution_figure(cfg, institution))
            .with_context(|| format!("building figure for {institution}"))?;

        let path = cfg.figure_path(institution);
        timeit("render", || fig.save_png(&path))?;

        if cfg.write_csv {
            let csv_path = path.with_extension("csv");
            let rows = export::write_csv(&fig, &csv_path)?;
            info!(path = %csv_path.display(), rows, "csv written");
        }
        written.push(path);
    }

    info!(figures = written.len(), "finished");
    Ok(written)
}
