// USAGE cargo run --release -- [--root /path/to/v7_CMIP5_pub] [--institution AWI]...
// With no flags the defaults in config.rs are used.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::Level;

use ism_sle_plot::{pipeline, telemetry, PlotConfig, Selection};

#[derive(Parser, Debug)]
#[command(author, version, about = "Spliced historical/projection SLE plots for ISMIP6 Greenland output")]
struct Args {
    /// Catalog root with one directory per institution
    #[arg(long)]
    root: Option<PathBuf>,

    /// Directory the figures are written to
    #[arg(long)]
    figures: Option<PathBuf>,

    /// Institution to plot; repeat for several
    #[arg(long = "institution", conflicts_with = "all")]
    institutions: Vec<String>,

    /// Plot every institution found under the root
    #[arg(long)]
    all: bool,

    /// Historical experiment name
    #[arg(long)]
    historical: Option<String>,

    /// Projection experiment name
    #[arg(long)]
    projection: Option<String>,

    /// Also write the plotted lines as CSV next to each figure
    #[arg(long)]
    csv: bool,
}

impl Args {
    fn into_config(self) -> PlotConfig {
        let mut cfg = PlotConfig::default();
        if let Some(root) = self.root { cfg.root = root; }
        if let Some(figures) = self.figures { cfg.figures = figures; }
        if self.all {
            cfg.institutions = Selection::All;
        } else if !self.institutions.is_empty() {
            cfg.institutions = Selection::Only(self.institutions);
        }
        if let Some(h) = self.historical { cfg.runs.historical = h; }
        if let Some(p) = self.projection { cfg.runs.projection = p; }
        cfg.write_csv = self.csv;
        cfg
    }
}

fn main() -> Result<()> {
    telemetry::init_tracing(Level::INFO);
    let cfg = Args::parse().into_config();
    tracing::debug!(?cfg, "config");

    let written = pipeline::run(&cfg)?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}
