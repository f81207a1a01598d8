use std::path::PathBuf;

use crate::catalog::{Layout, RunNames};

// Edit these before a run; the command line can override them.
pub const DEFAULT_ROOT:         &str   = "data/v7_CMIP5_pub";
pub const DEFAULT_FIGURES:      &str   = "figs";
pub const DEFAULT_INSTITUTIONS: [&str; 1] = ["AWI"];

/// Which discovered institutions get a figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Only(Vec<String>),
}

impl Selection {
    pub fn selects(&self, institution: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(names) => names.iter().any(|n| n == institution),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotConfig {
    /// Catalog root holding one directory per institution.
    pub root:         PathBuf,
    pub figures:      PathBuf,
    pub institutions: Selection,
    pub runs:         RunNames,
    pub layout:       Layout,
    /// Also dump the plotted lines next to each figure.
    pub write_csv:    bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        PlotConfig {
            root:         PathBuf::from(DEFAULT_ROOT),
            figures:      PathBuf::from(DEFAULT_FIGURES),
            institutions: Selection::Only(DEFAULT_INSTITUTIONS.iter().map(|s| s.to_string()).collect()),
            runs:         RunNames::default(),
            layout:       Layout::default(),
            write_csv:    false,
        }
    }
}

impl PlotConfig {
    /// `<figures>/<institution>_<historical>_<projection>.png`
    pub fn figure_path(&self, institution: &str) -> PathBuf {
        self.figures.join(format!(
            "{institution}_{}_{}.png",
            self.runs.historical, self.runs.projection
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pick_awi_only() {
        let cfg = PlotConfig::default();
        assert!(cfg.institutions.selects("AWI"));
        assert!(!cfg.institutions.selects("IMAU"));
        assert!(Selection::All.selects("IMAU"));
    }

    #[test]
    fn figure_name_carries_run_names() {
        let cfg = PlotConfig::default();
        assert_eq!(cfg.figure_path("AWI"), PathBuf::from("figs/AWI_historical_ctrl_proj.png"));
    }
}
