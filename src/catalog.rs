//! Directory discovery for the `<root>/<institution>/<model>/<run>_<res>/` layout.

use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use walkdir::WalkDir;

use crate::error::{IsmError, IsmResult};

/// Naming convention of the scalar files inside one run directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Grid resolution suffix of run directories, e.g. `05` in `historical_05`.
    pub resolution: String,
    pub file_prefix: String,
    /// Picked first when several extensions match.
    pub preferred_ext: String,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            resolution:    "05".into(),
            file_prefix:   "scalars_mm_GIS".into(),
            preferred_ext: "nc".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Historical,
    Projection,
}

impl RunKind {
    pub const ALL: [RunKind; 2] = [RunKind::Historical, RunKind::Projection];

    /// Position in plotting order; drives the line style.
    pub fn index(self) -> usize {
        match self {
            RunKind::Historical => 0,
            RunKind::Projection => 1,
        }
    }
}

/// Experiment names used for each run kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunNames {
    pub historical: String,
    pub projection: String,
}

impl Default for RunNames {
    fn default() -> Self {
        RunNames { historical: "historical".into(), projection: "ctrl_proj".into() }
    }
}

impl RunNames {
    pub fn name(&self, kind: RunKind) -> &str {
        match kind {
            RunKind::Historical => &self.historical,
            RunKind::Projection => &self.projection,
        }
    }
}

/// (institution, model, run) triple naming one scalar file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId {
    pub institution: String,
    pub model:       String,
    pub run:         String,
}

impl RunId {
    pub fn new(institution: &str, model: &str, run: &str) -> Self {
        RunId {
            institution: institution.to_string(),
            model:       model.to_string(),
            run:         run.to_string(),
        }
    }

    /// Legend text: `<institution> <model> <run>`.
    pub fn label(&self) -> String {
        format!("{} {} {}", self.institution, self.model, self.run)
    }

    pub fn run_dir(&self, root: &Path, layout: &Layout) -> PathBuf {
        root.join(&self.institution)
            .join(&self.model)
            .join(format!("{}_{}", self.run, layout.resolution))
    }

    pub fn file_stem(&self, layout: &Layout) -> String {
        format!("{}_{}_{}_{}", layout.file_prefix, self.institution, self.model, self.run)
    }
}

/// Sorted names of the non-hidden subdirectories directly under `dir`.
pub fn list_subdirs(dir: &Path) -> IsmResult<Vec<String>> {
    if !dir.is_dir() {
        return Err(IsmError::NotFound(dir.to_path_buf()));
    }
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_dir() { continue }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') { continue }
        names.push(name);
    }
    Ok(names)
}

pub fn list_institutions(root: &Path) -> IsmResult<Vec<String>> {
    list_subdirs(root)
}

pub fn list_models(root: &Path, institution: &str) -> IsmResult<Vec<String>> {
    list_subdirs(&root.join(institution))
}

/// Finds `<run_dir>/<stem>.<ext>`, preferring the layout's extension.
pub fn scalar_file(root: &Path, id: &RunId, layout: &Layout) -> IsmResult<PathBuf> {
    let dir = id.run_dir(root, layout);
    let stem = id.file_stem(layout);
    let pattern = format!(
        "{}/{}.*",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(&stem)
    );

    let mut hits: Vec<PathBuf> = glob(&pattern)?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    hits.sort();

    if hits.is_empty() {
        return Err(IsmError::NotFound(dir.join(format!("{stem}.{}", layout.preferred_ext))));
    }
    let preferred = hits
        .iter()
        .position(|p| p.extension().is_some_and(|e| e == layout.preferred_ext.as_str()))
        .unwrap_or(0);
    Ok(hits.swap_remove(preferred))
}
