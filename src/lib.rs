//! Greenland ISM sea-level contribution plots.
//!
//! Reads ISMIP6 `scalars_mm_GIS_*` NetCDF output laid out as
//! `<root>/<institution>/<model>/<run>_05/`, splices each model's projection
//! onto the end of its historical run and draws one comparison figure per
//! institution.

pub mod calendar;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod normalize;
pub mod pipeline;
pub mod plot;
pub mod series;
pub mod telemetry;

pub use catalog::{Layout, RunId, RunKind, RunNames};
pub use config::{PlotConfig, Selection};
pub use error::{IsmError, IsmResult};
pub use series::Series;
