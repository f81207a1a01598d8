//! Sea-level-equivalent time series and the NetCDF scalar-file reader.

use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use netcdf::{AttributeValue, Variable};
use tracing::{debug, info};

use crate::calendar::{CfCalendar, CfUnits, TimeDecoding};
use crate::catalog::{self, Layout, RunId};
use crate::error::{IsmError, IsmResult};

pub const TIME_VAR: &str = "time";
pub const SLE_VAR:  &str = "sle";

/// `sle` is stored in metres and decreases with mass loss; plots want mm of rise.
pub const SLE_TO_MM_RISE: f64 = -1000.0;

/// Paired (timestamp, value) samples, values in mm of sea-level rise.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    times:  Vec<NaiveDateTime>,
    values: Vec<f64>,
}

impl Series {
    pub fn new(times: Vec<NaiveDateTime>, values: Vec<f64>) -> IsmResult<Self> {
        if times.len() != values.len() {
            return Err(IsmError::LengthMismatch { times: times.len(), values: values.len() });
        }
        Ok(Series { times, values })
    }

    pub fn times(&self) -> &[NaiveDateTime] { &self.times }
    pub fn values(&self) -> &[f64] { &self.values }
    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
    pub fn first(&self) -> Option<f64> { self.values.first().copied() }
    pub fn last(&self) -> Option<f64> { self.values.last().copied() }

    /// Same timestamps, every value plus `offset`.
    pub fn shifted(&self, offset: f64) -> Series {
        Series {
            times:  self.times.clone(),
            values: self.values.iter().map(|v| v + offset).collect(),
        }
    }

    pub fn decimal_years(&self) -> Vec<f64> {
        self.times.iter().copied().map(decimal_year).collect()
    }
}

/// `2000-07-02 00:00` → `2000.5`.
pub fn decimal_year(t: NaiveDateTime) -> f64 {
    let year = t.year();
    let days_in_year = match NaiveDate::from_ymd_opt(year, 2, 29) {
        Some(_) => 366.0,
        None    => 365.0,
    };
    let day = f64::from(t.ordinal0()) + f64::from(t.num_seconds_from_midnight()) / 86_400.0;
    f64::from(year) + day / days_in_year
}

/// Metres SLE → mm of sea-level rise, sample by sample.
pub fn sle_to_mm(raw: &[f64]) -> Vec<f64> {
    raw.iter().map(|v| v * SLE_TO_MM_RISE).collect()
}

// ─────────────────────────────────────────────────────────────────────
// NetCDF
// ─────────────────────────────────────────────────────────────────────

/// Locates and reads the scalar file of `id` under `root`.
pub fn load_series(root: &Path, id: &RunId, layout: &Layout) -> IsmResult<Series> {
    let path = catalog::scalar_file(root, id, layout)?;
    read_scalar_file(&path, TimeDecoding::for_institution(&id.institution))
}

pub fn read_scalar_file(path: &Path, decoding: TimeDecoding) -> IsmResult<Series> {
    info!(path = %path.display(), ?decoding, "reading scalars");
    if !path.is_file() {
        return Err(IsmError::NotFound(path.to_path_buf()));
    }
    let nc_err = |source| IsmError::NetCdf { path: path.to_path_buf(), source };
    let file = netcdf::open(path).map_err(nc_err)?;

    let time = require_var(&file, path, TIME_VAR)?;
    let raw_time: Vec<f64> = time.get_values::<f64, _>(..).map_err(nc_err)?;
    let units = string_attr(&time, "units", path)?
        .ok_or_else(|| IsmError::parse(path, "time variable has no 'units' attribute"))?;
    let units = CfUnits::parse(&units).map_err(|msg| IsmError::parse(path, msg))?;
    let calendar = string_attr(&time, "calendar", path)?;
    let calendar = CfCalendar::parse(calendar.as_deref()).map_err(|msg| IsmError::parse(path, msg))?;
    debug!(?units, ?calendar, n = raw_time.len(), "time axis");

    let times = calendar
        .decode(&raw_time, &units)
        .and_then(|dates| decoding.apply(&dates))
        .map_err(|msg| IsmError::parse(path, msg))?;

    let sle = require_var(&file, path, SLE_VAR)?;
    let raw_sle: Vec<f64> = sle.get_values::<f64, _>(..).map_err(nc_err)?;
    let raw_sle = unpack(&sle, raw_sle, path)?;

    Series::new(times, sle_to_mm(&raw_sle)).map_err(|e| IsmError::parse(path, e.to_string()))
}

fn require_var<'f>(file: &'f netcdf::File, path: &Path, name: &str) -> IsmResult<Variable<'f>> {
    file.variable(name)
        .ok_or_else(|| IsmError::parse(path, format!("missing variable '{name}'")))
}

fn attr_value(var: &Variable, name: &str, path: &Path) -> IsmResult<Option<AttributeValue>> {
    match var.attribute(name) {
        None => Ok(None),
        Some(attr) => attr
            .value()
            .map(Some)
            .map_err(|source| IsmError::NetCdf { path: path.to_path_buf(), source }),
    }
}

fn string_attr(var: &Variable, name: &str, path: &Path) -> IsmResult<Option<String>> {
    match attr_value(var, name, path)? {
        None => Ok(None),
        Some(AttributeValue::Str(s)) => Ok(Some(s)),
        Some(other) => Err(IsmError::parse(path, format!("attribute '{name}' is not text: {other:?}"))),
    }
}

fn numeric_attr(var: &Variable, name: &str, path: &Path) -> IsmResult<Option<f64>> {
    let v = match attr_value(var, name, path)? {
        None => return Ok(None),
        Some(v) => v,
    };
    let x = match v {
        AttributeValue::Double(x)  => x,
        AttributeValue::Float(x)   => f64::from(x),
        AttributeValue::Int(x)     => f64::from(x),
        AttributeValue::Short(x)   => f64::from(x),
        AttributeValue::Schar(x)   => f64::from(x),
        AttributeValue::Doubles(xs) if xs.len() == 1 => xs[0],
        AttributeValue::Floats(xs)  if xs.len() == 1 => f64::from(xs[0]),
        other => {
            return Err(IsmError::parse(path, format!("attribute '{name}' is not a number: {other:?}")))
        }
    };
    Ok(Some(x))
}

/// CF packing: fill/missing samples become NaN, then `raw * scale_factor + add_offset`.
fn unpack(var: &Variable, raw: Vec<f64>, path: &Path) -> IsmResult<Vec<f64>> {
    let fill    = numeric_attr(var, "_FillValue", path)?;
    let missing = numeric_attr(var, "missing_value", path)?;
    let scale   = numeric_attr(var, "scale_factor", path)?.unwrap_or(1.0);
    let offset  = numeric_attr(var, "add_offset", path)?.unwrap_or(0.0);

    Ok(raw
        .into_iter()
        .map(|v| {
            if Some(v) == fill || Some(v) == missing {
                f64::NAN
            } else {
                v * scale + offset
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn t(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn conversion_is_linear_and_sign_inverting() {
        let raw = [-1.0, -2.0, 0.0, 0.0125, 3.5];
        let mm = sle_to_mm(&raw);
        for (r, m) in raw.iter().zip(&mm) {
            assert_relative_eq!(*m, -1000.0 * r);
        }
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = Series::new(vec![t(2000, 1, 1)], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, IsmError::LengthMismatch { times: 1, values: 2 }));
    }

    #[test]
    fn shift_keeps_times() {
        let s = Series::new(vec![t(2000, 1, 1), t(2001, 1, 1)], vec![1.0, 2.0]).unwrap();
        let s2 = s.shifted(-2.0);
        assert_eq!(s2.times(), s.times());
        assert_eq!(s2.values(), &[-1.0, 0.0]);
        assert_eq!(s2.first(), Some(-1.0));
        assert_eq!(s2.last(), Some(0.0));
    }

    #[test]
    fn decimal_years() {
        assert_relative_eq!(decimal_year(t(2015, 1, 1)), 2015.0);
        assert_relative_eq!(decimal_year(t(2000, 7, 2)), 2000.5);
        assert_relative_eq!(decimal_year(t(2001, 7, 2)), 2001.0 + 182.0 / 365.0);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = read_scalar_file(Path::new("/nonexistent/scalars.nc"), TimeDecoding::ModelCalendar)
            .unwrap_err();
        assert!(matches!(err, IsmError::NotFound(_)));
    }
}
