use std::path::{Path, PathBuf};

use ism_sle_plot::calendar::TimeDecoding;
use ism_sle_plot::export::write_csv;
use ism_sle_plot::pipeline::{institution_figure, run};
use ism_sle_plot::plot::{LineStyle, MODEL_COLORS};
use ism_sle_plot::series::read_scalar_file;
use ism_sle_plot::{IsmError, Layout, PlotConfig, RunId, Selection};

struct Scalars<'a> {
    units:    &'a str,
    calendar: Option<&'a str>,
    time:     &'a [f64],
    sle:      &'a [f64],
    fill:     Option<f64>,
}

fn write_scalars(path: &Path, s: &Scalars) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut nc = netcdf::create(path).unwrap();
    nc.add_dimension("time", s.time.len()).unwrap();
    {
        let mut t = nc.add_variable::<f64>("time", &["time"]).unwrap();
        t.put_attribute("units", s.units).unwrap();
        if let Some(cal) = s.calendar {
            t.put_attribute("calendar", cal).unwrap();
        }
        t.put_values(s.time, ..).unwrap();
    }
    if !s.sle.is_empty() {
        let mut v = nc.add_variable::<f64>("sle", &["time"]).unwrap();
        if let Some(fill) = s.fill {
            v.set_fill_value(fill).unwrap();
        }
        v.put_attribute("units", "m").unwrap();
        v.put_values(s.sle, ..).unwrap();
    }
}

fn scalar_path(root: &Path, institution: &str, model: &str, run: &str) -> PathBuf {
    let id = RunId::new(institution, model, run);
    let layout = Layout::default();
    id.run_dir(root, &layout).join(format!("{}.nc", id.file_stem(&layout)))
}

fn noleap<'a>(time: &'a [f64], sle: &'a [f64]) -> Scalars<'a> {
    Scalars { units: "days since 1850-1-1 00:00:00", calendar: Some("noleap"), time, sle, fill: None }
}

fn config(root: &Path) -> PlotConfig {
    PlotConfig {
        root: root.to_path_buf(),
        figures: root.join("figs"),
        institutions: Selection::All,
        ..PlotConfig::default()
    }
}

#[test]
fn test_awi_models_are_spliced() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let hist_t = [59_130.0, 59_495.0, 59_860.0]; // 2012..2014 in a 365-day calendar
    let proj_t = [60_225.0, 60_590.0];
    for model in ["ISSM1", "ISSM2"] {
        write_scalars(&scalar_path(root, "AWI", model, "historical"), &noleap(&hist_t, &[-1.0, -2.0, -3.0]));
        write_scalars(&scalar_path(root, "AWI", model, "ctrl_proj"), &noleap(&proj_t, &[-3.0, -4.0]));
    }

    let fig = institution_figure(&config(root), "AWI").unwrap();
    let lines = fig.lines();
    assert_eq!(lines.len(), 4);

    assert_eq!(lines[0].label(), "AWI ISSM1 historical");
    assert_eq!(lines[0].series.values(), &[-2000.0, -1000.0, 0.0]);
    assert_eq!(lines[1].label(), "AWI ISSM1 ctrl_proj");
    assert_eq!(lines[1].series.values(), &[0.0, 1000.0]);

    assert_eq!((lines[0].color, lines[0].style), (MODEL_COLORS[0], LineStyle::Solid));
    assert_eq!((lines[1].color, lines[1].style), (MODEL_COLORS[0], LineStyle::Dashed));
    assert_eq!((lines[2].color, lines[3].color), (MODEL_COLORS[1], MODEL_COLORS[1]));

    let t0 = lines[0].series.times()[0];
    assert_eq!(t0.to_string(), "2012-01-01 00:00:00");
    assert_eq!(lines[1].series.times()[0].to_string(), "2015-01-01 00:00:00");
}

#[test]
fn test_imau_keeps_only_years() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("imau.nc");
    write_scalars(&path, &Scalars {
        units: "days since 2000-01-01",
        calendar: Some("proleptic_gregorian"),
        time: &[182.0, 548.0],
        sle: &[0.0, -0.5],
        fill: None,
    });

    let s = read_scalar_file(&path, TimeDecoding::CalendarYear).unwrap();
    let stamps: Vec<String> = s.times().iter().map(|t| t.to_string()).collect();
    assert_eq!(stamps, ["2000-01-01 00:00:00", "2001-01-01 00:00:00"]);
    assert_eq!(s.values(), &[0.0, 500.0]);
}

#[test]
fn test_360_day_calendar_only_decodes_for_calendar_years() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("day360.nc");
    // day 59 is 30 February
    write_scalars(&path, &Scalars {
        units: "days since 2001-01-01",
        calendar: Some("360_day"),
        time: &[0.0, 59.0],
        sle: &[0.0, 0.0],
        fill: None,
    });

    let err = read_scalar_file(&path, TimeDecoding::ModelCalendar).unwrap_err();
    assert!(matches!(err, IsmError::Parse { .. }), "{err}");
    assert!(read_scalar_file(&path, TimeDecoding::CalendarYear).is_ok());
}

#[test]
fn test_missing_projection_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write_scalars(&scalar_path(root, "AWI", "ISSM1", "historical"), &noleap(&[0.0], &[-1.0]));

    let err = institution_figure(&config(root), "AWI").unwrap_err();
    match err {
        IsmError::NotFound(p) => assert!(p.ends_with("ctrl_proj_05/scalars_mm_GIS_AWI_ISSM1_ctrl_proj.nc")),
        other => panic!("expected NotFound, got {other}"),
    }
}

#[test]
fn test_missing_sle_is_parse_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("no_sle.nc");
    write_scalars(&path, &noleap(&[0.0, 365.0], &[]));

    let err = read_scalar_file(&path, TimeDecoding::ModelCalendar).unwrap_err();
    assert!(err.to_string().contains("missing variable 'sle'"), "{err}");
}

#[test]
fn test_bad_units_is_parse_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("bad_units.nc");
    write_scalars(&path, &Scalars { units: "years", calendar: None, time: &[0.0], sle: &[0.0], fill: None });

    let err = read_scalar_file(&path, TimeDecoding::ModelCalendar).unwrap_err();
    assert!(matches!(err, IsmError::Parse { .. }), "{err}");
}

#[test]
fn test_fill_values_become_gaps_and_empty_csv_cells() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let fill = -9_999.0;
    write_scalars(
        &scalar_path(root, "AWI", "ISSM1", "historical"),
        &Scalars { fill: Some(fill), ..noleap(&[0.0, 365.0, 730.0], &[-1.0, fill, -2.0]) },
    );
    write_scalars(
        &scalar_path(root, "AWI", "ISSM1", "ctrl_proj"),
        &Scalars { fill: Some(fill), ..noleap(&[1095.0, 1460.0], &[-2.0, -2.5]) },
    );

    let fig = institution_figure(&config(root), "AWI").unwrap();
    let hist = &fig.lines()[0];
    assert!(hist.series.values()[1].is_nan());
    assert_eq!(hist.segments().len(), 2);
    assert_eq!(fig.lines()[1].series.values(), &[0.0, 500.0]);

    let csv_path = root.join("awi.csv");
    assert_eq!(write_csv(&fig, &csv_path).unwrap(), 5);
    let text = std::fs::read_to_string(&csv_path).unwrap();
    let rows: Vec<&str> = text.lines().collect();
    assert_eq!(rows[0], "institution,model,run,time,decimal_year,sle_mm");
    assert_eq!(rows[1], "AWI,ISSM1,historical,1850-01-01T00:00:00,1850.000000,-1000");
    assert_eq!(rows[2], "AWI,ISSM1,historical,1851-01-01T00:00:00,1851.000000,");
    assert_eq!(rows[5], "AWI,ISSM1,ctrl_proj,1854-01-01T00:00:00,1854.000000,500");
}

#[test]
fn test_run_overwrites_one_figure_per_institution() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write_scalars(&scalar_path(root, "AWI", "ISSM1", "historical"), &noleap(&[0.0, 365.0], &[-1.0, -2.0]));
    write_scalars(&scalar_path(root, "AWI", "ISSM1", "ctrl_proj"), &noleap(&[730.0, 1095.0], &[-2.0, -3.0]));
    let cfg = PlotConfig { write_csv: true, ..config(root) };
    let expected = root.join("figs").join("AWI_historical_ctrl_proj.png");

    let first = run(&cfg).unwrap();
    assert_eq!(first, vec![expected.clone()]);
    assert!(expected.is_file());
    assert!(expected.with_extension("csv").is_file());

    let second = run(&cfg).unwrap();
    assert_eq!(second, first);
    let pngs = std::fs::read_dir(root.join("figs"))
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|x| x == "png"))
        .count();
    assert_eq!(pngs, 1);
}
