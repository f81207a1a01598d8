//! CF time decoding.
//!
//! ISM output stores time as `<unit> since <reference>` offsets in whatever
//! calendar the model ran on. Decoding happens in two steps: offsets become
//! [`ModelDate`]s in the file's own [`CfCalendar`], then a [`TimeDecoding`]
//! strategy turns those into ordinary `NaiveDateTime`s.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

const MS_PER_DAY: i64 = 86_400_000;
/// Offsets at or beyond this many milliseconds (about 3 million years) are rejected.
const MAX_OFFSET_MS: f64 = 1e17;

const CUM_DAYS:      [i64; 13] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365];
const CUM_DAYS_LEAP: [i64; 13] = [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335, 366];

/// Institutions whose time axis is read as plain calendar years.
pub const CALENDAR_YEAR_INSTITUTIONS: &[&str] = &["IMAU"];

// ─────────────────────────────────────────────────────────────────────
// Units
// ─────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn parse(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Ok(TimeUnit::Seconds),
            "min" | "mins" | "minute" | "minutes"       => Ok(TimeUnit::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours"       => Ok(TimeUnit::Hours),
            "d" | "day" | "days"                        => Ok(TimeUnit::Days),
            other => Err(format!("unsupported time unit '{other}'")),
        }
    }

    pub fn millis(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1_000.0,
            TimeUnit::Minutes => 60_000.0,
            TimeUnit::Hours   => 3_600_000.0,
            TimeUnit::Days    => MS_PER_DAY as f64,
        }
    }
}

/// A date in some model calendar. Fields are not checked against the
/// standard calendar, so `1990-02-30` is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModelDate {
    pub year:  i32,
    pub month: u32,
    pub day:   u32,
    /// Milliseconds since midnight.
    pub ms:    u32,
}

impl ModelDate {
    /// Same wall-clock fields in the standard calendar, if that date exists.
    pub fn to_standard(self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day)?;
        let time = NaiveTime::from_num_seconds_from_midnight_opt(
            self.ms / 1_000,
            (self.ms % 1_000) * 1_000_000,
        )?;
        Some(NaiveDateTime::new(date, time))
    }
}

/// Parsed `<unit> since <reference>` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfUnits {
    pub unit:      TimeUnit,
    pub reference: ModelDate,
}

impl CfUnits {
    /// Parses e.g. `days since 1850-1-1 00:00:00` or `seconds since 2015-01-01T00:00:00Z`.
    pub fn parse(units: &str) -> Result<Self, String> {
        let (unit, rest) = units
            .trim()
            .split_once(" since ")
            .ok_or_else(|| format!("time units '{units}' lack 'since'"))?;
        let unit = TimeUnit::parse(unit.trim())?;
        let reference = parse_reference(rest.trim())
            .ok_or_else(|| format!("bad reference date in '{units}'"))?;
        Ok(CfUnits { unit, reference })
    }
}

fn parse_reference(s: &str) -> Option<ModelDate> {
    let s = s.trim_end_matches("UTC").trim_end_matches('Z').trim();
    let (date, time) = match s.split_once(|c: char| c == ' ' || c == 'T') {
        Some((d, t)) => (d, t.trim()),
        None         => (s, ""),
    };

    // leading '-' belongs to the year, not a separator
    let (sign, date) = match date.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None       => (1, date),
    };
    let mut parts = date.split('-');
    let year:  i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next().map_or(Some(1), |p| p.parse().ok())?;
    let day:   u32 = parts.next().map_or(Some(1), |p| p.parse().ok())?;
    if parts.next().is_some() || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    let mut ms = 0u32;
    if !time.is_empty() {
        let mut hms = time.split(':');
        let h: u32 = hms.next()?.parse().ok()?;
        let m: u32 = hms.next().map_or(Some(0), |p| p.parse().ok())?;
        let sec: f64 = hms.next().map_or(Some(0.0), |p| p.parse().ok())?;
        if h > 23 || m > 59 || !(0.0..60.0).contains(&sec) {
            return None;
        }
        ms = h * 3_600_000 + m * 60_000 + (sec * 1_000.0).round() as u32;
    }

    Some(ModelDate { year: sign * year, month, day, ms })
}

// ─────────────────────────────────────────────────────────────────────
// Calendars
// ─────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfCalendar {
    /// `standard`, `gregorian`, `proleptic_gregorian`.
    Standard,
    /// `noleap`, `365_day`.
    NoLeap,
    /// `all_leap`, `366_day`.
    AllLeap,
    /// `360_day`: twelve 30-day months.
    Day360,
}

impl CfCalendar {
    /// A missing `calendar` attribute means `standard`.
    pub fn parse(name: Option<&str>) -> Result<Self, String> {
        let Some(name) = name else { return Ok(CfCalendar::Standard) };
        match name.trim().to_ascii_lowercase().as_str() {
            "standard" | "gregorian" | "proleptic_gregorian" => Ok(CfCalendar::Standard),
            "noleap" | "365_day"                             => Ok(CfCalendar::NoLeap),
            "all_leap" | "366_day"                           => Ok(CfCalendar::AllLeap),
            "360_day"                                        => Ok(CfCalendar::Day360),
            other => Err(format!("unsupported calendar '{other}'")),
        }
    }

    fn year_len(self) -> i64 {
        match self {
            CfCalendar::NoLeap  => 365,
            CfCalendar::AllLeap => 366,
            CfCalendar::Day360  => 360,
            CfCalendar::Standard => unreachable!("standard calendar has no fixed year length"),
        }
    }

    fn valid(self, d: &ModelDate) -> bool {
        match self {
            CfCalendar::Standard => NaiveDate::from_ymd_opt(d.year, d.month, d.day).is_some(),
            CfCalendar::Day360   => d.day <= 30,
            CfCalendar::NoLeap | CfCalendar::AllLeap => {
                let cum = if self == CfCalendar::NoLeap { &CUM_DAYS } else { &CUM_DAYS_LEAP };
                let m = d.month as usize;
                i64::from(d.day) <= cum[m] - cum[m - 1]
            }
        }
    }

    /// Day index of `d` counted from year 0 of a fixed-length calendar.
    fn day_number(self, d: &ModelDate) -> i64 {
        let (y, m, day) = (i64::from(d.year), d.month as usize, i64::from(d.day));
        match self {
            CfCalendar::NoLeap  => y * 365 + CUM_DAYS[m - 1] + day - 1,
            CfCalendar::AllLeap => y * 366 + CUM_DAYS_LEAP[m - 1] + day - 1,
            CfCalendar::Day360  => y * 360 + (m as i64 - 1) * 30 + day - 1,
            CfCalendar::Standard => unreachable!("standard calendar is decoded through chrono"),
        }
    }

    fn date_of_day(self, n: i64, ms: u32) -> ModelDate {
        let len = self.year_len();
        let year = n.div_euclid(len) as i32;
        let doy = n.rem_euclid(len);
        let (month, day) = match self {
            CfCalendar::Day360 => (doy / 30 + 1, doy % 30 + 1),
            _ => {
                let cum = if self == CfCalendar::NoLeap { &CUM_DAYS } else { &CUM_DAYS_LEAP };
                let m = cum.iter().rposition(|&c| c <= doy).unwrap_or(0);
                (m as i64 + 1, doy - cum[m] + 1)
            }
        };
        ModelDate { year, month: month as u32, day: day as u32, ms }
    }

    /// Decodes raw offsets into dates of this calendar.
    pub fn decode(self, values: &[f64], units: &CfUnits) -> Result<Vec<ModelDate>, String> {
        let reference = units.reference;
        if !self.valid(&reference) {
            return Err(format!("reference date {reference:?} does not exist in {self:?} calendar"));
        }
        let step = units.unit.millis();
        let midnight = ModelDate { ms: 0, ..reference }.to_standard();

        values
            .iter()
            .map(|&v| {
                if !v.is_finite() {
                    return Err(format!("non-finite time value {v}"));
                }
                let scaled = (v * step).round();
                if scaled.abs() >= MAX_OFFSET_MS {
                    return Err(format!("time value {v} out of range"));
                }
                let total = i64::from(reference.ms)
                    .checked_add(scaled as i64)
                    .ok_or_else(|| format!("time value {v} out of range"))?;
                match self {
                    CfCalendar::Standard => {
                        let start = midnight
                            .ok_or_else(|| format!("bad reference date {reference:?}"))?;
                        let t = start
                            .checked_add_signed(Duration::milliseconds(total))
                            .ok_or_else(|| format!("time value {v} is outside the representable dates"))?;
                        Ok(from_naive(t))
                    }
                    _ => {
                        let days = self
                            .day_number(&reference)
                            .checked_add(total.div_euclid(MS_PER_DAY))
                            .filter(|d| i32::try_from(d.div_euclid(self.year_len())).is_ok())
                            .ok_or_else(|| format!("time value {v} out of range"))?;
                        Ok(self.date_of_day(days, total.rem_euclid(MS_PER_DAY) as u32))
                    }
                }
            })
            .collect()
    }
}

fn from_naive(t: NaiveDateTime) -> ModelDate {
    use chrono::{Datelike, Timelike};
    ModelDate {
        year:  t.year(),
        month: t.month(),
        day:   t.day(),
        ms:    t.num_seconds_from_midnight() * 1_000 + t.nanosecond() / 1_000_000,
    }
}

// ─────────────────────────────────────────────────────────────────────
// Institution-dependent strategy
// ─────────────────────────────────────────────────────────────────────

/// How a model's time axis becomes standard-calendar timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeDecoding {
    /// Keep only the calendar year; each sample lands on 1 January.
    CalendarYear,
    /// Carry each model-calendar date over to the same fields in the
    /// standard calendar. Dates that do not exist there are an error.
    ModelCalendar,
}

impl TimeDecoding {
    pub fn for_institution(institution: &str) -> Self {
        if CALENDAR_YEAR_INSTITUTIONS.contains(&institution) {
            TimeDecoding::CalendarYear
        } else {
            TimeDecoding::ModelCalendar
        }
    }

    pub fn apply(self, dates: &[ModelDate]) -> Result<Vec<NaiveDateTime>, String> {
        match self {
            TimeDecoding::CalendarYear => dates.iter().map(calendar_year).collect(),
            TimeDecoding::ModelCalendar => dates.iter().map(model_calendar).collect(),
        }
    }
}

fn calendar_year(d: &ModelDate) -> Result<NaiveDateTime, String> {
    NaiveDate::from_ymd_opt(d.year, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("year {} out of range", d.year))
}

fn model_calendar(d: &ModelDate) -> Result<NaiveDateTime, String> {
    d.to_standard().ok_or_else(|| {
        format!(
            "{:04}-{:02}-{:02} has no standard-calendar equivalent",
            d.year, d.month, d.day
        )
    })
}
