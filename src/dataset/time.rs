//! Relative time axes (`"<unit> since <reference>"`) turned into calendar dates.
//!
//! Seconds through days are exact durations. Months and years step along the calendar
//! from the reference date, so `1 months since 1960-01-31` is 1960-02-29, not a fixed
//! thirty days later. The fractional part of a month or year offset is that fraction
//! of the month or year it lands in, which places `0.5 months since 1960-01-01` in the
//! middle of January.

use crate::dataset::dimension::DimensionData;
use crate::dataset::error::DatasetError;
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::fmt;
use std::str::FromStr;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Months,
    Years,
}

impl TimeUnit {
    fn seconds(&self) -> Option<f64> {
        match self {
            TimeUnit::Seconds => Some(1.0),
            TimeUnit::Minutes => Some(60.0),
            TimeUnit::Hours => Some(3_600.0),
            TimeUnit::Days => Some(SECONDS_PER_DAY),
            TimeUnit::Months | TimeUnit::Years => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
            TimeUnit::Months => "months",
            TimeUnit::Years => "years",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Accepts singular and plural forms in any case.
impl FromStr for TimeUnit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "second" | "seconds" => Ok(TimeUnit::Seconds),
            "minute" | "minutes" => Ok(TimeUnit::Minutes),
            "hour" | "hours" => Ok(TimeUnit::Hours),
            "day" | "days" => Ok(TimeUnit::Days),
            "month" | "months" => Ok(TimeUnit::Months),
            "year" | "years" => Ok(TimeUnit::Years),
            _ => Err(()),
        }
    }
}

/// A parsed `units` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeEncoding {
    pub unit: TimeUnit,
    pub reference: NaiveDateTime,
}

impl TimeEncoding {
    /// Parses `"<unit> since <YYYY-MM-DD>[ HH:MM[:SS[.f]]][...]"`.
    ///
    /// A time of day directly after the date (separated by a space or `T`) is used;
    /// anything else after the date, such as a time zone, is ignored.
    pub fn parse(units: &str) -> Result<Self, DatasetError> {
        let malformed = || DatasetError::MalformedUnits(units.to_string());

        let mut words = units.split_whitespace();
        let unit_word = words.next().ok_or_else(malformed)?;
        match words.next() {
            Some(since) if since.eq_ignore_ascii_case("since") => {}
            _ => return Err(malformed()),
        }
        let date_word = words.next().ok_or_else(malformed)?;

        let unit = unit_word
            .parse::<TimeUnit>()
            .map_err(|_| DatasetError::UnknownTimeUnit {
                unit: unit_word.to_string(),
                units: units.to_string(),
            })?;

        let (date_part, inline_time) = match date_word.split_once('T') {
            Some((date, time)) => (date, Some(time)),
            None => (date_word, None),
        };
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| {
            DatasetError::InvalidReferenceDate {
                date: date_part.to_string(),
                units: units.to_string(),
            }
        })?;
        let time = inline_time
            .or_else(|| words.next())
            .and_then(parse_time_of_day)
            .unwrap_or_default();

        Ok(Self {
            unit,
            reference: date.and_time(time),
        })
    }

    /// Reads the encoding from a dimension's `units` attribute.
    pub fn from_dimension(name: &str, dimension: &DimensionData) -> Result<Self, DatasetError> {
        let units = dimension
            .attributes
            .units()
            .ok_or_else(|| DatasetError::MissingUnits(Some(name.to_string())))?;
        Self::parse(units)
    }

    /// Resolves every offset, keeping length and order.
    pub fn resolve_all(&self, offsets: &[f64]) -> Result<Vec<NaiveDateTime>, DatasetError> {
        offsets
            .iter()
            .enumerate()
            .map(|(index, &offset)| self.resolve(index, offset))
            .collect()
    }

    /// The instant `offset` units after the reference.
    pub fn resolve(&self, index: usize, offset: f64) -> Result<NaiveDateTime, DatasetError> {
        if !offset.is_finite() {
            return Err(DatasetError::NonFiniteOffset { index, offset });
        }
        let out_of_range = || DatasetError::OffsetOutOfRange {
            index,
            offset,
            unit: self.unit.to_string(),
        };

        match self.unit.seconds() {
            Some(unit_seconds) => {
                let delta = millis_delta(offset * unit_seconds).ok_or_else(out_of_range)?;
                self.reference
                    .checked_add_signed(delta)
                    .ok_or_else(out_of_range)
            }
            None => {
                let whole = offset.floor();
                let fraction = offset - whole;
                let months_per_step = if self.unit == TimeUnit::Years { 12.0 } else { 1.0 };
                let landed = add_months(self.reference, whole * months_per_step)
                    .ok_or_else(out_of_range)?;
                if fraction == 0.0 {
                    return Ok(landed);
                }
                let span_days = if self.unit == TimeUnit::Years {
                    days_in_year(landed.year())
                } else {
                    days_in_month(landed.year(), landed.month()).ok_or_else(out_of_range)?
                };
                let delta = millis_delta(fraction * span_days as f64 * SECONDS_PER_DAY)
                    .ok_or_else(out_of_range)?;
                landed.checked_add_signed(delta).ok_or_else(out_of_range)
            }
        }
    }
}

fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(s, format).ok())
}

fn millis_delta(seconds: f64) -> Option<TimeDelta> {
    let millis = (seconds * 1_000.0).round();
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}

fn add_months(start: NaiveDateTime, months: f64) -> Option<NaiveDateTime> {
    if months.abs() > u32::MAX as f64 {
        return None;
    }
    let step = Months::new(months.abs() as u32);
    if months >= 0.0 {
        start.checked_add_months(step)
    } else {
        start.checked_sub_months(step)
    }
}

fn days_in_month(year: i32, month: u32) -> Option<i64> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some((next - first).num_days())
}

fn days_in_year(year: i32) -> i64 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// Converts a relative time dimension into dates, one per value, order kept.
///
/// # Errors
///
/// [`DatasetError::MissingUnits`] without a `units` attribute, the other format
/// variants for an unusable encoding, or for offsets that are not finite or that
/// leave chrono's date range.
pub fn normalize(dimension: &DimensionData) -> Result<Vec<NaiveDate>, DatasetError> {
    Ok(normalize_datetimes(dimension)?
        .into_iter()
        .map(|dt| dt.date())
        .collect())
}

/// Like [`normalize`] but keeps the time of day.
pub fn normalize_datetimes(dimension: &DimensionData) -> Result<Vec<NaiveDateTime>, DatasetError> {
    let units = dimension
        .attributes
        .units()
        .ok_or(DatasetError::MissingUnits(None))?;
    TimeEncoding::parse(units)?.resolve_all(&dimension.values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::dimension::AttributeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time_axis(units: &str, values: Vec<f64>) -> DimensionData {
        DimensionData::new(values, [("units", units)].into_iter().collect())
    }

    #[test]
    fn test_months_since_round_trip() -> Result<(), DatasetError> {
        let dim = time_axis("months since 1960-01-01", vec![0.0, 1.0, 12.0]);
        assert_eq!(
            normalize(&dim)?,
            vec![date(1960, 1, 1), date(1960, 2, 1), date(1961, 1, 1)]
        );
        Ok(())
    }

    #[test]
    fn test_month_end_is_calendar_defined() -> Result<(), DatasetError> {
        let dim = time_axis("months since 1960-01-31", vec![1.0, 2.0, -2.0]);
        assert_eq!(
            normalize(&dim)?,
            vec![date(1960, 2, 29), date(1960, 3, 31), date(1959, 11, 30)]
        );
        Ok(())
    }

    #[test]
    fn test_fractional_months_land_mid_month() -> Result<(), DatasetError> {
        // Data Library monthly axes are centred on the month.
        let dim = time_axis("months since 1960-01-01", vec![0.5, 1.5, -0.5]);
        let dt = normalize_datetimes(&dim)?;
        assert_eq!(dt[0], date(1960, 1, 16).and_hms_opt(12, 0, 0).unwrap());
        assert_eq!(dt[1], date(1960, 2, 15).and_hms_opt(12, 0, 0).unwrap());
        assert_eq!(dt[2].date(), date(1959, 12, 16));
        Ok(())
    }

    #[test]
    fn test_years_since() -> Result<(), DatasetError> {
        let dim = time_axis("years since 2000-02-29", vec![0.0, 1.0, 4.0, 0.5]);
        assert_eq!(
            normalize(&dim)?,
            vec![
                date(2000, 2, 29),
                date(2001, 2, 28),
                date(2004, 2, 29),
                date(2000, 8, 30)
            ]
        );
        Ok(())
    }

    #[test]
    fn test_exact_duration_units() -> Result<(), DatasetError> {
        let days = time_axis("days since 1970-01-01", vec![0.0, 31.0, 365.25]);
        assert_eq!(
            normalize(&days)?,
            vec![date(1970, 1, 1), date(1970, 2, 1), date(1971, 1, 1)]
        );

        let hours = time_axis("hours since 2020-12-31 18:00:00", vec![6.0, -18.0]);
        assert_eq!(
            normalize_datetimes(&hours)?,
            vec![
                date(2021, 1, 1).and_hms_opt(0, 0, 0).unwrap(),
                date(2020, 12, 31).and_hms_opt(0, 0, 0).unwrap()
            ]
        );

        let minutes = time_axis("Minutes since 2000-01-01T23:30", vec![45.0]);
        assert_eq!(normalize(&minutes)?, vec![date(2000, 1, 2)]);

        let seconds = time_axis("seconds since 1970-01-01 00:00:00 UTC", vec![86_399.0]);
        assert_eq!(normalize(&seconds)?, vec![date(1970, 1, 1)]);
        Ok(())
    }

    #[test]
    fn test_parse_encoding() -> Result<(), DatasetError> {
        let enc = TimeEncoding::parse("Day SINCE 1960-1-1 junk")?;
        assert_eq!(enc.unit, TimeUnit::Days);
        assert_eq!(enc.reference, date(1960, 1, 1).and_hms_opt(0, 0, 0).unwrap());
        Ok(())
    }

    #[test]
    fn test_missing_units() {
        let dim = DimensionData::new(vec![0.0], AttributeMap::new());
        let unnamed = normalize(&dim).unwrap_err();
        assert!(matches!(unnamed, DatasetError::MissingUnits(None)));
        assert_eq!(unnamed.to_string(), "Time dimension has no 'units' attribute");

        let named = TimeEncoding::from_dimension("T", &dim).unwrap_err();
        assert!(matches!(named, DatasetError::MissingUnits(Some(ref name)) if name == "T"));
        assert_eq!(named.to_string(), "Time dimension 'T' has no 'units' attribute");
    }

    #[test]
    fn test_malformed_units() {
        for units in ["", "months", "months after 1960-01-01", "months since"] {
            let err = normalize(&time_axis(units, vec![0.0])).unwrap_err();
            assert!(
                matches!(&err, DatasetError::MalformedUnits(u) if u == units),
                "unexpected error for '{}': {:?}",
                units,
                err
            );
            assert!(err.is_format());
        }
    }

    #[test]
    fn test_unknown_unit_is_named() {
        let err = normalize(&time_axis("fortnights since 1960-01-01", vec![0.0])).unwrap_err();
        assert!(
            matches!(&err, DatasetError::UnknownTimeUnit { unit, .. } if unit == "fortnights")
        );
        assert!(err.is_format());
    }

    #[test]
    fn test_invalid_reference_date() {
        let err = normalize(&time_axis("days since 1960-02-30", vec![0.0])).unwrap_err();
        assert!(
            matches!(&err, DatasetError::InvalidReferenceDate { date, .. } if date == "1960-02-30")
        );
        assert!(normalize(&time_axis("days since yesterday", vec![0.0])).is_err());
    }

    #[test]
    fn test_non_finite_offsets() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = normalize(&time_axis("months since 1960-01-01", vec![0.0, bad])).unwrap_err();
            assert!(matches!(err, DatasetError::NonFiniteOffset { index: 1, .. }));
        }
    }

    #[test]
    fn test_offset_out_of_range() {
        let err = normalize(&time_axis("years since 1960-01-01", vec![1e12])).unwrap_err();
        assert!(matches!(err, DatasetError::OffsetOutOfRange { index: 0, .. }));
        let err = normalize(&time_axis("seconds since 1960-01-01", vec![1e300])).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_length_and_order_preserved() -> Result<(), DatasetError> {
        let dim = time_axis("days since 2000-01-10", vec![5.0, -5.0, 0.0, 1.0]);
        let dates = normalize(&dim)?;
        assert_eq!(dates.len(), 4);
        assert_eq!(
            dates,
            vec![date(2000, 1, 15), date(2000, 1, 5), date(2000, 1, 10), date(2000, 1, 11)]
        );
        Ok(())
    }
}
