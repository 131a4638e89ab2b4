// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Time units for point timestamps and query epochs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Unit of an epoch timestamp.
///
/// Conversions go through `i128` nanoseconds so that no intermediate
/// value overflows; results that do not fit an `i64` saturate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[serde(alias = "ns")]
    Nanos,
    #[serde(alias = "u", alias = "us")]
    Micros,
    #[default]
    #[serde(alias = "ms")]
    Millis,
    #[serde(alias = "s")]
    Seconds,
    #[serde(alias = "m")]
    Minutes,
    #[serde(alias = "h")]
    Hours,
}

impl TimeUnit {
    /// Nanoseconds in one tick of this unit.
    pub const fn nanos_per_unit(self) -> i128 {
        match self {
            TimeUnit::Nanos => 1,
            TimeUnit::Micros => 1_000,
            TimeUnit::Millis => 1_000_000,
            TimeUnit::Seconds => NANOS_PER_SECOND,
            TimeUnit::Minutes => 60 * NANOS_PER_SECOND,
            TimeUnit::Hours => 3_600 * NANOS_PER_SECOND,
        }
    }

    /// InfluxDB precision / epoch identifier (`ns`, `u`, `ms`, `s`, `m`, `h`).
    pub const fn precision(self) -> &'static str {
        match self {
            TimeUnit::Nanos => "ns",
            TimeUnit::Micros => "u",
            TimeUnit::Millis => "ms",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
        }
    }

    /// Convert `value` expressed in `from` into this unit.
    ///
    /// Coarsening floors, as [`TimeUnit::from_datetime`] does; refining
    /// saturates at the `i64` bounds.
    pub fn convert(self, value: i64, from: TimeUnit) -> i64 {
        let nanos = i128::from(value) * from.nanos_per_unit();
        saturate(nanos.div_euclid(self.nanos_per_unit()))
    }

    /// Epoch value of `instant` in this unit, floored to whole ticks.
    ///
    /// Returns `None` when the value does not fit an `i64`.
    pub fn from_datetime(self, instant: &DateTime<Utc>) -> Option<i64> {
        let nanos = i128::from(instant.timestamp()) * NANOS_PER_SECOND
            + i128::from(instant.timestamp_subsec_nanos());
        i64::try_from(nanos.div_euclid(self.nanos_per_unit())).ok()
    }

    /// Instant denoted by an epoch `value` in this unit.
    ///
    /// Returns `None` when the instant is outside chrono's range.
    pub fn to_datetime(self, value: i64) -> Option<DateTime<Utc>> {
        let nanos = i128::from(value) * self.nanos_per_unit();
        let secs = i64::try_from(nanos.div_euclid(NANOS_PER_SECOND)).ok()?;
        let subsec = u32::try_from(nanos.rem_euclid(NANOS_PER_SECOND)).ok()?;
        DateTime::from_timestamp(secs, subsec)
    }
}

fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeUnit::Nanos => "nanos",
            TimeUnit::Micros => "micros",
            TimeUnit::Millis => "millis",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
        };
        f.write_str(name)
    }
}

/// Unrecognised time unit name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimeUnitError(pub String);

impl fmt::Display for ParseTimeUnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown time unit: {}", self.0)
    }
}

impl std::error::Error for ParseTimeUnitError {}

impl FromStr for TimeUnit {
    type Err = ParseTimeUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nanos" | "nanoseconds" | "ns" => Ok(TimeUnit::Nanos),
            "micros" | "microseconds" | "us" | "u" => Ok(TimeUnit::Micros),
            "millis" | "milliseconds" | "ms" => Ok(TimeUnit::Millis),
            "seconds" | "secs" | "s" => Ok(TimeUnit::Seconds),
            "minutes" | "mins" | "m" => Ok(TimeUnit::Minutes),
            "hours" | "h" => Ok(TimeUnit::Hours),
            _ => Err(ParseTimeUnitError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_coarsens_by_flooring() {
        assert_eq!(TimeUnit::Seconds.convert(1_999, TimeUnit::Millis), 1);
        assert_eq!(TimeUnit::Seconds.convert(-1_999, TimeUnit::Millis), -2);
        assert_eq!(TimeUnit::Seconds.convert(-1_000, TimeUnit::Millis), -1);
        assert_eq!(TimeUnit::Hours.convert(7_200_000, TimeUnit::Millis), 2);
    }

    #[test]
    fn test_convert_agrees_with_from_datetime_before_epoch() {
        for ms in [-1_999_i64, -1_001, -1, 0, 1, 1_999] {
            let instant = DateTime::from_timestamp_millis(ms).expect("valid instant");
            for unit in [TimeUnit::Seconds, TimeUnit::Minutes] {
                assert_eq!(
                    unit.convert(ms, TimeUnit::Millis),
                    unit.from_datetime(&instant).expect("in range"),
                    "{} ms in {}",
                    ms,
                    unit
                );
            }
        }
    }

    #[test]
    fn test_convert_refines_and_saturates() {
        assert_eq!(TimeUnit::Nanos.convert(1_500, TimeUnit::Millis), 1_500_000_000);
        assert_eq!(TimeUnit::Nanos.convert(i64::MAX, TimeUnit::Hours), i64::MAX);
        assert_eq!(TimeUnit::Nanos.convert(i64::MIN, TimeUnit::Hours), i64::MIN);
    }

    #[test]
    fn test_datetime_round_trip_in_each_unit() {
        let instant = DateTime::from_timestamp(1_700_000_000, 0).expect("valid instant");
        for unit in [
            TimeUnit::Nanos,
            TimeUnit::Micros,
            TimeUnit::Millis,
            TimeUnit::Seconds,
        ] {
            let epoch = unit.from_datetime(&instant).expect("in range");
            assert_eq!(unit.to_datetime(epoch), Some(instant), "unit {}", unit);
        }
    }

    #[test]
    fn test_from_datetime_floors_sub_unit_precision() {
        let instant = DateTime::from_timestamp(10, 999_999_999).expect("valid instant");
        assert_eq!(TimeUnit::Millis.from_datetime(&instant), Some(10_999));
        assert_eq!(TimeUnit::Seconds.from_datetime(&instant), Some(10));

        let before_epoch = DateTime::from_timestamp(-1, 500_000_000).expect("valid instant");
        assert_eq!(TimeUnit::Seconds.from_datetime(&before_epoch), Some(-1));
    }

    #[test]
    fn test_from_datetime_out_of_range_for_nanos() {
        let far = DateTime::from_timestamp(10_000_000_000, 0).expect("valid instant");
        assert_eq!(TimeUnit::Nanos.from_datetime(&far), None);
        assert!(TimeUnit::Millis.from_datetime(&far).is_some());
    }

    #[test]
    fn test_parse_names_and_abbreviations() {
        assert_eq!("ms".parse::<TimeUnit>(), Ok(TimeUnit::Millis));
        assert_eq!("NANOS".parse::<TimeUnit>(), Ok(TimeUnit::Nanos));
        assert_eq!("u".parse::<TimeUnit>(), Ok(TimeUnit::Micros));
        assert!("fortnights".parse::<TimeUnit>().is_err());
    }

    #[test]
    fn test_precision_identifiers() {
        assert_eq!(TimeUnit::Micros.precision(), "u");
        assert_eq!(TimeUnit::Millis.precision(), "ms");
        assert_eq!(TimeUnit::default(), TimeUnit::Millis);
    }
}
