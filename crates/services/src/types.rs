use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type};

/// Errors produced when building or parsing a [`MonthDate`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonthDateError {
    #[error("invalid month-date '{0}', expected MM-YYYY")]
    Format(String),
    #[error("month {0} is out of range 1-12")]
    MonthOutOfRange(u32),
    #[error("year {0} is out of range 0-9999")]
    YearOutOfRange(i32),
}

/// A calendar month without day or time, written as `MM-YYYY` (e.g. `07-2025`).
///
/// Ordering is chronological. In PostgreSQL it is stored as a `DATE` holding the
/// first day of the month; reading a `DATE` keeps only its year and month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthDate {
    year: i32,
    month: u32,
}

impl MonthDate {
    /// Textual layout accepted by [`FromStr`] and produced by [`fmt::Display`]
    pub const FORMAT: &'static str = "MM-YYYY";

    pub fn new(year: i32, month: u32) -> Result<Self, MonthDateError> {
        if !(1..=12).contains(&month) {
            return Err(MonthDateError::MonthOutOfRange(month));
        }
        if !(0..=9999).contains(&year) {
            return Err(MonthDateError::YearOutOfRange(year));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("month is validated and day 1 exists in every month")
    }
}

impl From<NaiveDate> for MonthDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month, self.year)
    }
}

impl FromStr for MonthDate {
    type Err = MonthDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 7
            && bytes[2] == b'-'
            && bytes[..2]
                .iter()
                .chain(&bytes[3..])
                .all(u8::is_ascii_digit);
        if !well_formed {
            return Err(MonthDateError::Format(s.to_string()));
        }

        let month: u32 = s[..2]
            .parse()
            .map_err(|_| MonthDateError::Format(s.to_string()))?;
        let year: i32 = s[3..]
            .parse()
            .map_err(|_| MonthDateError::Format(s.to_string()))?;

        Self::new(year, month)
    }
}

impl Serialize for MonthDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Cow::<'de, str>::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// Support for tokio-postgres
impl<'a> FromSql<'a> for MonthDate {
    fn from_sql(
        ty: &Type,
        raw: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        let date = NaiveDate::from_sql(ty, raw)?;
        Ok(Self::from(date))
    }

    fn accepts(ty: &Type) -> bool {
        <NaiveDate as FromSql>::accepts(ty)
    }
}

impl ToSql for MonthDate {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        self.first_day().to_sql(ty, out)
    }

    fn accepts(ty: &Type) -> bool {
        <NaiveDate as ToSql>::accepts(ty)
    }

    tokio_postgres::types::to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_month() {
        let date = MonthDate::new(2025, 7).unwrap();
        assert_eq!(date.to_string(), "07-2025");
    }

    #[test]
    fn test_parse_valid() {
        let date: MonthDate = "07-2025".parse().unwrap();
        assert_eq!(date.month(), 7);
        assert_eq!(date.year(), 2025);

        let december: MonthDate = "12-1999".parse().unwrap();
        assert_eq!(december.month(), 12);
    }

    #[test]
    fn test_parse_rejects_out_of_range_month() {
        assert_eq!(
            "13-2025".parse::<MonthDate>(),
            Err(MonthDateError::MonthOutOfRange(13))
        );
        assert_eq!(
            "00-2025".parse::<MonthDate>(),
            Err(MonthDateError::MonthOutOfRange(0))
        );
    }

    #[test]
    fn test_parse_rejects_bad_layout() {
        for input in [
            "7-2025",
            "07/2025",
            "2025-07",
            "07-25",
            "07-2025 ",
            "+7-2025",
            "",
            "2025-07-01T00:00:00Z",
        ] {
            assert!(
                matches!(input.parse::<MonthDate>(), Err(MonthDateError::Format(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_ordering_is_chronological() {
        let dec_2024 = MonthDate::new(2024, 12).unwrap();
        let jan_2025 = MonthDate::new(2025, 1).unwrap();
        let feb_2025 = MonthDate::new(2025, 2).unwrap();
        assert!(dec_2024 < jan_2025);
        assert!(jan_2025 < feb_2025);
    }

    #[test]
    fn test_naive_date_truncates_to_month() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
        let month = MonthDate::from(date);
        assert_eq!(month, MonthDate::new(2025, 3).unwrap());
        assert_eq!(
            month.first_day(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_json_token() {
        let date = MonthDate::new(2025, 7).unwrap();
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"07-2025\"");

        let parsed: MonthDate = serde_json::from_str("\"07-2025\"").unwrap();
        assert_eq!(parsed, date);

        assert!(serde_json::from_str::<MonthDate>("\"13-2025\"").is_err());
        assert!(serde_json::from_str::<MonthDate>("202507").is_err());
    }

    #[test]
    fn test_json_null_is_unset() {
        let unset: Option<MonthDate> = serde_json::from_str("null").unwrap();
        assert!(unset.is_none());
        assert_eq!(serde_json::to_string(&None::<MonthDate>).unwrap(), "null");
    }
}
