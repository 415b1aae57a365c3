use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::LazyLock;
use utoipa::ToSchema;

static QUARTER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-Q[1-4]$").ok());

/// Review cycle bucket such as `2024-Q3`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "2024-Q3")]
pub struct Quarter(String);

impl Quarter {
    pub fn of(at: DateTime<Utc>) -> Self {
        let q = (at.month() - 1) / 3 + 1;
        Quarter(format!("{}-Q{}", at.year(), q))
    }

    pub fn current() -> Self {
        Self::of(Utc::now())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Quarter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if QUARTER_PATTERN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(trimmed))
        {
            Ok(Quarter(trimmed.to_string()))
        } else {
            Err(format!("Invalid quarter '{}', expected YYYY-Qn", s))
        }
    }
}

impl TryFrom<String> for Quarter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Quarter> for String {
    fn from(q: Quarter) -> Self {
        q.0
    }
}

impl Display for Quarter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_quarter() {
        assert_eq!("2024-Q3".parse::<Quarter>().unwrap().as_str(), "2024-Q3");
        assert!("2024-Q5".parse::<Quarter>().is_err());
        assert!("2024Q3".parse::<Quarter>().is_err());
        assert!("24-Q1".parse::<Quarter>().is_err());
    }

    #[test]
    fn test_parse_quarter_rejects_non_ascii_digits() {
        assert!("\u{0662}\u{0660}\u{0662}\u{0664}-Q3".parse::<Quarter>().is_err());
        assert!("２０２４-Q1".parse::<Quarter>().is_err());
    }

    #[test]
    fn test_quarter_of_date() {
        let jan = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let sep = Utc.with_ymd_and_hms(2024, 9, 30, 23, 59, 59).unwrap();
        let oct = Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap();
        assert_eq!(Quarter::of(jan).as_str(), "2024-Q1");
        assert_eq!(Quarter::of(sep).as_str(), "2024-Q3");
        assert_eq!(Quarter::of(oct).as_str(), "2024-Q4");
    }

    #[test]
    fn test_quarters_order_chronologically() {
        let a: Quarter = "2023-Q4".parse().unwrap();
        let b: Quarter = "2024-Q1".parse().unwrap();
        assert!(a < b);
    }
}
