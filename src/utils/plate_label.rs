//! Plate labels
//!
//! A plate label is a date token optionally followed by one letter that
//! distinguishes plates run on the same day (`20230514`, `20230514b`,
//! `2023-05-14a`). Plates sharing a date token form one physical batch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlateLabel(String);

impl PlateLabel {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Label with the same-day suffix letter stripped
    ///
    /// A trailing ASCII letter is only a suffix when preceded by a digit, so
    /// labels without a date token (`plateA`) are their own batch.
    pub fn batch_key(&self) -> &str {
        let bytes = self.0.as_bytes();
        match bytes {
            [.., prev, last] if last.is_ascii_alphabetic() && prev.is_ascii_digit() => {
                &self.0[..self.0.len() - 1]
            }
            _ => &self.0,
        }
    }

    /// Parse the batch's date token with the first matching format
    pub fn sample_date(&self, formats: &[String]) -> Option<NaiveDate> {
        let token = self.batch_key();
        formats
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
    }
}

impl fmt::Display for PlateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formats() -> Vec<String> {
        vec!["%Y%m%d".to_string(), "%Y-%m-%d".to_string(), "%d.%m.%Y".to_string()]
    }

    #[test]
    fn test_batch_key_strips_suffix_letter() {
        assert_eq!(PlateLabel::new("20230514b").batch_key(), "20230514");
        assert_eq!(PlateLabel::new("2023-05-14a").batch_key(), "2023-05-14");
        assert_eq!(PlateLabel::new("20230514").batch_key(), "20230514");
        assert_eq!(PlateLabel::new(" 20230514c ").batch_key(), "20230514");
    }

    #[test]
    fn test_batch_key_keeps_non_date_labels() {
        assert_eq!(PlateLabel::new("plateA").batch_key(), "plateA");
        assert_eq!(PlateLabel::new("b").batch_key(), "b");
        assert_eq!(PlateLabel::new("").batch_key(), "");
    }

    #[test]
    fn test_sample_date() {
        let expected = NaiveDate::from_ymd_opt(2023, 5, 14);
        assert_eq!(PlateLabel::new("20230514b").sample_date(&formats()), expected);
        assert_eq!(PlateLabel::new("2023-05-14").sample_date(&formats()), expected);
        assert_eq!(PlateLabel::new("14.05.2023a").sample_date(&formats()), expected);
        assert_eq!(PlateLabel::new("plateA").sample_date(&formats()), None);
    }
}
