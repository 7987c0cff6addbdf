use chrono::{DateTime, Local, NaiveDate, TimeZone};
use thiserror::Error;

/// Accepted deadline layouts, tried in this order. The first layout that
/// parses wins, so `01/02/2003` resolves as 1 February 2003.
pub const DATE_FORMATS: [DateFormat; 6] = [
    DateFormat { label: "YYYY-MM-DD", pattern: "%Y-%m-%d" },
    DateFormat { label: "DD.MM.YYYY", pattern: "%d.%m.%Y" },
    DateFormat { label: "DD/MM/YYYY", pattern: "%d/%m/%Y" },
    DateFormat { label: "YYYY/MM/DD", pattern: "%Y/%m/%d" },
    DateFormat { label: "DD-MM-YYYY", pattern: "%d-%m-%Y" },
    DateFormat { label: "MM/DD/YYYY", pattern: "%m/%d/%Y" },
];

/// A single supported date layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFormat {
    /// Human readable layout, also used as the shape template.
    pub label: &'static str,
    /// `chrono` format string equivalent to `label`.
    pub pattern: &'static str,
}

impl DateFormat {
    /// Checks the exact shape of `input` against the label: every `Y`, `M`
    /// and `D` must be an ASCII digit and every other character must match
    /// literally. Keeps chrono from accepting short or overlong fields.
    fn matches_shape(&self, input: &str) -> bool {
        input.len() == self.label.len()
            && input.bytes().zip(self.label.bytes()).all(|(c, l)| match l {
                b'Y' | b'M' | b'D' => c.is_ascii_digit(),
                other => c == other,
            })
    }

    fn parse(&self, input: &str) -> Option<NaiveDate> {
        if !self.matches_shape(input) {
            return None;
        }
        NaiveDate::parse_from_str(input, self.pattern).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("empty date string")]
    InvalidInput,

    #[error("invalid date format, supported formats: {}", .supported.join(", "))]
    InvalidFormat { supported: Vec<&'static str> },
}

/// Labels of every supported layout, in priority order.
pub fn supported_formats() -> Vec<&'static str> {
    DATE_FORMATS.iter().map(|f| f.label).collect()
}

/// Parses a deadline token into the last second (23:59:59) of that day in
/// local time.
pub fn parse_date(text: &str) -> Result<DateTime<Local>, DateError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DateError::InvalidInput);
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| format.parse(text))
        .and_then(end_of_day)
        .ok_or_else(|| DateError::InvalidFormat {
            supported: supported_formats(),
        })
}

/// 23:59:59 local time on `date`. Returns `None` only if that wall-clock
/// time does not exist in the local zone.
pub fn end_of_day(date: NaiveDate) -> Option<DateTime<Local>> {
    let naive = date.and_hms_opt(23, 59, 59)?;
    Local.from_local_datetime(&naive).earliest()
}
