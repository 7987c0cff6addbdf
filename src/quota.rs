use chrono::{DateTime, Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::ValidationError;

/// Requests a non-premium user may make per accounting period.
pub const FREE_REQUEST_LIMIT: u32 = 10;

/// Per-user usage quota for description processing requests.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiLimit {
    pub user_id: i64,
    pub requests_count: u32,
    /// End of the current accounting period.
    pub reset_date: DateTime<Local>,
    #[serde(default)]
    pub is_premium: bool,
}

impl ApiLimit {
    /// A fresh, empty quota whose period ends at the start of next month.
    pub fn new(user_id: i64, now: DateTime<Local>) -> Self {
        ApiLimit {
            user_id,
            requests_count: 0,
            reset_date: start_of_next_month(now),
            is_premium: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id <= 0 {
            return Err(ValidationError::InvalidUser);
        }
        Ok(())
    }

    pub fn should_reset_at(&self, now: DateTime<Local>) -> bool {
        now > self.reset_date
    }

    /// Premium users are always allowed. Everyone else is allowed while under
    /// the limit, or once the period has expired.
    pub fn can_make_request_at(&self, now: DateTime<Local>) -> bool {
        self.is_premium
            || self.should_reset_at(now)
            || self.requests_count < FREE_REQUEST_LIMIT
    }

    pub fn can_make_request(&self) -> bool {
        self.can_make_request_at(Local::now())
    }

    /// Starts a new period: zero requests, ending at the start of next month.
    pub fn reset(&mut self, now: DateTime<Local>) {
        self.requests_count = 0;
        self.reset_date = start_of_next_month(now);
    }

    pub fn increment_requests(&mut self) {
        self.requests_count = self.requests_count.saturating_add(1);
    }

    /// Requests left in the current period; `None` means unlimited.
    pub fn remaining_requests_at(&self, now: DateTime<Local>) -> Option<u32> {
        if self.is_premium {
            return None;
        }
        if self.should_reset_at(now) {
            return Some(FREE_REQUEST_LIMIT);
        }
        Some(FREE_REQUEST_LIMIT.saturating_sub(self.requests_count))
    }
}

/// Midnight local time on the first day of the month after `now`.
fn start_of_next_month(now: DateTime<Local>) -> DateTime<Local> {
    let (year, month) = match now.month() {
        12 => (now.year() + 1, 1),
        m => (now.year(), m + 1),
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .unwrap_or(now)
}
