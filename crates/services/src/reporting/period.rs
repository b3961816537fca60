use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// Look-back window for dashboard charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Today,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Period {
    /// `[start, now]` for this period.
    pub fn window(self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = match self {
            Period::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc())
                .unwrap_or(now),
            Period::Week => now - Duration::days(7),
            Period::Month => months_back(now, 1),
            Period::Quarter => months_back(now, 3),
            Period::Year => months_back(now, 12),
        };
        (start, now)
    }
}

pub(crate) fn months_back(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(months)).unwrap_or(now)
}
