//! Local calendar day used for daily quotas.

use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{AppError, AppResult, config::LimitsConfig};

/// The timezone whose midnight resets daily quotas.
#[derive(Debug, Clone, Copy)]
pub struct LocalDay {
    tz: Tz,
}

impl LocalDay {
    /// Create from an IANA timezone name.
    pub fn new(timezone: &str) -> AppResult<Self> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid timezone: {timezone}")))?;
        Ok(Self { tz })
    }

    /// Create from the limits section of the configuration.
    pub fn from_config(limits: &LimitsConfig) -> AppResult<Self> {
        Self::new(&limits.timezone)
    }

    /// The configured timezone.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.tz
    }

    /// Start of the current local day.
    #[must_use]
    pub fn start_of_today(&self) -> DateTime<FixedOffset> {
        self.start_of_day(Utc::now())
    }

    /// Start of the local day containing `instant`.
    #[must_use]
    pub fn start_of_day(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        let local = instant.with_timezone(&self.tz);
        let midnight = local.date_naive().and_time(NaiveTime::MIN);

        // A DST gap can swallow midnight; fall back to the instant's own offset.
        self.tz.from_local_datetime(&midnight).earliest().map_or_else(
            || {
                let offset = *local.fixed_offset().offset();
                offset
                    .from_local_datetime(&midnight)
                    .earliest()
                    .unwrap_or_else(|| instant.fixed_offset())
            },
            |start| start.fixed_offset(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tokyo_midnight() {
        let day = LocalDay::new("Asia/Tokyo").unwrap();
        // 2024-05-01 16:30 UTC is 2024-05-02 01:30 JST.
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 16, 30, 0).unwrap();
        let start = day.start_of_day(instant);

        assert_eq!(start.to_rfc3339(), "2024-05-02T00:00:00+09:00");
        assert_eq!(
            start.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_before_local_midnight_stays_on_previous_day() {
        let day = LocalDay::new("Asia/Tokyo").unwrap();
        // 2024-05-01 14:59 UTC is 23:59 JST on the same date.
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 14, 59, 0).unwrap();

        assert_eq!(
            day.start_of_day(instant).to_rfc3339(),
            "2024-05-01T00:00:00+09:00"
        );
    }

    #[test]
    fn test_invalid_timezone() {
        assert!(matches!(
            LocalDay::new("Mars/Olympus"),
            Err(AppError::Config(_))
        ));
    }
}
