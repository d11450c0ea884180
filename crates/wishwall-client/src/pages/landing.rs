use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

use crate::router::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    pub fn is_over(&self) -> bool {
        *self == Countdown::default()
    }
}

/// Time left until `target`, all zero once it has passed.
pub fn countdown<Tz: TimeZone>(now: &DateTime<Tz>, target: &DateTime<Tz>) -> Countdown {
    let secs = target.clone().signed_duration_since(now.clone()).num_seconds();
    if secs <= 0 {
        return Countdown::default();
    }
    Countdown {
        days: secs / 86_400,
        hours: (secs / 3_600) % 24,
        minutes: (secs / 60) % 60,
        seconds: secs % 60,
    }
}

/// Midnight on the coming 1 January, in `now`'s zone.
pub fn next_new_year<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let midnight = NaiveDate::from_ymd_opt(now.year() + 1, 1, 1)?.and_hms_opt(0, 0, 0)?;
    now.timezone().from_local_datetime(&midnight).earliest()
}

/// The front page: a countdown to the new year and the two ways in.
#[derive(Debug, Clone, Default)]
pub struct LandingPage;

impl LandingPage {
    pub fn new() -> Self {
        Self
    }

    /// Ticks once a second while the page is shown.
    pub fn countdown_at(&self, now: DateTime<Utc>) -> Countdown {
        next_new_year(&now)
            .map(|target| countdown(&now, &target))
            .unwrap_or_default()
    }

    pub fn create_wall(&self) -> Route {
        Route::SignUp
    }

    pub fn sign_in(&self) -> Route {
        Route::SignIn
    }
}
