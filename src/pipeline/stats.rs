use std::collections::HashSet;

use serde::Serialize;
use time::{macros::format_description, Date, Duration, OffsetDateTime, UtcOffset};

use crate::listings::repo_types::{Listing, ListingStatus};
use crate::users::repo_types::{Role, User};

/// Number of calendar days covered by the activity histogram, today included.
pub const HISTORY_DAYS: i64 = 7;

/// The calendar used to bucket timestamps into days. Passed in explicitly so
/// reports do not depend on the host timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalCalendar {
    pub offset: UtcOffset,
    pub today: Date,
}

impl LocalCalendar {
    pub fn now(offset: UtcOffset) -> Self {
        Self {
            offset,
            today: OffsetDateTime::now_utc().to_offset(offset).date(),
        }
    }

    pub fn date_of(&self, at: OffsetDateTime) -> Date {
        at.to_offset(self.offset).date()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    /// `YYYY-MM-DD`
    pub date: String,
    pub count: usize,
}

pub fn format_day(d: Date) -> String {
    d.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

/// Counts timestamps per day over the last [`HISTORY_DAYS`] days, oldest
/// first. Days without records are present with a zero count; timestamps
/// outside the window are ignored.
pub fn daily_histogram<I>(stamps: I, calendar: &LocalCalendar) -> Vec<DayCount>
where
    I: IntoIterator<Item = OffsetDateTime>,
{
    let days: Vec<Date> = (0..HISTORY_DAYS)
        .rev()
        .filter_map(|back| calendar.today.checked_sub(Duration::days(back)))
        .collect();
    let mut counts = vec![0usize; days.len()];

    for at in stamps {
        let day = calendar.date_of(at);
        if let Some(slot) = days.iter().position(|d| *d == day) {
            counts[slot] += 1;
        }
    }

    days.into_iter()
        .zip(counts)
        .map(|(d, count)| DayCount {
            date: format_day(d),
            count,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn of<'a>(listings: impl IntoIterator<Item = &'a Listing>) -> Self {
        let mut counts = Self::default();
        for l in listings {
            match l.status {
                ListingStatus::Pending => counts.pending += 1,
                ListingStatus::Approved => counts.approved += 1,
                ListingStatus::Rejected => counts.rejected += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingStats {
    pub total: usize,
    #[serde(flatten)]
    pub by_status: StatusCounts,
    /// Number of distinct categories.
    pub categories: usize,
    pub by_day: Vec<DayCount>,
}

impl ListingStats {
    pub fn compute(listings: &[Listing], calendar: &LocalCalendar) -> Self {
        let categories: HashSet<&str> = listings.iter().map(|l| l.category.as_str()).collect();
        Self {
            total: listings.len(),
            by_status: StatusCounts::of(listings),
            categories: categories.len(),
            by_day: daily_histogram(listings.iter().map(|l| l.created_at), calendar),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: usize,
    pub clients: usize,
    pub craftsmen: usize,
    pub admins: usize,
    pub by_day: Vec<DayCount>,
}

impl UserStats {
    pub fn compute(users: &[User], calendar: &LocalCalendar) -> Self {
        let count = |role: Role| users.iter().filter(|u| u.role == role).count();
        Self {
            total: users.len(),
            clients: count(Role::Client),
            craftsmen: count(Role::Craftsman),
            admins: count(Role::Admin),
            by_day: daily_histogram(users.iter().map(|u| u.created_at), calendar),
        }
    }
}
