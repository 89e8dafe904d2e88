use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteVisit {
    pub id: i64,
    pub visitor_ip: String,
    pub user_agent: String,
    pub page_path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVisit {
    pub visitor_ip: String,
    pub user_agent: String,
    pub page_path: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteStats {
    pub total_visits: u64,
    pub unique_visitors: u64,
    pub today_visits: u64,
    pub week_visits: u64,
    pub month_visits: u64,
}

/// Lower bounds of the reporting windows: start of today (UTC), and 7 and 30
/// days before that.
#[derive(Debug, Clone, Copy)]
pub struct StatsWindows {
    pub today: DateTime<Utc>,
    pub week: DateTime<Utc>,
    pub month: DateTime<Utc>,
}

impl StatsWindows {
    pub fn at(now: DateTime<Utc>) -> Self {
        let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        Self {
            today,
            week: today - Duration::days(7),
            month: today - Duration::days(30),
        }
    }
}

impl SiteStats {
    pub fn from_visits<'a>(visits: impl IntoIterator<Item = &'a SiteVisit>, now: DateTime<Utc>) -> Self {
        let w = StatsWindows::at(now);
        let mut stats = SiteStats::default();
        let mut ips = HashSet::new();
        for v in visits {
            stats.total_visits += 1;
            ips.insert(v.visitor_ip.as_str());
            if v.created_at >= w.today {
                stats.today_visits += 1;
            }
            if v.created_at >= w.week {
                stats.week_visits += 1;
            }
            if v.created_at >= w.month {
                stats.month_visits += 1;
            }
        }
        stats.unique_visitors = ips.len() as u64;
        stats
    }
}
