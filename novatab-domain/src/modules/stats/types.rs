use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Sessions older than this are dropped whenever the statistics are written.
pub const SESSION_RETENTION_DAYS: i64 = 30;

/// One finished browsing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSession {
    pub date: DateTime<Utc>,
    /// Active seconds.
    pub duration: u64,
    pub tabs_opened: u32,
}

/// Usage statistics as persisted under `statsData`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsData {
    /// Lifetime active seconds.
    #[serde(rename = "totalTime")]
    pub total_time_secs: u64,
    /// Active seconds on `last_active_date`.
    #[serde(rename = "timeToday")]
    pub time_today_secs: u64,
    pub tabs_today: u32,
    pub tabs_total: u64,
    /// Local `YYYY-MM-DD` of the last recorded activity; empty before any.
    pub last_active_date: String,
    pub trackers_blocked: u64,
    pub sessions: Vec<UsageSession>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl StatsData {
    /// Resets the daily counters when `today` differs from the stored date.
    /// Returns whether a new day started.
    pub fn roll_day(&mut self, today: &str) -> bool {
        if self.last_active_date == today {
            return false;
        }
        self.last_active_date = today.to_string();
        self.tabs_today = 0;
        self.time_today_secs = 0;
        true
    }

    pub fn record_tab(&mut self, today: &str) {
        self.roll_day(today);
        self.tabs_today = self.tabs_today.saturating_add(1);
        self.tabs_total = self.tabs_total.saturating_add(1);
    }

    pub fn add_active_time(&mut self, secs: u64, today: &str) {
        self.roll_day(today);
        self.total_time_secs = self.total_time_secs.saturating_add(secs);
        self.time_today_secs = self.time_today_secs.saturating_add(secs);
    }

    /// Appends `session` and prunes the log relative to `now`.
    pub fn append_session(&mut self, session: UsageSession, now: DateTime<Utc>) {
        self.sessions.push(session);
        self.prune_sessions(now);
    }

    pub fn prune_sessions(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::days(SESSION_RETENTION_DAYS);
        self.sessions.retain(|session| session.date >= cutoff);
    }

    /// Tabs opened on `today`, zero if the stored counters belong to another day.
    pub fn tabs_on(&self, today: &str) -> u32 {
        if self.last_active_date == today {
            self.tabs_today
        } else {
            0
        }
    }

    pub fn time_on(&self, today: &str) -> u64 {
        if self.last_active_date == today {
            self.time_today_secs
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn session(date: DateTime<Utc>, duration: u64) -> UsageSession {
        UsageSession { date, duration, tabs_opened: 1 }
    }

    #[test]
    fn test_daily_tab_counter_resets_on_new_day() {
        let mut stats = StatsData { tabs_today: 7, tabs_total: 40, last_active_date: "2026-03-01".into(), ..Default::default() };

        stats.record_tab("2026-03-01");
        assert_eq!((stats.tabs_today, stats.tabs_total), (8, 41));

        stats.record_tab("2026-03-02");
        assert_eq!((stats.tabs_today, stats.tabs_total), (1, 42));
        assert_eq!(stats.last_active_date, "2026-03-02");
    }

    #[test]
    fn test_active_time_rolls_with_the_day() {
        let mut stats = StatsData::default();
        stats.add_active_time(90, "2026-03-01");
        stats.add_active_time(30, "2026-03-01");
        assert_eq!((stats.total_time_secs, stats.time_today_secs), (120, 120));

        stats.add_active_time(10, "2026-03-02");
        assert_eq!((stats.total_time_secs, stats.time_today_secs), (130, 10));
        assert_eq!(stats.time_on("2026-03-03"), 0);
    }

    #[test]
    fn test_append_prunes_sessions_older_than_thirty_days() {
        let now = Utc.with_ymd_and_hms(2026, 4, 30, 12, 0, 0).unwrap();
        let mut stats = StatsData {
            sessions: vec![
                session(now - Duration::days(45), 100),
                session(now - Duration::days(31), 200),
                session(now - Duration::days(30), 300),
                session(now - Duration::days(2), 400),
            ],
            ..Default::default()
        };

        stats.append_session(session(now, 500), now);

        let kept: Vec<u64> = stats.sessions.iter().map(|s| s.duration).collect();
        assert_eq!(kept, vec![300, 400, 500]);
    }

    #[test]
    fn test_serialized_shape_keeps_unknown_fields() {
        let stored = json!({
            "totalTime": 3600,
            "tabsToday": 2,
            "tabsTotal": 10,
            "lastActiveDate": "2026-03-01",
            "sessions": [{ "date": "2026-03-01T08:00:00Z", "duration": 60, "tabsOpened": 2 }],
            "streak": 4
        });
        let stats: StatsData = serde_json::from_value(stored).unwrap();
        assert_eq!(stats.total_time_secs, 3600);
        assert_eq!(stats.sessions[0].tabs_opened, 2);

        let written = serde_json::to_value(&stats).unwrap();
        assert_eq!(written["streak"], json!(4));
        assert_eq!(written["timeToday"], json!(0));
    }
}
