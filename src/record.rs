use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use serde::Serialize;

/// Layout of `LastLoginTime` in the cache file.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Written for hosts that were never used. Older than any real login.
pub const NEVER_USED: &str = "1977-01-01T15:04:05";

/// [`NEVER_USED`] as a timestamp.
pub static NEVER_USED_AT: Lazy<NaiveDateTime> = Lazy::new(|| {
    NaiveDate::from_ymd_opt(1977, 1, 1)
        .and_then(|date| date.and_hms_opt(15, 4, 5))
        .unwrap_or(NaiveDateTime::MIN)
});

pub const DEFAULT_PORT: &str = "22";

/// One cached ssh destination.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    pub alias: String,
    pub hostname: String,
    pub user: String,
    pub port: String,
    #[serde(skip_serializing)]
    pub secret: String,
    pub use_count: u64,
    pub last_used_at: Option<String>,
}

impl Record {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            port: DEFAULT_PORT.to_string(),
            ..Default::default()
        }
    }

    /// Query record carrying only a hostname, optionally with a user.
    pub fn for_hostname(hostname: impl Into<String>, user: Option<String>) -> Self {
        Self {
            hostname: hostname.into(),
            user: user.unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Copy of this record with the values the cache file writes for empty fields.
    pub fn with_defaults(&self) -> Self {
        let mut record = self.clone();
        if record.port.is_empty() {
            record.port = DEFAULT_PORT.to_string();
        }
        if record.last_used_at.as_deref().map_or(true, str::is_empty) {
            record.last_used_at = Some(NEVER_USED.to_string());
        }
        record
    }

    /// Overwrites every field with the values from `other`.
    pub fn merge(&mut self, other: &Record) {
        self.clone_from(other);
    }

    pub fn mark_used(&mut self, at: NaiveDateTime) {
        self.use_count = self.use_count.saturating_add(1);
        self.last_used_at = Some(at.format(TIME_FORMAT).to_string());
    }

    /// `None` when the host was never used, `Some(Err)` when the stored value is garbage.
    pub fn last_used(&self) -> Option<Result<NaiveDateTime, chrono::ParseError>> {
        self.last_used_at
            .as_deref()
            .filter(|value| !value.is_empty())
            .map(|value| NaiveDateTime::parse_from_str(value, TIME_FORMAT))
    }

    pub fn port_or_default(&self) -> &str {
        if self.port.is_empty() {
            DEFAULT_PORT
        } else {
            &self.port
        }
    }

    /// `user@hostname` as passed to ssh.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.hostname)
    }

    /// Key used by `ssh-keygen -R`; non-standard ports are bracketed.
    pub fn known_hosts_entry(&self) -> String {
        match self.port_or_default() {
            DEFAULT_PORT => self.hostname.clone(),
            port => format!("[{}]:{}", self.hostname, port),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn mark_used_bumps_count_and_time() {
        let mut record = Record::new("node1");
        record.use_count = 4;
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(8, 5, 1)
            .unwrap();

        record.mark_used(at);

        assert_eq!(record.use_count, 5);
        assert_eq!(record.last_used_at.as_deref(), Some("2024-03-09T08:05:01"));
        assert_eq!(record.last_used().unwrap().unwrap(), at);
    }

    #[test]
    fn with_defaults_fills_port_and_sentinel() {
        let record = Record {
            alias: "a".into(),
            ..Default::default()
        }
        .with_defaults();

        assert_eq!(record.port, "22");
        assert_eq!(record.last_used_at.as_deref(), Some(NEVER_USED));
        assert_eq!(record.use_count, 0);
    }

    #[test]
    fn sentinel_timestamp_matches_written_value() {
        assert_eq!(NEVER_USED_AT.format(TIME_FORMAT).to_string(), NEVER_USED);
    }

    #[test]
    fn last_used_reports_garbage() {
        let mut record = Record::new("a");
        assert!(record.last_used().is_none());
        record.last_used_at = Some("yesterday".into());
        assert!(record.last_used().unwrap().is_err());
    }

    #[rstest]
    #[case("22", "10.0.0.1")]
    #[case("", "10.0.0.1")]
    #[case("2222", "[10.0.0.1]:2222")]
    fn known_hosts_entry(#[case] port: &str, #[case] expected: &str) {
        let record = Record {
            hostname: "10.0.0.1".into(),
            port: port.into(),
            ..Default::default()
        };
        assert_eq!(record.known_hosts_entry(), expected);
    }
}
