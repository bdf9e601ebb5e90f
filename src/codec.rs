//! Reader and writer for the `config_cache` file.
//!
//! The format is a subset of ssh_config. Usage data and passwords are written as
//! comments so the file stays usable with `ssh -F`, but they are still read back.

use tracing::{debug, trace};

use crate::record::{Record, DEFAULT_PORT, NEVER_USED};

/// Commented keys that still carry data.
const COMMENTED_KEYS: [&str; 3] = ["Password", "LoginTimes", "LastLoginTime"];

pub fn decode(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current: Option<Record> = None;

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (commented, body) = match line.strip_prefix('#') {
            Some(rest) => (true, rest.trim()),
            None => (false, line),
        };

        if commented && !COMMENTED_KEYS.iter().any(|k| starts_with_key(body, k)) {
            continue;
        }

        if body.eq_ignore_ascii_case("Host") {
            // a Host line without alias; its fields are dropped with it
            debug!(line = number + 1, "skipping host block without alias");
            records.extend(current.take());
            continue;
        }

        let Some((key, value)) = body.split_once(char::is_whitespace) else {
            trace!(line = number + 1, "skipping malformed line");
            continue;
        };
        let value = value.trim();

        if key.eq_ignore_ascii_case("Host") {
            records.extend(current.take());
            current = Some(Record::new(value));
            continue;
        }

        let Some(record) = current.as_mut() else {
            trace!(line = number + 1, key, "field outside of a host block");
            continue;
        };

        match key.to_ascii_lowercase().as_str() {
            "hostname" => record.hostname = value.to_string(),
            "user" => record.user = value.to_string(),
            "port" => record.port = value.to_string(),
            "password" => record.secret = value.to_string(),
            "lastlogintime" => record.last_used_at = Some(value.to_string()),
            "logintimes" => {
                record.use_count = value.parse().unwrap_or_else(|_| {
                    debug!(alias = %record.alias, value, "unparsable login count, using 0");
                    0
                })
            }
            _ => trace!(line = number + 1, key, "ignoring unknown key"),
        }
    }

    records.extend(current);
    records
}

pub fn encode(records: &[Record]) -> String {
    let mut out = String::new();
    for record in records {
        let port = match record.port.as_str() {
            "" => DEFAULT_PORT,
            port => port,
        };
        let last_used = match record.last_used_at.as_deref() {
            None | Some("") => NEVER_USED,
            Some(value) => value,
        };

        out.push_str(&format!(
            "Host {}\n  HostName {}\n  User {}\n  Port {}\n  #Password {}\n  #LoginTimes {}\n  #LastLoginTime {}\n",
            record.alias,
            record.hostname,
            record.user,
            port,
            record.secret,
            record.use_count,
            last_used,
        ));
    }
    out
}

fn starts_with_key(body: &str, key: &str) -> bool {
    let token = body.split(char::is_whitespace).next().unwrap_or_default();
    token.eq_ignore_ascii_case(key)
}
