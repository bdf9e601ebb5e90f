use ssh2_config::{ParseRule, SshConfig};
use tracing::debug;
use whoami::username;

use crate::record::Record;

/// A concrete host from `~/.ssh/config`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SshConfigItem {
    pub host: String,
    pub user: String,
    pub hostname: String,
    pub port: Option<u16>,
}

/// Hosts from the default ssh_config. A missing or broken file yields nothing.
pub fn retrieve_ssh_configs() -> Vec<SshConfigItem> {
    match SshConfig::parse_default_file(ParseRule::ALLOW_UNKNOWN_FIELDS) {
        Ok(config) => items(&config),
        Err(err) => {
            debug!(%err, "ssh_config not usable");
            Vec::new()
        }
    }
}

fn items(config: &SshConfig) -> Vec<SshConfigItem> {
    let mut datas = Vec::new();
    for host in config.get_hosts() {
        // if hostname is not set, we can't connect to it
        let Some(hostname) = host.params.host_name.clone() else {
            continue;
        };
        // if user is not set, ssh uses the current user
        let user = host.params.user.clone().unwrap_or_else(username);

        for clause in host.pattern.iter() {
            if clause.negated || clause.pattern.contains(['*', '?']) {
                continue;
            }
            datas.push(SshConfigItem {
                host: clause.pattern.clone(),
                user: user.clone(),
                hostname: hostname.clone(),
                port: host.params.port,
            });
        }
    }
    datas
}

/// Fills empty connection fields of `record` from a matching ssh_config host.
pub fn fill_from(record: &mut Record, items: &[SshConfigItem]) -> bool {
    let found = items
        .iter()
        .find(|item| !record.alias.is_empty() && item.host == record.alias)
        .or_else(|| {
            items
                .iter()
                .find(|item| !record.hostname.is_empty() && item.hostname == record.hostname)
        });
    let Some(item) = found else {
        return false;
    };

    debug!(host = %item.host, "found host in ssh_config");
    if record.alias.is_empty() {
        record.alias = item.host.clone();
    }
    if record.hostname.is_empty() || record.hostname == record.alias {
        record.hostname = item.hostname.clone();
    }
    if record.user.is_empty() {
        record.user = item.user.clone();
    }
    if record.port.is_empty() {
        if let Some(port) = item.port {
            record.port = port.to_string();
        }
    }
    true
}
