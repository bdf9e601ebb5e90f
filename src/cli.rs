use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::{error::Error, error::Result, record::Record};

pub const DEFAULT_CACHE_PATH: &str = "~/.ssh/config_cache";

/// Simplified ssh login: finds, fills in and caches the hosts you connect to.
///
/// Needs `sshpass` and `ssh-keygen` in PATH.
#[derive(Debug, Parser)]
#[command(name = "ssp", version, about, long_about)]
pub struct Cli {
    /// List cached hosts
    #[arg(short, long)]
    pub list: bool,

    /// Print the listing as JSON (passwords are left out)
    #[arg(long, requires = "list")]
    pub json: bool,

    /// Cached host alias to connect to (e.g. `ssp --host node1`)
    #[arg(long, value_name = "ALIAS")]
    pub host: Option<String>,

    /// Hostname to connect to (e.g. `ssp --hostname 127.0.0.1`)
    #[arg(long)]
    pub hostname: Option<String>,

    /// Cache file
    #[arg(long, env = "SSP_CACHE", default_value = DEFAULT_CACHE_PATH)]
    pub cache: String,

    /// Raise log verbosity, repeat for more
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Alias or hostname, `user@hostname`, or an index into `--list`
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List { json: bool },
    /// Choose a cached host interactively.
    Pick,
    Login(Record),
    Index(usize),
}

impl Cli {
    pub fn action(&self) -> Result<Action> {
        if self.list {
            return Ok(Action::List { json: self.json });
        }
        if let Some(alias) = &self.host {
            return Ok(Action::Login(Record {
                alias: alias.clone(),
                ..Default::default()
            }));
        }
        if let Some(hostname) = &self.hostname {
            return Ok(Action::Login(Record::for_hostname(hostname.clone(), None)));
        }

        let Some(target) = self.target.as_deref() else {
            return Ok(Action::Pick);
        };

        if target.contains('@') {
            let parts: Vec<&str> = target.split('@').collect();
            let [user, hostname] = parts[..] else {
                return Err(Error::InvalidTarget(target.to_string()));
            };
            return Ok(Action::Login(Record::for_hostname(
                hostname.trim(),
                Some(user.trim().to_string()),
            )));
        }

        if let Ok(index) = target.parse::<usize>() {
            return Ok(Action::Index(index));
        }

        Ok(Action::Login(Record {
            alias: target.to_string(),
            hostname: target.to_string(),
            ..Default::default()
        }))
    }

    pub fn cache_path(&self) -> PathBuf {
        expand_home(&self.cache)
    }

    /// Default `tracing` filter for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Replaces a leading `~` with the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}
