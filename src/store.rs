use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{codec, error::Error, error::Result, ranker, record::Record};

/// Number of hosts shown by listings.
pub const LIST_LIMIT: usize = 21;

/// The ranked set of cached hosts backed by one cache file.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    records: Vec<Record>,
}

impl Store {
    /// Reads the cache at `path`, creating an empty file on first run.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = PathBuf::from(path.as_ref());
        let records = match fs::read_to_string(&path) {
            Ok(text) => codec::decode(&text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "cache file not found, creating it");
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
                }
                File::create(&path).map_err(|e| Error::io(&path, e))?;
                Vec::new()
            }
            Err(err) => return Err(Error::io(path, err)),
        };

        let mut store = Self {
            path,
            records: Vec::with_capacity(records.len()),
        };
        for record in records {
            // first block wins, lookups would never reach a later one
            if store.find_by_alias(&record.alias).is_some() {
                debug!(alias = %record.alias, hostname = %record.hostname, "dropping duplicate host block");
                continue;
            }
            store.records.push(record);
        }
        store.sort();
        debug!(hosts = store.records.len(), "loaded cache");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All hosts, most relevant first.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The head of [`Store::records`] meant for display.
    pub fn list(&self) -> &[Record] {
        &self.records[..self.records.len().min(LIST_LIMIT)]
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn find_by_alias(&self, alias: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.alias == alias)
    }

    pub fn find_by_hostname(&self, hostname: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.hostname == hostname)
    }

    /// Looks `query` up by alias, then by hostname. Empty fields never match.
    pub fn find(&self, query: &Record) -> Result<Record> {
        let by_alias = Some(query.alias.as_str())
            .filter(|alias| !alias.is_empty())
            .and_then(|alias| self.find_by_alias(alias));
        let found = by_alias.or_else(|| {
            Some(query.hostname.as_str())
                .filter(|hostname| !hostname.is_empty())
                .and_then(|hostname| self.find_by_hostname(hostname))
        });

        found.cloned().ok_or_else(|| {
            Error::NotFound(format!(
                "host {:?} / hostname {:?}",
                query.alias, query.hostname
            ))
        })
    }

    /// Replaces the host with the same alias in place, or appends a new one.
    pub fn upsert(&mut self, record: Record) {
        match self.records.iter_mut().find(|r| r.alias == record.alias) {
            Some(existing) => existing.merge(&record),
            None => self.records.push(record),
        }
    }

    /// Counts a successful login to `record` and re-ranks the cache.
    pub fn record_use(&mut self, record: Record) -> Record {
        self.record_use_at(record, Local::now().naive_local())
    }

    pub fn record_use_at(&mut self, mut record: Record, at: NaiveDateTime) -> Record {
        record.mark_used(at);
        debug!(alias = %record.alias, count = record.use_count, "recording login");
        self.upsert(record.clone());
        self.sort();
        record
    }

    /// Rewrites the cache file through a temporary file in the same directory.
    pub fn persist(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
        let temp_path = file.path().to_path_buf();
        file.write_all(codec::encode(&self.records).as_bytes())
            .map_err(|e| Error::io(temp_path, e))?;
        file.persist(&self.path)
            .map_err(|e| Error::io(&self.path, e.error))?;

        debug!(path = %self.path.display(), hosts = self.records.len(), "cache written");
        Ok(())
    }

    fn sort(&mut self) {
        ranker::sort(&mut self.records);
    }
}
