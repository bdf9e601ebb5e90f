use anyhow::Context;
use tracing::{info, warn};

use crate::{
    cli::Action,
    display,
    error::Error,
    prompt::{self, Prompter},
    record::Record,
    select_box::SelectBox,
    ssh::Connector,
    sshconfig::{self, SshConfigItem},
    store::Store,
    terminal::Terminal,
};

pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");

pub struct App<P, C> {
    store: Store,
    prompter: P,
    connector: C,
    ssh_configs: Option<Vec<SshConfigItem>>,
}

impl<P: Prompter, C: Connector> App<P, C> {
    pub fn new(store: Store, prompter: P, connector: C) -> Self {
        App {
            store,
            prompter,
            connector,
            ssh_configs: None,
        }
    }

    /// Uses these hosts instead of reading `~/.ssh/config` on the first cache miss.
    pub fn with_ssh_configs(mut self, items: Vec<SshConfigItem>) -> Self {
        self.ssh_configs = Some(items);
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn run(&mut self, action: Action) -> anyhow::Result<()> {
        match action {
            Action::List { json: false } => print!("{}", display::render_table(self.store.list())),
            Action::List { json: true } => {
                println!("{}", display::render_json(self.store.list())?)
            }
            Action::Pick => {
                if let Some(record) = self.pick()? {
                    self.login(record)?;
                }
            }
            Action::Index(index) => {
                let record = self
                    .store
                    .get(index)
                    .cloned()
                    .ok_or(Error::IndexOutOfRange {
                        index,
                        len: self.store.len(),
                    })?;
                self.login(record)?;
            }
            Action::Login(query) => {
                let record = self.resolve(query)?;
                self.login(record)?;
            }
        }
        Ok(())
    }

    /// Finds the cached host for `query`, or completes it from ssh_config and prompts.
    pub fn resolve(&mut self, query: Record) -> crate::error::Result<Record> {
        match self.store.find(&query) {
            Ok(record) => {
                info!(alias = %record.alias, "using cached host");
                Ok(record)
            }
            Err(Error::NotFound(what)) => {
                info!(%what, "host not cached, asking for details");
                let mut record = query;
                let items = self
                    .ssh_configs
                    .get_or_insert_with(sshconfig::retrieve_ssh_configs);
                sshconfig::fill_from(&mut record, items);
                prompt::fill_missing(&mut record, &mut self.prompter)?;
                Ok(record)
            }
            Err(err) => Err(err),
        }
    }

    /// Checks the connection, records the login and hands the terminal to ssh.
    pub fn login(&mut self, record: Record) -> anyhow::Result<()> {
        self.connector
            .check(&record)
            .with_context(|| format!("connection to {} failed", record.destination()))?;

        let record = self.store.record_use(record);
        if let Err(err) = self.store.persist() {
            warn!(%err, "failed to update cache");
            eprintln!("Error writing cache: {err}");
        }

        self.connector.exec(&record)?;
        Ok(())
    }

    fn pick(&self) -> anyhow::Result<Option<Record>> {
        if self.store.is_empty() {
            println!("No cached hosts, connect with `{CRATE_NAME} <host>` first");
            return Ok(None);
        }

        let mut select_box = SelectBox::new(self.store.list().to_vec());
        let mut terminal = Terminal::new(select_box.height())?;
        let selected = select_box.select(&mut terminal)?;
        // drop is needed to restore the terminal before ssh takes over
        drop(terminal);
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, fs, io::Cursor};

    use tempfile::TempDir;

    use super::*;
    use crate::prompt::LinePrompter;

    #[derive(Default)]
    struct FakeConnector {
        refuse: bool,
        checked: RefCell<Vec<Record>>,
        executed: RefCell<Vec<Record>>,
    }

    impl Connector for &FakeConnector {
        fn check(&self, record: &Record) -> crate::error::Result<()> {
            self.checked.borrow_mut().push(record.clone());
            if self.refuse {
                return Err(Error::Command {
                    program: "sshpass".into(),
                    stderr: "Permission denied".into(),
                });
            }
            Ok(())
        }

        fn exec(&self, record: &Record) -> crate::error::Result<()> {
            self.executed.borrow_mut().push(record.clone());
            Ok(())
        }
    }

    type TestApp<'a> = App<LinePrompter<Cursor<Vec<u8>>, Vec<u8>>, &'a FakeConnector>;

    const CACHE: &str = "\
Host web
  HostName 10.0.0.1
  User deploy
  #Password pw
  #LoginTimes 3
  #LastLoginTime 2023-07-01T10:00:00
Host db
  HostName 10.0.0.2
  User postgres
  Port 2222
  #Password pw2
  #LoginTimes 9
  #LastLoginTime 2023-07-01T12:00:00
";

    fn app<'a>(dir: &TempDir, input: &str, connector: &'a FakeConnector) -> TestApp<'a> {
        let path = dir.path().join("config_cache");
        if !path.exists() {
            fs::write(&path, CACHE).unwrap();
        }
        let store = Store::load(&path).unwrap();
        let prompter = LinePrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        App::new(store, prompter, connector).with_ssh_configs(vec![SshConfigItem {
            host: "bastion".into(),
            user: "ops".into(),
            hostname: "203.0.113.7".into(),
            port: Some(2022),
        }])
    }

    fn reload(dir: &TempDir) -> Store {
        Store::load(dir.path().join("config_cache")).unwrap()
    }

    #[test]
    fn cached_login_bumps_usage() {
        let dir = tempfile::tempdir().unwrap();
        let connector = FakeConnector::default();
        let mut app = app(&dir, "", &connector);

        app.run(Action::Login(Record::for_hostname("10.0.0.1", None)))
            .unwrap();

        assert_eq!(connector.executed.borrow()[0].alias, "web");
        let store = reload(&dir);
        let web = store.find_by_alias("web").unwrap();
        assert_eq!(web.use_count, 4);
        assert_eq!(store.get(0).unwrap().alias, "web");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn index_logs_into_ranked_host() {
        let dir = tempfile::tempdir().unwrap();
        let connector = FakeConnector::default();
        let mut app = app(&dir, "", &connector);

        app.run(Action::Index(0)).unwrap();

        let executed = connector.executed.borrow();
        assert_eq!(executed[0].alias, "db");
        assert_eq!(executed[0].use_count, 10);
    }

    #[test]
    fn index_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let connector = FakeConnector::default();
        let mut app = app(&dir, "", &connector);

        let err = app.run(Action::Index(7)).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::IndexOutOfRange { index: 7, len: 2 })
        ));
        assert!(connector.checked.borrow().is_empty());
    }

    #[test]
    fn unknown_host_is_prompted_and_cached() {
        let dir = tempfile::tempdir().unwrap();
        let connector = FakeConnector::default();
        let mut app = app(&dir, "newbox\nsecret\n\n", &connector);

        app.run(Action::Login(Record::for_hostname(
            "192.168.7.7",
            Some("admin".into()),
        )))
        .unwrap();

        let store = reload(&dir);
        let added = store.find_by_alias("newbox").unwrap();
        assert_eq!(added.hostname, "192.168.7.7");
        assert_eq!(added.user, "admin");
        assert_eq!(added.secret, "secret");
        assert_eq!(added.port, "22");
        assert_eq!(added.use_count, 1);
        assert_eq!(store.get(0).unwrap().alias, "newbox");
    }

    #[test]
    fn ssh_config_fills_before_prompting() {
        let dir = tempfile::tempdir().unwrap();
        let connector = FakeConnector::default();
        let mut app = app(&dir, "hunter2\n", &connector);

        let record = app
            .resolve(Record {
                alias: "bastion".into(),
                hostname: "bastion".into(),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(record.hostname, "203.0.113.7");
        assert_eq!(record.user, "ops");
        assert_eq!(record.port, "2022");
        assert_eq!(record.secret, "hunter2");
    }

    #[test]
    fn login_proceeds_when_cache_cannot_be_written() {
        let dir = tempfile::tempdir().unwrap();
        let connector = FakeConnector::default();
        let mut app = app(&dir, "", &connector);
        fs::remove_dir_all(dir.path()).unwrap();

        app.run(Action::Login(Record {
            alias: "web".into(),
            ..Default::default()
        }))
        .unwrap();

        let executed = connector.executed.borrow();
        assert_eq!(executed.len(), 1);
        assert_eq!(executed[0].alias, "web");
        assert_eq!(executed[0].use_count, 4);
        assert!(!dir.path().exists());
    }

    #[test]
    fn failed_check_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let connector = FakeConnector {
            refuse: true,
            ..Default::default()
        };
        let mut app = app(&dir, "", &connector);
        let cache = fs::read_to_string(dir.path().join("config_cache")).unwrap();

        let err = app
            .run(Action::Login(Record {
                alias: "db".into(),
                ..Default::default()
            }))
            .unwrap_err();

        assert!(err.to_string().contains("postgres@10.0.0.2"));
        assert_eq!(fs::read_to_string(dir.path().join("config_cache")).unwrap(), cache);
        assert!(connector.executed.borrow().is_empty());
        assert_eq!(app.store().find_by_alias("db").unwrap().use_count, 9);
    }
}
