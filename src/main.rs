use clap::Parser;
use ssp::{prompt::TerminalPrompter, ssh::SshPass, App, Cli, Store};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    let action = cli.action()?;
    let store = Store::load(cli.cache_path())?;
    tracing::debug!(?action, cache = %store.path().display(), "ssp start");

    let mut app = App::new(store, TerminalPrompter::new(), SshPass);
    app.run(action)
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
