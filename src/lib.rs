mod app;
pub mod cli;
pub mod codec;
pub mod display;
mod error;
mod input;
pub mod prompt;
pub mod ranker;
pub mod record;
mod select_box;
pub mod ssh;
pub mod sshconfig;
pub mod store;
mod terminal;

pub use app::{App, CRATE_NAME};
pub use cli::{Action, Cli};
pub use error::{Error, Result};
pub use record::Record;
pub use select_box::SelectBox;
pub use store::Store;
pub use terminal::Terminal;
