mod cli;
mod settings;

pub use cli::{Cli, Command};
pub use settings::{
    ChatSettings, LoggingSettings, ServerSettings, Settings, TranscriptionSettings,
    VectorStoreSettings,
};
