use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "voxrag", version, about = "Transcription, chat and similarity search over HTTP")]
pub struct Cli {
    /// Bind address, overriding `server.host`.
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port, overriding `server.port`.
    #[arg(long)]
    pub port: Option<u16>,

    /// Settings profile; loads `appsettings.<PROFILE>` when present.
    #[arg(long = "config", value_name = "PROFILE", default_value = "default")]
    pub profile: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP API. Used when no command is given.
    Serve,
    /// Split, embed and index text files into the document store, then exit.
    Ingest {
        #[arg(required = true, value_name = "FILES")]
        paths: Vec<PathBuf>,
    },
}
