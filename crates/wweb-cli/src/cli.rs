//! CLI argument definitions using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// WhatsApp Web session runner
#[derive(Parser, Debug)]
#[command(name = "wweb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the session and handle events until Ctrl-C
    Run {
        /// Plugin config file (TOML)
        #[arg(short, long, env = "WWEB_CONFIG", default_value = "wweb.toml")]
        config: PathBuf,
    },

    /// Validate the config and probe the browser
    Check {
        #[arg(short, long, env = "WWEB_CONFIG", default_value = "wweb.toml")]
        config: PathBuf,
    },

    /// Start the session, wait until ready, send one message, stop
    Send {
        #[arg(short, long, env = "WWEB_CONFIG", default_value = "wweb.toml")]
        config: PathBuf,
        /// Recipient MSISDN (national or international format)
        msisdn: String,
        /// Message text, or caption when --media is given
        text: String,
        /// Attach a file as media
        #[arg(long)]
        media: Option<PathBuf>,
    },

    /// Print the wire address for an MSISDN
    Normalize {
        msisdn: String,
        #[arg(short, long, default_value = "ID")]
        region: String,
    },
}
