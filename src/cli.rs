//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "icecheck")]
#[command(version)]
#[command(about = "Manage signaling/TURN server settings and probe TURN relay connectivity")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Configuration file path (defaults to searching standard locations)
    #[arg(short, long, default_value = "config.toml")]
    pub(crate) config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Probe one TURN server without touching the settings store
    Probe {
        /// TURN server address, host or host:port
        server: String,

        /// Shared secret used to derive the ephemeral credential
        secret: String,

        /// Allowed transports: udp, tcp or udp,tcp
        #[arg(short, long, default_value = "udp,tcp")]
        protocols: String,
    },

    /// Probe every stored TURN server
    Check,

    /// Manage the stored TURN server list
    Turn {
        #[command(subcommand)]
        action: TurnAction,
    },

    /// Manage the stored STUN server list
    Stun {
        #[command(subcommand)]
        action: StunAction,
    },

    /// Manage the stored signaling server list
    Signaling {
        #[command(subcommand)]
        action: SignalingAction,
    },

    /// Test configuration file
    Test {
        /// Configuration file path (optional, defaults to config.toml)
        #[arg(index = 1)]
        config_file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum TurnAction {
    /// List stored TURN servers
    List,

    /// Append a TURN server entry
    Add {
        server: String,
        secret: String,

        /// Allowed transports: udp, tcp or udp,tcp
        #[arg(short, long, default_value = "udp,tcp")]
        protocols: String,
    },

    /// Remove the entry at the given position (starting at 0)
    Remove { index: usize },
}

#[derive(Subcommand, Debug)]
pub(crate) enum StunAction {
    /// List stored STUN servers
    List,

    /// Append a STUN server address (host:port)
    Add { server: String },

    /// Remove the entry at the given position (starting at 0)
    Remove { index: usize },
}

#[derive(Subcommand, Debug)]
pub(crate) enum SignalingAction {
    /// List stored signaling servers
    List,

    /// Append a signaling server entry
    Add {
        server: String,

        /// Validate the server's SSL certificate
        #[arg(long)]
        verify: bool,
    },

    /// Remove the entry at the given position (starting at 0)
    Remove { index: usize },

    /// Set the shared signaling secret
    SetSecret { secret: String },
}
