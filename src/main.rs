//! icecheck main program
//!
//! Manages stored signaling/TURN server settings and probes TURN relay
//! connectivity with short-lived, relay-only peer connections.

mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use icecheck::config::AppConfig;
use icecheck::error::{Error, Result};
use icecheck::observability::init_observability;
use icecheck::probe::connector::WebRtcConnector;
use icecheck::probe::{ProbeOutcome, ProbeRequest, Prober};
use icecheck::settings::form::TurnForm;
use icecheck::settings::store::SqliteSettingsStore;
use icecheck::settings::{IceSettings, SignalingServer, TransportSet, TurnServer};

macro_rules! bootstrap_info {
    ($($arg:tt)*) => {
        println!($($arg)*);
    };
}

macro_rules! bootstrap_error {
    ($($arg:tt)*) => {
        eprintln!($($arg)*);
    };
}

use cli::{Cli, Commands, SignalingAction, StunAction, TurnAction};

/// Application launcher utilities
struct ApplicationLauncher;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Test { config_file } => {
            let config_path = config_file.as_ref().unwrap_or(&cli.config);
            ApplicationLauncher::test_config_file(config_path)
        }
        command => {
            let config = ApplicationLauncher::load_config(&cli.config)?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            runtime.block_on(ApplicationLauncher::run_command(command, config))
        }
    }
}

impl ApplicationLauncher {
    /// Find config file with fallback locations. Missing config is not
    /// an error; built-in defaults apply.
    fn find_config_file(provided_path: &PathBuf) -> Result<Option<PathBuf>> {
        // A non-default path must exist.
        if provided_path != Path::new("config.toml") {
            if provided_path.exists() {
                bootstrap_info!("Using provided config file: {:?}", provided_path);
                return Ok(Some(provided_path.clone()));
            }
            bootstrap_error!("Provided config file not found: {:?}", provided_path);
            return Err(Error::config(format!(
                "Config file not found: {provided_path:?}"
            )));
        }

        let fallback_paths = vec![
            // 1. Current working directory
            PathBuf::from("config.toml"),
            // 2. System config directory
            PathBuf::from("/etc/icecheck/config.toml"),
        ];

        for path in &fallback_paths {
            if path.exists() {
                bootstrap_info!("Found config file: {:?}", path);
                return Ok(Some(path.clone()));
            }
        }

        Ok(None)
    }

    fn load_config(provided_path: &PathBuf) -> Result<AppConfig> {
        let config = match Self::find_config_file(provided_path)? {
            Some(path) => AppConfig::from_file(&path)?,
            None => {
                bootstrap_info!("No configuration file found, using built-in defaults");
                AppConfig::default()
            }
        };

        if let Err(errors) = config.validate() {
            bootstrap_error!("❌ Configuration validation failed:");
            for (i, err) in errors.iter().enumerate() {
                bootstrap_error!("  {}. {}", i + 1, err);
            }
            return Err(Error::config("configuration validation failed"));
        }

        Ok(config)
    }

    /// Check that a configuration file parses and validates.
    fn test_config_file(config_path: &PathBuf) -> Result<()> {
        match AppConfig::from_file(config_path) {
            Ok(config) => {
                bootstrap_info!("✅ Configuration file parsed: {:?}", config_path);
                match config.validate() {
                    Ok(()) => {
                        bootstrap_info!("✅ Configuration validation passed");
                        Ok(())
                    }
                    Err(errors) => {
                        bootstrap_error!("❌ Configuration validation failed:");
                        for (i, err) in errors.iter().enumerate() {
                            bootstrap_error!("  {}. {}", i + 1, err);
                        }
                        Err(Error::config("configuration validation failed"))
                    }
                }
            }
            Err(e) => {
                bootstrap_error!("❌ Configuration file failed to parse: {e}");
                Err(e)
            }
        }
    }

    async fn run_command(command: &Commands, config: AppConfig) -> Result<()> {
        let _observability_guard = init_observability(&config.log)?;

        match command {
            Commands::Probe {
                server,
                secret,
                protocols,
            } => Self::probe_one(server, secret, protocols).await,
            Commands::Check => Self::check_all(&config).await,
            Commands::Turn { action } => Self::manage_turn(&config, action).await,
            Commands::Stun { action } => Self::manage_stun(&config, action).await,
            Commands::Signaling { action } => Self::manage_signaling(&config, action).await,
            Commands::Test { .. } => unreachable!("handled before the runtime starts"),
        }
    }

    async fn open_settings(config: &AppConfig) -> Result<IceSettings> {
        if !config.store.path.exists() {
            std::fs::create_dir_all(&config.store.path).with_context(|| {
                format!(
                    "Failed to create settings data directory: {}",
                    config.store.path.display()
                )
            })?;
        }
        let store = SqliteSettingsStore::open(&config.store.path).await?;
        Ok(IceSettings::new(
            Arc::new(store),
            config.store.namespace.clone(),
        ))
    }

    async fn probe_one(server: &str, secret: &str, protocols: &str) -> Result<()> {
        let protocols: TransportSet = protocols.parse().map_err(Error::config)?;
        let request = ProbeRequest {
            server: server.to_string(),
            secret: secret.to_string(),
            transports: protocols.transports().to_vec(),
        };

        let prober = Prober::new(WebRtcConnector::new());
        let report = prober.run(&request).await;

        for candidate in &report.candidates {
            println!(
                "  {} {} {}:{}",
                candidate.typ, candidate.protocol, candidate.address, candidate.port
            );
        }
        if report.timed_out {
            println!("  (candidate gathering timed out)");
        }

        match report.outcome {
            ProbeOutcome::Reachable => {
                println!("✅ {server}: relay reachable");
                Ok(())
            }
            ProbeOutcome::Unreachable => {
                println!("❌ {server}: no relay candidate");
                Err(Error::custom(format!("TURN server unreachable: {server}")))
            }
            ProbeOutcome::Skipped => Err(Error::config(
                "server, secret and protocols must all be non-empty",
            )),
        }
    }

    async fn check_all(config: &AppConfig) -> Result<()> {
        let settings = Self::open_settings(config).await?;
        let entries = settings.load_turn_servers().await?;
        if entries.is_empty() {
            println!("No TURN servers configured");
            return Ok(());
        }

        info!("Probing {} stored TURN server(s)", entries.len());
        let form = TurnForm::from_entries(entries);
        let prober = Prober::new(WebRtcConnector::new());

        let mut failures = 0;
        for (index, row) in form.rows().iter().enumerate() {
            let report = form
                .trigger_probe(index, &prober)
                .await
                .ok_or_else(|| Error::custom("probe trigger was dropped"))?;

            match report.outcome {
                ProbeOutcome::Reachable => {
                    println!("✅ {}: relay reachable", row.entry.server);
                }
                ProbeOutcome::Unreachable => {
                    println!("❌ {}: no relay candidate", row.entry.server);
                    failures += 1;
                }
                ProbeOutcome::Skipped => {
                    println!("⚠️  {}: entry incomplete, skipped", row.entry.server);
                }
            }
        }

        if failures > 0 {
            Err(Error::custom(format!(
                "{failures} TURN server(s) unreachable"
            )))
        } else {
            Ok(())
        }
    }

    async fn manage_turn(config: &AppConfig, action: &TurnAction) -> Result<()> {
        let settings = Self::open_settings(config).await?;
        let mut entries = settings.load_turn_servers().await?;

        match action {
            TurnAction::List => {
                if entries.is_empty() {
                    println!("No TURN servers configured");
                }
                for (i, entry) in entries.iter().enumerate() {
                    println!("{i}: {} [{}]", entry.server, entry.protocols);
                }
                Ok(())
            }
            TurnAction::Add {
                server,
                secret,
                protocols,
            } => {
                let protocols: TransportSet = protocols.parse().map_err(Error::config)?;
                entries.push(TurnServer {
                    server: server.clone(),
                    secret: secret.clone(),
                    protocols,
                });
                settings.save_turn_servers(&entries).await?;
                println!("Added TURN server: {server}");
                Ok(())
            }
            TurnAction::Remove { index } => {
                if *index >= entries.len() {
                    return Err(Error::custom(format!("no TURN server at index {index}")));
                }
                let removed = entries.remove(*index);
                settings.save_turn_servers(&entries).await?;
                println!("Removed TURN server: {}", removed.server);
                Ok(())
            }
        }
    }

    async fn manage_stun(config: &AppConfig, action: &StunAction) -> Result<()> {
        let settings = Self::open_settings(config).await?;
        let mut entries = settings.load_stun_servers().await?;

        match action {
            StunAction::List => {
                if entries.is_empty() {
                    println!("No STUN servers configured");
                }
                for (i, entry) in entries.iter().enumerate() {
                    println!("{i}: {entry}");
                }
                Ok(())
            }
            StunAction::Add { server } => {
                entries.push(server.clone());
                settings.save_stun_servers(&entries).await?;
                println!("Added STUN server: {server}");
                Ok(())
            }
            StunAction::Remove { index } => {
                if *index >= entries.len() {
                    return Err(Error::custom(format!("no STUN server at index {index}")));
                }
                let removed = entries.remove(*index);
                settings.save_stun_servers(&entries).await?;
                println!("Removed STUN server: {removed}");
                Ok(())
            }
        }
    }

    async fn manage_signaling(config: &AppConfig, action: &SignalingAction) -> Result<()> {
        let settings = Self::open_settings(config).await?;
        let mut signaling = settings.load_signaling().await?;

        match action {
            SignalingAction::List => {
                if signaling.servers.is_empty() {
                    println!("No signaling servers configured");
                }
                for (i, entry) in signaling.servers.iter().enumerate() {
                    let verify = if entry.verify { "verified" } else { "unverified" };
                    println!("{i}: {} ({verify})", entry.server);
                }
                if !signaling.secret.is_empty() {
                    println!("Shared secret is set");
                }
                Ok(())
            }
            SignalingAction::Add { server, verify } => {
                url::Url::parse(server)
                    .map_err(|e| Error::config(format!("invalid signaling URL '{server}': {e}")))?;
                signaling.servers.push(SignalingServer {
                    server: server.clone(),
                    verify: *verify,
                });
                settings.save_signaling(&signaling).await?;
                println!("Added signaling server: {server}");
                Ok(())
            }
            SignalingAction::Remove { index } => {
                if *index >= signaling.servers.len() {
                    return Err(Error::custom(format!(
                        "no signaling server at index {index}"
                    )));
                }
                let removed = signaling.servers.remove(*index);
                settings.save_signaling(&signaling).await?;
                println!("Removed signaling server: {}", removed.server);
                Ok(())
            }
            SignalingAction::SetSecret { secret } => {
                signaling.secret = secret.clone();
                settings.save_signaling(&signaling).await?;
                println!("Signaling secret updated");
                Ok(())
            }
        }
    }
}
