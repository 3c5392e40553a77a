//! TURN connectivity probe
//!
//! Given one candidate TURN server's address, shared secret and allowed
//! transports, the probe opens a relay-only peer connection with
//! ephemeral credentials, collects the network-path candidates the
//! negotiation discovers and classifies the server as reachable iff at
//! least one candidate traversed the relay. No media is sent.

pub mod candidate;
pub mod connector;
pub mod credentials;
pub mod indicator;

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use self::candidate::{Candidate, relay_reachable};
use self::connector::{GatherEvent, IceConnector, RelayTarget};
use self::credentials::EphemeralCredential;

use crate::settings::Transport;

/// Hang guard: relays that accept the connection but never finish
/// gathering still produce a definitive classification.
pub const GATHER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("WebRTC error: {0}")]
    WebRtc(#[from] webrtc::Error),

    #[error("Connector error: {reason}")]
    Connector { reason: String },
}

impl ProbeError {
    pub fn connector(reason: impl Into<String>) -> Self {
        Self::Connector {
            reason: reason.into(),
        }
    }
}

/// Inputs of one probe invocation, read from the row at trigger time.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub server: String,
    pub secret: String,
    pub transports: Vec<Transport>,
}

impl ProbeRequest {
    /// All three inputs must be non-empty or the probe is a no-op.
    pub fn is_actionable(&self) -> bool {
        !self.server.trim().is_empty()
            && !self.secret.trim().is_empty()
            && !self.transports.is_empty()
    }

    /// One relay URL per allowed transport.
    pub fn relay_urls(&self) -> Vec<String> {
        let server = self.server.trim();
        self.transports
            .iter()
            .map(|t| format!("turn:{server}?transport={t}"))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Incomplete input; nothing was attempted.
    Skipped,
    /// At least one relay path was discovered.
    Reachable,
    /// No relay path, including the zero-candidate case.
    Unreachable,
}

/// Result of one probe invocation.
#[derive(Debug)]
pub struct ProbeReport {
    pub outcome: ProbeOutcome,
    pub candidates: Vec<Candidate>,
    pub timed_out: bool,
}

impl ProbeReport {
    pub fn skipped() -> Self {
        Self {
            outcome: ProbeOutcome::Skipped,
            candidates: Vec::new(),
            timed_out: false,
        }
    }

    pub fn relay_found(&self) -> bool {
        self.outcome == ProbeOutcome::Reachable
    }
}

/// Probe engine. Owns the connector seam; each `run` owns its
/// connection exclusively and closes it exactly once.
pub struct Prober<C> {
    connector: C,
}

impl<C: IceConnector> Prober<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub async fn run(&self, request: &ProbeRequest) -> ProbeReport {
        if !request.is_actionable() {
            debug!("Probe request incomplete, skipping");
            return ProbeReport::skipped();
        }

        let credential = EphemeralCredential::issue(&request.secret, Utc::now().timestamp());
        let target = RelayTarget {
            urls: request.relay_urls(),
            username: credential.username,
            credential: credential.password,
        };

        info!(server = %request.server, urls = ?target.urls, "Probing TURN relay");

        let mut session = match self.connector.connect(target).await {
            Ok(session) => session,
            Err(e) => {
                warn!(server = %request.server, "Failed to open probe connection: {e}");
                return ProbeReport {
                    outcome: ProbeOutcome::Unreachable,
                    candidates: Vec::new(),
                    timed_out: false,
                };
            }
        };

        let mut candidates = Vec::new();
        let mut timed_out = false;

        match session.negotiate().await {
            Ok(()) => {
                let deadline = tokio::time::sleep(GATHER_TIMEOUT);
                tokio::pin!(deadline);

                loop {
                    tokio::select! {
                        _ = &mut deadline => {
                            warn!(
                                server = %request.server,
                                "Candidate gathering did not finish within {GATHER_TIMEOUT:?}"
                            );
                            timed_out = true;
                            break;
                        }
                        event = session.next_event() => match event {
                            Some(GatherEvent::Candidate(line)) if line.trim().is_empty() => {
                                // Empty payload doubles as end-of-candidates.
                                break;
                            }
                            Some(GatherEvent::Candidate(line)) => match line.parse::<Candidate>() {
                                Ok(c) => {
                                    debug!(candidate = %line, typ = %c.typ, "Discovered candidate");
                                    candidates.push(c);
                                }
                                Err(e) => warn!(candidate = %line, "Unparseable candidate: {e}"),
                            },
                            Some(GatherEvent::EndOfCandidates)
                            | Some(GatherEvent::GatheringComplete)
                            | None => break,
                        }
                    }
                }
            }
            Err(e) => {
                // Classification still runs with whatever was collected
                // so far, typically nothing.
                warn!(server = %request.server, "Offer negotiation failed: {e}");
            }
        }

        session.close().await;

        let outcome = if relay_reachable(&candidates) {
            ProbeOutcome::Reachable
        } else {
            ProbeOutcome::Unreachable
        };
        info!(
            server = %request.server,
            ?outcome,
            candidates = candidates.len(),
            timed_out,
            "Probe finished"
        );

        ProbeReport {
            outcome,
            candidates,
            timed_out,
        }
    }
}
