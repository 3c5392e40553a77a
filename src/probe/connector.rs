//! Real-time-communication seam
//!
//! The probe engine only depends on these traits: open a relay-only
//! connection, negotiate a one-way offer, drain candidate events and
//! tear the connection down. Production uses the webrtc crate; tests
//! drive the engine with scripted sessions.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use webrtc::api::APIBuilder;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_gatherer_state::RTCIceGathererState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::policy::ice_transport_policy::RTCIceTransportPolicy;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;

use super::ProbeError;

/// The single ICE server entry handed to a probe connection: one
/// `turn:` URL per allowed transport, all authenticated with the same
/// ephemeral credential pair.
#[derive(Debug, Clone)]
pub struct RelayTarget {
    pub urls: Vec<String>,
    pub username: String,
    pub credential: String,
}

/// Event emitted while a session gathers network-path candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatherEvent {
    /// A discovered candidate, as its SDP attribute line.
    Candidate(String),
    /// Candidate event without payload. Environments lacking the
    /// gathering-state signal mark the end of discovery this way.
    EndOfCandidates,
    /// Explicit gathering-complete signal.
    GatheringComplete,
}

#[async_trait]
pub trait IceConnector: Send + Sync {
    async fn connect(&self, target: RelayTarget) -> Result<Box<dyn IceSession>, ProbeError>;
}

/// One relay-only connection attempt, exclusively owned by a single
/// probe invocation. `close` is called exactly once on every exit path.
#[async_trait]
pub trait IceSession: Send {
    /// Starts one-way offer negotiation requesting an audio capability
    /// only. Candidate events flow after this returns.
    async fn negotiate(&mut self) -> Result<(), ProbeError>;

    /// Next gathering event; `None` once the event stream is closed.
    async fn next_event(&mut self) -> Option<GatherEvent>;

    async fn close(&mut self);
}

/// Production connector backed by the webrtc crate.
#[derive(Debug, Default)]
pub struct WebRtcConnector;

impl WebRtcConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IceConnector for WebRtcConnector {
    async fn connect(&self, target: RelayTarget) -> Result<Box<dyn IceSession>, ProbeError> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let api = APIBuilder::new().with_media_engine(media_engine).build();

        let config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: target.urls,
                username: target.username,
                credential: target.credential,
                ..Default::default()
            }],
            // Relay only: any discovered path must traverse the TURN
            // server, or the test would prove nothing.
            ice_transport_policy: RTCIceTransportPolicy::Relay,
            ..Default::default()
        };

        let pc = Arc::new(api.new_peer_connection(config).await?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let tx = event_tx.clone();
        pc.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let tx = tx.clone();
            Box::pin(async move {
                match candidate {
                    Some(c) => match c.to_json() {
                        Ok(init) => {
                            let _ = tx.send(GatherEvent::Candidate(init.candidate));
                        }
                        Err(e) => warn!("Failed to serialize ICE candidate: {e}"),
                    },
                    None => {
                        let _ = tx.send(GatherEvent::EndOfCandidates);
                    }
                }
            })
        }));

        let tx = event_tx;
        pc.on_ice_gathering_state_change(Box::new(move |state: RTCIceGathererState| {
            let tx = tx.clone();
            Box::pin(async move {
                debug!("ICE gathering state changed: {state}");
                if state == RTCIceGathererState::Complete {
                    let _ = tx.send(GatherEvent::GatheringComplete);
                }
            })
        }));

        Ok(Box::new(WebRtcSession {
            pc,
            events: event_rx,
            closed: false,
        }))
    }
}

struct WebRtcSession {
    pc: Arc<RTCPeerConnection>,
    events: mpsc::UnboundedReceiver<GatherEvent>,
    closed: bool,
}

#[async_trait]
impl IceSession for WebRtcSession {
    async fn negotiate(&mut self) -> Result<(), ProbeError> {
        // Audio capability only; no media is ever sent.
        self.pc
            .add_transceiver_from_kind(
                RTPCodecType::Audio,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Recvonly,
                    send_encodings: vec![],
                }),
            )
            .await?;

        let offer = self.pc.create_offer(None).await?;
        // Candidate gathering starts once the local description applies.
        self.pc.set_local_description(offer).await?;
        Ok(())
    }

    async fn next_event(&mut self) -> Option<GatherEvent> {
        self.events.recv().await
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.pc.close().await {
            warn!("Failed to close probe connection: {e}");
        }
    }
}
