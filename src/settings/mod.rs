//! Server settings data model
//!
//! Ordered lists of signaling and TURN server entries, persisted as
//! JSON documents in the key/value settings store. Entry identity is
//! the position in its list.

pub mod form;
pub mod store;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use self::store::{SettingsStore, StoreResult};

/// Store key holding `{servers: [...], secret}` for signaling servers.
pub const SIGNALING_KEY: &str = "signaling_servers";

/// Store key holding the plain TURN server list.
pub const TURN_KEY: &str = "turn_servers";

/// Store key holding the plain STUN server list.
pub const STUN_KEY: &str = "stun_servers";

/// A single relay transport protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Udp,
    Tcp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp => f.write_str("udp"),
            Self::Tcp => f.write_str("tcp"),
        }
    }
}

/// Allowed transports of a TURN entry, stored in the comma-joined wire
/// form used by the settings document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportSet {
    #[serde(rename = "udp")]
    Udp,
    #[serde(rename = "tcp")]
    Tcp,
    #[default]
    #[serde(rename = "udp,tcp")]
    UdpAndTcp,
}

impl TransportSet {
    pub fn transports(&self) -> &'static [Transport] {
        match self {
            Self::Udp => &[Transport::Udp],
            Self::Tcp => &[Transport::Tcp],
            Self::UdpAndTcp => &[Transport::Udp, Transport::Tcp],
        }
    }
}

impl fmt::Display for TransportSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp => f.write_str("udp"),
            Self::Tcp => f.write_str("tcp"),
            Self::UdpAndTcp => f.write_str("udp,tcp"),
        }
    }
}

impl FromStr for TransportSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "udp" => Ok(Self::Udp),
            "tcp" => Ok(Self::Tcp),
            "udp,tcp" | "tcp,udp" => Ok(Self::UdpAndTcp),
            other => Err(format!(
                "invalid transport set '{other}', expected udp, tcp or udp,tcp"
            )),
        }
    }
}

/// One signaling server row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalingServer {
    pub server: String,
    /// Whether the server's SSL certificate is validated.
    #[serde(default)]
    pub verify: bool,
}

/// The signaling block: server rows plus one shared secret.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalingSettings {
    #[serde(default)]
    pub servers: Vec<SignalingServer>,
    #[serde(default)]
    pub secret: String,
}

/// One TURN server row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurnServer {
    pub server: String,
    pub secret: String,
    #[serde(default)]
    pub protocols: TransportSet,
}

/// Typed access to the two server-list documents in the settings store.
pub struct IceSettings {
    store: Arc<dyn SettingsStore>,
    namespace: String,
}

impl IceSettings {
    pub fn new(store: Arc<dyn SettingsStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub async fn load_turn_servers(&self) -> StoreResult<Vec<TurnServer>> {
        match self.store.get(&self.namespace, TURN_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Persists the TURN list; rows missing an address or secret are
    /// dropped rather than written.
    pub async fn save_turn_servers(&self, servers: &[TurnServer]) -> StoreResult<()> {
        let kept: Vec<&TurnServer> = servers
            .iter()
            .filter(|s| !s.server.trim().is_empty() && !s.secret.trim().is_empty())
            .collect();
        let value = serde_json::to_value(&kept)?;
        self.store.set(&self.namespace, TURN_KEY, &value).await
    }

    pub async fn load_stun_servers(&self) -> StoreResult<Vec<String>> {
        match self.store.get(&self.namespace, STUN_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Persists the STUN list of `host:port` addresses; blank rows are
    /// dropped rather than written.
    pub async fn save_stun_servers(&self, servers: &[String]) -> StoreResult<()> {
        let kept: Vec<&String> = servers.iter().filter(|s| !s.trim().is_empty()).collect();
        let value = serde_json::to_value(&kept)?;
        self.store.set(&self.namespace, STUN_KEY, &value).await
    }

    pub async fn load_signaling(&self) -> StoreResult<SignalingSettings> {
        match self.store.get(&self.namespace, SIGNALING_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(SignalingSettings::default()),
        }
    }

    /// Persists the signaling block; rows without a URL are dropped.
    pub async fn save_signaling(&self, settings: &SignalingSettings) -> StoreResult<()> {
        let kept = SignalingSettings {
            servers: settings
                .servers
                .iter()
                .filter(|s| !s.server.trim().is_empty())
                .cloned()
                .collect(),
            secret: settings.secret.clone(),
        };
        let value = serde_json::to_value(&kept)?;
        self.store.set(&self.namespace, SIGNALING_KEY, &value).await
    }
}
