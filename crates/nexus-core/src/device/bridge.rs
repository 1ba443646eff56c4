//! External bridge -- post session events as JSON to a generic automation
//! endpoint (home automation, scripts, chat relays).

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;

use super::blocking_runtime;
use crate::error::BridgeError;
use crate::events::Event;
use crate::storage::BridgeConfig;

const BRIDGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Wire format of every bridge post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgePayload {
    pub source: String,
    pub event: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl BridgePayload {
    pub fn new(event: &str, note: &str) -> Self {
        let now = Utc::now();
        Self {
            source: "nexus".into(),
            event: event.into(),
            timestamp: now.timestamp_millis() as f64 / 1000.0,
            note: note.into(),
            data: None,
        }
    }
}

pub struct Bridge {
    url: String,
    client: Client,
    runtime: Runtime,
}

impl Bridge {
    /// Build from configuration; refuses when the bridge is off or has no URL.
    pub fn from_config(config: &BridgeConfig) -> Result<Self, BridgeError> {
        if !config.enabled {
            return Err(BridgeError::Disabled);
        }
        let url = config.url.trim();
        if url.is_empty() {
            return Err(BridgeError::NotConfigured);
        }
        let client = Client::builder().timeout(BRIDGE_TIMEOUT).build()?;
        let runtime = blocking_runtime().map_err(BridgeError::Runtime)?;
        Ok(Self {
            url: url.to_string(),
            client,
            runtime,
        })
    }

    /// Post a payload and return the HTTP status code, whatever it is.
    pub fn post(&self, payload: &BridgePayload) -> Result<u16, BridgeError> {
        let status = self.runtime.block_on(async {
            let resp = self.client.post(&self.url).json(payload).send().await?;
            Ok::<_, reqwest::Error>(resp.status().as_u16())
        })?;
        Ok(status)
    }

    pub fn send_test(&self) -> Result<u16, BridgeError> {
        self.post(&BridgePayload::new("TEST", "Test event from Nexus bridge."))
    }

    /// Forward an engine event with its full JSON body attached.
    pub fn forward(&self, event: &Event) -> Result<u16, BridgeError> {
        let mut payload = BridgePayload::new(event.name(), "");
        payload.data = serde_json::to_value(event).ok();
        self.post(&payload)
    }
}
