//! ESP32 lock box over HTTP: `GET <base>/lock` and `GET <base>/unlock`.

use std::time::Duration;

use reqwest::Client;
use tokio::runtime::Runtime;
use url::Url;

use super::blocking_runtime;
use super::traits::Actuator;
use crate::error::ActuatorError;
use crate::storage::DeviceConfig;

pub struct HttpActuator {
    base_url: String,
    client: Client,
    runtime: Runtime,
}

impl HttpActuator {
    /// Build a gateway for `base_url` with a per-request `timeout`.
    ///
    /// An empty URL is accepted here and reported as
    /// [`ActuatorError::NotConfigured`] on each command, so a device that is
    /// not set up yet degrades to retry-on-next-poll like any other outage.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ActuatorError> {
        let client = Client::builder().timeout(timeout).build()?;
        let runtime = blocking_runtime().map_err(ActuatorError::Runtime)?;
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            client,
            runtime,
        })
    }

    pub fn from_config(device: &DeviceConfig) -> Result<Self, ActuatorError> {
        Self::new(&device.esp32_url, Duration::from_secs(device.timeout_secs))
    }

    fn endpoint(&self, command: &str) -> Result<Url, ActuatorError> {
        if self.base_url.is_empty() {
            return Err(ActuatorError::NotConfigured);
        }
        let raw = format!("{}/{command}", self.base_url);
        Url::parse(&raw).map_err(|source| ActuatorError::InvalidUrl { url: raw, source })
    }

    fn send(&self, command: &str) -> Result<(), ActuatorError> {
        let url = self.endpoint(command)?;
        // The request future must be built inside the runtime: the client's
        // timeout arms a tokio timer as soon as the request is created.
        let (status, body) = self.runtime.block_on(async {
            let resp = self.client.get(url).send().await?;
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Ok::<_, reqwest::Error>((status, body))
        })?;
        if status.is_success() {
            tracing::debug!(command, response = %body.trim(), "actuator acknowledged");
            Ok(())
        } else {
            Err(ActuatorError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

impl Actuator for HttpActuator {
    fn lock(&self) -> Result<(), ActuatorError> {
        self.send("lock")
    }

    fn unlock(&self) -> Result<(), ActuatorError> {
        self.send("unlock")
    }
}
