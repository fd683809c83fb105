//! HTTP actuator transport.
//!
//! The actuator exposes a tiny HTTP server; each command is a GET of
//! `<base_url>/Car?move=...`. The response body is ignored.

use anyhow::{anyhow, Context, Result};
use std::time::Duration;
use url::Url;

use super::transport::{Transport, TransportError};

pub struct HttpTransport {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpTransport {
    /// Build a transport for `base_url` (e.g. `http://192.168.4.1`).
    ///
    /// Without `timeout` a hung actuator blocks the dispatcher's consumer
    /// thread indefinitely; the analysis worker is unaffected either way.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let url = Url::parse(base_url).context("parse actuator url")?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(anyhow!(
                    "unsupported actuator scheme '{}'; expected http(s)",
                    other
                ))
            }
        }
        if url.host_str().is_none() {
            return Err(anyhow!("actuator url missing host"));
        }

        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: builder.build(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_url(&self, payload: &str) -> String {
        format!("{}{}", self.base_url, payload)
    }
}

impl Transport for HttpTransport {
    fn send(&mut self, payload: &str) -> Result<(), TransportError> {
        let url = self.request_url(payload);
        match self.agent.get(&url).call() {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, _)) => Err(TransportError::Status(code)),
            Err(err) => Err(TransportError::Request(err.to_string())),
        }
    }
}
