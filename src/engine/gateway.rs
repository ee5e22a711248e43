// wweb Engine: Send Gateway
//
// Public outbound operation: normalize the MSISDN, then hand the content to
// the driver's send primitive. Driver failures surface as `EngineError::Send`.

use super::driver::SessionDriver;
use super::phone::PhoneNormalizer;
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{Content, SendOptions};
use log::{info, warn};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// No recipient given; nothing was sent.
    Skipped,
}

impl SendOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendOutcome::Sent => "ok",
            SendOutcome::Skipped => "skipped",
        }
    }
}

#[derive(Clone)]
pub struct SendGateway {
    driver: Arc<dyn SessionDriver>,
    normalizer: PhoneNormalizer,
}

impl SendGateway {
    pub fn new(driver: Arc<dyn SessionDriver>, normalizer: PhoneNormalizer) -> Self {
        SendGateway { driver, normalizer }
    }

    pub async fn send(
        &self,
        msisdn: &str,
        content: impl Into<Content>,
        options: SendOptions,
    ) -> EngineResult<SendOutcome> {
        if msisdn.trim().is_empty() {
            return Ok(SendOutcome::Skipped);
        }

        let normalized = self.normalizer.normalize(msisdn)?;
        if !normalized.valid_for_region {
            warn!("[send] MSISDN {} is not valid for the configured region, sending anyway", msisdn);
        }

        let to = normalized.address;
        info!("[send] Sending message to {}..", to);
        self.driver
            .send_message(to.as_str(), content.into(), options)
            .await
            .map_err(|e| EngineError::Send(format!("{}: {}", to, e)))?;
        info!("[send] --> Sent to {}", to);

        Ok(SendOutcome::Sent)
    }
}
