// wweb Sidecar: REST Helpers
// SidecarApi, start_session, call, truncate_body

use crate::atoms::constants::LOG_BODY_LIMIT;
use crate::atoms::error::{EngineError, EngineResult};
use crate::engine::config::SidecarConfig;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Thin client for the bridge's REST surface. Every call carries the
/// `apikey` header; responses are `{ "result": ... }`.
#[derive(Debug, Clone)]
pub(crate) struct SidecarApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SidecarApi {
    pub(crate) fn new(config: &SidecarConfig) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(SidecarApi {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub(crate) fn client_url(&self, client_id: &str, op: &str) -> String {
        format!("{}/client/{}/{}", self.base_url, client_id, op)
    }

    /// Asks the bridge to launch the browser session and start posting
    /// events to the webhook.
    pub(crate) async fn start_session(&self, body: &Value) -> EngineResult<()> {
        let url = format!("{}/session/start", self.base_url);
        let text = self.post("session/start", &url, body).await?;
        info!("[sidecar] Session start accepted: {}", truncate_body(&text));
        Ok(())
    }

    /// Calls one client operation and decodes its `result`.
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        client_id: &str,
        op: &str,
        args: Value,
    ) -> EngineResult<T> {
        let url = self.client_url(client_id, op);
        let text = self.post(op, &url, &args).await?;
        decode_result(op, &text)
    }

    async fn post(&self, op: &str, url: &str, body: &Value) -> EngineResult<String> {
        let resp = self.client.post(url)
            .header("apikey", &self.api_key)
            .json(body)
            .send().await?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        debug!("[sidecar] {} response [{}]: {}", op, status, truncate_body(&text));

        if !status.is_success() {
            return Err(EngineError::driver(op, format!("{}: {}", status, truncate_body(&text))));
        }
        Ok(text)
    }
}

pub(crate) fn decode_result<T: DeserializeOwned>(op: &str, text: &str) -> EngineResult<T> {
    let mut payload: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(text)?
    };
    let result = payload.get_mut("result").map(Value::take).unwrap_or(Value::Null);
    serde_json::from_value(result)
        .map_err(|e| EngineError::driver(op, format!("unexpected result: {}", e)))
}

/// Char-safe prefix of a response body for logs and errors.
pub(crate) fn truncate_body(text: &str) -> &str {
    match text.char_indices().nth(LOG_BODY_LIMIT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::types::{Chat, Message};

    #[test]
    fn client_url_trims_trailing_slash() {
        let api = SidecarApi::new(&SidecarConfig {
            api_url: "http://localhost:8085/".into(),
            ..Default::default()
        }).unwrap();
        assert_eq!(api.client_url("shop", "sendMessage"), "http://localhost:8085/client/shop/sendMessage");
    }

    #[test]
    fn decode_typed_result() {
        let chats: Vec<Chat> = decode_result("getChats", r#"{"result":[{"id":"1@g.us","isGroup":true}]}"#).unwrap();
        assert_eq!(chats.len(), 1);
        assert!(chats[0].is_group);
    }

    #[test]
    fn decode_null_result_for_unit_and_option() {
        let () = decode_result("pin", r#"{"result":null}"#).unwrap();
        let () = decode_result("pin", "").unwrap();
        let quoted: Option<Message> = decode_result("getQuotedMessage", r#"{}"#).unwrap();
        assert!(quoted.is_none());
    }

    #[test]
    fn decode_mismatch_is_driver_error() {
        let err = decode_result::<String>("acceptInvite", r#"{"result":42}"#).unwrap_err();
        assert!(matches!(err, EngineError::Driver { .. }));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let long = "é".repeat(LOG_BODY_LIMIT + 10);
        assert_eq!(truncate_body(&long).chars().count(), LOG_BODY_LIMIT);
        assert_eq!(truncate_body("short"), "short");
    }
}
