// wweb Sidecar: Webhook HTTP Listener
// bind_webhook, run_webhook_listener, parse_webhook_event

use crate::atoms::constants::WEBHOOK_READ_TIMEOUT_SECS;
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::Event;
use log::{info, warn};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedSender;

const MAX_REQUEST_BYTES: usize = 8 * 1024 * 1024;

/// Event names the bridge may post, as emitted by the web library.
const KNOWN_EVENTS: &[&str] = &[
    "loading_screen", "qr", "authenticated", "auth_failure", "ready", "change_state",
    "disconnected", "message_create", "message_revoke_everyone", "message_revoke_me",
    "message_ack", "message", "group_join", "group_leave", "group_update",
];

/// Events without a payload; whatever the bridge sends as data is dropped.
const UNIT_EVENTS: &[&str] = &["authenticated", "ready"];

pub(crate) async fn bind_webhook(port: u16) -> EngineResult<TcpListener> {
    let addr = format!("127.0.0.1:{}", port);
    TcpListener::bind(&addr).await
        .map_err(|e| EngineError::driver("webhook", format!("Failed to bind webhook listener on {}: {}", addr, e)))
}

/// Minimal HTTP listener the bridge posts session events to. Requests must
/// target `path`; anything else is answered but dropped.
pub(crate) async fn run_webhook_listener(
    listener: TcpListener,
    path: String,
    events: UnboundedSender<Event>,
    stop: Arc<AtomicBool>,
) {
    if let Ok(addr) = listener.local_addr() {
        info!("[sidecar] Webhook listener started on {}", addr);
    }

    loop {
        if stop.load(Ordering::Relaxed) { break; }

        let accept_result = tokio::time::timeout(Duration::from_secs(2), listener.accept()).await;
        let (mut stream, _peer) = match accept_result {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                warn!("[sidecar] Accept error: {}", e);
                continue;
            }
            Err(_) => continue, // timeout, re-check stop
        };

        // A stalled peer must not hold up the next webhook.
        let read_timeout = Duration::from_secs(WEBHOOK_READ_TIMEOUT_SECS);
        let request = match read_request(&mut stream, read_timeout).await {
            Ok(r) => r,
            Err(e) => {
                warn!("[sidecar] Webhook read failed: {}", e);
                continue;
            }
        };

        // The bridge expects a quick answer.
        let response = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nOK";
        let _ = stream.write_all(response.as_bytes()).await;
        drop(stream);

        let Some((target, body)) = split_request(&request) else { continue };
        if target != path {
            warn!("[sidecar] Dropping webhook for unexpected path {}", target);
            continue;
        }

        match parse_webhook_event(body) {
            Ok(Some(event)) => {
                if events.send(event).is_err() {
                    info!("[sidecar] Event channel closed, stopping webhook listener");
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => warn!("[sidecar] Bad webhook payload: {}", e),
        }
    }

    info!("[sidecar] Webhook listener stopped");
}

/// Reads one request, giving up after `timeout`.
async fn read_request(stream: &mut tokio::net::TcpStream, timeout: Duration) -> EngineResult<String> {
    tokio::time::timeout(timeout, read_full_request(stream))
        .await
        .map_err(|_| EngineError::driver("webhook", format!("read timed out after {:?}", timeout)))?
}

/// Reads headers plus `Content-Length` bytes of body.
async fn read_full_request(stream: &mut tokio::net::TcpStream) -> EngineResult<String> {
    let mut buf = Vec::with_capacity(8192);
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 { break; }
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() > MAX_REQUEST_BYTES {
            return Err(EngineError::driver("webhook", "request too large"));
        }
        if let Some(header_end) = find_header_end(&buf) {
            let headers = String::from_utf8_lossy(&buf[..header_end]);
            if buf.len() >= header_end + 4 + content_length(&headers) { break; }
        }
    }
    Ok(String::from_utf8_lossy(&buf).to_string())
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn content_length(headers: &str) -> usize {
    headers.lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse().ok())
        .unwrap_or(0)
}

/// Request target and body of a raw HTTP request.
fn split_request(request: &str) -> Option<(&str, &str)> {
    let target = request.lines().next()?.split_whitespace().nth(1)?;
    let idx = request.find("\r\n\r\n")?;
    Some((target, &request[idx + 4..]))
}

/// Decodes `{ "event": <name>, "data": <payload> }`. Unknown event names
/// are `Ok(None)`; a known name with a malformed payload is an error.
pub fn parse_webhook_event(body: &str) -> EngineResult<Option<Event>> {
    let mut payload: Value = serde_json::from_str(body)?;
    let name = payload["event"].as_str().unwrap_or("").to_string();
    if !KNOWN_EVENTS.contains(&name.as_str()) {
        if !name.is_empty() {
            info!("[sidecar] Ignoring webhook event {:?}", name);
        }
        return Ok(None);
    }

    let data = if UNIT_EVENTS.contains(&name.as_str()) {
        Value::Null
    } else {
        payload.get_mut("data").map(Value::take).unwrap_or(Value::Null)
    };
    let event = serde_json::from_value(serde_json::json!({ "event": name, "data": data }))?;
    Ok(Some(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;
    use tokio::sync::mpsc;

    #[test]
    fn parses_qr_event() {
        let ev = parse_webhook_event(r#"{"event":"qr","data":"2@abc"}"#).unwrap();
        assert_eq!(ev, Some(Event::QrReceived("2@abc".into())));
    }

    #[test]
    fn unit_events_ignore_data() {
        let ev = parse_webhook_event(r#"{"event":"authenticated","data":{"WABrowserId":"x"}}"#).unwrap();
        assert_eq!(ev, Some(Event::Authenticated));
        let ev = parse_webhook_event(r#"{"event":"ready"}"#).unwrap();
        assert_eq!(ev, Some(Event::Ready));
    }

    #[test]
    fn parses_inbound_message() {
        let ev = parse_webhook_event(
            r#"{"event":"message","data":{"id":"m1","type":"chat","from":"6281@c.us","body":"!ping"}}"#,
        ).unwrap();
        match ev {
            Some(Event::InboundMessage(m)) => {
                assert_eq!(m.body, "!ping");
                assert_eq!(m.kind, "chat");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_event_is_ignored() {
        assert_eq!(parse_webhook_event(r#"{"event":"call","data":{}}"#).unwrap(), None);
        assert_eq!(parse_webhook_event(r#"{"data":{}}"#).unwrap(), None);
    }

    #[test]
    fn malformed_known_event_is_error() {
        assert!(parse_webhook_event(r#"{"event":"qr","data":{"not":"a string"}}"#).is_err());
        assert!(parse_webhook_event("not json").is_err());
    }

    #[test]
    fn split_request_finds_target_and_body() {
        let raw = "POST /webhook/abc HTTP/1.1\r\nHost: x\r\nContent-Length: 2\r\n\r\n{}";
        assert_eq!(split_request(raw), Some(("/webhook/abc", "{}")));
        assert_eq!(content_length("POST / HTTP/1.1\r\ncontent-length: 17"), 17);
    }

    #[tokio::test]
    async fn stalled_request_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut client = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
        client.write_all(b"POST /webhook/tok HTTP/1.1\r\nContent-Length: 40\r\n").await.unwrap();

        let (mut server, _) = listener.accept().await.unwrap();
        let err = read_request(&mut server, Duration::from_millis(100)).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
        drop(client);
    }

    #[tokio::test]
    async fn complete_request_is_read_within_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut client = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
        client.write_all(b"POST /webhook/tok HTTP/1.1\r\nContent-Length: 2\r\n\r\n{}").await.unwrap();

        let (mut server, _) = listener.accept().await.unwrap();
        let request = read_request(&mut server, Duration::from_secs(5)).await.unwrap();
        assert_eq!(split_request(&request), Some(("/webhook/tok", "{}")));
    }

    #[tokio::test]
    async fn listener_forwards_events_for_its_path() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run_webhook_listener(listener, "/webhook/tok".into(), tx, stop.clone()));

        for (path, body) in [
            ("/webhook/other", r#"{"event":"qr","data":"wrong"}"#),
            ("/webhook/tok", r#"{"event":"qr","data":"right"}"#),
        ] {
            let mut conn = TcpStream::connect(addr).await.unwrap();
            let req = format!(
                "POST {} HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
                path, body.len(), body
            );
            conn.write_all(req.as_bytes()).await.unwrap();
            let mut resp = String::new();
            conn.read_to_string(&mut resp).await.unwrap();
            assert!(resp.starts_with("HTTP/1.1 200"));
        }

        assert_eq!(rx.recv().await, Some(Event::QrReceived("right".into())));
        stop.store(true, Ordering::Relaxed);
        task.abort();
    }
}
