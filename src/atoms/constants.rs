// ── wweb Atoms: Constants ──────────────────────────────────────────────────
// All named constants for the crate live here.

// ── Wire addressing ───────────────────────────────────────────────────────
// User address suffix of the web messaging protocol.
pub const WIRE_USER_SUFFIX: &str = "@c.us";

/// Region used to interpret national-format MSISDNs when none is configured.
pub const DEFAULT_REGION: &str = "ID";

// ── Session bootstrap ─────────────────────────────────────────────────────
pub const DEFAULT_CLIENT_ID: &str = "default";
pub const DEFAULT_HANDLER: &str = "default";
/// Directory (under the platform data dir) holding per-client auth stores.
pub const AUTH_DIR_NAME: &str = "wweb-plugin/auth";
pub const DEFAULT_BROWSER: &str = "chromium";
pub const DEFAULT_BROWSER_ARGS: &[&str] = &["--no-sandbox", "--disable-setuid-sandbox"];

// ── Watchdog ──────────────────────────────────────────────────────────────
pub const DEFAULT_WATCHDOG_SECS: u64 = 60;

// ── Sidecar bridge ────────────────────────────────────────────────────────
pub const DEFAULT_SIDECAR_URL: &str = "http://127.0.0.1:8085";
pub const DEFAULT_WEBHOOK_PORT: u16 = 8086;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// A webhook request must arrive in full within this window.
pub(crate) const WEBHOOK_READ_TIMEOUT_SECS: u64 = 10;
/// Response bodies are truncated to this many chars in logs and errors.
pub(crate) const LOG_BODY_LIMIT: usize = 300;

// ── Default replies ───────────────────────────────────────────────────────
pub(crate) const GROUP_ONLY_REPLY: &str = "This command can only be used in a group!";
pub(crate) const USER_JOINED_REPLY: &str = "User joined.";
pub(crate) const USER_LEFT_REPLY: &str = "User left.";
pub(crate) const GROUP_UPDATED_REPLY: &str = "Group updated.";
pub(crate) const RESEND_MEDIA_CAPTION: &str = "Here's your requested media.";
pub(crate) const MUTE_SECS: i64 = 20;

/// Default test message; `{client_id}` is substituted.
pub(crate) const TEST_MESSAGE_TEMPLATE: &str = "Hello, WhatsApp Web client {client_id} just got alive!";
