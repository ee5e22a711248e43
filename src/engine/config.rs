// wweb Engine: Plugin Configuration
// PluginConfig, TestDirective, WatchdogConfig, BrowserConfig, SidecarConfig,
// load_config, validate_config, check_browser_available

use crate::atoms::constants::{
    AUTH_DIR_NAME, DEFAULT_BROWSER, DEFAULT_BROWSER_ARGS, DEFAULT_CLIENT_ID, DEFAULT_HANDLER,
    DEFAULT_REGION, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SIDECAR_URL, DEFAULT_WATCHDOG_SECS, DEFAULT_WEBHOOK_PORT,
};
use crate::atoms::error::{EngineError, EngineResult};
use crate::engine::phone::PhoneNormalizer;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

// ── Config Structs ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub enabled: bool,
    /// Session identity; also keys the local auth store.
    pub client_id: String,
    /// Name of the handler the host application resolves at startup.
    pub handler: String,
    /// Send one message once the session is ready.
    pub test: Option<TestDirective>,
    /// ISO region used to read national-format numbers.
    pub region: String,
    /// Root of the per-client auth stores.
    pub auth_data_path: PathBuf,
    pub watchdog: WatchdogConfig,
    pub browser: BrowserConfig,
    pub sidecar: SidecarConfig,
}

impl Default for PluginConfig {
    fn default() -> Self {
        PluginConfig {
            enabled: false,
            client_id: DEFAULT_CLIENT_ID.into(),
            handler: DEFAULT_HANDLER.into(),
            test: None,
            region: DEFAULT_REGION.into(),
            auth_data_path: default_auth_path(),
            watchdog: WatchdogConfig::default(),
            browser: BrowserConfig::default(),
            sidecar: SidecarConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDirective {
    pub msisdn: String,
    /// Defaults to a "just got alive" greeting naming the client id.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    pub enabled: bool,
    pub timeout_secs: u64,
    /// Terminate the process on timeout so a supervisor restarts it.
    pub exit_process: bool,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        WatchdogConfig {
            enabled: true,
            timeout_secs: DEFAULT_WATCHDOG_SECS,
            exit_process: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Headless browser executable the sidecar should launch.
    pub executable: String,
    pub args: Vec<String>,
    /// Probe `<executable> --version` during validation.
    pub check_on_start: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        BrowserConfig {
            executable: DEFAULT_BROWSER.into(),
            args: DEFAULT_BROWSER_ARGS.iter().map(|a| a.to_string()).collect(),
            check_on_start: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidecarConfig {
    /// Base URL of the browser-automation bridge REST API.
    pub api_url: String,
    /// Must match the key the bridge was started with.
    pub api_key: String,
    /// Port for the local webhook listener the bridge posts events to.
    pub webhook_port: u16,
    /// Upper bound for every REST call to the bridge.
    pub request_timeout_secs: u64,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        SidecarConfig {
            api_url: DEFAULT_SIDECAR_URL.into(),
            api_key: String::new(),
            webhook_port: DEFAULT_WEBHOOK_PORT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

fn default_auth_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(AUTH_DIR_NAME)
}

// ── Loading ────────────────────────────────────────────────────────────

impl PluginConfig {
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Message sent by the Ready test directive.
    pub fn test_message(&self) -> Option<(String, String)> {
        let test = self.test.as_ref()?;
        let text = match &test.message {
            Some(m) if !m.trim().is_empty() => m.clone(),
            _ => crate::atoms::constants::TEST_MESSAGE_TEMPLATE.replace("{client_id}", &self.client_id),
        };
        Some((test.msisdn.clone(), text))
    }
}

/// Reads the plugin config. `Ok(None)` when the plugin is disabled.
pub fn load_config(path: &Path) -> EngineResult<Option<PluginConfig>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| EngineError::Config(format!("Read {}: {}", path.display(), e)))?;
    let config = PluginConfig::from_toml_str(&text)?;
    if !config.enabled {
        info!("[config] WhatsApp web plugin disabled in {}", path.display());
        return Ok(None);
    }
    Ok(Some(config))
}

// ── Validation ─────────────────────────────────────────────────────────

/// Checks everything needed before a session can start. `known_handlers`
/// is the set of handler names the host application can resolve.
pub fn validate_config(config: &PluginConfig, known_handlers: &[&str]) -> EngineResult<()> {
    if config.client_id.trim().is_empty() {
        return Err(EngineError::Config("client_id must not be empty".into()));
    }
    if config.client_id.contains(['/', '\\']) {
        return Err(EngineError::Config(format!(
            "client_id {:?} must not contain path separators",
            config.client_id
        )));
    }
    if !known_handlers.contains(&config.handler.as_str()) {
        return Err(EngineError::Config(format!(
            "Unknown handler {:?} (available: {})",
            config.handler,
            known_handlers.join(", ")
        )));
    }
    PhoneNormalizer::new(&config.region)?;
    if let Some(test) = &config.test {
        if test.msisdn.trim().is_empty() {
            warn!("[config] test directive has no msisdn; no test message will be sent");
        }
    }
    if config.sidecar.api_key.trim().is_empty() {
        return Err(EngineError::Config("sidecar.api_key must be set to the bridge's key".into()));
    }
    if config.sidecar.request_timeout_secs == 0 {
        return Err(EngineError::Config("sidecar.request_timeout_secs must be > 0".into()));
    }
    if config.watchdog.enabled && config.watchdog.timeout_secs == 0 {
        return Err(EngineError::Config("watchdog.timeout_secs must be > 0".into()));
    }
    if config.browser.check_on_start {
        let version = check_browser_available(&config.browser.executable)?;
        info!("[config] Browser available: {}", version);
    }
    info!("[config] WhatsApp web {:?} configuration is valid", config.client_id);
    Ok(())
}

/// Runs `<executable> --version` and returns the reported version line.
pub fn check_browser_available(executable: &str) -> EngineResult<String> {
    let output = Command::new(executable)
        .arg("--version")
        .output()
        .map_err(|e| EngineError::Config(format!("{} is not available: {}", executable, e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() || !is_browser_version(&stdout) {
        return Err(EngineError::Config(format!(
            "{} is not a usable browser (got {:?})",
            executable, stdout
        )));
    }
    Ok(stdout)
}

fn is_browser_version(line: &str) -> bool {
    line.starts_with("Chromium") || line.starts_with("Google Chrome")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn offline(mut config: PluginConfig) -> PluginConfig {
        config.browser.check_on_start = false;
        config.sidecar.api_key = "bridge-key".into();
        config
    }

    #[test]
    fn parses_minimal_toml() {
        let config = PluginConfig::from_toml_str(
            r#"
            enabled = true
            client_id = "shop"
            handler = "default"

            [test]
            msisdn = "081234567890"
            "#,
        ).unwrap();
        assert!(config.enabled);
        assert_eq!(config.client_id, "shop");
        assert_eq!(config.region, "ID");
        assert_eq!(config.watchdog.timeout_secs, 60);
        assert_eq!(config.browser.args, vec!["--no-sandbox", "--disable-setuid-sandbox"]);
        assert_eq!(config.test.unwrap().delay_ms, 0);
    }

    #[test]
    fn load_returns_none_when_disabled() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "enabled = false\nclient_id = \"x\"").unwrap();
        assert!(load_config(file.path()).unwrap().is_none());
    }

    #[test]
    fn load_returns_config_when_enabled() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "enabled = true\nclient_id = \"x\"\n[watchdog]\nexit_process = true").unwrap();
        let config = load_config(file.path()).unwrap().unwrap();
        assert!(config.watchdog.exit_process);
        assert!(config.watchdog.enabled);
    }

    #[test]
    fn load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "enabled = [").unwrap();
        assert!(matches!(load_config(file.path()), Err(EngineError::ConfigParse(_))));
    }

    #[test]
    fn test_message_defaults_to_greeting() {
        let config = PluginConfig {
            client_id: "shop".into(),
            test: Some(TestDirective { msisdn: "0812".into(), message: None, delay_ms: 0 }),
            ..Default::default()
        };
        let (to, text) = config.test_message().unwrap();
        assert_eq!(to, "0812");
        assert_eq!(text, "Hello, WhatsApp Web client shop just got alive!");
    }

    #[test]
    fn test_message_uses_configured_text() {
        let config = PluginConfig {
            test: Some(TestDirective { msisdn: "0812".into(), message: Some("ping".into()), delay_ms: 5 }),
            ..Default::default()
        };
        assert_eq!(config.test_message().unwrap().1, "ping");
    }

    #[test]
    fn validate_rejects_unknown_handler() {
        let config = offline(PluginConfig { handler: "missing".into(), ..Default::default() });
        let err = validate_config(&config, &["default"]).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn validate_rejects_empty_client_id() {
        let config = offline(PluginConfig { client_id: " ".into(), ..Default::default() });
        assert!(validate_config(&config, &["default"]).is_err());
    }

    #[test]
    fn validate_rejects_bad_region() {
        let config = offline(PluginConfig { region: "XX1".into(), ..Default::default() });
        assert!(validate_config(&config, &["default"]).is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        let config = offline(PluginConfig::default());
        assert!(validate_config(&config, &["default"]).is_ok());
    }

    #[test]
    fn default_api_key_is_empty_and_rejected() {
        assert!(SidecarConfig::default().api_key.is_empty());
        let mut config = offline(PluginConfig::default());
        config.sidecar.api_key = String::new();
        let err = validate_config(&config, &["default"]).unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn missing_browser_is_config_error() {
        let err = check_browser_available("definitely-not-a-browser-binary").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn browser_version_prefixes() {
        assert!(is_browser_version("Chromium 120.0.6099.224 built on Debian"));
        assert!(is_browser_version("Google Chrome 121.0"));
        assert!(!is_browser_version("bash: chromium: not found"));
    }
}
