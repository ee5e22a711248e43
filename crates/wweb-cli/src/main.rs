//! wweb - WhatsApp Web session runner
//!
//! Hosts one plugin session backed by the sidecar browser bridge.

use clap::Parser;
use log::{error, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wweb_plugin::atoms::types::MessageMedia;
use wweb_plugin::{
    bootstrap, load_config, normalize, validate_config, Content, EngineError, EngineResult,
    PluginConfig, SendOptions, SessionHandle, SidecarDriver,
};

mod cli;
mod handlers;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> EngineResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run(&config).await,
        Commands::Check { config } => check(&config),
        Commands::Send { config, msisdn, text, media } => {
            send(&config, &msisdn, text, media.as_deref()).await
        }
        Commands::Normalize { msisdn, region } => {
            let normalized = normalize(&msisdn, &region)?;
            if !normalized.valid_for_region {
                warn!("{} is not a valid number for region {}", msisdn, region);
            }
            println!("{}", normalized.address);
            Ok(())
        }
    }
}

fn enabled_config(path: &Path) -> EngineResult<Option<PluginConfig>> {
    let config = load_config(path)?;
    if config.is_none() {
        info!("Nothing to do: plugin disabled in {}", path.display());
    }
    Ok(config)
}

async fn start(config: &PluginConfig) -> EngineResult<SessionHandle> {
    let handler = handlers::resolve(&config.handler)
        .ok_or_else(|| EngineError::Config(format!("Unknown handler {:?}", config.handler)))?;
    let driver = Arc::new(SidecarDriver::new(&config.sidecar, &config.browser)?);
    bootstrap(config, handlers::HANDLER_NAMES, handler, driver)
        .await
        .ok_or_else(|| EngineError::Other("WhatsApp web not bootstrapped".into()))
}

async fn run(path: &Path) -> EngineResult<()> {
    let Some(config) = enabled_config(path)? else { return Ok(()) };
    let handle = start(&config).await?;

    tokio::signal::ctrl_c().await?;
    info!("Interrupted, stopping {}", handle.client_id());
    handle.shutdown().await
}

fn check(path: &Path) -> EngineResult<()> {
    let Some(mut config) = enabled_config(path)? else { return Ok(()) };
    validate_config(&config, handlers::HANDLER_NAMES)?;
    config.sidecar.api_key = "<redacted>".into();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

async fn send(path: &Path, msisdn: &str, text: String, media: Option<&Path>) -> EngineResult<()> {
    let Some(config) = enabled_config(path)? else { return Ok(()) };

    let (content, options) = match media {
        Some(file) => {
            let bytes = std::fs::read(file)?;
            let filename = file.file_name().map(|n| n.to_string_lossy().to_string());
            let media = MessageMedia::from_bytes(guess_mimetype(file), &bytes, filename);
            (Content::Media(media), SendOptions { caption: Some(text), ..Default::default() })
        }
        None => (Content::Text(text), SendOptions::default()),
    };

    let handle = start(&config).await?;
    let result = match wait_until_ready(&handle, Duration::from_secs(config.watchdog.timeout_secs)).await {
        Ok(()) => handle.send(msisdn, content, options).await,
        Err(e) => Err(e),
    };
    if let Err(e) = handle.shutdown().await {
        error!("Shutdown failed: {}", e);
    }

    let outcome = result?;
    println!("{}", outcome.as_str());
    Ok(())
}

async fn wait_until_ready(handle: &SessionHandle, timeout: Duration) -> EngineResult<()> {
    let mut status = handle.subscribe();
    let wait = async {
        loop {
            if status.borrow_and_update().ready {
                return Ok::<(), EngineError>(());
            }
            status.changed().await
                .map_err(|_| EngineError::Other("session stopped before ready".into()))?;
        }
    };
    tokio::time::timeout(timeout, wait)
        .await
        .map_err(|_| EngineError::LifecycleTimeout(timeout.as_secs()))?
}

fn guess_mimetype(file: &Path) -> &'static str {
    let ext = file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mimetype_from_extension() {
        assert_eq!(guess_mimetype(Path::new("a/photo.JPG")), "image/jpeg");
        assert_eq!(guess_mimetype(Path::new("doc.pdf")), "application/pdf");
        assert_eq!(guess_mimetype(Path::new("blob")), "application/octet-stream");
    }

    #[test]
    fn cli_parses_send_with_media() {
        let cli = Cli::try_parse_from(["wweb", "send", "0812", "hi", "--media", "x.png"]).unwrap();
        match cli.command {
            Commands::Send { msisdn, media, .. } => {
                assert_eq!(msisdn, "0812");
                assert_eq!(media.unwrap(), Path::new("x.png"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
