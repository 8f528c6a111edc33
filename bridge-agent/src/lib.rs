//! Bridge Agent
//!
//! Standalone host for the capture history API. Optionally seeds the history from a
//! JSONL file of previously intercepted transactions before serving.

use anyhow::Context as _;
use bridge_core::config::{DEFAULT_MAX_HISTORY, DEFAULT_PORT, LOOPBACK};
use bridge_core::{BridgeConfig, BridgeContext, BridgeServer, CaptureAdapter, InterceptedMessage};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::io::AsyncBufReadExt;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Loopback address to serve the history API on
    #[arg(long, env = "BRIDGE_LISTEN_ADDR", default_value = LOOPBACK)]
    pub listen_addr: String,

    /// Port to serve the history API on
    #[arg(long, env = "BRIDGE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Number of transactions retained before the oldest are evicted
    #[arg(long, env = "BRIDGE_MAX_HISTORY", default_value_t = DEFAULT_MAX_HISTORY)]
    pub max_history: usize,

    /// JSONL file of intercepted transactions to capture at startup
    #[arg(long)]
    pub import: Option<PathBuf>,
}

impl Args {
    pub fn to_config(&self) -> BridgeConfig {
        BridgeConfig {
            listen_address: self.listen_addr.clone(),
            listen_port: self.port,
            max_history: self.max_history,
            ..Default::default()
        }
    }
}

/// Validate the arguments and create the context the agent will serve.
pub fn build_context(args: &Args) -> anyhow::Result<BridgeContext> {
    let config = args.to_config();
    config.validate()?;
    Ok(BridgeContext::new(config))
}

/// Import captures, bind the API listener and serve until the context is shut down.
pub async fn run_agent(args: Args, context: BridgeContext) -> anyhow::Result<()> {
    tracing::info!("Starting Bridge Agent...");
    tracing::info!("  Listen:  {}:{}", args.listen_addr, args.port);
    tracing::info!("  History: {} entries", args.max_history);

    if let Some(path) = &args.import {
        let imported = load_import(path, &context.capture_adapter()).await?;
        tracing::info!("Imported {} captures from {}", imported, path.display());
    }

    let server = BridgeServer::bind(context)
        .await
        .context("history API could not be started")?;
    server.log_banner();
    server.run().await?;
    Ok(())
}

/// Feed every well-formed line of a JSONL capture file through the adapter.
///
/// Blank lines are skipped and malformed lines are logged and skipped. Returns the
/// number of entries appended.
pub async fn load_import<P: AsRef<Path>>(path: P, adapter: &CaptureAdapter) -> anyhow::Result<usize> {
    let path = path.as_ref();
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open import file {}", path.display()))?;
    let mut lines = tokio::io::BufReader::new(file).lines();
    let mut line_num = 0;
    let mut imported = 0;

    while let Some(line) = lines.next_line().await? {
        line_num += 1;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<InterceptedMessage>(&line) {
            Ok(message) => {
                if adapter.process_proxy_message(false, &message).is_some() {
                    imported += 1;
                }
            }
            Err(e) => {
                tracing::warn!(line = line_num, error = %e, "failed to parse capture record, skipping");
            }
        }
    }

    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["bridge-agent"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_cli_overrides_defaults() {
        let parsed = args(&["--port", "9100", "--max-history", "5", "--import", "caps.jsonl"]);
        assert_eq!(parsed.port, 9100);
        assert_eq!(parsed.max_history, 5);
        assert_eq!(parsed.import, Some(PathBuf::from("caps.jsonl")));

        let config = parsed.to_config();
        assert_eq!(config.listen_port, 9100);
        assert_eq!(config.max_history, 5);
        assert_eq!(config.max_header_bytes, BridgeConfig::default().max_header_bytes);
    }

    #[test]
    fn test_non_loopback_address_is_rejected() {
        let parsed = args(&["--listen-addr", "0.0.0.0"]);
        assert!(build_context(&parsed).is_err());

        let parsed = args(&["--listen-addr", "::1", "--port", "0"]);
        assert!(build_context(&parsed).is_ok());
    }

    #[tokio::test]
    async fn test_load_import_skips_bad_lines() {
        let mut file = NamedTempFile::new().unwrap();
        // "GET / HTTP/1.1\r\n\r\n" and "HTTP/1.1 200 OK\r\n\r\n"
        writeln!(
            file,
            r#"{{"host":"a.test","port":80,"protocol":"http","request":"R0VUIC8gSFRUUC8xLjENCg0K","response":"SFRUUC8xLjEgMjAwIE9LDQoNCg=="}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(
            file,
            r#"{{"host":"b.test","port":80,"protocol":"http","request":"R0VUIC8gSFRUUC8xLjENCg0K","response":null}}"#
        )
        .unwrap();
        file.flush().unwrap();

        let context = BridgeContext::new(BridgeConfig::default());
        let imported = load_import(file.path(), &context.capture_adapter()).await.unwrap();

        assert_eq!(imported, 1);
        let entry = context.history().get_by_index(0).unwrap();
        assert_eq!(entry.host, "a.test");
        assert_eq!(entry.url, "http://a.test/");
        assert_eq!(entry.status_code, Some(200));
    }

    #[tokio::test]
    async fn test_load_import_missing_file_fails() {
        let context = BridgeContext::new(BridgeConfig::default());
        let result = load_import("/nonexistent/captures.jsonl", &context.capture_adapter()).await;
        assert!(result.is_err());
    }
}
