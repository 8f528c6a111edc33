//! Capture path: host notifications in, history entries out.
//!
//! The interception host hands over each completed transaction as raw bytes plus the
//! destination service. [`CaptureAdapter`] turns that into a [`CaptureEntry`] and appends
//! it to the shared [`HistoryStore`]. Nothing here is async; the host may call in from
//! any thread.

use crate::history::{CaptureEntry, HistoryStore};
use crate::serde_helpers::base64_bytes_opt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Destination of an intercepted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub host: String,
    pub port: u16,
    pub protocol: String,
}

impl ServiceDescriptor {
    pub fn new(host: impl Into<String>, port: u16, protocol: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            protocol: protocol.into(),
        }
    }
}

/// What the interception host exposes for one transaction.
///
/// Byte buffers are opaque; no particular encoding is assumed.
pub trait MessageInfo {
    fn request(&self) -> Option<&[u8]>;
    fn response(&self) -> Option<&[u8]>;
    fn http_service(&self) -> &ServiceDescriptor;
}

/// Owned transaction record, used by hosts without their own message type and by the
/// offline import format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptedMessage {
    #[serde(flatten)]
    pub service: ServiceDescriptor,
    #[serde(with = "base64_bytes_opt", default)]
    pub request: Option<Vec<u8>>,
    #[serde(with = "base64_bytes_opt", default)]
    pub response: Option<Vec<u8>>,
}

impl MessageInfo for InterceptedMessage {
    fn request(&self) -> Option<&[u8]> {
        self.request.as_deref()
    }

    fn response(&self) -> Option<&[u8]> {
        self.response.as_deref()
    }

    fn http_service(&self) -> &ServiceDescriptor {
        &self.service
    }
}

/// Receives completed-transaction callbacks and records them.
#[derive(Debug, Clone)]
pub struct CaptureAdapter {
    history: Arc<HistoryStore>,
}

impl CaptureAdapter {
    pub fn new(history: Arc<HistoryStore>) -> Self {
        Self { history }
    }

    /// Host callback. Request-phase notifications carry no response yet and are ignored.
    pub fn process_proxy_message(
        &self,
        message_is_request: bool,
        message: &dyn MessageInfo,
    ) -> Option<usize> {
        if message_is_request {
            return None;
        }
        self.capture(message)
    }

    /// Record one transaction. Returns the assigned index, or `None` when the
    /// transaction has no completed response.
    pub fn capture(&self, message: &dyn MessageInfo) -> Option<usize> {
        let (request, response) = match (message.request(), message.response()) {
            (Some(req), Some(resp)) => (req, resp),
            _ => {
                debug!(
                    host = %message.http_service().host,
                    "skipping transaction without a completed response"
                );
                return None;
            }
        };

        let entry = build_entry(request, response, message.http_service());
        let method = entry.method.clone();
        let host = entry.host.clone();
        let index = self.history.append(entry);
        debug!(index, %host, %method, "captured transaction");
        Some(index)
    }
}

/// Build an entry from raw bytes. Metadata that cannot be parsed is left empty; the
/// entry itself is always produced.
pub fn build_entry(request: &[u8], response: &[u8], service: &ServiceDescriptor) -> CaptureEntry {
    let request_headers = head_lines(request);
    let response_headers = head_lines(response);

    let mut request_line = request_headers
        .first()
        .map(|l| l.split_whitespace())
        .into_iter()
        .flatten();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default();

    let url = resolve_url(target, service).unwrap_or_else(|| {
        if !request.is_empty() {
            warn!(host = %service.host, request_target = target, "could not resolve request URL");
        }
        String::new()
    });

    let status_code = response_headers
        .first()
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok())
        .unwrap_or(0);

    CaptureEntry {
        index: 0,
        host: service.host.clone(),
        port: service.port,
        protocol: service.protocol.clone(),
        request_text: String::from_utf8_lossy(request).into_owned(),
        response_length: response.len(),
        request_raw: request.to_vec(),
        response_raw: response.to_vec(),
        method,
        url,
        request_headers,
        status_code: Some(status_code),
        response_headers,
    }
}

/// Lines of the header block, first line included, up to the first blank line.
fn head_lines(message: &[u8]) -> Vec<String> {
    let head_end = find_subslice(message, b"\r\n\r\n")
        .or_else(|| find_subslice(message, b"\n\n"))
        .unwrap_or(message.len());
    String::from_utf8_lossy(&message[..head_end])
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .take_while(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Full URL for a request target: absolute-form targets are kept, origin-form targets
/// are joined onto the service's scheme, host and port.
fn resolve_url(target: &str, service: &ServiceDescriptor) -> Option<String> {
    if target.is_empty() {
        return None;
    }
    if let Ok(absolute) = Url::parse(target) {
        if absolute.has_host() {
            return Some(absolute.to_string());
        }
    }

    let host = if service.host.contains(':') && !service.host.starts_with('[') {
        format!("[{}]", service.host)
    } else {
        service.host.clone()
    };
    let base = format!("{}://{}:{}", service.protocol, host, service.port);
    let resolved = if target.starts_with('/') {
        Url::parse(&format!("{}{}", base, target))
    } else {
        // authority-form (CONNECT) and asterisk-form carry no path of their own
        Url::parse(&base)
    };
    resolved.ok().map(|u| u.to_string())
}
