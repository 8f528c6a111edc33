//! Inbound API request framing
//!
//! Only the header block is read. Request bodies are never consumed; every route is a
//! bodiless GET or OPTIONS.

use crate::error::BridgeError;
use crate::Result;
use tokio::io::{AsyncRead, AsyncReadExt};

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const READ_CHUNK: usize = 1024;

/// Method and path taken from the request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub path: String,
    pub version: Option<String>,
}

/// Read from `reader` until the end of the header block.
///
/// Returns the bytes up to and including CR LF CR LF. Anything read past the terminator
/// is dropped. EOF before the terminator, or a head larger than `max_bytes`, is a
/// malformed request.
pub async fn read_request_head<R>(reader: &mut R, max_bytes: usize) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut head = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(BridgeError::MalformedRequest(format!(
                "connection closed after {} bytes without end of headers",
                head.len()
            )));
        }

        // The terminator may straddle the previous chunk boundary.
        let scan_from = head.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
        head.extend_from_slice(&chunk[..n]);

        if let Some(pos) = head[scan_from..]
            .windows(HEADER_TERMINATOR.len())
            .position(|w| w == HEADER_TERMINATOR)
        {
            head.truncate(scan_from + pos + HEADER_TERMINATOR.len());
            return Ok(head);
        }

        if head.len() > max_bytes {
            return Err(BridgeError::MalformedRequest(format!(
                "header block exceeds {} bytes",
                max_bytes
            )));
        }
    }
}

/// Split the first line of `head` into `METHOD SP PATH [SP VERSION]`.
pub fn parse_request_line(head: &[u8]) -> Result<RequestLine> {
    let text = String::from_utf8_lossy(head);
    let first = text.split("\r\n").next().unwrap_or_default();
    let mut parts = first.split(' ');

    match (parts.next(), parts.next()) {
        (Some(method), Some(path)) => Ok(RequestLine {
            method: method.to_string(),
            path: path.to_string(),
            version: parts.next().map(str::to_string),
        }),
        _ => Err(BridgeError::MalformedRequest(format!(
            "request line has fewer than two tokens: {:?}",
            first
        ))),
    }
}
