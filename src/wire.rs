// src/wire.rs

//! Framed wire protocol for the tip service.
//!
//! Every message travels as one frame: a u32 big-endian payload length
//! followed by a JSON payload. Unary operations answer with a single
//! reply frame; streaming operations emit zero or more `Tip` frames and
//! terminate with `End`, or with a single `Error` frame on failure.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{AppError, Result};
use crate::models::Tip;

/// Maximum frame size accepted on either side (64 KiB).
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// A client request, one per operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Bookmark a page; the service extracts the preview metadata.
    CreateTip { url: String },
    /// Remove a tip by its store-assigned identifier.
    DeleteTip { id: String },
    /// Stream every stored tip.
    AllTips,
    /// Stream tips whose title contains the substring, case-insensitively.
    SearchTips { title: String },
}

/// A server reply frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum Reply {
    /// A single tip, either a unary result or one stream element.
    Tip { tip: Tip },
    /// Deletion confirmation echoing the removed identifier.
    Deleted { id: String },
    /// Normal end-of-stream marker.
    End,
    /// Terminal failure; nothing follows on this call.
    Error { error: WireError },
}

/// Failure kinds surfaced to callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller-supplied input is malformed; never retried
    InvalidArgument,
    /// Storage failure or unexpected backend condition
    Internal,
    /// Preview fetch/parse failed during creation
    Extraction,
    /// Pre-check against the URL returned a non-success response
    Unreachable,
    /// The operation's time bound elapsed
    Timeout,
}

/// An error as carried on the wire, kind intact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireError {
    pub kind: ErrorKind,
    pub message: String,
}

impl WireError {
    /// Map an application error onto its wire kind, keeping the message.
    pub fn from_app(err: &AppError) -> Self {
        let kind = match err {
            AppError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AppError::Extraction(_) => ErrorKind::Extraction,
            // The extractor is the only HTTP consumer on the service side,
            // so transport-level fetch failures are extraction failures.
            AppError::Http(_) => ErrorKind::Extraction,
            AppError::Selector { .. } => ErrorKind::Extraction,
            AppError::Unreachable(_) => ErrorKind::Unreachable,
            AppError::Timeout { .. } => ErrorKind::Timeout,
            _ => ErrorKind::Internal,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<WireError> for AppError {
    fn from(err: WireError) -> Self {
        match err.kind {
            ErrorKind::InvalidArgument => AppError::InvalidArgument(err.message),
            ErrorKind::Internal => AppError::Internal(err.message),
            ErrorKind::Extraction => AppError::Extraction(err.message),
            ErrorKind::Unreachable => AppError::Unreachable(err.message),
            ErrorKind::Timeout => AppError::Timeout {
                operation: err.message,
            },
        }
    }
}

/// Write one length-prefixed JSON frame.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = serde_json::to_vec(message)?;
    if payload.len() > MAX_FRAME_BYTES {
        return Err(AppError::protocol(format!(
            "frame exceeds max: {} > {}",
            payload.len(),
            MAX_FRAME_BYTES
        )));
    }
    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed JSON frame.
///
/// Returns `Ok(None)` if the stream ends cleanly before the length prefix.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];

    // Read the first chunk separately to detect clean EOF.
    let n = reader.read(&mut len_buf).await?;
    if n == 0 {
        return Ok(None);
    }
    if n < 4 {
        reader.read_exact(&mut len_buf[n..]).await?;
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(AppError::protocol(format!(
            "frame exceeds max: {} > {}",
            len, MAX_FRAME_BYTES
        )));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(serde_json::from_slice(&payload)?))
}
