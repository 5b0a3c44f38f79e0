// src/client.rs

//! Tip client adapter.
//!
//! Consumes the tip service over the network and applies the
//! display-oriented post-processing every consumer must reproduce:
//! streams are drained fully, the list-all view is reversed so the
//! newest tip comes first, and title/description are truncated at
//! character boundaries for display. Stored records are never mutated.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;

use crate::error::{AppError, Result};
use crate::models::{ClientConfig, Tip};
use crate::tls;
use crate::wire::{Reply, Request, read_frame, write_frame};

/// Display limit for tip titles, in characters.
const TITLE_DISPLAY_CHARS: usize = 50;

/// Display limit for tip descriptions, in characters.
const DESCRIPTION_DISPLAY_CHARS: usize = 150;

/// Marker appended when a field was shortened for display.
const ELLIPSIS: char = '…';

/// Boxed duplex connection, plaintext or TLS.
trait Connection: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Connection for T {}

/// Client adapter for the tip service.
pub struct TipClient {
    host: String,
    port: u16,
    tls: Option<(TlsConnector, ServerName<'static>)>,
    unary_timeout: Duration,
    stream_timeout: Duration,
}

impl TipClient {
    /// Create a client for the configured target.
    ///
    /// Debug mode dials plaintext; otherwise the connection is TLS with
    /// trust anchored at the configured CA certificate.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let tls = if config.debug {
            None
        } else {
            let connector = tls::connector(&config.ca_file)?;
            let name = ServerName::try_from(config.host.clone())
                .map_err(|_| AppError::config(format!("invalid TLS host name: {}", config.host)))?;
            Some((connector, name))
        };
        Ok(Self {
            host: config.host.clone(),
            port: config.port,
            tls,
            unary_timeout: Duration::from_secs(config.unary_timeout_secs),
            stream_timeout: Duration::from_secs(config.stream_timeout_secs),
        })
    }

    async fn connect(&self) -> Result<Box<dyn Connection>> {
        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        match &self.tls {
            None => Ok(Box::new(stream)),
            Some((connector, name)) => {
                let tls = connector.connect(name.clone(), stream).await?;
                Ok(Box::new(tls))
            }
        }
    }

    /// Bookmark a page and return the stored tip, id included.
    pub async fn create_tip(&self, url: &str) -> Result<Tip> {
        let request = Request::CreateTip {
            url: url.to_string(),
        };
        let reply = timeout(self.unary_timeout, self.unary(request))
            .await
            .map_err(|_| AppError::timeout("create_tip"))??;
        match reply {
            Reply::Tip { tip } => Ok(tip),
            Reply::Error { error } => Err(error.into()),
            other => Err(AppError::protocol(format!(
                "unexpected reply to create_tip: {other:?}"
            ))),
        }
    }

    /// Delete a tip by id; returns the echoed id on success.
    pub async fn delete_tip(&self, id: &str) -> Result<String> {
        let request = Request::DeleteTip { id: id.to_string() };
        let reply = timeout(self.unary_timeout, self.unary(request))
            .await
            .map_err(|_| AppError::timeout("delete_tip"))??;
        match reply {
            Reply::Deleted { id } => Ok(id),
            Reply::Error { error } => Err(error.into()),
            other => Err(AppError::protocol(format!(
                "unexpected reply to delete_tip: {other:?}"
            ))),
        }
    }

    /// Fetch every tip, newest first, shaped for display.
    pub async fn all_tips(&self) -> Result<Vec<Tip>> {
        let mut tips = timeout(self.stream_timeout, self.drain(Request::AllTips))
            .await
            .map_err(|_| AppError::timeout("all_tips"))??;
        // The store yields oldest-first insertion order; the list view
        // presents the most recently created tip first.
        tips.reverse();
        Ok(tips.into_iter().map(shape_for_display).collect())
    }

    /// Fetch tips matching the title substring, shaped for display.
    ///
    /// Search results stay in store scan order; only the list-all view
    /// is reversed. An empty substring fetches every tip.
    pub async fn search_tips(&self, title: &str) -> Result<Vec<Tip>> {
        let request = Request::SearchTips {
            title: title.to_string(),
        };
        let tips = timeout(self.stream_timeout, self.drain(request))
            .await
            .map_err(|_| AppError::timeout("search_tips"))??;
        Ok(tips.into_iter().map(shape_for_display).collect())
    }

    /// Bounded readiness probe: try a cheap call until the service
    /// answers, failing fast once the attempt budget is exhausted.
    pub async fn wait_ready(&self, attempts: u32, delay: Duration) -> Result<()> {
        for attempt in 1..=attempts {
            let probe = timeout(self.unary_timeout, self.drain(Request::AllTips))
                .await
                .map_err(|_| AppError::timeout("readiness probe"))
                .and_then(|result| result);
            match probe {
                Ok(_) => return Ok(()),
                Err(e) => {
                    log::debug!("readiness probe {attempt}/{attempts} failed: {e}");
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        Err(AppError::internal(format!(
            "tip service not ready after {attempts} attempts"
        )))
    }

    async fn unary(&self, request: Request) -> Result<Reply> {
        let mut conn = self.connect().await?;
        write_frame(&mut conn, &request).await?;
        read_frame::<_, Reply>(&mut conn)
            .await?
            .ok_or_else(|| AppError::protocol("connection closed before reply"))
    }

    /// Drain a response stream fully, preserving arrival order.
    ///
    /// Any stream error discards the partial results and fails the call.
    async fn drain(&self, request: Request) -> Result<Vec<Tip>> {
        let mut conn = self.connect().await?;
        write_frame(&mut conn, &request).await?;

        let mut tips = Vec::new();
        loop {
            match read_frame::<_, Reply>(&mut conn).await? {
                Some(Reply::Tip { tip }) => tips.push(tip),
                Some(Reply::End) => return Ok(tips),
                Some(Reply::Error { error }) => return Err(error.into()),
                Some(other) => {
                    return Err(AppError::protocol(format!(
                        "unexpected frame in stream: {other:?}"
                    )));
                }
                None => {
                    return Err(AppError::protocol(
                        "stream closed without end-of-stream marker",
                    ));
                }
            }
        }
    }
}

/// Apply the display truncation rules to one tip.
fn shape_for_display(mut tip: Tip) -> Tip {
    tip.title = truncate_chars(&tip.title, TITLE_DISPLAY_CHARS);
    tip.description = truncate_chars(&tip.description, DESCRIPTION_DISPLAY_CHARS);
    tip
}

/// Truncate to `max_chars` characters, appending a single ellipsis when
/// shortened. Counts whole characters, never splitting a multi-byte
/// encoding.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            let mut shortened = text[..byte_index].to_string();
            shortened.push(ELLIPSIS);
            shortened
        }
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        let text = "a".repeat(50);
        assert_eq!(truncate_chars(&text, 50), text);
        assert_eq!(truncate_chars("", 50), "");
    }

    #[test]
    fn test_truncate_long_ascii() {
        let text = "a".repeat(60);
        let shown = truncate_chars(&text, 50);
        assert_eq!(shown.chars().count(), 51);
        assert!(shown.starts_with(&"a".repeat(50)));
        assert!(shown.ends_with('…'));
    }

    #[test]
    fn test_truncate_multibyte_at_char_boundary() {
        let text = "도".repeat(60);
        let shown = truncate_chars(&text, 50);
        assert_eq!(shown.chars().count(), 51);
        assert!(shown.starts_with(&"도".repeat(50)));
        assert!(shown.ends_with('…'));
    }

    #[test]
    fn test_shape_for_display_limits() {
        let tip = Tip {
            id: "65a1b2c3d4e5f6a7b8c9d0e1".to_string(),
            title: "t".repeat(80),
            url: "https://example.com/".to_string(),
            description: "d".repeat(200),
            image: String::new(),
        };
        let shown = shape_for_display(tip);
        assert_eq!(shown.title.chars().count(), 51);
        assert_eq!(shown.description.chars().count(), 151);
    }
}
