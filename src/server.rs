// src/server.rs

//! TCP transport for the tip service.
//!
//! Accepts connections, optionally wraps them in TLS, and serves framed
//! requests sequentially per connection. Each connection runs on its own
//! task; concurrent calls only share the tip store.

use std::sync::Arc;

use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

use crate::error::Result;
use crate::service::TipService;
use crate::wire::{Reply, Request, WireError, read_frame, write_frame};

/// Accept connections forever, dispatching each onto its own task.
pub async fn serve(
    listener: TcpListener,
    acceptor: Option<TlsAcceptor>,
    service: Arc<TipService>,
) -> Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                log::warn!("accept failed: {e}");
                continue;
            }
        };
        log::debug!("connection from {peer}");

        let service = Arc::clone(&service);
        let acceptor = acceptor.clone();
        tokio::spawn(async move {
            let result = match acceptor {
                Some(acceptor) => match acceptor.accept(stream).await {
                    Ok(tls) => handle_connection(tls, service).await,
                    Err(e) => {
                        log::warn!("TLS handshake with {peer} failed: {e}");
                        return;
                    }
                },
                None => handle_connection(stream, service).await,
            };
            if let Err(e) = result {
                log::warn!("connection {peer} ended with error: {e}");
            }
        });
    }
}

/// Serve framed requests on one connection until clean EOF.
pub async fn handle_connection<S>(mut stream: S, service: Arc<TipService>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(request) = read_frame::<_, Request>(&mut stream).await? {
        dispatch(request, &mut stream, &service).await?;
    }
    Ok(())
}

/// Run one request, writing its reply frame(s).
///
/// Failures of the operation itself are reported to the caller as an
/// `Error` frame with the kind intact; only transport failures propagate
/// out of here.
async fn dispatch<S>(request: Request, stream: &mut S, service: &TipService) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    match request {
        Request::CreateTip { url } => {
            let reply = match service.create_tip(&url).await {
                Ok(tip) => Reply::Tip { tip },
                Err(e) => {
                    log::warn!("create_tip({url}) failed: {e}");
                    Reply::Error {
                        error: WireError::from_app(&e),
                    }
                }
            };
            write_frame(stream, &reply).await
        }
        Request::DeleteTip { id } => {
            let reply = match service.delete_tip(&id).await {
                Ok(id) => Reply::Deleted { id },
                Err(e) => {
                    log::warn!("delete_tip({id}) failed: {e}");
                    Reply::Error {
                        error: WireError::from_app(&e),
                    }
                }
            };
            write_frame(stream, &reply).await
        }
        Request::AllTips => {
            let tips = service.all_tips().await;
            stream_tips(tips, stream).await
        }
        Request::SearchTips { title } => {
            let tips = service.search_tips(&title).await;
            stream_tips(tips, stream).await
        }
    }
}

/// Emit one `Tip` frame per record, then `End`; a mid-stream failure
/// emits a single `Error` frame and nothing further.
async fn stream_tips<S>(
    tips: Result<crate::store::TipStream>,
    stream: &mut S,
) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    let mut tips = match tips {
        Ok(tips) => tips,
        Err(e) => {
            log::warn!("scan failed: {e}");
            return write_frame(
                stream,
                &Reply::Error {
                    error: WireError::from_app(&e),
                },
            )
            .await;
        }
    };

    while let Some(item) = tips.next().await {
        match item {
            Ok(tip) => write_frame(stream, &Reply::Tip { tip }).await?,
            Err(e) => {
                log::warn!("scan aborted mid-stream: {e}");
                return write_frame(
                    stream,
                    &Reply::Error {
                        error: WireError::from_app(&e),
                    },
                )
                .await;
            }
        }
    }
    write_frame(stream, &Reply::End).await
}
