//! Native-messaging host
//!
//! The browser side talks to this process over stdin/stdout. Each frame is a
//! 32-bit little-endian length followed by that many bytes of UTF-8 JSON.
//! Every inbound frame gets exactly one reply frame, in order. Logs must go
//! to stderr; stdout carries only frames.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::messages::{Dispatcher, InboundMessage, MessageResponse};
use crate::sync::{SyncEngine, SyncNotifier};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Largest frame accepted from the browser
pub const MAX_INBOUND_FRAME: u32 = 64 * 1024 * 1024;

/// Largest frame the browser accepts from a host
pub const MAX_OUTBOUND_FRAME: usize = 1024 * 1024;

/// Read one frame; `None` at end of input
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let len = match reader.read_u32_le().await {
        Ok(len) => len,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if len > MAX_INBOUND_FRAME {
        return Err(Error::Parse(format!(
            "frame of {len} bytes exceeds {MAX_INBOUND_FRAME}"
        )));
    }
    let mut body = vec![0; len as usize];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Write one frame holding `value` as JSON
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(value)?;
    if body.len() > MAX_OUTBOUND_FRAME {
        return Err(Error::Internal(format!(
            "reply of {} bytes exceeds {MAX_OUTBOUND_FRAME}",
            body.len()
        )));
    }
    let len = u32::try_from(body.len())
        .map_err(|_| Error::Internal("reply length overflows u32".to_string()))?;
    writer.write_u32_le(len).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Answer frames from `reader` on `writer` until end of input, then wait
/// for in-flight syncs
pub async fn serve<R, W>(dispatcher: &Dispatcher, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = read_frame(&mut reader).await? {
        let response = match serde_json::from_slice::<InboundMessage>(&frame) {
            Ok(message) => {
                debug!(?message, "message received");
                dispatcher.handle(message).await
            }
            Err(e) => {
                warn!(error = %e, "unreadable message");
                MessageResponse::error(format!("unreadable message: {e}"))
            }
        };
        write_frame(&mut writer, &response).await?;
    }
    debug!("input closed, waiting for in-flight syncs");
    dispatcher.wait_idle().await;
    Ok(())
}

/// Run as the browser's native-messaging host on stdin/stdout
///
/// Starts the credential watcher and drains anything queued by an earlier
/// run before reading messages.
pub async fn run_host(config: &Config, notifier: Arc<dyn SyncNotifier>) -> Result<()> {
    let engine = Arc::new(SyncEngine::from_config(config)?.with_notifier(notifier));
    let watcher = engine.watch_credentials();

    match engine.drain_with_stored_credentials().await {
        Ok(Some(report)) => info!(synced = report.synced, pending = report.pending, "startup drain finished"),
        Ok(None) => debug!("not connected, skipping startup drain"),
        Err(e) => warn!(error = %e, "startup drain failed"),
    }

    let dispatcher = Dispatcher::new(Arc::clone(&engine), config.min_code_len);
    info!("native-messaging host ready");
    let result = serve(&dispatcher, tokio::io::stdin(), tokio::io::stdout()).await;
    watcher.abort();
    result
}
