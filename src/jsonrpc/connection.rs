//! Per-connection serve loop shared by the TCP and stdio servers

use log::{debug, warn};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

use super::context::Context;
use super::error::{CodecError, TransportError};
use super::framing::{read_frame, write_frame, Framing, DEFAULT_MAX_FRAME_LEN};
use super::invoker::Invoker;
use super::types::{ErrorCode, Response, RpcError};

/// Transport-side settings for one connection
#[derive(Debug, Clone, Copy)]
pub struct ServeOptions {
    pub framing: Framing,
    /// Deadline placed on the context of every message
    pub timeout: Option<Duration>,
    /// Largest accepted message body; longer frames close the connection
    pub max_frame_len: usize,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            framing: Framing::Lines,
            timeout: None,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// Serve framed messages until EOF, returning how many were handled
///
/// Each message is dispatched on the blocking pool with its own child of the
/// connection context, so a handler cancelling its context only affects its
/// own call. The connection context is cancelled however the loop exits.
/// Payloads that cannot be decoded are answered with a parse-error object
/// and the loop continues.
pub async fn serve_connection<R, W>(
    invoker: Invoker,
    reader: R,
    mut writer: W,
    options: ServeOptions,
) -> Result<usize, TransportError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let connection_ctx = Context::background();
    let _cancel_on_exit = connection_ctx.cancel_handle().drop_guard();
    let mut handled = 0usize;

    while let Some(frame) = read_frame(&mut reader, options.framing, options.max_frame_len).await? {
        debug!("Received {} byte message", frame.len());

        let ctx = match options.timeout {
            Some(timeout) => connection_ctx.with_timeout(timeout),
            None => connection_ctx.child(),
        };
        let invoker = invoker.clone();
        let reply = tokio::task::spawn_blocking(move || invoker.handle_bytes(&ctx, &frame)).await?;

        let bytes = match reply {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Rejected message: {}", err);
                serde_json::to_vec(&rejection(&err))?
            }
        };

        write_frame(&mut writer, options.framing, &bytes).await?;
        handled += 1;
    }

    debug!("Connection closed after {} message(s)", handled);
    Ok(handled)
}

/// Reply for a payload that never reached dispatch
pub fn rejection(err: &CodecError) -> Response {
    let code = match err {
        CodecError::Encode(_) => ErrorCode::InternalError,
        CodecError::Empty | CodecError::Malformed(_) => ErrorCode::ParseError,
    };
    Response::uncorrelated(RpcError::new(code.code(), err.to_string(), None))
}
