// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Stdio server loop.
//!
//! The host talks to the provider over stdin/stdout using length-prefixed
//! framing (4-byte LE + JSON payload). Requests are processed one at a time;
//! a separate reader task keeps draining input so a `stop` frame cancels
//! the operation currently running.

use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::handler::ProviderHandler;
use super::protocol::{
    decode_message, encode_message, error_codes, Envelope, Message, ProtocolError, RequestId,
    MAX_MESSAGE_SIZE,
};

/// Frames buffered between the reader task and the dispatch loop.
const PENDING_FRAMES: usize = 16;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Read a length-prefixed frame from an async reader.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ServerError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;

    let frame_len = u32::from_le_bytes(len_buf) as usize;
    if frame_len > MAX_MESSAGE_SIZE {
        return Err(ServerError::FrameTooLarge {
            size: frame_len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buf = vec![0u8; frame_len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Write a length-prefixed frame to an async writer.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, data: &[u8]) -> Result<(), ServerError> {
    let len = u32::try_from(data.len()).map_err(|_| ServerError::FrameTooLarge {
        size: data.len(),
        max: MAX_MESSAGE_SIZE,
    })?;
    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

fn is_stop_frame(bytes: &[u8]) -> bool {
    matches!(
        decode_message(bytes),
        Ok(Envelope {
            message: Message::Stop,
            ..
        })
    )
}

/// Serve requests until the input closes or a `stop` request is answered.
pub async fn serve<R, W>(mut reader: R, mut writer: W, handler: Arc<ProviderHandler>) -> Result<(), ServerError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(PENDING_FRAMES);
    let ctx = handler.context().clone();

    let reader_task = tokio::spawn(async move {
        loop {
            let frame = match read_frame(&mut reader).await {
                Ok(frame) => frame,
                Err(ServerError::Io(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    debug!("Input closed");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Failed to read request frame");
                    break;
                }
            };
            let stop = is_stop_frame(&frame);
            if stop {
                ctx.cancel();
            }
            if tx.send(frame).await.is_err() || stop {
                break;
            }
        }
    });

    while let Some(frame) = rx.recv().await {
        let stop = is_stop_frame(&frame);
        let response = match handler.process(&frame).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to encode response");
                encode_message(&Envelope::new(
                    RequestId::default(),
                    Message::error(error_codes::INTERNAL, e.to_string()),
                ))?
            }
        };
        write_frame(&mut writer, &response).await?;
        if stop {
            info!("Provider stopped");
            break;
        }
    }

    reader_task.abort();
    Ok(())
}

/// Serve on the process's stdin and stdout.
pub async fn run_stdio(handler: Arc<ProviderHandler>) -> Result<(), ServerError> {
    info!("Provider serving on stdio");
    serve(tokio::io::stdin(), tokio::io::stdout(), handler).await
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
