//! Async log pumps for the child's stdout/stderr (non-UTF8-safe).
//!
//! Gateways can emit non-UTF8 bytes and may write a fatal message without
//! a trailing newline before hanging. The pump therefore reads raw chunks:
//! bytes go to the log file as soon as they arrive, and a lossy decode
//! feeds tracing and the tail. A multibyte sequence split across two reads
//! is held back until the rest of it arrives.

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::debug;

use super::tail::TailBuffer;

/// Bytes read from the pipe per iteration.
const CHUNK_SIZE: usize = 8 * 1024;

/// Copy `stream` into `log` chunk by chunk, optionally mirroring into `tail`.
///
/// The task ends at EOF (child closed the pipe) or on a read error.
pub fn spawn_log_pump(
    mut stream: impl AsyncRead + Unpin + Send + 'static,
    mut log: File,
    stream_type: &'static str,
    tail: Option<TailBuffer>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut chunk = [0u8; CHUNK_SIZE];
        let mut pending: Vec<u8> = Vec::new();
        let mut log_ok = true;

        loop {
            let n = match stream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    debug!(%stream_type, error = %e, "log pump exiting due to read error");
                    break;
                }
            };

            if log_ok {
                if let Err(e) = write_chunk(&mut log, &chunk[..n]).await {
                    debug!(%stream_type, error = %e, "log file write failed, continuing without file");
                    log_ok = false;
                }
            }

            pending.extend_from_slice(&chunk[..n]);
            let text = take_decodable(&mut pending);
            mirror(&text, stream_type, tail.as_ref());
        }

        if !pending.is_empty() {
            let rest = String::from_utf8_lossy(&pending);
            mirror(&rest, stream_type, tail.as_ref());
        }

        let _ = log.flush().await;
        debug!(%stream_type, "log pump task exiting");
    })
}

fn mirror(text: &str, stream_type: &'static str, tail: Option<&TailBuffer>) {
    if text.is_empty() {
        return;
    }
    if let Some(tail) = tail {
        tail.push(text);
    }
    debug!(%stream_type, "{}: {}", stream_type, text.trim_end_matches(['\r', '\n']));
}

async fn write_chunk(log: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    log.write_all(bytes).await?;
    log.flush().await
}

/// Decode and remove everything in `pending` except a trailing incomplete
/// UTF-8 sequence. Invalid bytes become U+FFFD.
fn take_decodable(pending: &mut Vec<u8>) -> String {
    let mut out = String::new();
    let mut start = 0;

    while start < pending.len() {
        match std::str::from_utf8(&pending[start..]) {
            Ok(valid) => {
                out.push_str(valid);
                start = pending.len();
            }
            Err(e) => {
                let valid_end = start + e.valid_up_to();
                out.push_str(&String::from_utf8_lossy(&pending[start..valid_end]));
                match e.error_len() {
                    Some(len) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        start = valid_end + len;
                    }
                    // Truncated sequence at the end; wait for more bytes.
                    None => {
                        start = valid_end;
                        break;
                    }
                }
            }
        }
    }

    pending.drain(..start);
    out
}
