use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::error::TransportError;

const CONTENT_LENGTH: &str = "Content-Length:";

/// Default upper bound on one message body
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Upper bound on one `Name: value` header line
const MAX_HEADER_LINE: u64 = 1024;

/// How messages are delimited on a byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// One JSON text per line
    Lines,
    /// LSPスタイルの `Content-Length: N\r\n\r\n` ヘッダー
    ContentLength,
}

impl FromStr for Framing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lines" => Ok(Framing::Lines),
            "content-length" => Ok(Framing::ContentLength),
            other => Err(format!(
                "unknown framing `{}` (expected `lines` or `content-length`)",
                other
            )),
        }
    }
}

/// Read one message of at most `max_len` bytes; `Ok(None)` on a clean EOF
///
/// A longer message is a framing error; nothing beyond `max_len` (plus a
/// line terminator) is buffered.
pub async fn read_frame<R>(
    reader: &mut R,
    framing: Framing,
    max_len: usize,
) -> Result<Option<Vec<u8>>, TransportError>
where
    R: AsyncBufRead + Unpin,
{
    match framing {
        Framing::Lines => read_line_frame(reader, max_len).await,
        Framing::ContentLength => read_content_length_frame(reader, max_len).await,
    }
}

fn too_long(len: impl std::fmt::Display, max_len: usize) -> TransportError {
    TransportError::Framing(format!("message of {} bytes exceeds limit of {}", len, max_len))
}

/// Write one message and flush
pub async fn write_frame<W>(writer: &mut W, framing: Framing, payload: &[u8]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    match framing {
        Framing::Lines => {
            writer.write_all(payload).await?;
            writer.write_all(b"\n").await?;
        }
        Framing::ContentLength => {
            let header = format!("{} {}\r\n\r\n", CONTENT_LENGTH, payload.len());
            writer.write_all(header.as_bytes()).await?;
            writer.write_all(payload).await?;
        }
    }
    writer.flush().await?;
    Ok(())
}

async fn read_line_frame<R>(reader: &mut R, max_len: usize) -> Result<Option<Vec<u8>>, TransportError>
where
    R: AsyncBufRead + Unpin,
{
    // 改行 (\r\n) の分だけ余裕を持たせる
    let limit = (max_len as u64).saturating_add(2);
    let mut line = Vec::new();
    loop {
        line.clear();
        let bytes_read = (&mut *reader).take(limit).read_until(b'\n', &mut line).await?;
        if bytes_read == 0 {
            return Ok(None);
        }
        if bytes_read as u64 == limit && line.last() != Some(&b'\n') {
            return Err(too_long(format!("more than {}", max_len), max_len));
        }
        // 空行はスキップ
        if line.iter().all(|b| b.is_ascii_whitespace()) {
            continue;
        }
        while line.last().is_some_and(|b| b.is_ascii_whitespace()) {
            line.pop();
        }
        if line.len() > max_len {
            return Err(too_long(line.len(), max_len));
        }
        return Ok(Some(line));
    }
}

async fn read_content_length_frame<R>(
    reader: &mut R,
    max_len: usize,
) -> Result<Option<Vec<u8>>, TransportError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let mut content_length: Option<usize> = None;

    // ヘッダーは空行まで続く
    loop {
        line.clear();
        let bytes_read = (&mut *reader).take(MAX_HEADER_LINE).read_line(&mut line).await?;
        if bytes_read == 0 {
            if content_length.is_some() {
                return Err(TransportError::Framing("EOF inside message header".to_string()));
            }
            return Ok(None);
        }

        if bytes_read as u64 == MAX_HEADER_LINE && !line.ends_with('\n') {
            return Err(TransportError::Framing("header line too long".to_string()));
        }

        let header = line.trim();
        if header.is_empty() {
            if content_length.is_some() {
                break;
            }
            continue;
        }

        if let Some(value) = header.strip_prefix(CONTENT_LENGTH) {
            let length = value
                .trim()
                .parse::<usize>()
                .map_err(|_| TransportError::Framing(format!("Invalid Content-Length: {}", value.trim())))?;
            content_length = Some(length);
        } else if !is_header_line(header) {
            return Err(TransportError::Framing(format!(
                "Expected Content-Length header, got: {}",
                header
            )));
        }
    }

    let length = content_length.unwrap_or_default();
    if length > max_len {
        return Err(too_long(length, max_len));
    }
    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

/// `Name: value` with a token-like name
fn is_header_line(line: &str) -> bool {
    match line.split_once(':') {
        Some((name, _)) => {
            !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        None => false,
    }
}
