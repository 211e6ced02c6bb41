//! IRC line codec.
//!
//! Frames the byte stream into CRLF-terminated lines. Inbound bytes are
//! decoded leniently: UTF-8 first, Latin-1 when that fails, so a single
//! badly-encoded line never tears down the session.

use bytes::{Buf, BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, Encoder, Framed};
use tracing::{debug, warn};

use crate::common::error::{ProtocolError, ProtocolResult};
use crate::irc::framer::MAX_LINE_LEN;

/// Inbound lines longer than this are discarded as garbage.
const MAX_INBOUND_LINE: usize = 8192;

/// Check that `line` can be sent as a single IRC line.
pub fn validate_line(line: &str) -> ProtocolResult<()> {
    if line.contains(['\r', '\n']) {
        return Err(ProtocolError::InvalidCharacters);
    }
    let len = line.len() + 2;
    if len > MAX_LINE_LEN {
        return Err(ProtocolError::MessageTooLong {
            len,
            limit: MAX_LINE_LEN,
        });
    }
    Ok(())
}

/// Decode raw bytes as UTF-8, falling back to Latin-1.
pub fn decode_lenient(raw: &[u8]) -> String {
    match std::str::from_utf8(raw) {
        Ok(s) => s.to_string(),
        Err(_) => raw.iter().map(|&b| b as char).collect(),
    }
}

/// Codec for IRC protocol lines.
#[derive(Debug, Default)]
pub struct IrcLineCodec {
    /// Log every raw line at debug level.
    dev: bool,
}

impl IrcLineCodec {
    pub fn new(dev: bool) -> Self {
        Self { dev }
    }
}

impl Decoder for IrcLineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(newline) = src.iter().position(|&b| b == b'\n') else {
                if src.len() > MAX_INBOUND_LINE {
                    warn!("Discarding {} bytes without a line terminator", src.len());
                    src.clear();
                }
                return Ok(None);
            };

            let raw = src.split_to(newline + 1);
            let mut end = newline;
            if end > 0 && raw[end - 1] == b'\r' {
                end -= 1;
            }
            if end == 0 {
                continue;
            }
            if end > MAX_INBOUND_LINE {
                warn!("Discarding oversized inbound line ({} bytes)", end);
                continue;
            }

            let line = decode_lenient(&raw[..end]);
            if self.dev {
                debug!("[DEV] << {}", line);
            }
            return Ok(Some(line));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None => {
                // Unterminated trailing bytes are dropped on close.
                if src.has_remaining() {
                    debug!("Dropping {} unterminated bytes at EOF", src.len());
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<String> for IrcLineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        validate_line(&item)?;
        if self.dev {
            debug!("[DEV] >> {}", item);
        }
        dst.reserve(item.len() + 2);
        dst.put_slice(item.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// A framed IRC connection.
pub type IrcConnection<S> = Framed<S, IrcLineCodec>;

/// Create a new IRC connection from a stream.
pub fn new_irc_connection<S: AsyncRead + AsyncWrite>(stream: S, dev: bool) -> IrcConnection<S> {
    Framed::new(stream, IrcLineCodec::new(dev))
}
