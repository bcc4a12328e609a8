//! Fixed-size headers for the handshake and for every framed message.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use tracing::trace;

use crate::error::{CommandResult, Error, Result};

pub const MAGIC_REQUEST: [u8; 8] = *b"DFHack?\n";
pub const MAGIC_RESPONSE: [u8; 8] = *b"DFHack!\n";
pub const PROTOCOL_VERSION: i32 = 1;

/// Largest payload either side will accept (8 MiB).
pub const MAX_MESSAGE_SIZE: i32 = 8 * 1_048_576;

pub const HANDSHAKE_LEN: usize = 12;
pub const HEADER_LEN: usize = 8;

/// Reserved negative message ids.
#[repr(i16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Control {
    Result = -1,
    Fail = -2,
    Text = -3,
    Quit = -4,
}

impl Control {
    pub fn from_i16(val: i16) -> Option<Self> {
        match val {
            -1 => Some(Control::Result),
            -2 => Some(Control::Fail),
            -3 => Some(Control::Text),
            -4 => Some(Control::Quit),
            _ => None,
        }
    }

    pub fn id(self) -> i16 {
        self as i16
    }
}

/// Handshake header: 8-byte magic followed by the protocol version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandshakeHeader {
    pub magic: [u8; 8],
    pub version: i32,
}

impl HandshakeHeader {
    pub fn request() -> Self {
        HandshakeHeader {
            magic: MAGIC_REQUEST,
            version: PROTOCOL_VERSION,
        }
    }

    pub fn response() -> Self {
        HandshakeHeader {
            magic: MAGIC_RESPONSE,
            version: PROTOCOL_VERSION,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(HANDSHAKE_LEN);
        buf.extend_from_slice(&self.magic);
        buf.write_i32::<LittleEndian>(self.version)?;
        Ok(buf)
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let mut magic = [0u8; 8];
        r.read_exact(&mut magic)?;
        let version = r.read_i32::<LittleEndian>()?;
        Ok(HandshakeHeader { magic, version })
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.encode()?)?;
        w.flush()?;
        Ok(())
    }
}

/// Client side of the handshake: send the request magic, expect the response magic.
pub fn client_handshake<S: Read + Write>(stream: &mut S) -> Result<()> {
    HandshakeHeader::request().write_to(stream)?;
    let reply = HandshakeHeader::read_from(stream)?;
    if reply != HandshakeHeader::response() {
        return Err(Error::InvalidHandshake);
    }
    Ok(())
}

/// Server side of the handshake: expect the request magic, answer with the response magic.
pub fn server_handshake<S: Read + Write>(stream: &mut S) -> Result<()> {
    let hello = HandshakeHeader::read_from(stream)?;
    if hello != HandshakeHeader::request() {
        return Err(Error::InvalidHandshake);
    }
    HandshakeHeader::response().write_to(stream)
}

/// Message header: `[i16 id][2B padding][i32 size]`.
///
/// For [`Control::Fail`] the size field holds the error code and no payload follows.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MessageHeader {
    pub id: i16,
    pub size: i32,
}

impl MessageHeader {
    pub fn encode(&self) -> Result<[u8; HEADER_LEN]> {
        let mut buf = [0u8; HEADER_LEN];
        let mut w = &mut buf[..];
        w.write_i16::<LittleEndian>(self.id)?;
        w.write_u16::<LittleEndian>(0)?;
        w.write_i32::<LittleEndian>(self.size)?;
        Ok(buf)
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let id = r.read_i16::<LittleEndian>()?;
        let _pad = r.read_u16::<LittleEndian>()?;
        let size = r.read_i32::<LittleEndian>()?;
        Ok(MessageHeader { id, size })
    }

    /// The declared size as a payload length, rejecting anything out of bounds.
    pub fn payload_len(&self) -> Result<usize> {
        if self.size < 0 || self.size > MAX_MESSAGE_SIZE {
            return Err(Error::BadSize(self.size));
        }
        Ok(self.size as usize)
    }
}

/// Read the payload announced by `header`. The size is validated before any
/// allocation so a corrupt header cannot force a huge read.
pub fn read_payload<R: Read>(r: &mut R, header: &MessageHeader) -> Result<Vec<u8>> {
    let len = header.payload_len()?;
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload)?;
    Ok(payload)
}

/// Write one header and its payload as a single buffer.
pub fn write_frame<W: Write>(w: &mut W, id: i16, payload: &[u8]) -> Result<()> {
    if payload.len() > MAX_MESSAGE_SIZE as usize {
        return Err(Error::MessageTooLarge(payload.len()));
    }
    let header = MessageHeader {
        id,
        size: payload.len() as i32,
    };
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(&header.encode()?);
    buf.extend_from_slice(payload);
    w.write_all(&buf)?;
    w.flush()?;
    trace!(id, size = payload.len(), "frame written");
    Ok(())
}

/// Write a bare header with no payload (failure and quit frames).
pub fn write_header<W: Write>(w: &mut W, header: MessageHeader) -> Result<()> {
    w.write_all(&header.encode()?)?;
    w.flush()?;
    Ok(())
}

pub fn write_failure<W: Write>(w: &mut W, code: CommandResult) -> Result<()> {
    write_header(
        w,
        MessageHeader {
            id: Control::Fail.id(),
            size: code.code(),
        },
    )
}

pub fn write_quit<W: Write>(w: &mut W) -> Result<()> {
    write_header(
        w,
        MessageHeader {
            id: Control::Quit.id(),
            size: 0,
        },
    )
}
