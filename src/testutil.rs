//! In-memory streams and frame builders shared by the unit tests.

use prost::Message;
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};

use crate::wire::{self, Control, HandshakeHeader, MessageHeader};

/// Reads from a prepared script and records everything written.
pub(crate) struct Duplex {
    input: Cursor<Vec<u8>>,
    output: Arc<Mutex<Vec<u8>>>,
}

impl Duplex {
    pub(crate) fn new(input: Vec<u8>) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let output = Arc::new(Mutex::new(Vec::new()));
        let duplex = Duplex {
            input: Cursor::new(input),
            output: output.clone(),
        };
        (duplex, output)
    }
}

impl Read for Duplex {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for Duplex {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub(crate) fn handshake_response() -> Vec<u8> {
    HandshakeHeader::response().encode().unwrap()
}

pub(crate) fn frame<M: Message>(id: i16, msg: &M) -> Vec<u8> {
    let mut out = Vec::new();
    wire::write_frame(&mut out, id, &msg.encode_to_vec()).unwrap();
    out
}

pub(crate) fn raw_header(id: i16, size: i32) -> Vec<u8> {
    MessageHeader { id, size }.encode().unwrap().to_vec()
}

/// Split written bytes back into frames. Failure and quit frames carry no payload.
pub(crate) fn split_frames(mut bytes: &[u8]) -> Vec<(MessageHeader, Vec<u8>)> {
    let mut frames = Vec::new();
    while !bytes.is_empty() {
        let header = MessageHeader::read_from(&mut bytes).unwrap();
        let len = match Control::from_i16(header.id) {
            Some(Control::Fail) | Some(Control::Quit) => 0,
            _ => header.size as usize,
        };
        frames.push((header, bytes[..len].to_vec()));
        bytes = &bytes[len..];
    }
    frames
}

/// Bytes written after skipping the client handshake.
pub(crate) fn after_handshake(bytes: &[u8]) -> &[u8] {
    &bytes[wire::HANDSHAKE_LEN..]
}
