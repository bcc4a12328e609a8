//! Server side of the protocol: read a request, run its handler, write the reply.

use prost::Message;
use std::io::{Read, Write};
use tracing::{debug, trace};

use crate::client::Reply;
use crate::error::{CommandResult, Result};
use crate::proto::{CoreTextNotification, TextColor};
use crate::registry::MethodTable;
use crate::wire::{self, Control, MessageHeader, MAX_MESSAGE_SIZE};

/// Writes the frames answering one request: any number of text frames, then
/// exactly one result or failure frame.
pub struct Responder<'a> {
    w: &'a mut dyn Write,
}

impl<'a> Responder<'a> {
    pub fn new(w: &'a mut dyn Write) -> Self {
        Responder { w }
    }

    pub fn write_text(&mut self, text: &CoreTextNotification) -> Result<()> {
        wire::write_frame(&mut self.w, Control::Text.id(), &text.encode_to_vec())
    }

    /// A non-empty message goes out first as a light red text line.
    pub fn write_error(&mut self, code: CommandResult, message: &str) -> Result<()> {
        if !message.is_empty() {
            self.write_text(&CoreTextNotification::line(message, TextColor::LightRed))?;
        }
        wire::write_failure(&mut self.w, code)
    }

    /// A reply too large for one frame becomes a link failure.
    pub fn write_result<M: Message>(&mut self, resp: &M) -> Result<()> {
        let payload = resp.encode_to_vec();
        if payload.len() > MAX_MESSAGE_SIZE as usize {
            return self.write_error(
                CommandResult::LinkFailure,
                &format!("reply too large: {}", payload.len()),
            );
        }
        wire::write_frame(&mut self.w, Control::Result.id(), &payload)
    }

    /// Relay a finished call. Command failures are answered with their code;
    /// any other error ends the connection.
    pub fn respond<M: Message>(&mut self, reply: Reply<M>) -> Result<()> {
        if let Some(resp) = self.respond_partial(reply)? {
            self.write_result(&resp)?;
        }
        Ok(())
    }

    /// Write the notifications of `reply`, and its failure frame if it failed.
    ///
    /// Returns the successful value when the caller still owes a result frame.
    pub fn respond_partial<T>(&mut self, reply: Reply<T>) -> Result<Option<T>> {
        let Reply { text, result } = reply;
        let code = match result.as_ref().err().map(|e| e.command_result()) {
            None => None,
            Some(Some(code)) => Some(code),
            Some(None) => return result.map(Some),
        };

        for t in &text {
            self.write_text(t)?;
        }

        match code {
            Some(code) => {
                wire::write_failure(&mut self.w, code)?;
                Ok(None)
            }
            None => result.map(Some),
        }
    }
}

/// Everything a handler gets for one request.
pub struct Call<'a, S> {
    pub table: &'a MethodTable<S>,
    pub session: &'a mut S,
    pub payload: &'a [u8],
    pub out: Responder<'a>,
}

impl<S> Call<'_, S> {
    /// Decode failures desync nothing on the wire, but the peer is sending
    /// something other than what it bound, so the error is fatal.
    pub fn decode<M: Message + Default>(&self) -> Result<M> {
        Ok(M::decode(self.payload)?)
    }
}

/// Route one request to its handler. Unknown ids are answered with `NotFound`.
pub fn dispatch<S, W: Write>(
    table: &MethodTable<S>,
    session: &mut S,
    id: i16,
    payload: &[u8],
    w: &mut W,
) -> Result<()> {
    let mut out = Responder::new(w);
    match table.get(id) {
        None => {
            debug!(id, "call of invalid id");
            out.write_error(CommandResult::NotFound, &format!("RPC call of invalid id {id}\n"))
        }
        Some(method) => {
            trace!(id, command = %method.command, size = payload.len(), "dispatch");
            let mut call = Call {
                table,
                session,
                payload,
                out,
            };
            (method.handler)(&mut call)
        }
    }
}

/// Serve requests until the peer quits or the stream fails.
///
/// Requests are handled strictly one at a time; the next header is read only
/// after the previous reply is fully written.
pub fn serve<T, S>(stream: &mut T, table: &MethodTable<S>, session: &mut S) -> Result<()>
where
    T: Read + Write,
{
    loop {
        let header = MessageHeader::read_from(stream)?;
        if header.id == Control::Quit.id() {
            debug!("peer quit");
            return Ok(());
        }
        let payload = wire::read_payload(stream, &header)?;
        dispatch(table, session, header.id, &payload, stream)?;
    }
}
