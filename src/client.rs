//! Client side of the protocol: bind-on-demand calls over one shared stream.

use prost::Message;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{CommandResult, Error, Result};
use crate::proto::{CoreBindReply, CoreBindRequest, CoreTextNotification, RpcMessage};
use crate::wire::{self, Control, MessageHeader};

/// Port used when `DFHACK_PORT` is unset or unparsable.
pub const DEFAULT_PORT: u16 = 5000;

/// Method id 0 is always `BindMethod`.
pub const BIND_METHOD_ID: i16 = 0;

/// The text notifications of one call together with its outcome.
///
/// Notifications are kept even when the call fails, in the order the server
/// sent them.
#[derive(Debug)]
pub struct Reply<T> {
    pub text: Vec<CoreTextNotification>,
    pub result: Result<T>,
}

impl<T> Reply<T> {
    pub fn ok(value: T, text: Vec<CoreTextNotification>) -> Self {
        Reply {
            text,
            result: Ok(value),
        }
    }

    pub fn err(error: impl Into<Error>, text: Vec<CoreTextNotification>) -> Self {
        Reply {
            text,
            result: Err(error.into()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        Reply {
            text: self.text,
            result: self.result.map(f),
        }
    }

    pub fn into_result(self) -> Result<T> {
        self.result
    }

    fn after(mut self, mut earlier: Vec<CoreTextNotification>) -> Self {
        earlier.append(&mut self.text);
        self.text = earlier;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct MethodKey {
    plugin: Option<String>,
    command: String,
    input: &'static str,
    output: &'static str,
}

struct Link<S> {
    stream: S,
    bound: HashMap<MethodKey, i16>,
    broken: bool,
}

impl<S: Read + Write> Link<S> {
    /// One round trip. After a fatal error the stream position is unknown, so
    /// the link refuses every later call.
    fn round_trip<Resp>(&mut self, id: i16, req: &impl Message) -> Reply<Resp>
    where
        Resp: Message + Default,
    {
        if self.broken {
            return Reply::err(Error::Closed, Vec::new());
        }
        let reply = round_trip(&mut self.stream, id, req);
        if let Err(e) = &reply.result {
            if e.is_fatal() {
                warn!(error = %e, "connection broken");
                self.broken = true;
            }
        }
        reply
    }
}

/// One client connection.
///
/// The stream and the bound-method cache live behind a single mutex that is
/// held for a whole bind-then-call sequence, so calls from several threads
/// never interleave on the wire.
pub struct Connection<S> {
    link: Mutex<Link<S>>,
}

impl Connection<TcpStream> {
    /// Connect to `localhost` on `$DFHACK_PORT`, or the default port.
    pub fn connect() -> Result<Self> {
        Self::dial(("localhost", crate::config::upstream_port()))
    }

    pub fn dial<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        let conn = Self::handshake(stream)?;
        info!(%peer, "connected");
        Ok(conn)
    }
}

impl<S: Read + Write> Connection<S> {
    /// Run the client handshake over an already open stream.
    pub fn handshake(mut stream: S) -> Result<Self> {
        wire::client_handshake(&mut stream)?;
        Ok(Connection {
            link: Mutex::new(Link {
                stream,
                bound: HashMap::new(),
                broken: false,
            }),
        })
    }

    /// Call `command` (in `plugin`, if given), binding it first if this
    /// connection has not seen the signature yet.
    pub fn call<Req, Resp>(&self, command: &str, plugin: Option<&str>, req: &Req) -> Reply<Resp>
    where
        Req: RpcMessage,
        Resp: RpcMessage,
    {
        let mut link = match self.link.lock() {
            Ok(link) => link,
            Err(_) => return Reply::err(Error::Poisoned, Vec::new()),
        };

        let key = MethodKey {
            plugin: plugin.map(str::to_owned),
            command: command.to_owned(),
            input: Req::bind_name(plugin),
            output: Resp::bind_name(plugin),
        };

        if let Some(id) = link.bound.get(&key).copied() {
            return link.round_trip(id, req);
        }

        let bind = CoreBindRequest {
            method: key.command.clone(),
            input_msg: key.input.to_owned(),
            output_msg: key.output.to_owned(),
            plugin: key.plugin.clone(),
        };
        let Reply { text, result } = link.round_trip::<CoreBindReply>(BIND_METHOD_ID, &bind);
        let id = match result.and_then(|reply| method_id(reply.assigned_id)) {
            Ok(id) => id,
            Err(e) => return Reply::err(e, text),
        };
        debug!(command, plugin = plugin.unwrap_or(""), id, "bound method");
        link.bound.insert(key, id);

        link.round_trip(id, req).after(text)
    }

    /// Resolve a method id explicitly. [`Connection::call`] does this on demand.
    pub fn bind_method(&self, req: &CoreBindRequest) -> Reply<i32> {
        match self.link.lock() {
            Ok(mut link) => link
                .round_trip::<CoreBindReply>(BIND_METHOD_ID, req)
                .map(|reply| reply.assigned_id),
            Err(_) => Reply::err(Error::Poisoned, Vec::new()),
        }
    }

    /// Send the quit header and drop the stream. The peer may already be gone,
    /// so a failed quit write is not reported.
    pub fn close(self) -> Result<()> {
        let mut link = self.link.into_inner().map_err(|_| Error::Poisoned)?;
        if link.broken {
            return Ok(());
        }
        if let Err(e) = wire::write_quit(&mut link.stream) {
            debug!(error = %e, "quit not delivered");
        }
        Ok(())
    }
}

fn method_id(assigned: i32) -> Result<i16> {
    match i16::try_from(assigned) {
        Ok(id) if id >= 0 => Ok(id),
        _ => Err(Error::BadMethodId(assigned)),
    }
}

fn round_trip<S, Resp>(stream: &mut S, id: i16, req: &impl Message) -> Reply<Resp>
where
    S: Read + Write,
    Resp: Message + Default,
{
    let mut text = Vec::new();
    let result = exchange(stream, id, req, &mut text);
    Reply { text, result }
}

fn exchange<S, Resp>(
    stream: &mut S,
    id: i16,
    req: &impl Message,
    text: &mut Vec<CoreTextNotification>,
) -> Result<Resp>
where
    S: Read + Write,
    Resp: Message + Default,
{
    wire::write_frame(stream, id, &req.encode_to_vec())?;

    loop {
        let header = MessageHeader::read_from(stream)?;
        match Control::from_i16(header.id) {
            Some(Control::Text) => {
                let payload = wire::read_payload(stream, &header)?;
                text.push(CoreTextNotification::decode(payload.as_slice())?);
            }
            Some(Control::Result) => {
                let payload = wire::read_payload(stream, &header)?;
                return Ok(Resp::decode(payload.as_slice())?);
            }
            Some(Control::Fail) => {
                return Err(match CommandResult::from_code(header.size) {
                    Some(cr) => Error::Command(cr),
                    None => Error::UnknownErrorCode(header.size),
                });
            }
            _ => return Err(Error::UnexpectedFrame(header.id)),
        }
    }
}
