//! Client, server and caching relay for the DFHack remote RPC protocol.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod mapcache;
pub mod proto;
pub mod registry;
pub mod relay;
pub mod server;
pub mod wire;

#[cfg(test)]
mod testutil;

pub use client::{Connection, Reply, BIND_METHOD_ID, DEFAULT_PORT};
pub use config::RelayConfig;
pub use error::{CommandResult, Error, Result};
pub use mapcache::{BlockCoord, ClientHashes, MapCache, Spiral};
pub use registry::{MethodDescriptor, MethodTable, MethodTableBuilder};
pub use relay::{Relay, RelaySession};
pub use server::{dispatch, serve, Call, Responder};
pub use wire::{Control, MessageHeader, MAX_MESSAGE_SIZE};
