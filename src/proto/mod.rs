//! Protobuf payloads exchanged over the wire.
//!
//! Messages are proto2 definitions from two packages: `dfproto` for the core
//! protocol and its basic world queries, and `RemoteFortressReader` for the
//! map/world plugin. A bind
//! request quotes the message names as the method signature: fully qualified
//! for core methods, bare for plugin methods.

pub mod basic;
pub mod dfproto;
pub mod remote_fortress;

pub use self::basic::*;
pub use self::dfproto::*;
pub use self::remote_fortress::*;

/// A protobuf message with stable type names.
pub trait RpcMessage: prost::Message + Default {
    /// `package.Message`
    const TYPE_NAME: &'static str;
    /// `Message`
    const SHORT_NAME: &'static str;

    /// The name a bind request uses for this message in `plugin`'s scope.
    fn bind_name(plugin: Option<&str>) -> &'static str {
        match plugin {
            None => Self::TYPE_NAME,
            Some(_) => Self::SHORT_NAME,
        }
    }
}

macro_rules! rpc_messages {
    ($package:literal => $($ty:ident),+ $(,)?) => {
        $(
            impl $crate::proto::RpcMessage for $ty {
                const TYPE_NAME: &'static str = concat!($package, ".", stringify!($ty));
                const SHORT_NAME: &'static str = stringify!($ty);
            }
        )+
    };
}

pub(crate) use rpc_messages;
