use std::fmt;

use super::rpc_messages;

/// Console colours a text fragment can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum TextColor {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Brown = 6,
    Grey = 7,
    DarkGrey = 8,
    LightBlue = 9,
    LightGreen = 10,
    LightCyan = 11,
    LightRed = 12,
    LightMagenta = 13,
    Yellow = 14,
    White = 15,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CoreTextFragment {
    #[prost(string, required, tag = "1")]
    pub text: String,
    #[prost(enumeration = "TextColor", optional, tag = "2")]
    pub color: Option<i32>,
}

/// Console output a server streams ahead of the final reply.
#[derive(Clone, PartialEq, prost::Message)]
pub struct CoreTextNotification {
    #[prost(message, repeated, tag = "1")]
    pub fragments: Vec<CoreTextFragment>,
}

impl CoreTextNotification {
    /// A notification holding a single coloured fragment.
    pub fn line(text: impl Into<String>, color: TextColor) -> Self {
        CoreTextNotification {
            fragments: vec![CoreTextFragment {
                text: text.into(),
                color: Some(color as i32),
            }],
        }
    }
}

impl fmt::Display for CoreTextNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in &self.fragments {
            f.write_str(&fragment.text)?;
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CoreBindRequest {
    #[prost(string, required, tag = "1")]
    pub method: String,
    #[prost(string, required, tag = "2")]
    pub input_msg: String,
    #[prost(string, required, tag = "3")]
    pub output_msg: String,
    #[prost(string, optional, tag = "4")]
    pub plugin: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CoreBindReply {
    #[prost(int32, required, tag = "1")]
    pub assigned_id: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CoreRunCommandRequest {
    #[prost(string, required, tag = "1")]
    pub command: String,
    #[prost(string, repeated, tag = "2")]
    pub arguments: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CoreRunLuaRequest {
    #[prost(string, required, tag = "1")]
    pub module: String,
    #[prost(string, required, tag = "2")]
    pub function: String,
    #[prost(string, repeated, tag = "3")]
    pub arguments: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct EmptyMessage {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct IntMessage {
    #[prost(int32, required, tag = "1")]
    pub value: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StringMessage {
    #[prost(string, required, tag = "1")]
    pub value: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StringListMessage {
    #[prost(string, repeated, tag = "1")]
    pub value: Vec<String>,
}

rpc_messages!("dfproto" =>
    CoreTextNotification,
    CoreBindRequest,
    CoreBindReply,
    CoreRunCommandRequest,
    CoreRunLuaRequest,
    EmptyMessage,
    IntMessage,
    StringMessage,
    StringListMessage,
);
