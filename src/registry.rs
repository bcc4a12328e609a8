//! The table of callable methods. A method's index in the table is its wire id.

use std::collections::HashMap;
use tracing::debug;

use crate::client::Reply;
use crate::error::{CommandResult, Error, Result};
use crate::proto::{CoreBindReply, CoreBindRequest, RpcMessage};
use crate::server::Call;

pub type Handler<S> = Box<dyn Fn(&mut Call<'_, S>) -> Result<()> + Send + Sync>;

pub struct MethodDescriptor<S> {
    pub command: String,
    pub plugin: Option<String>,
    pub input: &'static str,
    pub output: &'static str,
    pub(crate) handler: Handler<S>,
}

/// Immutable once built. Core commands are looked up by name, plugin commands
/// by plugin and name.
pub struct MethodTable<S> {
    methods: Vec<MethodDescriptor<S>>,
    core: HashMap<String, i16>,
    plugins: HashMap<String, HashMap<String, i16>>,
}

impl<S: 'static> MethodTable<S> {
    /// A builder with `BindMethod` already registered as id 0.
    pub fn builder() -> MethodTableBuilder<S> {
        MethodTableBuilder { methods: Vec::new() }.raw(
            None,
            "BindMethod",
            CoreBindRequest::TYPE_NAME,
            CoreBindReply::TYPE_NAME,
            bind_method,
        )
    }
}

impl<S> MethodTable<S> {
    /// Resolve a method to its id, checking the caller's idea of its signature.
    pub fn bind(&self, command: &str, plugin: Option<&str>, input: &str, output: &str) -> Result<i16> {
        let found = match plugin {
            None => self.core.get(command),
            Some(plugin) => self.plugins.get(plugin).and_then(|m| m.get(command)),
        };
        let id = *found.ok_or_else(|| Error::MethodNotFound {
            method: command.to_owned(),
            plugin: plugin.map(str::to_owned),
        })?;

        let method = &self.methods[id as usize];
        if method.input != input || method.output != output {
            return Err(Error::SignatureMismatch {
                method: command.to_owned(),
                plugin: plugin.map(str::to_owned),
                input: input.to_owned(),
                output: output.to_owned(),
                expected_input: method.input.to_owned(),
                expected_output: method.output.to_owned(),
            });
        }
        Ok(id)
    }

    /// The method registered under `id`; negative ids never match.
    pub fn get(&self, id: i16) -> Option<&MethodDescriptor<S>> {
        usize::try_from(id).ok().and_then(|i| self.methods.get(i))
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i16, &MethodDescriptor<S>)> {
        self.methods.iter().enumerate().map(|(i, m)| (i as i16, m))
    }
}

pub struct MethodTableBuilder<S> {
    methods: Vec<MethodDescriptor<S>>,
}

impl<S: 'static> MethodTableBuilder<S> {
    /// Register a handler that works on the raw call.
    pub fn raw<F>(
        mut self,
        plugin: Option<&str>,
        command: &str,
        input: &'static str,
        output: &'static str,
        handler: F,
    ) -> Self
    where
        F: Fn(&mut Call<'_, S>) -> Result<()> + Send + Sync + 'static,
    {
        self.methods.push(MethodDescriptor {
            command: command.to_owned(),
            plugin: plugin.map(str::to_owned),
            input,
            output,
            handler: Box::new(handler),
        });
        self
    }

    /// Register a typed handler. The request is decoded for it and its reply
    /// is written back as text followed by a result or failure. The signature
    /// uses bare message names for plugin methods.
    pub fn method<Req, Resp, F>(self, plugin: Option<&str>, command: &str, f: F) -> Self
    where
        Req: RpcMessage,
        Resp: RpcMessage,
        F: Fn(&mut S, Req) -> Reply<Resp> + Send + Sync + 'static,
    {
        let input = Req::bind_name(plugin);
        let output = Resp::bind_name(plugin);
        self.raw(plugin, command, input, output, move |call| {
            let req = call.decode::<Req>()?;
            let reply = f(&mut *call.session, req);
            call.out.respond(reply)
        })
    }

    pub fn build(self) -> MethodTable<S> {
        debug_assert!(self.methods.len() <= i16::MAX as usize);

        let mut core = HashMap::new();
        let mut plugins: HashMap<String, HashMap<String, i16>> = HashMap::new();
        for (i, method) in self.methods.iter().enumerate() {
            let index = match &method.plugin {
                None => &mut core,
                Some(plugin) => plugins.entry(plugin.clone()).or_default(),
            };
            // The first registration of a name keeps its id.
            index.entry(method.command.clone()).or_insert(i as i16);
        }

        MethodTable {
            methods: self.methods,
            core,
            plugins,
        }
    }
}

fn bind_method<S>(call: &mut Call<'_, S>) -> Result<()> {
    let req: CoreBindRequest = call.decode()?;
    let bound = call.table.bind(
        &req.method,
        req.plugin.as_deref(),
        &req.input_msg,
        &req.output_msg,
    );
    match bound {
        Ok(id) => {
            debug!(method = %req.method, plugin = req.plugin.as_deref().unwrap_or(""), id, "bind");
            call.out.write_result(&CoreBindReply {
                assigned_id: i32::from(id),
            })
        }
        Err(e) => {
            debug!(error = %e, "bind rejected");
            call.out.write_error(CommandResult::Failure, &format!("{e}\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{BlockList, BlockRequest, EmptyMessage, StringMessage, PLUGIN};

    fn table() -> MethodTable<()> {
        MethodTable::builder()
            .method(None, "GetVersion", |_, _: EmptyMessage| {
                Reply::ok(StringMessage { value: "1".into() }, Vec::new())
            })
            .method(Some(PLUGIN), "GetBlockList", |_, _: BlockRequest| {
                Reply::ok(BlockList::default(), Vec::new())
            })
            .method(Some(PLUGIN), "GetVersion", |_, _: EmptyMessage| {
                Reply::ok(StringMessage { value: "2".into() }, Vec::new())
            })
            .build()
    }

    #[test]
    fn test_bind_method_is_zero() {
        let table = table();
        let id = table
            .bind("BindMethod", None, "dfproto.CoreBindRequest", "dfproto.CoreBindReply")
            .unwrap();
        assert_eq!(id, 0);
    }

    #[test]
    fn test_bind_idempotent() {
        let table = table();
        let a = table
            .bind("GetBlockList", Some(PLUGIN), "BlockRequest", "BlockList")
            .unwrap();
        let b = table
            .bind("GetBlockList", Some(PLUGIN), "BlockRequest", "BlockList")
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a, 2);
    }

    #[test]
    fn test_plugin_scope_is_separate() {
        let table = table();
        let core = table
            .bind("GetVersion", None, "dfproto.EmptyMessage", "dfproto.StringMessage")
            .unwrap();
        let plugin = table
            .bind("GetVersion", Some(PLUGIN), "EmptyMessage", "StringMessage")
            .unwrap();
        assert_ne!(core, plugin);

        let err = table
            .bind("GetBlockList", None, "BlockRequest", "BlockList")
            .unwrap_err();
        assert!(matches!(err, Error::MethodNotFound { .. }));

        let err = table
            .bind("GetBlockList", Some("OtherPlugin"), "BlockRequest", "BlockList")
            .unwrap_err();
        assert!(matches!(err, Error::MethodNotFound { .. }));
    }

    #[test]
    fn test_signature_mismatch_is_distinct() {
        let table = table();
        let err = table
            .bind("GetVersion", None, "EmptyMessage", "dfproto.StringMessage")
            .unwrap_err();
        match err {
            Error::SignatureMismatch {
                input,
                expected_input,
                ..
            } => {
                assert_eq!(input, "EmptyMessage");
                assert_eq!(expected_input, "dfproto.EmptyMessage");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_get_out_of_range() {
        let table = table();
        assert_eq!(table.len(), 4);
        assert!(table.get(3).is_some());
        assert!(table.get(4).is_none());
        assert!(table.get(-5).is_none());
        assert!(table.get(-1).is_none());
    }
}
