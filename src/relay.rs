//! A relay that serves many clients from one upstream connection and answers
//! block-list requests out of a shared map cache.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, info, warn};

use crate::client::{Connection, Reply};
use crate::config::RelayConfig;
use crate::error::{CommandResult, Error, Result};
use crate::mapcache::{ClientHashes, MapCache};
use crate::proto::{
    BlockList, BlockRequest, CoreRunCommandRequest, EmptyMessage, GetWorldInfoOut, ListEnumsOut,
    ListJobSkillsOut, ListMaterialsIn, ListMaterialsOut, MapInfo, MaterialList, PlantList,
    RpcMessage, StringMessage, TiletypeList, UnitList, ViewInfo, PLUGIN,
};
use crate::registry::{MethodTable, MethodTableBuilder};
use crate::server::{self, Call};
use crate::wire;

/// Per-client state. The hash knowledge belongs to this client alone.
pub struct RelaySession<T> {
    upstream: Arc<Connection<T>>,
    cache: Arc<Mutex<MapCache>>,
    hashes: ClientHashes,
}

impl<T> RelaySession<T> {
    pub fn hashes(&self) -> &ClientHashes {
        &self.hashes
    }
}

pub struct Relay<T> {
    upstream: Arc<Connection<T>>,
    cache: Arc<Mutex<MapCache>>,
    table: MethodTable<RelaySession<T>>,
}

impl Relay<TcpStream> {
    pub fn connect(config: &RelayConfig) -> Result<Self> {
        let upstream = Connection::dial(config.upstream.as_str())?;
        Ok(Relay::new(upstream))
    }

    /// Bind the configured address and serve until accepting fails.
    pub fn run(config: &RelayConfig) -> Result<()> {
        let listener = TcpListener::bind(config.listen.as_str())?;
        info!(addr = %listener.local_addr()?, upstream = %config.upstream, "relay listening");
        Arc::new(Relay::connect(config)?).serve(listener)
    }
}

impl<T> Relay<T>
where
    T: Read + Write + Send + 'static,
{
    /// Wrap an upstream connection. The upstream's own map hashes are reset
    /// once so its incremental block lists start from a known state.
    pub fn new(upstream: Connection<T>) -> Self {
        if let Err(e) = upstream.reset_map_hashes().into_result() {
            warn!(error = %e, "upstream map hash reset failed");
        }
        Relay {
            upstream: Arc::new(upstream),
            cache: Arc::new(Mutex::new(MapCache::new())),
            table: method_table(),
        }
    }

    pub fn session(&self) -> RelaySession<T> {
        RelaySession {
            upstream: self.upstream.clone(),
            cache: self.cache.clone(),
            hashes: ClientHashes::new(),
        }
    }

    pub fn table(&self) -> &MethodTable<RelaySession<T>> {
        &self.table
    }

    pub fn cache(&self) -> &Arc<Mutex<MapCache>> {
        &self.cache
    }

    /// Handshake with one client and serve it until it quits.
    pub fn handle<S: Read + Write>(&self, stream: &mut S) -> Result<()> {
        wire::server_handshake(stream)?;
        let mut session = self.session();
        server::serve(stream, &self.table, &mut session)
    }

    /// Accept clients forever, one thread each.
    pub fn serve(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };
            let peer = stream
                .peer_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            let thread = thread::Builder::new().name(format!("relay {peer}"));
            self.spawn_client(stream, peer, thread);
        }
        Ok(())
    }

    /// Serve one accepted client on its own thread. If the thread cannot be
    /// started the client is dropped and the relay keeps accepting.
    fn spawn_client(
        self: &Arc<Self>,
        mut stream: TcpStream,
        peer: String,
        builder: thread::Builder,
    ) {
        let relay = self.clone();
        let spawned = builder.spawn({
            let peer = peer.clone();
            move || {
                info!(%peer, "connect");
                match relay.handle(&mut stream) {
                    Ok(()) => info!(%peer, "disconnect"),
                    Err(e) => warn!(%peer, error = %e, "connection closed"),
                }
            }
        });
        if let Err(e) = spawned {
            warn!(%peer, error = %e, "spawn failed");
        }
    }
}

fn forward<T, Req, Resp>(
    builder: MethodTableBuilder<RelaySession<T>>,
    plugin: Option<&str>,
    command: &str,
) -> MethodTableBuilder<RelaySession<T>>
where
    T: Read + Write + Send + 'static,
    Req: RpcMessage,
    Resp: RpcMessage,
{
    let name = command.to_owned();
    let scope = plugin.map(str::to_owned);
    builder.method(plugin, command, move |s: &mut RelaySession<T>, req: Req| {
        s.upstream.call::<Req, Resp>(&name, scope.as_deref(), &req)
    })
}

/// The methods the relay answers. Ids follow registration order.
pub fn method_table<T>() -> MethodTable<RelaySession<T>>
where
    T: Read + Write + Send + 'static,
{
    let b = MethodTable::<RelaySession<T>>::builder().method(
        None,
        "RunCommand",
        |_, _: CoreRunCommandRequest| {
            Reply::<EmptyMessage>::err(CommandResult::NotImplemented, Vec::new())
        },
    );
    let b = forward::<T, EmptyMessage, StringMessage>(b, None, "GetVersion");
    let b = forward::<T, EmptyMessage, StringMessage>(b, None, "GetDFVersion");
    let b = forward::<T, EmptyMessage, GetWorldInfoOut>(b, None, "GetWorldInfo");
    let b = forward::<T, EmptyMessage, ListEnumsOut>(b, None, "ListEnums");
    let b = forward::<T, EmptyMessage, ListJobSkillsOut>(b, None, "ListJobSkills");
    let b = forward::<T, ListMaterialsIn, ListMaterialsOut>(b, None, "ListMaterials");
    let b = forward::<T, EmptyMessage, ViewInfo>(b, Some(PLUGIN), "GetViewInfo");
    let b = forward::<T, EmptyMessage, MapInfo>(b, Some(PLUGIN), "GetMapInfo");
    let b = forward::<T, EmptyMessage, MaterialList>(b, Some(PLUGIN), "GetMaterialList");
    let b = forward::<T, EmptyMessage, MaterialList>(b, Some(PLUGIN), "GetGrowthList");
    let b = forward::<T, EmptyMessage, TiletypeList>(b, Some(PLUGIN), "GetTiletypeList");
    let b = forward::<T, EmptyMessage, UnitList>(b, Some(PLUGIN), "GetUnitList");
    let b = forward::<T, BlockRequest, PlantList>(b, Some(PLUGIN), "GetPlantList");
    b.method(Some(PLUGIN), "ResetMapHashes", |s: &mut RelaySession<T>, _: EmptyMessage| {
        s.hashes.reset();
        Reply::ok(EmptyMessage {}, Vec::new())
    })
    .raw(
        Some(PLUGIN),
        "GetBlockList",
        BlockRequest::SHORT_NAME,
        BlockList::SHORT_NAME,
        get_block_list::<T>,
    )
    .build()
}

/// Fetch the whole box from upstream regardless of the client's budget, merge
/// it into the cache, then answer with only what this client lacks.
///
/// The cache stays locked from the upstream fetch until selection is done, so
/// upstream updates are merged in the order they were fetched.
fn get_block_list<T: Read + Write>(call: &mut Call<'_, RelaySession<T>>) -> Result<()> {
    let req: BlockRequest = call.decode()?;
    let session = &mut *call.session;

    let mut cache = session.cache.lock().map_err(|_| Error::Poisoned)?;
    let upstream_req = BlockRequest {
        blocks_needed: None,
        ..req.clone()
    };
    let reply = session.upstream.get_block_list(&upstream_req);
    let Some(list) = call.out.respond_partial(reply)? else {
        return Ok(());
    };

    let fetched = list.map_blocks.len();
    let changed = cache.merge_all(list.map_blocks);
    let picked = cache.select(&req, &mut session.hashes);
    drop(cache);

    debug!(fetched, changed, sent = picked.len(), "block list");
    call.out.write_result(&BlockList {
        map_blocks: picked,
        map_x: list.map_x,
        map_y: list.map_y,
    })
}
