use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use dfhack_remote::proto::{
    BlockList, BlockRequest, CoreBindRequest, CoreRunCommandRequest, EmptyMessage, MapBlock,
    StringMessage, ViewInfo, PLUGIN,
};
use dfhack_remote::{
    server, wire, CommandResult, Connection, Control, Error, MessageHeader, MethodTable, Relay,
    Reply, BIND_METHOD_ID,
};
use prost::Message;

/// Stands in for the game: a fixed set of blocks that tests can edit, and a
/// record of every block request and bind it receives.
#[derive(Default)]
struct World {
    blocks: Vec<MapBlock>,
    requests: Vec<BlockRequest>,
    binds: Vec<String>,
}

type Shared = Arc<Mutex<World>>;

fn block(x: i32, y: i32, z: i32) -> MapBlock {
    MapBlock {
        map_x: x * 16,
        map_y: y * 16,
        map_z: z,
        tiles: vec![7; 256],
        water: vec![0; 256],
        ..Default::default()
    }
}

fn game_table() -> MethodTable<Shared> {
    MethodTable::builder()
        .method(None, "GetVersion", |_, _: EmptyMessage| {
            Reply::ok(StringMessage { value: "0.47.05-r8".into() }, Vec::new())
        })
        .method(Some(PLUGIN), "ResetMapHashes", |_, _: EmptyMessage| {
            Reply::ok(EmptyMessage {}, Vec::new())
        })
        .method(Some(PLUGIN), "GetViewInfo", |_, _: EmptyMessage| {
            Reply::ok(
                ViewInfo {
                    view_pos_x: Some(16),
                    view_pos_z: Some(0),
                    ..Default::default()
                },
                Vec::new(),
            )
        })
        .method(Some(PLUGIN), "GetBlockList", |world: &mut Shared, req: BlockRequest| {
            let mut world = world.lock().unwrap();
            let inside = |b: &&MapBlock| {
                let (x, y) = (b.map_x / 16, b.map_y / 16);
                x >= req.min_x() && x < req.max_x() && y >= req.min_y() && y < req.max_y()
                    && b.map_z >= req.min_z() && b.map_z < req.max_z()
            };
            let map_blocks = world.blocks.iter().filter(inside).cloned().collect();
            world.requests.push(req);
            Reply::ok(
                BlockList {
                    map_blocks,
                    map_x: Some(0),
                    map_y: Some(0),
                },
                Vec::new(),
            )
        })
        .build()
}

/// `server::serve`, but noting each bound method name in the world first.
fn serve_game(
    stream: &mut TcpStream,
    table: &MethodTable<Shared>,
    world: &mut Shared,
) -> dfhack_remote::Result<()> {
    loop {
        let header = MessageHeader::read_from(stream)?;
        if header.id == Control::Quit.id() {
            return Ok(());
        }
        let payload = wire::read_payload(stream, &header)?;
        if header.id == BIND_METHOD_ID {
            let bind = CoreBindRequest::decode(payload.as_slice())?;
            world.lock().unwrap().binds.push(bind.method);
        }
        server::dispatch(table, world, header.id, &payload, stream)?;
    }
}

fn spawn_game(world: Shared) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    thread::spawn(move || {
        let table = Arc::new(game_table());
        for stream in listener.incoming() {
            let mut stream = stream.unwrap();
            let table = table.clone();
            let mut session = world.clone();
            thread::spawn(move || {
                wire::server_handshake(&mut stream).unwrap();
                let _ = serve_game(&mut stream, &table, &mut session);
            });
        }
    });
    addr
}

fn spawn_relay(world: Shared) -> String {
    let upstream = Connection::dial(spawn_game(world).as_str()).unwrap();
    let relay = Arc::new(Relay::new(upstream));
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    thread::spawn(move || relay.serve(listener));
    addr
}

fn world_of(blocks: Vec<MapBlock>) -> Shared {
    Arc::new(Mutex::new(World {
        blocks,
        ..Default::default()
    }))
}

fn square(n: i32) -> Vec<MapBlock> {
    let mut blocks = Vec::new();
    for x in 0..n {
        for y in 0..n {
            blocks.push(block(x, y, 0));
        }
    }
    blocks
}

fn whole_box(n: i32, budget: Option<i32>) -> BlockRequest {
    BlockRequest {
        blocks_needed: budget,
        min_x: Some(0),
        max_x: Some(n),
        min_y: Some(0),
        max_y: Some(n),
        min_z: Some(0),
        max_z: Some(1),
    }
}

fn fetch(conn: &Connection<TcpStream>, req: &BlockRequest) -> Vec<MapBlock> {
    conn.get_block_list(req).into_result().unwrap().map_blocks
}

#[test]
fn test_clients_receive_only_changes() {
    let world = world_of(square(2));
    let addr = spawn_relay(world.clone());
    let req = whole_box(2, None);

    let a = Connection::dial(addr.as_str()).unwrap();
    assert_eq!(fetch(&a, &req).len(), 4);
    assert!(fetch(&a, &req).is_empty());

    world.lock().unwrap().blocks[3].water = vec![5; 256];
    let changed = fetch(&a, &req);
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].water[0], 5);

    // A second client has seen nothing yet.
    let b = Connection::dial(addr.as_str()).unwrap();
    assert_eq!(fetch(&b, &req).len(), 4);

    a.reset_map_hashes().into_result().unwrap();
    assert_eq!(fetch(&a, &req).len(), 4);

    a.close().unwrap();
    b.close().unwrap();
}

#[test]
fn test_budget_is_applied_by_relay() {
    let world = world_of(square(3));
    let addr = spawn_relay(world.clone());
    let req = whole_box(3, Some(4));

    let client = Connection::dial(addr.as_str()).unwrap();
    assert_eq!(fetch(&client, &req).len(), 4);
    assert_eq!(fetch(&client, &req).len(), 4);
    assert_eq!(fetch(&client, &req).len(), 1);
    assert!(fetch(&client, &req).is_empty());

    let seen = world.lock().unwrap();
    assert_eq!(seen.requests.len(), 4);
    assert!(seen.requests.iter().all(|r| r.blocks_needed.is_none()));
}

#[test]
fn test_forwarded_and_local_methods() {
    let addr = spawn_relay(world_of(Vec::new()));
    let client = Connection::dial(addr.as_str()).unwrap();

    assert_eq!(client.get_version().into_result().unwrap(), "0.47.05-r8");
    let view = client.get_view_info().into_result().unwrap();
    assert_eq!(view.view_pos_x, Some(16));

    let run = client.run_command(&CoreRunCommandRequest {
        command: "die".into(),
        arguments: Vec::new(),
    });
    assert!(matches!(
        run.result,
        Err(Error::Command(CommandResult::NotImplemented))
    ));

    // The game does not offer this one, so neither does the relay.
    let suspend = client.core_suspend();
    assert!(matches!(
        suspend.result,
        Err(Error::Command(CommandResult::Failure))
    ));
    assert!(!suspend.text.is_empty());

    assert_eq!(client.get_version().into_result().unwrap(), "0.47.05-r8");
}

#[test]
fn test_concurrent_calls_bind_once() {
    let world = world_of(Vec::new());
    let conn = Arc::new(Connection::dial(spawn_game(world.clone()).as_str()).unwrap());

    let callers: Vec<_> = (0..8)
        .map(|_| {
            let conn = conn.clone();
            thread::spawn(move || {
                (0..4)
                    .map(|_| conn.get_version().into_result())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    for caller in callers {
        for version in caller.join().unwrap() {
            assert_eq!(version.unwrap(), "0.47.05-r8");
        }
    }

    let world = world.lock().unwrap();
    assert_eq!(world.binds.iter().filter(|m| *m == "GetVersion").count(), 1);
}
