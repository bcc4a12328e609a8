use super::rpc_messages;

/// Plugin namespace the map/world methods are registered under.
pub const PLUGIN: &str = "RemoteFortressReader";

#[derive(Clone, Copy, PartialEq, Eq, Hash, prost::Message)]
pub struct MatPair {
    #[prost(int32, required, tag = "1")]
    pub mat_type: i32,
    #[prost(int32, required, tag = "2")]
    pub mat_index: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ColorDefinition {
    #[prost(int32, required, tag = "1")]
    pub red: i32,
    #[prost(int32, required, tag = "2")]
    pub green: i32,
    #[prost(int32, required, tag = "3")]
    pub blue: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MaterialDefinition {
    #[prost(message, optional, tag = "1")]
    pub mat_pair: Option<MatPair>,
    #[prost(string, optional, tag = "2")]
    pub id: Option<String>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub name: Option<Vec<u8>>,
    #[prost(message, optional, tag = "4")]
    pub state_color: Option<ColorDefinition>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MaterialList {
    #[prost(message, repeated, tag = "1")]
    pub material_list: Vec<MaterialDefinition>,
}

/// Shape, special, material and variant are plugin enums kept as raw values.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Tiletype {
    #[prost(int32, required, tag = "1")]
    pub id: i32,
    #[prost(string, optional, tag = "2")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub caption: Option<String>,
    #[prost(int32, optional, tag = "4")]
    pub shape: Option<i32>,
    #[prost(int32, optional, tag = "5")]
    pub special: Option<i32>,
    #[prost(int32, optional, tag = "6")]
    pub material: Option<i32>,
    #[prost(int32, optional, tag = "7")]
    pub variant: Option<i32>,
    #[prost(string, optional, tag = "8")]
    pub direction: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TiletypeList {
    #[prost(message, repeated, tag = "1")]
    pub tiletype_list: Vec<Tiletype>,
}

/// Per-tile data for one 16x16 block at one z-level.
///
/// Positions are in tiles. Every per-tile field is either empty (not sent in
/// this update) or holds 256 entries in row-major order.
#[derive(Clone, PartialEq, prost::Message)]
pub struct MapBlock {
    #[prost(int32, required, tag = "1")]
    pub map_x: i32,
    #[prost(int32, required, tag = "2")]
    pub map_y: i32,
    #[prost(int32, required, tag = "3")]
    pub map_z: i32,
    #[prost(int32, repeated, packed = "false", tag = "4")]
    pub tiles: Vec<i32>,
    #[prost(message, repeated, tag = "5")]
    pub materials: Vec<MatPair>,
    #[prost(message, repeated, tag = "6")]
    pub layer_materials: Vec<MatPair>,
    #[prost(message, repeated, tag = "7")]
    pub vein_materials: Vec<MatPair>,
    #[prost(message, repeated, tag = "8")]
    pub base_materials: Vec<MatPair>,
    #[prost(int32, repeated, packed = "false", tag = "9")]
    pub magma: Vec<i32>,
    #[prost(int32, repeated, packed = "false", tag = "10")]
    pub water: Vec<i32>,
    #[prost(bool, repeated, packed = "false", tag = "11")]
    pub hidden: Vec<bool>,
    #[prost(bool, repeated, packed = "false", tag = "12")]
    pub light: Vec<bool>,
    #[prost(bool, repeated, packed = "false", tag = "13")]
    pub subterranean: Vec<bool>,
    #[prost(bool, repeated, packed = "false", tag = "14")]
    pub outside: Vec<bool>,
    #[prost(bool, repeated, packed = "false", tag = "15")]
    pub aquifer: Vec<bool>,
    #[prost(bool, repeated, packed = "false", tag = "16")]
    pub water_stagnant: Vec<bool>,
    #[prost(bool, repeated, packed = "false", tag = "17")]
    pub water_salt: Vec<bool>,
}

/// A bounding box in block units (z in tiles), max bounds exclusive.
#[derive(Clone, PartialEq, prost::Message)]
pub struct BlockRequest {
    #[prost(int32, optional, tag = "1")]
    pub blocks_needed: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub min_x: Option<i32>,
    #[prost(int32, optional, tag = "3")]
    pub max_x: Option<i32>,
    #[prost(int32, optional, tag = "4")]
    pub min_y: Option<i32>,
    #[prost(int32, optional, tag = "5")]
    pub max_y: Option<i32>,
    #[prost(int32, optional, tag = "6")]
    pub min_z: Option<i32>,
    #[prost(int32, optional, tag = "7")]
    pub max_z: Option<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BlockList {
    #[prost(message, repeated, tag = "1")]
    pub map_blocks: Vec<MapBlock>,
    #[prost(int32, optional, tag = "2")]
    pub map_x: Option<i32>,
    #[prost(int32, optional, tag = "3")]
    pub map_y: Option<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PlantDef {
    #[prost(int32, required, tag = "1")]
    pub pos_x: i32,
    #[prost(int32, required, tag = "2")]
    pub pos_y: i32,
    #[prost(int32, required, tag = "3")]
    pub pos_z: i32,
    #[prost(int32, required, tag = "4")]
    pub index: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PlantList {
    #[prost(message, repeated, tag = "1")]
    pub plant_list: Vec<PlantDef>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UnitDefinition {
    #[prost(int32, required, tag = "1")]
    pub id: i32,
    #[prost(bool, optional, tag = "2")]
    pub is_valid: Option<bool>,
    #[prost(int32, optional, tag = "3")]
    pub pos_x: Option<i32>,
    #[prost(int32, optional, tag = "4")]
    pub pos_y: Option<i32>,
    #[prost(int32, optional, tag = "5")]
    pub pos_z: Option<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UnitList {
    #[prost(message, repeated, tag = "1")]
    pub creature_list: Vec<UnitDefinition>,
}

/// Where the game's camera currently looks, in tiles.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ViewInfo {
    #[prost(int32, optional, tag = "1")]
    pub view_pos_x: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub view_pos_y: Option<i32>,
    #[prost(int32, optional, tag = "3")]
    pub view_pos_z: Option<i32>,
    #[prost(int32, optional, tag = "4")]
    pub view_size_x: Option<i32>,
    #[prost(int32, optional, tag = "5")]
    pub view_size_y: Option<i32>,
    #[prost(int32, optional, tag = "6")]
    pub cursor_pos_x: Option<i32>,
    #[prost(int32, optional, tag = "7")]
    pub cursor_pos_y: Option<i32>,
    #[prost(int32, optional, tag = "8")]
    pub cursor_pos_z: Option<i32>,
    #[prost(int32, optional, tag = "9")]
    pub follow_unit_id: Option<i32>,
    #[prost(int32, optional, tag = "10")]
    pub follow_item_id: Option<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MapInfo {
    #[prost(int32, optional, tag = "1")]
    pub block_size_x: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub block_size_y: Option<i32>,
    #[prost(int32, optional, tag = "3")]
    pub block_size_z: Option<i32>,
    #[prost(int32, optional, tag = "4")]
    pub block_pos_x: Option<i32>,
    #[prost(int32, optional, tag = "5")]
    pub block_pos_y: Option<i32>,
    #[prost(int32, optional, tag = "6")]
    pub block_pos_z: Option<i32>,
    #[prost(string, optional, tag = "7")]
    pub world_name: Option<String>,
    #[prost(string, optional, tag = "8")]
    pub world_name_english: Option<String>,
    #[prost(string, optional, tag = "9")]
    pub save_name: Option<String>,
}

rpc_messages!("RemoteFortressReader" =>
    MatPair,
    MaterialList,
    TiletypeList,
    MapBlock,
    BlockRequest,
    BlockList,
    PlantList,
    UnitList,
    ViewInfo,
    MapInfo,
);
