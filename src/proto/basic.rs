//! The basic world queries served by DFHack core: world info, enum tables,
//! skills, materials, units and squads.

use super::rpc_messages;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum WorldMode {
    Dwarf = 1,
    Adventure = 2,
    Legends = 3,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct EnumItemName {
    #[prost(int32, required, tag = "1")]
    pub value: i32,
    #[prost(string, optional, tag = "2")]
    pub name: Option<String>,
    /// Width of a bitfield member; absent means one bit.
    #[prost(int32, optional, tag = "3", default = "1")]
    pub bit_size: Option<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NameInfo {
    #[prost(string, optional, tag = "1")]
    pub first_name: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub nickname: Option<String>,
    #[prost(int32, optional, tag = "3", default = "-1")]
    pub language_id: Option<i32>,
    #[prost(string, optional, tag = "4")]
    pub last_name: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub english_name: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BasicMaterialId {
    #[prost(int32, required, tag = "1")]
    pub r#type: i32,
    #[prost(sint32, required, tag = "2")]
    pub index: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MaterialProduct {
    #[prost(string, required, tag = "1")]
    pub id: String,
    #[prost(int32, required, tag = "2")]
    pub r#type: i32,
    #[prost(sint32, required, tag = "3")]
    pub index: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BasicMaterialInfo {
    #[prost(int32, required, tag = "1")]
    pub r#type: i32,
    #[prost(sint32, required, tag = "2")]
    pub index: i32,
    #[prost(string, required, tag = "3")]
    pub token: String,
    #[prost(int32, repeated, packed = "false", tag = "4")]
    pub flags: Vec<i32>,
    #[prost(int32, optional, tag = "5", default = "-1")]
    pub subtype: Option<i32>,
    #[prost(int32, optional, tag = "6", default = "-1")]
    pub creature_id: Option<i32>,
    #[prost(int32, optional, tag = "7", default = "-1")]
    pub plant_id: Option<i32>,
    #[prost(int32, optional, tag = "8", default = "-1")]
    pub histfig_id: Option<i32>,
    #[prost(string, optional, tag = "9")]
    pub name_prefix: Option<String>,
    #[prost(fixed32, repeated, packed = "false", tag = "10")]
    pub state_color: Vec<u32>,
    #[prost(string, repeated, tag = "11")]
    pub state_name: Vec<String>,
    #[prost(string, repeated, tag = "12")]
    pub state_adj: Vec<String>,
    #[prost(string, repeated, tag = "13")]
    pub reaction_class: Vec<String>,
    #[prost(message, repeated, tag = "14")]
    pub reaction_product: Vec<MaterialProduct>,
    #[prost(int32, repeated, packed = "false", tag = "15")]
    pub inorganic_flags: Vec<i32>,
}

/// Which optional parts of [`BasicMaterialInfo`] to fill in.
#[derive(Clone, PartialEq, prost::Message)]
pub struct BasicMaterialInfoMask {
    /// Matter states to report names and colours for (solid, liquid, ...).
    #[prost(int32, repeated, packed = "false", tag = "1")]
    pub states: Vec<i32>,
    #[prost(int32, optional, tag = "4", default = "10015")]
    pub temperature: Option<i32>,
    #[prost(bool, optional, tag = "2")]
    pub flags: Option<bool>,
    #[prost(bool, optional, tag = "3")]
    pub reaction: Option<bool>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct JobSkillAttr {
    #[prost(int32, required, tag = "1")]
    pub id: i32,
    #[prost(string, required, tag = "2")]
    pub key: String,
    #[prost(string, optional, tag = "3")]
    pub caption: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub caption_noun: Option<String>,
    #[prost(int32, optional, tag = "5")]
    pub profession: Option<i32>,
    #[prost(int32, optional, tag = "6")]
    pub labor: Option<i32>,
    #[prost(string, optional, tag = "7")]
    pub r#type: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProfessionAttr {
    #[prost(int32, required, tag = "1")]
    pub id: i32,
    #[prost(string, required, tag = "2")]
    pub key: String,
    #[prost(string, optional, tag = "3")]
    pub caption: Option<String>,
    #[prost(bool, optional, tag = "4")]
    pub military: Option<bool>,
    #[prost(bool, optional, tag = "5")]
    pub can_assign_labor: Option<bool>,
    #[prost(int32, optional, tag = "6")]
    pub parent: Option<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UnitLaborAttr {
    #[prost(int32, required, tag = "1")]
    pub id: i32,
    #[prost(string, required, tag = "2")]
    pub key: String,
    #[prost(string, optional, tag = "3")]
    pub caption: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SkillInfo {
    #[prost(int32, required, tag = "1")]
    pub id: i32,
    #[prost(int32, required, tag = "2")]
    pub level: i32,
    #[prost(int32, required, tag = "3")]
    pub experience: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UnitMiscTrait {
    #[prost(int32, required, tag = "1")]
    pub id: i32,
    #[prost(int32, required, tag = "2")]
    pub value: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BasicUnitInfo {
    #[prost(int32, required, tag = "1")]
    pub unit_id: i32,
    #[prost(int32, required, tag = "13")]
    pub pos_x: i32,
    #[prost(int32, required, tag = "14")]
    pub pos_y: i32,
    #[prost(int32, required, tag = "15")]
    pub pos_z: i32,
    #[prost(message, optional, tag = "2")]
    pub name: Option<NameInfo>,
    #[prost(fixed32, required, tag = "3")]
    pub flags1: u32,
    #[prost(fixed32, required, tag = "4")]
    pub flags2: u32,
    #[prost(fixed32, required, tag = "5")]
    pub flags3: u32,
    #[prost(int32, required, tag = "6")]
    pub race: i32,
    #[prost(int32, required, tag = "7")]
    pub caste: i32,
    #[prost(int32, optional, tag = "8", default = "-1")]
    pub gender: Option<i32>,
    #[prost(int32, optional, tag = "9", default = "-1")]
    pub civ_id: Option<i32>,
    #[prost(int32, optional, tag = "10", default = "-1")]
    pub histfig_id: Option<i32>,
    #[prost(int32, optional, tag = "17", default = "-1")]
    pub death_id: Option<i32>,
    #[prost(uint32, optional, tag = "18")]
    pub death_flags: Option<u32>,
    #[prost(int32, optional, tag = "19", default = "-1")]
    pub squad_id: Option<i32>,
    #[prost(int32, optional, tag = "20", default = "-1")]
    pub squad_position: Option<i32>,
    #[prost(int32, optional, tag = "22", default = "-1")]
    pub profession: Option<i32>,
    #[prost(string, optional, tag = "23")]
    pub custom_profession: Option<String>,
    #[prost(int32, repeated, packed = "false", tag = "11")]
    pub labors: Vec<i32>,
    #[prost(message, repeated, tag = "12")]
    pub skills: Vec<SkillInfo>,
    #[prost(message, repeated, tag = "24")]
    pub misc_traits: Vec<UnitMiscTrait>,
    #[prost(int32, repeated, packed = "false", tag = "21")]
    pub burrows: Vec<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BasicUnitInfoMask {
    #[prost(bool, optional, tag = "1")]
    pub labors: Option<bool>,
    #[prost(bool, optional, tag = "2")]
    pub skills: Option<bool>,
    #[prost(bool, optional, tag = "3")]
    pub profession: Option<bool>,
    #[prost(bool, optional, tag = "4")]
    pub misc_traits: Option<bool>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BasicSquadInfo {
    #[prost(int32, required, tag = "1")]
    pub squad_id: i32,
    #[prost(message, optional, tag = "2")]
    pub name: Option<NameInfo>,
    #[prost(string, optional, tag = "3")]
    pub alias: Option<String>,
    /// Unit ids, -1 for an empty position.
    #[prost(sint32, repeated, packed = "false", tag = "4")]
    pub members: Vec<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UnitLaborState {
    #[prost(int32, required, tag = "1")]
    pub unit_id: i32,
    #[prost(int32, required, tag = "2")]
    pub labor: i32,
    #[prost(bool, required, tag = "3")]
    pub value: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetWorldInfoOut {
    #[prost(enumeration = "WorldMode", required, tag = "1")]
    pub mode: i32,
    #[prost(string, required, tag = "2")]
    pub save_dir: String,
    #[prost(message, optional, tag = "3")]
    pub world_name: Option<NameInfo>,
    #[prost(int32, optional, tag = "4")]
    pub civ_id: Option<i32>,
    #[prost(int32, optional, tag = "5")]
    pub site_id: Option<i32>,
    #[prost(int32, optional, tag = "6")]
    pub group_id: Option<i32>,
    #[prost(int32, optional, tag = "7")]
    pub race_id: Option<i32>,
    #[prost(int32, optional, tag = "8")]
    pub player_unit_id: Option<i32>,
    #[prost(int32, optional, tag = "9")]
    pub player_histfig_id: Option<i32>,
    #[prost(int32, repeated, packed = "false", tag = "10")]
    pub companion_unit_ids: Vec<i32>,
    #[prost(int32, repeated, packed = "false", tag = "11")]
    pub companion_histfig_ids: Vec<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListEnumsOut {
    #[prost(message, repeated, tag = "1")]
    pub material_flags: Vec<EnumItemName>,
    #[prost(message, repeated, tag = "2")]
    pub inorganic_flags: Vec<EnumItemName>,
    #[prost(message, repeated, tag = "3")]
    pub unit_flags1: Vec<EnumItemName>,
    #[prost(message, repeated, tag = "4")]
    pub unit_flags2: Vec<EnumItemName>,
    #[prost(message, repeated, tag = "5")]
    pub unit_flags3: Vec<EnumItemName>,
    #[prost(message, repeated, tag = "6")]
    pub unit_labor: Vec<EnumItemName>,
    #[prost(message, repeated, tag = "7")]
    pub job_skill: Vec<EnumItemName>,
    #[prost(message, repeated, tag = "8")]
    pub cie_add_tag_mask1: Vec<EnumItemName>,
    #[prost(message, repeated, tag = "9")]
    pub cie_add_tag_mask2: Vec<EnumItemName>,
    #[prost(message, repeated, tag = "10")]
    pub death_info_flags: Vec<EnumItemName>,
    #[prost(message, repeated, tag = "11")]
    pub profession: Vec<EnumItemName>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListJobSkillsOut {
    #[prost(message, repeated, tag = "1")]
    pub skill: Vec<JobSkillAttr>,
    #[prost(message, repeated, tag = "2")]
    pub profession: Vec<ProfessionAttr>,
    #[prost(message, repeated, tag = "3")]
    pub labor: Vec<UnitLaborAttr>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListMaterialsIn {
    #[prost(message, optional, tag = "1")]
    pub mask: Option<BasicMaterialInfoMask>,
    /// Specific materials to look up; the flags below select whole groups.
    #[prost(message, repeated, tag = "2")]
    pub id_list: Vec<BasicMaterialId>,
    #[prost(bool, optional, tag = "3")]
    pub builtin: Option<bool>,
    #[prost(bool, optional, tag = "4")]
    pub inorganic: Option<bool>,
    #[prost(bool, optional, tag = "5")]
    pub creatures: Option<bool>,
    #[prost(bool, optional, tag = "6")]
    pub plants: Option<bool>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListMaterialsOut {
    #[prost(message, repeated, tag = "1")]
    pub value: Vec<BasicMaterialInfo>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListUnitsIn {
    #[prost(message, optional, tag = "1")]
    pub mask: Option<BasicUnitInfoMask>,
    #[prost(int32, repeated, packed = "false", tag = "2")]
    pub id_list: Vec<i32>,
    #[prost(bool, optional, tag = "5")]
    pub scan_all: Option<bool>,
    #[prost(int32, optional, tag = "3")]
    pub race: Option<i32>,
    #[prost(int32, optional, tag = "4")]
    pub civ_id: Option<i32>,
    #[prost(bool, optional, tag = "6")]
    pub dead: Option<bool>,
    #[prost(bool, optional, tag = "7")]
    pub alive: Option<bool>,
    #[prost(bool, optional, tag = "8")]
    pub sane: Option<bool>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListUnitsOut {
    #[prost(message, repeated, tag = "1")]
    pub value: Vec<BasicUnitInfo>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListSquadsIn {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListSquadsOut {
    #[prost(message, repeated, tag = "1")]
    pub value: Vec<BasicSquadInfo>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SetUnitLaborsIn {
    #[prost(message, repeated, tag = "1")]
    pub change: Vec<UnitLaborState>,
}

rpc_messages!("dfproto" =>
    GetWorldInfoOut,
    ListEnumsOut,
    ListJobSkillsOut,
    ListMaterialsIn,
    ListMaterialsOut,
    ListUnitsIn,
    ListUnitsOut,
    ListSquadsIn,
    ListSquadsOut,
    SetUnitLaborsIn,
);
