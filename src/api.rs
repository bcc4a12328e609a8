//! Typed wrappers for the methods a client normally calls.

use std::io::{Read, Write};

use crate::client::{Connection, Reply};
use crate::proto::{
    BlockList, BlockRequest, CoreRunCommandRequest, CoreRunLuaRequest, EmptyMessage,
    GetWorldInfoOut, IntMessage, ListEnumsOut, ListJobSkillsOut, ListMaterialsIn,
    ListMaterialsOut, ListSquadsIn, ListSquadsOut, ListUnitsIn, ListUnitsOut, MapInfo,
    MaterialList, PlantList, SetUnitLaborsIn, StringListMessage, StringMessage, TiletypeList,
    UnitList, ViewInfo, PLUGIN,
};

impl<S: Read + Write> Connection<S> {
    pub fn get_version(&self) -> Reply<String> {
        self.call::<_, StringMessage>("GetVersion", None, &EmptyMessage {})
            .map(|m| m.value)
    }

    pub fn get_df_version(&self) -> Reply<String> {
        self.call::<_, StringMessage>("GetDFVersion", None, &EmptyMessage {})
            .map(|m| m.value)
    }

    pub fn run_command(&self, req: &CoreRunCommandRequest) -> Reply<()> {
        self.call::<_, EmptyMessage>("RunCommand", None, req).map(|_| ())
    }

    /// Returns the suspend nesting level.
    pub fn core_suspend(&self) -> Reply<i32> {
        self.call::<_, IntMessage>("CoreSuspend", None, &EmptyMessage {})
            .map(|m| m.value)
    }

    pub fn core_resume(&self) -> Reply<i32> {
        self.call::<_, IntMessage>("CoreResume", None, &EmptyMessage {})
            .map(|m| m.value)
    }

    pub fn run_lua(&self, req: &CoreRunLuaRequest) -> Reply<Vec<String>> {
        self.call::<_, StringListMessage>("RunLua", None, req)
            .map(|m| m.value)
    }

    pub fn get_world_info(&self) -> Reply<GetWorldInfoOut> {
        self.call("GetWorldInfo", None, &EmptyMessage {})
    }

    /// Names of the game's flag and enum tables.
    pub fn list_enums(&self) -> Reply<ListEnumsOut> {
        self.call("ListEnums", None, &EmptyMessage {})
    }

    pub fn list_job_skills(&self) -> Reply<ListJobSkillsOut> {
        self.call("ListJobSkills", None, &EmptyMessage {})
    }

    pub fn list_materials(&self, req: &ListMaterialsIn) -> Reply<ListMaterialsOut> {
        self.call("ListMaterials", None, req)
    }

    pub fn list_units(&self, req: &ListUnitsIn) -> Reply<ListUnitsOut> {
        self.call("ListUnits", None, req)
    }

    pub fn list_squads(&self) -> Reply<ListSquadsOut> {
        self.call("ListSquads", None, &ListSquadsIn {})
    }

    pub fn set_unit_labors(&self, req: &SetUnitLaborsIn) -> Reply<()> {
        self.call::<_, EmptyMessage>("SetUnitLabors", None, req)
            .map(|_| ())
    }

    pub fn get_material_list(&self) -> Reply<MaterialList> {
        self.call("GetMaterialList", Some(PLUGIN), &EmptyMessage {})
    }

    pub fn get_growth_list(&self) -> Reply<MaterialList> {
        self.call("GetGrowthList", Some(PLUGIN), &EmptyMessage {})
    }

    pub fn get_tiletype_list(&self) -> Reply<TiletypeList> {
        self.call("GetTiletypeList", Some(PLUGIN), &EmptyMessage {})
    }

    /// Blocks in the box that changed since this connection last asked.
    pub fn get_block_list(&self, req: &BlockRequest) -> Reply<BlockList> {
        self.call("GetBlockList", Some(PLUGIN), req)
    }

    pub fn get_plant_list(&self, req: &BlockRequest) -> Reply<PlantList> {
        self.call("GetPlantList", Some(PLUGIN), req)
    }

    pub fn check_hashes(&self) -> Reply<()> {
        self.call::<_, EmptyMessage>("CheckHashes", Some(PLUGIN), &EmptyMessage {})
            .map(|_| ())
    }

    pub fn get_unit_list(&self) -> Reply<UnitList> {
        self.call("GetUnitList", Some(PLUGIN), &EmptyMessage {})
    }

    pub fn get_view_info(&self) -> Reply<ViewInfo> {
        self.call("GetViewInfo", Some(PLUGIN), &EmptyMessage {})
    }

    pub fn get_map_info(&self) -> Reply<MapInfo> {
        self.call("GetMapInfo", Some(PLUGIN), &EmptyMessage {})
    }

    /// Make the next block list resend everything.
    pub fn reset_map_hashes(&self) -> Reply<()> {
        self.call::<_, EmptyMessage>("ResetMapHashes", Some(PLUGIN), &EmptyMessage {})
            .map(|_| ())
    }
}
