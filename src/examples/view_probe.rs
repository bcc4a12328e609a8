//! Connect to DFHack (or a relay), print what the player is looking at, and
//! fetch the blocks around it twice. The second fetch only returns blocks that
//! changed in between.

use anyhow::Result;
use dfhack_remote::proto::{BlockRequest, ViewInfo};
use dfhack_remote::{Connection, Reply};

const RADIUS: i32 = 3;

fn print_text<T>(reply: &Reply<T>) {
    for line in &reply.text {
        print!("{line}");
    }
}

fn request_around(view: &ViewInfo) -> BlockRequest {
    let centre_x = (view.view_pos_x() + view.view_size_x() / 2).div_euclid(16);
    let centre_y = (view.view_pos_y() + view.view_size_y() / 2).div_euclid(16);
    let z = view.view_pos_z();
    BlockRequest {
        blocks_needed: None,
        min_x: Some(centre_x - RADIUS),
        max_x: Some(centre_x + RADIUS + 1),
        min_y: Some(centre_y - RADIUS),
        max_y: Some(centre_y + RADIUS + 1),
        min_z: Some(z - 1),
        max_z: Some(z + 1),
    }
}

fn main() -> Result<()> {
    let conn = Connection::connect()?;

    let version = conn.get_version();
    print_text(&version);
    println!("DFHack {}", version.into_result()?);
    println!("Dwarf Fortress {}", conn.get_df_version().into_result()?);

    let view = conn.get_view_info();
    print_text(&view);
    let view = view.into_result()?;
    println!(
        "view at ({}, {}, {}), size {}x{}",
        view.view_pos_x(),
        view.view_pos_y(),
        view.view_pos_z(),
        view.view_size_x(),
        view.view_size_y()
    );

    let req = request_around(&view);
    conn.reset_map_hashes().into_result()?;
    for pass in 1..=2 {
        let list = conn.get_block_list(&req);
        print_text(&list);
        let list = list.into_result()?;
        println!("pass {pass}: {} blocks", list.map_blocks.len());
        for block in &list.map_blocks {
            println!(
                "  block ({}, {}, {}): {} tiles",
                block.map_x,
                block.map_y,
                block.map_z,
                block.tiles.len()
            );
        }
    }

    conn.close()?;
    Ok(())
}
