use anyhow::Result;
use comfy_table::Cell;
use pointshot_core::Project;

use super::status::{add_photo_row, partition_photos, photo_table};

pub fn run(project: &Project, json: bool) -> Result<()> {
    let photos = project.photos();

    if json {
        println!("{}", serde_json::to_string_pretty(photos)?);
        return Ok(());
    }

    if photos.is_empty() {
        println!("No photos imported. Run 'pointshot photos import <DIR>'.");
        return Ok(());
    }

    let (matched, unmatched) = partition_photos(photos);
    let mut table = photo_table();

    for photo in &matched {
        add_photo_row(&mut table, photo);
    }

    // Separator between matched and unmatched
    if !matched.is_empty() && !unmatched.is_empty() {
        let empty_row: Vec<Cell> = (0..6).map(|_| Cell::new("")).collect();
        table.add_row(empty_row);
    }

    for photo in &unmatched {
        add_photo_row(&mut table, photo);
    }

    println!();
    println!("  Photos ({} matched, {} unmatched)", matched.len(), unmatched.len());
    println!("  ------");
    println!("{table}");
    println!();

    Ok(())
}
