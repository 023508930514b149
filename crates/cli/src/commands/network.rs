use std::path::Path;

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use pointshot_core::domain::{Parcel, ParcelSource};
use pointshot_core::frame::{zone, FrameKind, Zone};
use pointshot_core::naming::is_special;
use pointshot_core::Project;

pub fn load(project: &mut Project, path: &Path) -> Result<()> {
    let frame = project.load_network(path)?;

    if let Some(net) = project.network() {
        println!(
            "Loaded {} points and {} parcels ({})",
            net.points.len(),
            net.parcels.len(),
            net.encoding
        );
        if !net.diagnostics.is_empty() {
            println!("  {} records skipped:", net.diagnostics.len());
            for d in &net.diagnostics {
                println!("    line {}: {}", d.line, d.message);
            }
        }
    }

    println!("Frame: {}", frame.describe());
    match frame.kind {
        FrameKind::Local => println!("GPS conversion disabled; assign photos manually."),
        FrameKind::NationalPlane if !frame.zone_confirmed => println!(
            "Zone could not be inferred; using zone {}. Change it with 'pointshot config set zone <N>'.",
            project.settings().zone
        ),
        FrameKind::NationalPlane => {}
        FrameKind::NeedsManual => println!("Frame needs manual confirmation."),
    }
    if frame.kind == FrameKind::NationalPlane {
        println!("{}", projection_line(zone(project.settings().zone)?));
    }
    Ok(())
}

fn projection_line(zone: &Zone) -> String {
    format!("GPS projection: JGD2011 plane zone {} (EPSG:{})", zone.number, zone.epsg())
}

pub fn show(project: &Project, parcels: bool) -> Result<()> {
    let Some(net) = project.network() else {
        println!("No network loaded. Run 'pointshot network load <FILE>'.");
        return Ok(());
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if parcels {
        table.set_header(vec![
            Cell::new("ID"),
            Cell::new("Name"),
            Cell::new("Kind"),
            Cell::new("Vertices"),
            Cell::new("Points"),
        ]);
        for parcel in &net.parcels {
            table.add_row(vec![
                Cell::new(&parcel.id),
                Cell::new(&parcel.name),
                Cell::new(parcel_kind(parcel)),
                Cell::new(parcel.vertices.len()),
                Cell::new(parcel_refs(parcel)),
            ]);
        }
    } else {
        table.set_header(vec![
            Cell::new("ID"),
            Cell::new("Name"),
            Cell::new("X"),
            Cell::new("Y"),
            Cell::new("Z"),
        ]);
        for point in &net.points {
            let name = if is_special(point) {
                Cell::new(&point.name).fg(Color::Yellow)
            } else {
                Cell::new(&point.name)
            };
            table.add_row(vec![
                Cell::new(&point.id),
                name,
                Cell::new(format!("{:.3}", point.x)),
                Cell::new(format!("{:.3}", point.y)),
                Cell::new(format!("{:.3}", point.z)),
            ]);
        }
    }

    println!("{table}");
    if let Some(path) = project.network_path() {
        println!("  {}", path.display());
    }
    Ok(())
}

pub(crate) fn parcel_kind(parcel: &Parcel) -> String {
    match &parcel.source {
        ParcelSource::Legacy => "legacy".to_string(),
        ParcelSource::Linked { type_code } => format!("linked ({type_code})"),
    }
}

/// Referenced point labels, comma-separated.
pub(crate) fn parcel_refs(parcel: &Parcel) -> String {
    parcel
        .refs
        .iter()
        .map(|r| if r.name.is_empty() { r.id.clone() } else { r.name.clone() })
        .collect::<Vec<_>>()
        .join(", ")
}
