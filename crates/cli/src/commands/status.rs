use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use pointshot_core::domain::{Category, PhotoRecord, PlanePoint, ProjectStats};
use pointshot_core::Project;

pub fn run(project: &Project) -> Result<()> {
    let stats = project.status();
    let network = match project.network_path() {
        Some(p) => p.display().to_string(),
        None => "not loaded".to_string(),
    };

    println!();
    println!("  Pointshot Status");
    println!("  ====================");
    println!();
    println!("  Overview");
    println!("  --------");
    println!(
        "   Photos:     {:>8}        Points:      {:>8}",
        stats.total_photos, stats.total_points
    );
    println!(
        "   Matched:    {:>8}        Parcels:     {:>8}",
        stats.matched, stats.total_parcels
    );
    println!(
        "   Unmatched:  {:>8}        Matched:     {}",
        stats.unmatched,
        format_percent(&stats)
    );
    println!(
        "   Distant:    {:>8}        Close:       {:>8}",
        stats.distant, stats.close
    );
    println!();
    println!("   Network:    {network}");
    println!("   Frame:      {}", stats.frame);
    println!(
        "   GPS:        {}",
        if stats.gps_conversion {
            format!("converted into zone {}", project.settings().zone)
        } else {
            "not converted".to_string()
        }
    );

    if stats.unmatched > 0 {
        println!();
        println!("  Run 'pointshot match' to name unmatched photos.");
    }
    println!();

    Ok(())
}

pub(crate) fn format_percent(stats: &ProjectStats) -> String {
    format!("{:.1}%", stats.match_percent())
}

pub(crate) fn format_distance(distance: Option<f64>) -> String {
    match distance {
        Some(d) => format!("{d:.2} m"),
        None => "-".to_string(),
    }
}

pub(crate) fn format_position(position: Option<PlanePoint>) -> String {
    match position {
        Some(p) => format!("{:.3}, {:.3}", p.x, p.y),
        None => "-".to_string(),
    }
}

/// Matched photos first, then unmatched; ingestion order within each.
pub(crate) fn partition_photos(photos: &[PhotoRecord]) -> (Vec<&PhotoRecord>, Vec<&PhotoRecord>) {
    photos.iter().partition(|p| p.is_matched())
}

pub(crate) fn add_photo_row(table: &mut Table, photo: &PhotoRecord) {
    let mut row: Vec<Cell> = vec![
        Cell::new(&photo.filename),
        Cell::new(format_position(photo.original_projected.or(photo.projected))),
    ];

    match &photo.matched_point_id {
        Some(id) => row.push(Cell::new(id).fg(Color::Cyan)),
        None => row.push(Cell::new("-").fg(Color::DarkGrey)),
    }

    row.push(match photo.category {
        Category::Distant => Cell::new("distant").fg(Color::Blue),
        Category::Close => Cell::new("close").fg(Color::Green),
        Category::Unknown => Cell::new(""),
    });
    row.push(Cell::new(format_distance(photo.distance)));

    match &photo.assigned_name {
        Some(name) => row.push(Cell::new(name).fg(Color::Green)),
        None => row.push(Cell::new("")),
    }

    table.add_row(row);
}

pub(crate) fn photo_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("File"),
        Cell::new("Position"),
        Cell::new("Point"),
        Cell::new("Category"),
        Cell::new("Distance"),
        Cell::new("Name"),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn make_photo(name: &str, point: Option<&str>) -> PhotoRecord {
        let mut photo = PhotoRecord::new(PathBuf::from(format!("/field/{name}")));
        if let Some(id) = point {
            photo.matched_point_id = Some(id.to_string());
            photo.category = Category::Close;
            photo.assigned_name = Some(format!("{id}-2.jpg"));
        }
        photo
    }

    fn make_stats(total: usize, matched: usize) -> ProjectStats {
        ProjectStats {
            total_photos: total,
            matched,
            unmatched: total - matched,
            distant: 0,
            close: matched,
            total_points: 4,
            total_parcels: 1,
            frame: "local grid".to_string(),
            gps_conversion: false,
        }
    }

    // ── Formatting ───────────────────────────────────────────────

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(Some(3.14159)), "3.14 m");
        assert_eq!(format_distance(Some(0.0)), "0.00 m");
        assert_eq!(format_distance(None), "-");
    }

    #[test]
    fn test_format_position() {
        assert_eq!(
            format_position(Some(PlanePoint::new(-35000.0, -6000.125))),
            "-35000.000, -6000.125"
        );
        assert_eq!(format_position(None), "-");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(&make_stats(4, 1)), "25.0%");
        assert_eq!(format_percent(&make_stats(3, 2)), "66.7%");
    }

    #[test]
    fn test_format_percent_empty_project() {
        assert_eq!(format_percent(&make_stats(0, 0)), "0.0%");
    }

    // ── Ordering ─────────────────────────────────────────────────

    #[test]
    fn test_partition_keeps_ingestion_order() {
        let photos = vec![
            make_photo("c.jpg", None),
            make_photo("a.jpg", Some("2")),
            make_photo("b.jpg", None),
            make_photo("d.jpg", Some("1")),
        ];
        let (matched, unmatched) = partition_photos(&photos);
        let names = |v: &[&PhotoRecord]| v.iter().map(|p| p.filename.clone()).collect::<Vec<_>>();
        assert_eq!(names(&matched), vec!["a.jpg", "d.jpg"]);
        assert_eq!(names(&unmatched), vec!["c.jpg", "b.jpg"]);
    }

    #[test]
    fn test_partition_empty() {
        let (matched, unmatched) = partition_photos(&[]);
        assert!(matched.is_empty());
        assert!(unmatched.is_empty());
    }

    // ── Table ────────────────────────────────────────────────────

    #[test]
    fn test_photo_rows_render() {
        let mut table = photo_table();
        add_photo_row(&mut table, &make_photo("IMG_1.jpg", Some("BM1")));
        add_photo_row(&mut table, &make_photo("IMG_2.jpg", None));

        let rendered = table.to_string();
        assert!(rendered.contains("IMG_1.jpg"));
        assert!(rendered.contains("BM1-2.jpg"));
        assert!(rendered.contains("IMG_2.jpg"));
        assert_eq!(table.row_iter().count(), 2);
    }
}
