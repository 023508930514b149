use std::path::Path;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use pointshot_core::{ImportProgress, Project};

pub fn import(project: &mut Project, dir: &Path) -> Result<()> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let summary = project.import_photos(
        dir,
        Some(&mut |progress| match progress {
            ImportProgress::Start { folder, file_count } => {
                pb.set_length(file_count as u64);
                pb.set_position(0);
                pb.set_message(format!("Reading {}", folder.display()));
            }
            ImportProgress::Imported { path } => {
                pb.inc(1);
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                pb.set_message(name);
            }
            ImportProgress::Complete { added, skipped } => {
                pb.finish_with_message(format!("{added} added, {skipped} already known"));
            }
        }),
    )?;

    println!(
        "Imported {} photos ({} with GPS, {} projected).",
        summary.added, summary.with_position, summary.projected
    );
    if summary.with_position > summary.projected {
        println!("GPS positions were not projected; match these photos manually or enable gps_conversion.");
    }
    Ok(())
}
