use std::path::Path;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use pointshot_core::{export::ExportProgress, Project};

pub fn run(project: &Project, dir: &Path, backup: bool) -> Result<()> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let report = project.export(
        dir,
        backup,
        Some(&mut |progress| match progress {
            ExportProgress::Start { total } => {
                pb.set_length(total as u64);
                pb.set_position(0);
                pb.set_message("Copying photos...");
            }
            ExportProgress::BackedUp { dir, count } => {
                pb.println(format!("Backed up {count} photos to {}", dir.display()));
            }
            ExportProgress::Copied { target, .. } => {
                pb.inc(1);
                pb.set_message(format!("-> {}", target.display()));
            }
            ExportProgress::Skipped { .. } => {
                pb.inc(1);
            }
            ExportProgress::Failed { path, message } => {
                pb.inc(1);
                pb.println(format!("failed: {} ({message})", path.display()));
            }
            ExportProgress::Complete {
                copied,
                skipped,
                failed,
            } => {
                pb.finish_with_message(format!("{copied} copied, {skipped} unchanged, {failed} failed"));
            }
        }),
    )?;

    if report.failures.is_empty() {
        println!("Export complete.");
    } else {
        println!("Export finished with {} failures.", report.failures.len());
    }
    Ok(())
}
