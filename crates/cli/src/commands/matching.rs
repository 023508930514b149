use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use pointshot_core::domain::Category;
use pointshot_core::naming::Assignment;
use pointshot_core::{MatchProgress, Project};

use super::status::format_distance;

/// clap value parser: only the two concrete categories are accepted.
pub fn parse_category(s: &str) -> Result<Category, String> {
    match Category::parse(s) {
        Some(c @ (Category::Distant | Category::Close)) => Ok(c),
        _ => Err(format!("expected 'distant' or 'close', got '{s}'")),
    }
}

pub fn auto(project: &mut Project, threshold: Option<f64>) -> Result<()> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    let mut demotions = Vec::new();

    let summary = project.auto_match(
        threshold,
        Some(&mut |progress| match progress {
            MatchProgress::Start { total } => {
                pb.set_length(total as u64);
                pb.set_message("Matching photos...");
            }
            MatchProgress::Matched {
                filename,
                distance,
                name,
                ..
            } => {
                pb.inc(1);
                pb.set_message(format!("{filename} -> {name} ({})", format_distance(Some(distance))));
            }
            MatchProgress::Demoted { filename, new_name } => {
                demotions.push(format!("{filename} -> {new_name}"));
            }
            MatchProgress::Complete(summary) => {
                pb.finish_with_message(format!("{} matched", summary.matched));
            }
        }),
    )?;

    println!(
        "Matched {} photos ({} already matched, {} out of range, {} without position).",
        summary.matched, summary.already_matched, summary.out_of_range, summary.no_position
    );
    if !demotions.is_empty() {
        println!("Renamed after a closer photo took their slot:");
        for d in &demotions {
            println!("  {d}");
        }
    }
    Ok(())
}

pub fn assign(project: &mut Project, photo: &str, point: Option<&str>, category: Option<Category>) -> Result<()> {
    let assignment = project.assign(photo, point, category)?;
    print_assignment(project, &assignment);
    Ok(())
}

pub fn unassign(project: &mut Project, photo: &str) -> Result<()> {
    project.unassign(photo)?;
    println!("{photo}: unassigned");
    Ok(())
}

pub fn category(project: &mut Project, photo: &str, category: Category) -> Result<()> {
    let assignment = project.set_category(photo, category)?;
    print_assignment(project, &assignment);
    Ok(())
}

fn print_assignment(project: &Project, assignment: &Assignment) {
    let distance = project.photo(&assignment.filename).and_then(|p| p.distance);
    println!(
        "{} -> {} ({})",
        assignment.filename,
        assignment.name,
        format_distance(distance)
    );
    if let Some(demoted) = &assignment.demoted {
        println!("{} -> {} (displaced)", demoted.filename, demoted.new_name);
    }
}
