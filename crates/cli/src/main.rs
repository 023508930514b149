mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pointshot_core::domain::Category;
use pointshot_core::Project;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Pointshot: match survey photos to control points and give them canonical names
#[derive(Parser)]
#[command(name = "pointshot", version, about)]
struct Cli {
    /// Path to the project catalog database
    #[arg(long, global = true, default_value = "pointshot.db")]
    catalog: PathBuf,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load or inspect the survey network
    Network {
        #[command(subcommand)]
        action: NetworkAction,
    },
    /// Ingest field photos
    Photos {
        #[command(subcommand)]
        action: PhotosAction,
    },
    /// List photos with their match and canonical name
    Ls {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Match every unmatched photo to its nearest control point
    Match {
        /// Maximum distance in meters (defaults to the configured threshold)
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Assign a photo to a control point
    Assign {
        /// Photo filename
        photo: String,
        /// Point id or name (omit to use the nearest point within the threshold)
        #[arg(long)]
        point: Option<String>,
        /// distant or close (defaults to the configured category)
        #[arg(long, value_parser = commands::matching::parse_category)]
        category: Option<Category>,
    },
    /// Clear a photo's match and canonical name
    Unassign {
        /// Photo filename
        photo: String,
    },
    /// Change the category of an assigned photo
    Category {
        /// Photo filename
        photo: String,
        /// distant or close
        #[arg(value_parser = commands::matching::parse_category)]
        category: Category,
    },
    /// Show project status summary
    Status,
    /// Copy named photos into a folder under their canonical names
    Export {
        /// Output directory (must exist)
        dir: PathBuf,
        /// Back up every source photo into the output directory first
        #[arg(long)]
        backup: bool,
    },
    /// Show or change project settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum NetworkAction {
    /// Parse a network file and adopt it for the project
    Load {
        /// Path to the network file
        path: PathBuf,
    },
    /// Show the loaded control points
    Show {
        /// List parcels instead of points
        #[arg(long)]
        parcels: bool,
    },
}

#[derive(Subcommand)]
enum PhotosAction {
    /// Import every photo directly inside a folder
    Import {
        /// Path to the photo folder
        dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show every setting
    Show,
    /// Change one setting
    Set { key: String, value: String },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    debug!(catalog = %cli.catalog.display(), "opening project");
    let mut project = Project::open(&cli.catalog)?;

    match cli.command {
        Commands::Network { action } => match action {
            NetworkAction::Load { path } => commands::network::load(&mut project, &path)?,
            NetworkAction::Show { parcels } => commands::network::show(&project, parcels)?,
        },
        Commands::Photos { action } => match action {
            PhotosAction::Import { dir } => commands::photos::import(&mut project, &dir)?,
        },
        Commands::Ls { json } => commands::ls::run(&project, json)?,
        Commands::Match { threshold } => commands::matching::auto(&mut project, threshold)?,
        Commands::Assign {
            photo,
            point,
            category,
        } => commands::matching::assign(&mut project, &photo, point.as_deref(), category)?,
        Commands::Unassign { photo } => commands::matching::unassign(&mut project, &photo)?,
        Commands::Category { photo, category } => commands::matching::category(&mut project, &photo, category)?,
        Commands::Status => commands::status::run(&project)?,
        Commands::Export { dir, backup } => commands::export::run(&project, &dir, backup)?,
        Commands::Config { action } => match action {
            None | Some(ConfigAction::Show) => commands::config::show(&project)?,
            Some(ConfigAction::Set { key, value }) => commands::config::set(&mut project, &key, &value)?,
        },
    }

    Ok(())
}
