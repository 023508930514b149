use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog schema version {db} is newer than supported version {code}")]
    SchemaTooNew { db: u32, code: u32 },

    #[error("EXIF parsing error: {0}")]
    Exif(#[from] exif::Error),

    #[error("walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("could not decode a survey network with any of: {}", .tried.join(", "))]
    NetworkDecode { tried: Vec<&'static str> },

    #[error("no survey network loaded; run `pointshot network load <file>` first")]
    NetworkNotLoaded,

    #[error("photo folder does not exist: {}", .0.display())]
    PhotoFolderNotFound(PathBuf),

    #[error("photo not found: {0}")]
    PhotoNotFound(String),

    #[error("photo is not assigned to a control point: {0}")]
    PhotoNotAssigned(String),

    #[error("control point not found: {0}")]
    PointNotFound(String),

    #[error("plane-rectangular zone must be 1..=19, got {0}")]
    ZoneOutOfRange(u8),

    #[error("unknown setting: {0}")]
    UnknownSetting(String),

    #[error("invalid value for {key}: {value}")]
    InvalidSetting { key: String, value: String },

    #[error("automatic matching unavailable: {0}")]
    AutoMatchUnavailable(String),

    #[error("no control point within threshold for {filename} (nearest {best:.2} m)")]
    NoMatchWithinThreshold { filename: String, best: f64 },

    #[error("photo has no projected position: {0}")]
    NoProjectedPosition(String),

    #[error("projection failed for ({lat}, {lon}) in zone {zone}")]
    ProjectionFailed { lat: f64, lon: f64, zone: u8 },

    #[error("export path does not exist: {}", .0.display())]
    ExportPathNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
