use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A position in a plane-rectangular frame, in meters.
/// `x` points north and `y` points east (surveying convention).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanePoint {
    pub x: f64,
    pub y: f64,
}

impl PlanePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &PlanePoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// A surveyed control point from an `A01` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub id: String,
    /// May be empty.
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ControlPoint {
    pub fn position(&self) -> PlanePoint {
        PlanePoint::new(self.x, self.y)
    }
}

/// A point reference inside a linked (`D00`) parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRef {
    pub id: String,
    pub name: String,
}

/// Which record family a parcel came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParcelSource {
    /// `A02` with inline coordinate lines.
    Legacy,
    /// `D00` with `B01` point references; carries the record's type code.
    Linked { type_code: String },
}

/// A land parcel: an ordered ring of vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub id: String,
    pub name: String,
    pub source: ParcelSource,
    /// Resolved references in file order. Empty for legacy parcels.
    pub refs: Vec<PointRef>,
    /// Vertices in file order.
    pub vertices: Vec<PlanePoint>,
}

impl Parcel {
    /// The closed ring (first vertex repeated at the end), or `None` when the
    /// parcel has fewer than three distinct vertices.
    pub fn polygon(&self) -> Option<Vec<PlanePoint>> {
        let mut distinct: Vec<PlanePoint> = Vec::new();
        for v in &self.vertices {
            if !distinct.contains(v) {
                distinct.push(*v);
            }
        }
        if distinct.len() < 3 {
            return None;
        }
        let mut ring = self.vertices.clone();
        if ring.first() != ring.last() {
            ring.push(ring[0]);
        }
        Some(ring)
    }
}

/// Shot category of a photo relative to its control point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Unknown,
    Distant,
    Close,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Unknown => "unknown",
            Category::Distant => "distant",
            Category::Close => "close",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" => Some(Category::Unknown),
            "distant" | "far" => Some(Category::Distant),
            "close" | "near" => Some(Category::Close),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field photograph and everything the core has learned about it.
///
/// `filename` is the stable key. Positions are mutated by projection and by
/// the naming engine; `original_projected` changes only when GPS positions
/// are re-projected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub filename: String,
    pub path: PathBuf,
    pub capture_time: Option<NaiveDateTime>,
    pub raw_position: Option<LatLon>,
    pub projected: Option<PlanePoint>,
    pub original_projected: Option<PlanePoint>,
    pub category: Category,
    pub matched_point_id: Option<String>,
    pub distance: Option<f64>,
    pub assigned_name: Option<String>,
}

impl PhotoRecord {
    pub fn new(path: PathBuf) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            filename,
            path,
            capture_time: None,
            raw_position: None,
            projected: None,
            original_projected: None,
            category: Category::Unknown,
            matched_point_id: None,
            distance: None,
            assigned_name: None,
        }
    }

    /// Record a projected position. The first successful projection is also
    /// kept as the original.
    pub fn set_projection(&mut self, position: PlanePoint) {
        self.projected = Some(position);
        if self.original_projected.is_none() {
            self.original_projected = Some(position);
        }
    }

    /// Undo any snap-to-point effect.
    pub fn restore_position(&mut self) {
        self.projected = self.original_projected;
    }

    pub fn is_matched(&self) -> bool {
        self.matched_point_id.is_some()
    }

    /// File extension including the leading dot, as written in the source name.
    pub fn extension(&self) -> String {
        match self.filename.rfind('.') {
            Some(idx) if idx > 0 => self.filename[idx..].to_string(),
            _ => String::new(),
        }
    }
}

/// Summary statistics over a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStats {
    pub total_photos: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub distant: usize,
    pub close: usize,
    pub total_points: usize,
    pub total_parcels: usize,
    pub frame: String,
    pub gps_conversion: bool,
}

impl ProjectStats {
    pub fn match_percent(&self) -> f64 {
        if self.total_photos == 0 {
            0.0
        } else {
            self.matched as f64 / self.total_photos as f64 * 100.0
        }
    }
}
