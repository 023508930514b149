pub mod projection;
pub mod zones;

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::ControlPoint;
pub use projection::{GaussKruger, GeodesyProvider};
pub use zones::{zone, Zone, ZONES};

/// Absolute extrema below this are an arbitrary site grid.
const LOCAL_LIMIT: f64 = 5_000.0;
/// Absolute extrema below this fit inside a national plane-rectangular zone.
const PLANE_LIMIT: f64 = 300_000.0;

/// Reference frame of a point set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    /// Arbitrary site grid. GPS positions cannot be correlated.
    Local,
    /// One of the national plane-rectangular zones.
    NationalPlane,
    /// No points to classify.
    NeedsManual,
}

impl FrameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::Local => "local",
            FrameKind::NationalPlane => "national_plane",
            FrameKind::NeedsManual => "needs_manual",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Extent {
    pub fn of(points: &[ControlPoint]) -> Option<Extent> {
        let first = points.first()?;
        let mut e = Extent {
            xmin: first.x,
            xmax: first.x,
            ymin: first.y,
            ymax: first.y,
        };
        for p in &points[1..] {
            e.xmin = e.xmin.min(p.x);
            e.xmax = e.xmax.max(p.x);
            e.ymin = e.ymin.min(p.y);
            e.ymax = e.ymax.max(p.y);
        }
        Some(e)
    }

    fn all_below(&self, limit: f64) -> bool {
        [self.xmin, self.xmax, self.ymin, self.ymax]
            .iter()
            .all(|v| v.abs() < limit)
    }
}

/// Classify a point set by the magnitude of its coordinates.
pub fn classify(points: &[ControlPoint]) -> FrameKind {
    match Extent::of(points) {
        None => FrameKind::NeedsManual,
        Some(e) if e.all_below(LOCAL_LIMIT) => FrameKind::Local,
        Some(e) if e.all_below(PLANE_LIMIT) => FrameKind::NationalPlane,
        // Too large for any zone: treat as an arbitrary grid.
        Some(_) => FrameKind::Local,
    }
}

/// Test the mean position against each zone's box in zone order; first hit wins.
pub fn infer_zone(points: &[ControlPoint]) -> Option<&'static Zone> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.y).sum::<f64>() / n;
    ZONES.iter().find(|z| z.contains(mean_x, mean_y))
}

/// Outcome of frame resolution for a loaded network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedFrame {
    pub kind: FrameKind,
    /// Inferred zone number; `None` when not inferred.
    pub zone: Option<u8>,
    /// False when a plane frame could not be placed in any zone and the
    /// operator must confirm the configured zone.
    pub zone_confirmed: bool,
    pub extent: Option<Extent>,
}

impl ResolvedFrame {
    pub fn supports_gps(&self) -> bool {
        self.kind == FrameKind::NationalPlane
    }

    pub fn describe(&self) -> String {
        match (self.kind, self.zone) {
            (FrameKind::NationalPlane, Some(z)) => format!("plane-rectangular zone {z}"),
            (FrameKind::NationalPlane, None) => "plane-rectangular (zone unconfirmed)".to_string(),
            (FrameKind::Local, _) => "local grid".to_string(),
            (FrameKind::NeedsManual, _) => "unknown (no points)".to_string(),
        }
    }
}

pub fn resolve(points: &[ControlPoint]) -> ResolvedFrame {
    let kind = classify(points);
    let extent = Extent::of(points);

    let (zone, zone_confirmed) = match kind {
        FrameKind::NationalPlane => match infer_zone(points) {
            Some(z) => (Some(z.number), true),
            None => {
                warn!("point set looks plane-rectangular but matches no zone; confirm the zone manually");
                (None, false)
            }
        },
        FrameKind::Local => (None, true),
        FrameKind::NeedsManual => {
            warn!("no control points to classify; frame needs manual confirmation");
            (None, false)
        }
    };

    let frame = ResolvedFrame {
        kind,
        zone,
        zone_confirmed,
        extent,
    };
    info!(frame = %frame.describe(), "coordinate frame resolved");
    frame
}
