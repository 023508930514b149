use rayon::prelude::*;

use crate::domain::{ControlPoint, PhotoRecord, PlanePoint};

/// Default maximum matching distance in meters.
pub const DEFAULT_THRESHOLD: f64 = 10.0;

/// Result of matching one photo against the control points.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Nearest point within the threshold. `index` is the point's position in
    /// parse order.
    Matched {
        index: usize,
        point_id: String,
        distance: f64,
    },
    /// Nothing within the threshold. `best` is the nearest distance found, or
    /// `None` when there were no points at all.
    NoMatch { best: Option<f64> },
    /// The photo has no projected position.
    NotApplicable,
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched { .. })
    }
}

/// Nearest point by Euclidean distance. Ties go to the earliest point.
pub fn nearest(position: PlanePoint, points: &[ControlPoint]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        let d = position.distance_to(&p.position());
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best
}

/// Match a single position. The threshold is inclusive.
pub fn find_nearest(position: Option<PlanePoint>, points: &[ControlPoint], threshold: f64) -> MatchOutcome {
    let Some(position) = position else {
        return MatchOutcome::NotApplicable;
    };
    match nearest(position, points) {
        Some((index, distance)) if distance <= threshold => MatchOutcome::Matched {
            index,
            point_id: points[index].id.clone(),
            distance,
        },
        Some((_, distance)) => MatchOutcome::NoMatch { best: Some(distance) },
        None => MatchOutcome::NoMatch { best: None },
    }
}

/// Match many photos in parallel. Output order follows `photos`.
pub fn match_batch(photos: &[&PhotoRecord], points: &[ControlPoint], threshold: f64) -> Vec<MatchOutcome> {
    photos
        .par_iter()
        .map(|photo| find_nearest(photo.projected, points, threshold))
        .collect()
}
