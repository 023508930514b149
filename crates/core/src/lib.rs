pub mod catalog;
pub mod domain;
pub mod error;
pub mod exif;
pub mod export;
pub mod frame;
pub mod hasher;
pub mod matching;
pub mod naming;
pub mod network;
pub mod scanner;
pub mod settings;

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::exif::{ExifData, ExifProvider, KamadakExif};
use catalog::Catalog;
use domain::*;
use error::{Error, Result};
use frame::{FrameKind, GaussKruger, GeodesyProvider, ResolvedFrame};
use matching::MatchOutcome;
use naming::{Assignment, NameStyle, NamingAssigner};
use network::SurveyNetwork;
use settings::Settings;

const NETWORK_PATH_KEY: &str = "network_path";

/// Callback for reporting photo import progress.
pub enum ImportProgress {
    /// Starting import of a folder.
    Start { folder: PathBuf, file_count: usize },
    /// A photo was added to the project.
    Imported { path: PathBuf },
    /// Import completed.
    Complete { added: usize, skipped: usize },
}

/// Callback for reporting auto-match progress.
pub enum MatchProgress {
    /// Starting a batch over the unmatched photos.
    Start { total: usize },
    /// A photo was assigned a canonical name.
    Matched {
        filename: String,
        point_id: String,
        distance: f64,
        name: String,
    },
    /// An incumbent was pushed to a numbered name.
    Demoted { filename: String, new_name: String },
    /// Batch completed.
    Complete(MatchSummary),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub added: usize,
    /// Files whose name is already in the project.
    pub skipped: usize,
    pub with_position: usize,
    pub projected: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchSummary {
    pub matched: usize,
    pub already_matched: usize,
    pub no_position: usize,
    pub out_of_range: usize,
    pub demoted: usize,
}

/// The main entry point: one survey job backed by a catalog file.
pub struct Project {
    catalog: Catalog,
    settings: Settings,
    network: Option<SurveyNetwork>,
    network_path: Option<PathBuf>,
    frame: Option<ResolvedFrame>,
    names: NamingAssigner,
    geodesy: Box<dyn GeodesyProvider>,
    exif: Box<dyn ExifProvider>,
}

impl Project {
    /// Open or create a project at the given catalog path.
    pub fn open(catalog_path: &Path) -> Result<Self> {
        Self::with_providers(
            Catalog::open(catalog_path)?,
            Box::new(GaussKruger::new()),
            Box::new(KamadakExif),
        )
    }

    /// Open a throwaway in-memory project (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::with_providers(
            Catalog::open_in_memory()?,
            Box::new(GaussKruger::new()),
            Box::new(KamadakExif),
        )
    }

    /// Build a project from an opened catalog and explicit collaborators.
    /// Reloads settings and photos, re-parses the stored network file and
    /// rebuilds the name registry.
    pub fn with_providers(
        catalog: Catalog,
        geodesy: Box<dyn GeodesyProvider>,
        exif: Box<dyn ExifProvider>,
    ) -> Result<Self> {
        let settings = Settings::load(&catalog)?;
        let records = catalog.list_photos()?;
        let network_path = catalog.get_config(NETWORK_PATH_KEY)?.map(PathBuf::from);

        let network = match &network_path {
            Some(path) => match network::load_network(path) {
                Ok(net) => Some(net),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "stored survey network could not be reloaded");
                    None
                }
            },
            None => None,
        };
        let frame = network.as_ref().map(|n| frame::resolve(&n.points));
        let (names, changed) = build_names(NameStyle::from(&settings), records, network.as_ref());

        let mut project = Self {
            catalog,
            settings,
            network,
            network_path,
            frame,
            names,
            geodesy,
            exif,
        };
        if changed > 0 {
            project.persist_all()?;
        }
        Ok(project)
    }

    // ── Network ──────────────────────────────────────────────────────

    /// Parse a network file, resolve its frame and adopt it for the project.
    /// A local grid turns GPS conversion off; an inferred zone is stored.
    pub fn load_network(&mut self, path: &Path) -> Result<ResolvedFrame> {
        let net = network::load_network(path)?;
        let resolved = frame::resolve(&net.points);
        let previous = (self.settings.zone, self.settings.gps_conversion);

        match resolved.kind {
            FrameKind::Local => self.settings.gps_conversion = false,
            FrameKind::NationalPlane => {
                self.settings.gps_conversion = true;
                if let Some(zone) = resolved.zone {
                    self.settings.zone = zone;
                }
            }
            FrameKind::NeedsManual => {}
        }
        if resolved.kind == FrameKind::NationalPlane && !resolved.zone_confirmed {
            warn!(zone = self.settings.zone, "zone not inferred; keeping the configured zone");
        }
        self.settings.save(&self.catalog)?;

        let stored = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.catalog
            .set_config(NETWORK_PATH_KEY, &stored.to_string_lossy())?;

        self.network = Some(net);
        self.network_path = Some(stored);
        self.frame = Some(resolved);

        let rebase = previous != (self.settings.zone, self.settings.gps_conversion);
        self.refresh_projections(rebase);
        self.rebuild_names();
        self.persist_all()?;
        Ok(resolved)
    }

    pub fn network(&self) -> Option<&SurveyNetwork> {
        self.network.as_ref()
    }

    pub fn network_path(&self) -> Option<&Path> {
        self.network_path.as_deref()
    }

    pub fn frame(&self) -> Option<&ResolvedFrame> {
        self.frame.as_ref()
    }

    fn require_network(&self) -> Result<&SurveyNetwork> {
        self.network.as_ref().ok_or(Error::NetworkNotLoaded)
    }

    // ── Photos ───────────────────────────────────────────────────────

    /// Photos in ingestion order.
    pub fn photos(&self) -> &[PhotoRecord] {
        self.names.records()
    }

    pub fn photo(&self, filename: &str) -> Option<&PhotoRecord> {
        self.names.get(filename)
    }

    /// GPS positions are projected once a network is loaded, conversion is on
    /// and the frame is not a local grid.
    fn projection_enabled(&self) -> bool {
        self.settings.gps_conversion && self.frame.is_some_and(|f| f.kind != FrameKind::Local)
    }

    /// Import every photo directly inside `folder`. Known filenames are skipped.
    pub fn import_photos(
        &mut self,
        folder: &Path,
        mut progress_cb: Option<&mut dyn FnMut(ImportProgress)>,
    ) -> Result<ImportSummary> {
        let paths = scanner::scan_photo_folder(folder)?;
        let fresh: Vec<PathBuf> = paths
            .iter()
            .filter(|p| {
                let name = p.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
                self.names.get(&name).is_none()
            })
            .cloned()
            .collect();
        let mut summary = ImportSummary {
            skipped: paths.len() - fresh.len(),
            ..ImportSummary::default()
        };

        if let Some(ref mut cb) = progress_cb {
            cb(ImportProgress::Start {
                folder: folder.to_path_buf(),
                file_count: fresh.len(),
            });
        }

        // Read metadata in parallel (no catalog access here)
        let exif = &self.exif;
        let metadata: Vec<(PathBuf, ExifData)> = fresh
            .par_iter()
            .map(|path| {
                let data = exif.read(path).unwrap_or_else(|e| {
                    debug!(path = %path.display(), error = %e, "no readable EXIF");
                    ExifData::default()
                });
                (path.clone(), data)
            })
            .collect();

        let zone = frame::zone(self.settings.zone)?;
        let project = self.projection_enabled();
        let mut added = Vec::with_capacity(metadata.len());

        for (path, data) in metadata {
            let mut record = PhotoRecord::new(path);
            record.capture_time = data.capture_time;
            record.raw_position = data.position;

            if let Some(position) = data.position {
                summary.with_position += 1;
                if project {
                    match self.geodesy.project(position, zone) {
                        Ok(p) => {
                            record.set_projection(p);
                            summary.projected += 1;
                        }
                        Err(e) => warn!(photo = %record.filename, error = %e, "projection failed"),
                    }
                }
            }

            if let Some(ref mut cb) = progress_cb {
                cb(ImportProgress::Imported {
                    path: record.path.clone(),
                });
            }
            added.push(record.clone());
            self.names.insert(record);
        }

        summary.added = added.len();
        self.catalog.upsert_photos_batch(&added)?;

        if let Some(ref mut cb) = progress_cb {
            cb(ImportProgress::Complete {
                added: summary.added,
                skipped: summary.skipped,
            });
        }
        info!(
            added = summary.added,
            skipped = summary.skipped,
            projected = summary.projected,
            "photos imported"
        );
        Ok(summary)
    }

    // ── Matching ─────────────────────────────────────────────────────

    /// Match every unmatched photo with a projected position to its nearest
    /// point and assign it under the default category. Results are computed
    /// in parallel and applied in ingestion order.
    pub fn auto_match(
        &mut self,
        threshold: Option<f64>,
        mut progress_cb: Option<&mut dyn FnMut(MatchProgress)>,
    ) -> Result<MatchSummary> {
        let net = self.network.as_ref().ok_or(Error::NetworkNotLoaded)?;
        if self.frame.is_some_and(|f| f.kind == FrameKind::Local) {
            return Err(Error::AutoMatchUnavailable(
                "the network uses a local grid; GPS positions cannot be correlated".to_string(),
            ));
        }
        if !self.settings.gps_conversion {
            return Err(Error::AutoMatchUnavailable("GPS conversion is disabled".to_string()));
        }
        let threshold = threshold.unwrap_or(self.settings.match_threshold);

        let mut summary = MatchSummary::default();
        let candidates: Vec<&PhotoRecord> = self
            .names
            .records()
            .iter()
            .filter(|r| {
                if r.is_matched() {
                    summary.already_matched += 1;
                    false
                } else {
                    true
                }
            })
            .collect();

        if let Some(ref mut cb) = progress_cb {
            cb(MatchProgress::Start {
                total: candidates.len(),
            });
        }

        let outcomes = matching::match_batch(&candidates, &net.points, threshold);
        let mut planned: Vec<(String, usize, f64)> = Vec::new();
        for (record, outcome) in candidates.iter().zip(outcomes) {
            match outcome {
                MatchOutcome::Matched { index, distance, .. } => {
                    planned.push((record.filename.clone(), index, distance));
                }
                MatchOutcome::NoMatch { best } => {
                    summary.out_of_range += 1;
                    debug!(photo = %record.filename, best = ?best, "no point within threshold");
                }
                MatchOutcome::NotApplicable => summary.no_position += 1,
            }
        }

        for (filename, index, distance) in planned {
            let point = &net.points[index];
            let assignment = self.names.assign(&filename, point, Category::Unknown)?;
            summary.matched += 1;

            if let Some(ref mut cb) = progress_cb {
                cb(MatchProgress::Matched {
                    filename: filename.clone(),
                    point_id: point.id.clone(),
                    distance,
                    name: assignment.name.clone(),
                });
            }
            if let Some(demotion) = assignment.demoted {
                summary.demoted += 1;
                if let Some(ref mut cb) = progress_cb {
                    cb(MatchProgress::Demoted {
                        filename: demotion.filename,
                        new_name: demotion.new_name,
                    });
                }
            }
        }

        self.persist_all()?;

        if let Some(ref mut cb) = progress_cb {
            cb(MatchProgress::Complete(summary.clone()));
        }
        info!(
            matched = summary.matched,
            out_of_range = summary.out_of_range,
            no_position = summary.no_position,
            "auto-match finished"
        );
        Ok(summary)
    }

    /// Nearest point for one photo without assigning anything.
    pub fn match_photo(&self, filename: &str, threshold: Option<f64>) -> Result<MatchOutcome> {
        let net = self.require_network()?;
        let record = self
            .names
            .get(filename)
            .ok_or_else(|| Error::PhotoNotFound(filename.to_string()))?;
        let threshold = threshold.unwrap_or(self.settings.match_threshold);
        let position = record.original_projected.or(record.projected);
        Ok(matching::find_nearest(position, &net.points, threshold))
    }

    /// Assign a photo to a point. Without an explicit point reference the
    /// nearest point within the threshold is used. `None` category falls back
    /// to the configured default.
    pub fn assign(&mut self, filename: &str, point: Option<&str>, category: Option<Category>) -> Result<Assignment> {
        let net = self.require_network()?;
        let point = match point {
            Some(reference) => net
                .find_point(reference)
                .ok_or_else(|| Error::PointNotFound(reference.to_string()))?
                .clone(),
            None => match self.match_photo(filename, None)? {
                MatchOutcome::Matched { index, .. } => net.points[index].clone(),
                MatchOutcome::NoMatch { best } => {
                    return Err(Error::NoMatchWithinThreshold {
                        filename: filename.to_string(),
                        best: best.unwrap_or(f64::INFINITY),
                    })
                }
                MatchOutcome::NotApplicable => return Err(Error::NoProjectedPosition(filename.to_string())),
            },
        };

        let assignment = self
            .names
            .assign(filename, &point, category.unwrap_or(Category::Unknown))?;
        self.persist(&assignment)?;
        Ok(assignment)
    }

    /// Clear a photo's match and canonical name.
    pub fn unassign(&mut self, filename: &str) -> Result<()> {
        self.names.unassign(filename)?;
        self.persist_one(filename)
    }

    /// Move an assigned photo to another category at the same point.
    pub fn set_category(&mut self, filename: &str, category: Category) -> Result<Assignment> {
        let net = self.require_network()?;
        let record = self
            .names
            .get(filename)
            .ok_or_else(|| Error::PhotoNotFound(filename.to_string()))?;
        let point_id = record
            .matched_point_id
            .as_deref()
            .ok_or_else(|| Error::PhotoNotAssigned(filename.to_string()))?;
        let point = net
            .point_by_id(point_id)
            .ok_or_else(|| Error::PointNotFound(point_id.to_string()))?
            .clone();

        let assignment = self.names.assign(filename, &point, category)?;
        self.persist(&assignment)?;
        Ok(assignment)
    }

    // ── Status ───────────────────────────────────────────────────────

    pub fn status(&self) -> ProjectStats {
        let photos = self.names.records();
        let matched = photos.iter().filter(|p| p.is_matched()).count();
        let count = |c: Category| photos.iter().filter(|p| p.is_matched() && p.category == c).count();

        ProjectStats {
            total_photos: photos.len(),
            matched,
            unmatched: photos.len() - matched,
            distant: count(Category::Distant),
            close: count(Category::Close),
            total_points: self.network.as_ref().map_or(0, |n| n.points.len()),
            total_parcels: self.network.as_ref().map_or(0, |n| n.parcels.len()),
            frame: self
                .frame
                .map_or_else(|| "no network loaded".to_string(), |f| f.describe()),
            gps_conversion: self.settings.gps_conversion,
        }
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validate, apply and persist one setting. Naming changes rename
    /// assigned photos; zone or conversion changes move every photo to the
    /// new frame.
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.settings.clone();
        next.apply(key, value)?;
        next.save(&self.catalog)?;

        let restyle = NameStyle::from(&next) != NameStyle::from(&self.settings);
        let rebase = next.zone != self.settings.zone || next.gps_conversion != self.settings.gps_conversion;
        self.settings = next;

        if restyle {
            self.rebuild_names();
        }
        if rebase {
            self.refresh_projections(true);
        }
        if restyle || rebase {
            self.persist_all()?;
        }
        Ok(())
    }

    // ── Export ───────────────────────────────────────────────────────

    /// `(source path, canonical name)` for every named photo.
    pub fn export_plan(&self) -> Vec<(PathBuf, String)> {
        self.names.export_pairs()
    }

    /// Copy every named photo into `out_dir` under its canonical name.
    pub fn export(
        &self,
        out_dir: &Path,
        backup: bool,
        progress_cb: Option<&mut dyn FnMut(export::ExportProgress)>,
    ) -> Result<export::ExportReport> {
        let items = export::plan_export(&self.names.export_pairs(), out_dir);
        let backup_at = backup.then(|| chrono::Local::now().naive_local());
        export::run_export(&items, out_dir, backup_at, progress_cb)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn rebuild_names(&mut self) {
        let records = std::mem::replace(&mut self.names, NamingAssigner::new(NameStyle::default())).into_records();
        let (names, _) = build_names(NameStyle::from(&self.settings), records, self.network.as_ref());
        self.names = names;
    }

    /// Project GPS positions into the current zone. Without `rebase` only
    /// photos that were never projected get a position; with it every photo
    /// moves to the current frame, or loses its GPS-derived position when
    /// projection is off.
    fn refresh_projections(&mut self, rebase: bool) {
        let zone = match frame::zone(self.settings.zone) {
            Ok(zone) if self.projection_enabled() => Some(zone),
            _ => None,
        };
        let geodesy = &self.geodesy;
        let project = |r: &PhotoRecord| {
            let position = r.raw_position?;
            match geodesy.project(position, zone?) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!(photo = %r.filename, error = %e, "projection failed");
                    None
                }
            }
        };

        let count = if rebase {
            self.names.rebase_projections(project)
        } else if zone.is_some() {
            self.names.fill_projections(project)
        } else {
            0
        };
        debug!(count, zone = self.settings.zone, rebase, "photo positions projected");
    }

    fn persist_all(&mut self) -> Result<()> {
        self.catalog.upsert_photos_batch(self.names.records())?;
        Ok(())
    }

    fn persist_one(&self, filename: &str) -> Result<()> {
        match self.names.get(filename) {
            Some(record) => self.catalog.upsert_photo(record),
            None => Err(Error::PhotoNotFound(filename.to_string())),
        }
    }

    fn persist(&self, assignment: &Assignment) -> Result<()> {
        self.persist_one(&assignment.filename)?;
        if let Some(demotion) = &assignment.demoted {
            self.persist_one(&demotion.filename)?;
        }
        Ok(())
    }
}

fn build_names(
    style: NameStyle,
    records: Vec<PhotoRecord>,
    network: Option<&SurveyNetwork>,
) -> (NamingAssigner, usize) {
    match network {
        Some(net) => NamingAssigner::restore(style, records, &net.points),
        None => {
            let mut names = NamingAssigner::new(style);
            for record in records {
                names.insert(record);
            }
            (names, 0)
        }
    }
}
