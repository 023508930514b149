pub mod filename;

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::domain::{Category, ControlPoint, PhotoRecord, PlanePoint};
use crate::error::{Error, Result};
pub use filename::{is_special, NameStyle, SlotKey, SPECIAL_MARKERS};

/// What a photo currently holds in the name registry.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Holding {
    /// Incumbent of a base-name slot.
    Base(SlotKey),
    /// A numbered name under `identifier`.
    Numbered { identifier: String, n: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Demotion {
    pub filename: String,
    pub new_name: String,
}

/// Result of one assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub filename: String,
    pub name: String,
    /// The previous incumbent, when it was pushed to a numbered name.
    pub demoted: Option<Demotion>,
}

/// Registry of canonical names. Owns the photo records and is the only
/// place their naming fields change.
///
/// For every slot at most one record holds the base name; every other record
/// sharing an identifier holds a distinct numbered name.
#[derive(Debug, Clone)]
pub struct NamingAssigner {
    style: NameStyle,
    records: Vec<PhotoRecord>,
    index: HashMap<String, usize>,
    holdings: Vec<Option<Holding>>,
    slots: HashMap<SlotKey, usize>,
    used: HashMap<String, BTreeSet<u32>>,
}

impl NamingAssigner {
    pub fn new(style: NameStyle) -> Self {
        Self {
            style,
            records: Vec::new(),
            index: HashMap::new(),
            holdings: Vec::new(),
            slots: HashMap::new(),
            used: HashMap::new(),
        }
    }

    /// Rebuild the registry from persisted records. Names that still fit the
    /// current style are reclaimed as-is in record order; the rest are
    /// assigned afresh. Returns the assigner and the number of records whose
    /// name had to be recomputed or cleared.
    pub fn restore(style: NameStyle, records: Vec<PhotoRecord>, points: &[ControlPoint]) -> (Self, usize) {
        let mut assigner = Self::new(style);
        for record in records {
            assigner.insert(record);
        }

        let mut pending: Vec<(String, ControlPoint, Category)> = Vec::new();
        let mut orphaned: Vec<String> = Vec::new();

        for idx in 0..assigner.records.len() {
            let record = &assigner.records[idx];
            let (Some(name), Some(point_id)) = (record.assigned_name.clone(), record.matched_point_id.clone()) else {
                continue;
            };
            let Some(point) = points.iter().find(|p| p.id == point_id) else {
                warn!(photo = %record.filename, point = %point_id, "matched point no longer in network; clearing");
                orphaned.push(record.filename.clone());
                continue;
            };

            let category = assigner.style.resolve_category(record.category);
            let identifier = assigner.style.identifier_for(point);
            let key = assigner.style.slot_key(&identifier, category);
            let ext = record.extension();

            if name == assigner.style.base_name(&key, &ext) && !assigner.slots.contains_key(&key) {
                assigner.slots.insert(key.clone(), idx);
                assigner.holdings[idx] = Some(Holding::Base(key));
                continue;
            }

            let reclaimed = assigner
                .style
                .parse_numbered(&name, &identifier, &ext)
                .filter(|n| !assigner.style.reserved_numbers().contains(n))
                .filter(|n| assigner.used.get(&identifier).map_or(true, |set| !set.contains(n)));
            match reclaimed {
                Some(n) => {
                    assigner.used_numbers(&identifier).insert(n);
                    assigner.holdings[idx] = Some(Holding::Numbered { identifier, n });
                }
                None => pending.push((record.filename.clone(), point.clone(), category)),
            }
        }

        let changed = pending.len() + orphaned.len();

        for filename in orphaned {
            if let Some(&idx) = assigner.index.get(&filename) {
                assigner.clear(idx);
            }
        }
        for (filename, point, category) in pending {
            // The filename came from the registry itself.
            if let Err(e) = assigner.assign(&filename, &point, category) {
                warn!(photo = %filename, error = %e, "could not reassign photo");
            }
        }

        if changed > 0 {
            info!(changed, "canonical names rebuilt");
        }
        (assigner, changed)
    }

    pub fn style(&self) -> &NameStyle {
        &self.style
    }

    /// Add a record. Returns false (and drops it) if the filename is known.
    pub fn insert(&mut self, record: PhotoRecord) -> bool {
        if self.index.contains_key(&record.filename) {
            return false;
        }
        self.index.insert(record.filename.clone(), self.records.len());
        self.records.push(record);
        self.holdings.push(None);
        true
    }

    pub fn get(&self, filename: &str) -> Option<&PhotoRecord> {
        self.index.get(filename).map(|&i| &self.records[i])
    }

    /// Records in ingestion order.
    pub fn records(&self) -> &[PhotoRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PhotoRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, filename: &str) -> Result<usize> {
        self.index
            .get(filename)
            .copied()
            .ok_or_else(|| Error::PhotoNotFound(filename.to_string()))
    }

    /// The record holding the base name for `point` and `category`.
    pub fn incumbent(&self, point: &ControlPoint, category: Category) -> Option<&PhotoRecord> {
        let category = self.style.resolve_category(category);
        let key = self.style.slot_key(&self.style.identifier_for(point), category);
        self.slots.get(&key).map(|&i| &self.records[i])
    }

    /// Assign `filename` to `point` under `category`, demoting a displaced
    /// incumbent to a fresh numbered name. Repeating an assignment is a no-op.
    pub fn assign(&mut self, filename: &str, point: &ControlPoint, category: Category) -> Result<Assignment> {
        let idx = self.position(filename)?;
        let category = self.style.resolve_category(category);
        let identifier = self.style.identifier_for(point);
        let key = self.style.slot_key(&identifier, category);

        let mut demoted = None;
        let holding = match self.holdings[idx].clone() {
            Some(Holding::Base(current)) if current == key => Holding::Base(current),
            current => match self.slots.get(&key).copied() {
                None => {
                    self.release(idx);
                    self.slots.insert(key.clone(), idx);
                    Holding::Base(key)
                }
                Some(_) if self.style.protects(point) => match current {
                    Some(Holding::Numbered { identifier: held, n }) if held == identifier => {
                        Holding::Numbered { identifier: held, n }
                    }
                    _ => {
                        self.release(idx);
                        let n = self.take_number(&identifier);
                        debug!(photo = filename, identifier = %identifier, n, "protected slot occupied");
                        Holding::Numbered { identifier, n }
                    }
                },
                Some(incumbent) => {
                    self.release(idx);
                    demoted = Some(self.demote(incumbent, &identifier));
                    self.slots.insert(key.clone(), idx);
                    Holding::Base(key)
                }
            },
        };

        let name = self.name_for(&holding, &self.records[idx].extension());
        self.holdings[idx] = Some(holding);

        let position = point.position();
        let record = &mut self.records[idx];
        record.distance = record
            .original_projected
            .or(record.projected)
            .map(|p| p.distance_to(&position));
        record.projected = Some(position);
        record.matched_point_id = Some(point.id.clone());
        record.category = category;
        record.assigned_name = Some(name.clone());

        debug!(photo = filename, name = %name, "assigned");
        Ok(Assignment {
            filename: filename.to_string(),
            name,
            demoted,
        })
    }

    /// Clear a record's match and name. A vacated base slot stays empty.
    pub fn unassign(&mut self, filename: &str) -> Result<()> {
        let idx = self.position(filename)?;
        self.clear(idx);
        debug!(photo = filename, "unassigned");
        Ok(())
    }

    /// Give a first projected position to every record that has none yet.
    /// Records already holding an original position are left alone. Returns
    /// how many records received a position.
    pub fn fill_projections(&mut self, mut project: impl FnMut(&PhotoRecord) -> Option<PlanePoint>) -> usize {
        let mut count = 0;
        for record in self.records.iter_mut().filter(|r| r.original_projected.is_none()) {
            if let Some(position) = project(record) {
                record.original_projected = Some(position);
                if !record.is_matched() {
                    record.projected = Some(position);
                }
                count += 1;
            }
        }
        count
    }

    /// Move every record into a new projected frame at once, matched records
    /// included, so no original position is left behind in the old frame.
    /// Matched records stay snapped to their point. Records the closure
    /// cannot project lose their GPS-derived position. Returns how many
    /// records received a position.
    pub fn rebase_projections(&mut self, mut project: impl FnMut(&PhotoRecord) -> Option<PlanePoint>) -> usize {
        let mut count = 0;
        for record in self.records.iter_mut() {
            let position = project(record);
            record.original_projected = position;
            if !record.is_matched() {
                record.projected = position;
            }
            if position.is_some() {
                count += 1;
            }
        }
        count
    }

    /// `(source path, canonical name)` for every named record, in ingestion order.
    pub fn export_pairs(&self) -> Vec<(PathBuf, String)> {
        self.records
            .iter()
            .filter_map(|r| r.assigned_name.as_ref().map(|n| (r.path.clone(), n.clone())))
            .collect()
    }

    fn clear(&mut self, idx: usize) {
        self.release(idx);
        let record = &mut self.records[idx];
        record.assigned_name = None;
        record.matched_point_id = None;
        record.distance = None;
        record.category = Category::Unknown;
        record.restore_position();
    }

    /// Push the incumbent at `idx` to a fresh numbered name and undo its snap.
    fn demote(&mut self, idx: usize, identifier: &str) -> Demotion {
        let n = self.take_number(identifier);
        let holding = Holding::Numbered {
            identifier: identifier.to_string(),
            n,
        };
        let new_name = self.name_for(&holding, &self.records[idx].extension());
        self.holdings[idx] = Some(holding);

        let record = &mut self.records[idx];
        record.assigned_name = Some(new_name.clone());
        record.restore_position();

        debug!(photo = %record.filename, name = %new_name, "demoted");
        Demotion {
            filename: record.filename.clone(),
            new_name,
        }
    }

    fn release(&mut self, idx: usize) {
        match self.holdings[idx].take() {
            Some(Holding::Base(key)) => {
                if self.slots.get(&key) == Some(&idx) {
                    self.slots.remove(&key);
                }
            }
            Some(Holding::Numbered { identifier, n }) => {
                if let Some(set) = self.used.get_mut(&identifier) {
                    set.remove(&n);
                }
            }
            None => {}
        }
    }

    fn used_numbers(&mut self, identifier: &str) -> &mut BTreeSet<u32> {
        let reserved = self.style.reserved_numbers();
        self.used
            .entry(identifier.to_string())
            .or_insert_with(|| reserved.iter().copied().collect())
    }

    /// Smallest free number for `identifier`, marked as used.
    fn take_number(&mut self, identifier: &str) -> u32 {
        let set = self.used_numbers(identifier);
        let mut n = 1;
        while set.contains(&n) {
            n += 1;
        }
        set.insert(n);
        n
    }

    fn name_for(&self, holding: &Holding, ext: &str) -> String {
        match holding {
            Holding::Base(key) => self.style.base_name(key, ext),
            Holding::Numbered { identifier, n } => self.style.numbered_name(identifier, *n, ext),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::IdentifierSource;
    use std::collections::HashSet;

    fn make_point(id: &str, name: &str, x: f64, y: f64) -> ControlPoint {
        ControlPoint {
            id: id.to_string(),
            name: name.to_string(),
            x,
            y,
            z: 0.0,
        }
    }

    fn make_photo(name: &str, position: Option<(f64, f64)>) -> PhotoRecord {
        let mut photo = PhotoRecord::new(PathBuf::from(format!("/field/{name}")));
        if let Some((x, y)) = position {
            photo.set_projection(PlanePoint::new(x, y));
        }
        photo
    }

    fn make_assigner(style: NameStyle, photos: &[(&str, Option<(f64, f64)>)]) -> NamingAssigner {
        let mut assigner = NamingAssigner::new(style);
        for (name, pos) in photos {
            assert!(assigner.insert(make_photo(name, *pos)));
        }
        assigner
    }

    fn bm1() -> ControlPoint {
        make_point("BM1", "", 100.0, 200.0)
    }

    fn name_of(assigner: &NamingAssigner, filename: &str) -> Option<String> {
        assigner.get(filename).and_then(|r| r.assigned_name.clone())
    }

    fn assert_no_collisions(assigner: &NamingAssigner) {
        let mut seen = HashSet::new();
        for r in assigner.records() {
            if let Some(name) = &r.assigned_name {
                assert!(seen.insert(name.clone()), "duplicate name {name}");
            }
        }
    }

    // ── Base assignment ──────────────────────────────────────────

    #[test]
    fn test_first_assignment_takes_base_name() {
        let mut a = make_assigner(NameStyle::default(), &[("p1.jpg", Some((110.0, 205.0)))]);
        let result = a.assign("p1.jpg", &bm1(), Category::Close).unwrap();
        assert_eq!(result.name, "BM1-2.jpg");
        assert!(result.demoted.is_none());

        let r = a.get("p1.jpg").unwrap();
        assert_eq!(r.matched_point_id.as_deref(), Some("BM1"));
        assert_eq!(r.category, Category::Close);
        assert!((r.distance.unwrap() - 125f64.sqrt()).abs() < 1e-9);
        assert_eq!(r.projected, Some(PlanePoint::new(100.0, 200.0)), "snapped to point");
        assert_eq!(r.original_projected, Some(PlanePoint::new(110.0, 205.0)));
    }

    #[test]
    fn test_categories_have_separate_slots() {
        let mut a = make_assigner(NameStyle::default(), &[("a.jpg", None), ("b.jpg", None)]);
        a.assign("a.jpg", &bm1(), Category::Distant).unwrap();
        a.assign("b.jpg", &bm1(), Category::Close).unwrap();
        assert_eq!(name_of(&a, "a.jpg").unwrap(), "BM1-1.jpg");
        assert_eq!(name_of(&a, "b.jpg").unwrap(), "BM1-2.jpg");
    }

    #[test]
    fn test_unknown_category_uses_default() {
        let mut a = make_assigner(NameStyle::default(), &[("a.jpg", None)]);
        let result = a.assign("a.jpg", &bm1(), Category::Unknown).unwrap();
        assert_eq!(result.name, "BM1-2.jpg");
        assert_eq!(a.get("a.jpg").unwrap().category, Category::Close);

        let style = NameStyle {
            default_category: Category::Distant,
            ..NameStyle::default()
        };
        let mut a = make_assigner(style, &[("a.jpg", None)]);
        assert_eq!(a.assign("a.jpg", &bm1(), Category::Unknown).unwrap().name, "BM1-1.jpg");
    }

    #[test]
    fn test_extension_case_preserved() {
        let mut a = make_assigner(NameStyle::default(), &[("IMG_1.JPG", None)]);
        assert_eq!(a.assign("IMG_1.JPG", &bm1(), Category::Close).unwrap().name, "BM1-2.JPG");
    }

    #[test]
    fn test_unknown_photo_is_error() {
        let mut a = make_assigner(NameStyle::default(), &[]);
        assert!(matches!(
            a.assign("ghost.jpg", &bm1(), Category::Close),
            Err(Error::PhotoNotFound(_))
        ));
    }

    // ── Demotion ─────────────────────────────────────────────────

    #[test]
    fn test_demotion_restores_original_position() {
        let mut a = make_assigner(
            NameStyle::default(),
            &[("p1.jpg", Some((110.0, 205.0))), ("p2.jpg", Some((101.0, 201.0)))],
        );
        a.assign("p1.jpg", &bm1(), Category::Close).unwrap();
        assert_eq!(a.get("p1.jpg").unwrap().projected, Some(PlanePoint::new(100.0, 200.0)));

        let result = a.assign("p2.jpg", &bm1(), Category::Close).unwrap();
        assert_eq!(result.name, "BM1-2.jpg");
        assert_eq!(
            result.demoted,
            Some(Demotion {
                filename: "p1.jpg".to_string(),
                new_name: "BM1_3.jpg".to_string(),
            })
        );

        let p1 = a.get("p1.jpg").unwrap();
        assert_eq!(p1.assigned_name.as_deref(), Some("BM1_3.jpg"));
        assert_eq!(p1.projected, p1.original_projected);
        assert_eq!(p1.projected, Some(PlanePoint::new(110.0, 205.0)));
        assert_eq!(p1.matched_point_id.as_deref(), Some("BM1"), "demotion keeps the match");
        assert_eq!(a.incumbent(&bm1(), Category::Close).unwrap().filename, "p2.jpg");
    }

    #[test]
    fn test_numbers_shared_across_categories() {
        let names = ["a.jpg", "b.jpg", "c.jpg", "d.jpg"];
        let mut a = make_assigner(NameStyle::default(), &names.map(|n| (n, None::<(f64, f64)>)));
        a.assign("a.jpg", &bm1(), Category::Close).unwrap();
        a.assign("b.jpg", &bm1(), Category::Close).unwrap();
        a.assign("c.jpg", &bm1(), Category::Distant).unwrap();
        a.assign("d.jpg", &bm1(), Category::Distant).unwrap();

        assert_eq!(name_of(&a, "a.jpg").unwrap(), "BM1_3.jpg");
        assert_eq!(name_of(&a, "b.jpg").unwrap(), "BM1-2.jpg");
        assert_eq!(name_of(&a, "c.jpg").unwrap(), "BM1_4.jpg");
        assert_eq!(name_of(&a, "d.jpg").unwrap(), "BM1-1.jpg");
    }

    #[test]
    fn test_assign_is_idempotent() {
        let mut a = make_assigner(NameStyle::default(), &[("p1.jpg", None), ("p2.jpg", None)]);
        a.assign("p1.jpg", &bm1(), Category::Close).unwrap();
        let first = a.assign("p2.jpg", &bm1(), Category::Close).unwrap();
        let second = a.assign("p2.jpg", &bm1(), Category::Close).unwrap();
        assert_eq!(first.name, second.name);
        assert!(second.demoted.is_none());
        assert_eq!(name_of(&a, "p1.jpg").unwrap(), "BM1_3.jpg");
    }

    #[test]
    fn test_reassign_releases_previous_slot() {
        let bm2 = make_point("BM2", "", 500.0, 200.0);
        let mut a = make_assigner(NameStyle::default(), &[("p1.jpg", None), ("p2.jpg", None)]);
        a.assign("p1.jpg", &bm1(), Category::Close).unwrap();
        a.assign("p1.jpg", &bm2, Category::Close).unwrap();
        assert!(a.incumbent(&bm1(), Category::Close).is_none());

        let result = a.assign("p2.jpg", &bm1(), Category::Close).unwrap();
        assert_eq!(result.name, "BM1-2.jpg");
        assert!(result.demoted.is_none());
    }

    #[test]
    fn test_released_numbers_are_reused() {
        let names = ["a.jpg", "b.jpg", "c.jpg"];
        let mut a = make_assigner(NameStyle::default(), &names.map(|n| (n, None::<(f64, f64)>)));
        a.assign("a.jpg", &bm1(), Category::Close).unwrap();
        a.assign("b.jpg", &bm1(), Category::Close).unwrap(); // a → _3
        a.unassign("a.jpg").unwrap();
        a.assign("c.jpg", &bm1(), Category::Close).unwrap(); // b → _3 again
        assert_eq!(name_of(&a, "b.jpg").unwrap(), "BM1_3.jpg");
    }

    #[test]
    fn test_collision_invariant_over_sequence() {
        let names: Vec<String> = (0..12).map(|i| format!("p{i}.jpg")).collect();
        let photos: Vec<(&str, Option<(f64, f64)>)> = names.iter().map(|n| (n.as_str(), None)).collect();
        let mut a = make_assigner(NameStyle::default(), &photos);
        let points = [bm1(), make_point("BM2", "", 500.0, 200.0)];
        let cats = [Category::Close, Category::Distant];

        for (i, name) in names.iter().enumerate() {
            a.assign(name, &points[i % 2], cats[(i / 2) % 2]).unwrap();
            if i % 5 == 4 {
                a.unassign(&names[i - 2]).unwrap();
            }
            assert_no_collisions(&a);
        }

        for point in &points {
            for cat in cats {
                let base = NameStyle::default().base_name(&NameStyle::default().slot_key(&point.id, cat), ".jpg");
                let holders = a
                    .records()
                    .iter()
                    .filter(|r| r.assigned_name.as_deref() == Some(base.as_str()))
                    .count();
                assert!(holders <= 1);
            }
        }
        for r in a.records().iter().filter(|r| r.assigned_name.as_deref().is_some_and(|n| n.contains('_'))) {
            let name = r.assigned_name.as_deref().unwrap();
            let n: u32 = name.rsplit('_').next().unwrap().trim_end_matches(".jpg").parse().unwrap();
            assert!(n >= 3, "{name}");
        }
    }

    #[test]
    fn test_same_sequence_same_names() {
        let run = || {
            let mut a = make_assigner(NameStyle::default(), &[("x.jpg", None), ("y.jpg", None), ("z.jpg", None)]);
            a.assign("y.jpg", &bm1(), Category::Close).unwrap();
            a.assign("x.jpg", &bm1(), Category::Close).unwrap();
            a.assign("z.jpg", &bm1(), Category::Close).unwrap();
            a.export_pairs()
        };
        assert_eq!(run(), run());
    }

    // ── Unassign ─────────────────────────────────────────────────

    #[test]
    fn test_unassign_clears_and_leaves_slot_empty() {
        let mut a = make_assigner(NameStyle::default(), &[("p1.jpg", Some((110.0, 205.0))), ("p2.jpg", None)]);
        a.assign("p1.jpg", &bm1(), Category::Close).unwrap();
        a.assign("p2.jpg", &bm1(), Category::Close).unwrap();
        a.unassign("p2.jpg").unwrap();

        let p2 = a.get("p2.jpg").unwrap();
        assert!(p2.assigned_name.is_none());
        assert!(p2.matched_point_id.is_none());
        assert!(p2.distance.is_none());
        assert_eq!(p2.category, Category::Unknown);

        assert!(a.incumbent(&bm1(), Category::Close).is_none(), "no automatic promotion");
        assert_eq!(name_of(&a, "p1.jpg").unwrap(), "BM1_3.jpg");
    }

    // ── Special points ───────────────────────────────────────────

    #[test]
    fn test_special_point_incumbent_never_demoted() {
        let reference = make_point("7", "基準点7", 0.0, 0.0);
        let mut a = make_assigner(NameStyle::default(), &[("a.jpg", None), ("b.jpg", None)]);
        assert_eq!(a.assign("a.jpg", &reference, Category::Close).unwrap().name, "基準点7-2.jpg");

        let second = a.assign("b.jpg", &reference, Category::Close).unwrap();
        assert_eq!(second.name, "基準点7_3.jpg");
        assert!(second.demoted.is_none());
        assert_eq!(name_of(&a, "a.jpg").unwrap(), "基準点7-2.jpg");

        let again = a.assign("b.jpg", &reference, Category::Close).unwrap();
        assert_eq!(again.name, "基準点7_3.jpg");
    }

    #[test]
    fn test_special_override_off_uses_configured_identifier() {
        let style = NameStyle {
            special_override: false,
            ..NameStyle::default()
        };
        let witness = make_point("8", "引照点8", 0.0, 0.0);
        let mut a = make_assigner(style, &[("a.jpg", None), ("b.jpg", None)]);
        a.assign("a.jpg", &witness, Category::Close).unwrap();
        let second = a.assign("b.jpg", &witness, Category::Close).unwrap();
        assert_eq!(second.name, "8-2.jpg");
        assert_eq!(name_of(&a, "a.jpg").unwrap(), "8_3.jpg");
    }

    // ── Style variants ───────────────────────────────────────────

    #[test]
    fn test_no_suffix_mode() {
        let style = NameStyle {
            category_suffix: false,
            ..NameStyle::default()
        };
        let mut a = make_assigner(style, &[("a.jpg", None), ("b.jpg", None), ("c.jpg", None)]);
        assert_eq!(a.assign("a.jpg", &bm1(), Category::Distant).unwrap().name, "BM1.jpg");
        let b = a.assign("b.jpg", &bm1(), Category::Close).unwrap();
        assert_eq!(b.name, "BM1.jpg");
        assert_eq!(b.demoted.unwrap().new_name, "BM1_1.jpg");
        a.assign("c.jpg", &bm1(), Category::Close).unwrap();
        assert_eq!(name_of(&a, "b.jpg").unwrap(), "BM1_2.jpg");
    }

    #[test]
    fn test_name_identifier() {
        let style = NameStyle {
            identifier: IdentifierSource::Name,
            ..NameStyle::default()
        };
        let mut a = make_assigner(style, &[("a.jpg", None)]);
        let point = make_point("12", "K12", 0.0, 0.0);
        assert_eq!(a.assign("a.jpg", &point, Category::Distant).unwrap().name, "K12-1.jpg");
    }

    // ── Restore ──────────────────────────────────────────────────

    #[test]
    fn test_restore_reclaims_names() {
        let points = vec![bm1()];
        let mut a = make_assigner(NameStyle::default(), &[("p1.jpg", None), ("p2.jpg", None), ("p3.jpg", None)]);
        a.assign("p1.jpg", &bm1(), Category::Close).unwrap();
        a.assign("p2.jpg", &bm1(), Category::Close).unwrap();
        let records = a.clone().into_records();

        let (mut restored, changed) = NamingAssigner::restore(NameStyle::default(), records, &points);
        assert_eq!(changed, 0);
        assert_eq!(restored.export_pairs(), a.export_pairs());
        assert_eq!(restored.incumbent(&bm1(), Category::Close).unwrap().filename, "p2.jpg");

        // Number 3 is still taken after the rebuild.
        let result = restored.assign("p3.jpg", &bm1(), Category::Close).unwrap();
        assert_eq!(result.demoted.unwrap().new_name, "BM1_4.jpg");
    }

    #[test]
    fn test_restore_renames_after_style_change() {
        let points = vec![make_point("12", "K12", 0.0, 0.0)];
        let mut a = make_assigner(NameStyle::default(), &[("a.jpg", None)]);
        a.assign("a.jpg", &points[0], Category::Close).unwrap();
        assert_eq!(name_of(&a, "a.jpg").unwrap(), "12-2.jpg");

        let style = NameStyle {
            identifier: IdentifierSource::Name,
            ..NameStyle::default()
        };
        let (restored, changed) = NamingAssigner::restore(style, a.into_records(), &points);
        assert_eq!(changed, 1);
        assert_eq!(name_of(&restored, "a.jpg").unwrap(), "K12-2.jpg");
    }

    #[test]
    fn test_restore_clears_orphaned_matches() {
        let mut a = make_assigner(NameStyle::default(), &[("a.jpg", Some((1.0, 1.0)))]);
        a.assign("a.jpg", &bm1(), Category::Close).unwrap();

        let (restored, changed) = NamingAssigner::restore(NameStyle::default(), a.into_records(), &[]);
        assert_eq!(changed, 1);
        let r = restored.get("a.jpg").unwrap();
        assert!(r.assigned_name.is_none());
        assert_eq!(r.projected, Some(PlanePoint::new(1.0, 1.0)));
    }

    #[test]
    fn test_fill_projections_never_overwrites_original() {
        let mut a = make_assigner(NameStyle::default(), &[("a.jpg", Some((1.0, 1.0))), ("b.jpg", None)]);
        a.assign("a.jpg", &bm1(), Category::Close).unwrap();

        let count = a.fill_projections(|_| Some(PlanePoint::new(9.0, 9.0)));
        assert_eq!(count, 1);
        let first = a.get("a.jpg").unwrap();
        assert_eq!(first.original_projected, Some(PlanePoint::new(1.0, 1.0)));
        assert_eq!(first.projected, Some(bm1().position()));
        let b = a.get("b.jpg").unwrap();
        assert_eq!(b.projected, Some(PlanePoint::new(9.0, 9.0)));
        assert_eq!(b.original_projected, b.projected);

        // A second pass finds nothing left to fill.
        assert_eq!(a.fill_projections(|_| Some(PlanePoint::new(5.0, 5.0))), 0);
        assert_eq!(a.get("b.jpg").unwrap().original_projected, Some(PlanePoint::new(9.0, 9.0)));
    }

    #[test]
    fn test_rebase_moves_matched_originals_too() {
        let mut a = make_assigner(NameStyle::default(), &[("a.jpg", Some((1.0, 1.0))), ("b.jpg", Some((2.0, 2.0)))]);
        a.assign("a.jpg", &bm1(), Category::Close).unwrap();

        let count = a.rebase_projections(|r| r.original_projected.map(|p| PlanePoint::new(p.x + 1000.0, p.y)));
        assert_eq!(count, 2);

        let first = a.get("a.jpg").unwrap();
        assert_eq!(first.original_projected, Some(PlanePoint::new(1001.0, 1.0)));
        assert_eq!(first.projected, Some(bm1().position()));
        let b = a.get("b.jpg").unwrap();
        assert_eq!(b.projected, Some(PlanePoint::new(1002.0, 2.0)));

        // A later demotion restores the rebased position.
        let second = a.assign("b.jpg", &bm1(), Category::Close).unwrap();
        assert_eq!(second.demoted.unwrap().filename, "a.jpg");
        assert_eq!(a.get("a.jpg").unwrap().projected, Some(PlanePoint::new(1001.0, 1.0)));
    }

    #[test]
    fn test_insert_rejects_known_filename() {
        let mut a = make_assigner(NameStyle::default(), &[("a.jpg", None)]);
        assert!(!a.insert(make_photo("a.jpg", None)));
        assert_eq!(a.len(), 1);
    }
}
