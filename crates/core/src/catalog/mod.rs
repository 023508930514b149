pub mod schema;

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};

use crate::domain::*;
use crate::error::Result;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const PHOTO_COLUMNS: &str = "filename, path, capture_time, gps_lat, gps_lon, proj_x, proj_y, orig_x, orig_y,
     category, matched_point_id, distance, assigned_name";

const UPSERT_PHOTO: &str = "INSERT INTO photos (filename, path, capture_time, gps_lat, gps_lon, proj_x, proj_y,
     orig_x, orig_y, category, matched_point_id, distance, assigned_name)
     VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)
     ON CONFLICT(filename) DO UPDATE SET
        path=excluded.path, capture_time=excluded.capture_time,
        gps_lat=excluded.gps_lat, gps_lon=excluded.gps_lon,
        proj_x=excluded.proj_x, proj_y=excluded.proj_y,
        orig_x=excluded.orig_x, orig_y=excluded.orig_y,
        category=excluded.category, matched_point_id=excluded.matched_point_id,
        distance=excluded.distance, assigned_name=excluded.assigned_name";

/// SQLite-backed project catalog: settings and photo records.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Open or create a catalog at the given path with WAL mode.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        schema::initialize(&conn)?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory catalog (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    // ── Photos ───────────────────────────────────────────────────────

    pub fn upsert_photo(&self, photo: &PhotoRecord) -> Result<()> {
        let values = photo_params(photo);
        self.conn.execute(UPSERT_PHOTO, &values.as_params()[..])?;
        Ok(())
    }

    /// Upsert multiple photos in a single transaction for bulk performance.
    pub fn upsert_photos_batch(&mut self, photos: &[PhotoRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_PHOTO)?;
            for photo in photos {
                let values = photo_params(photo);
                stmt.execute(&values.as_params()[..])?;
            }
        }
        tx.commit()?;
        Ok(photos.len())
    }

    /// All photo records in ingestion order.
    pub fn list_photos(&self) -> Result<Vec<PhotoRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PHOTO_COLUMNS} FROM photos ORDER BY id"))?;
        let photos = stmt
            .query_map([], row_to_photo)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(photos)
    }

    pub fn count_photos(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ── Config ───────────────────────────────────────────────────

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .ok();
        Ok(value)
    }
}

/// Owned column values for one photo row, in `UPSERT_PHOTO` order.
struct PhotoParams {
    filename: String,
    path: String,
    capture_time: Option<String>,
    gps_lat: Option<f64>,
    gps_lon: Option<f64>,
    proj_x: Option<f64>,
    proj_y: Option<f64>,
    orig_x: Option<f64>,
    orig_y: Option<f64>,
    category: &'static str,
    matched_point_id: Option<String>,
    distance: Option<f64>,
    assigned_name: Option<String>,
}

impl PhotoParams {
    fn as_params(&self) -> [&dyn rusqlite::ToSql; 13] {
        [
            &self.filename,
            &self.path,
            &self.capture_time,
            &self.gps_lat,
            &self.gps_lon,
            &self.proj_x,
            &self.proj_y,
            &self.orig_x,
            &self.orig_y,
            &self.category,
            &self.matched_point_id,
            &self.distance,
            &self.assigned_name,
        ]
    }
}

fn photo_params(photo: &PhotoRecord) -> PhotoParams {
    PhotoParams {
        filename: photo.filename.clone(),
        path: photo.path.to_string_lossy().into_owned(),
        capture_time: photo.capture_time.map(|t| t.format(TIME_FORMAT).to_string()),
        gps_lat: photo.raw_position.map(|p| p.lat),
        gps_lon: photo.raw_position.map(|p| p.lon),
        proj_x: photo.projected.map(|p| p.x),
        proj_y: photo.projected.map(|p| p.y),
        orig_x: photo.original_projected.map(|p| p.x),
        orig_y: photo.original_projected.map(|p| p.y),
        category: photo.category.as_str(),
        matched_point_id: photo.matched_point_id.clone(),
        distance: photo.distance,
        assigned_name: photo.assigned_name.clone(),
    }
}

fn pair<T>(a: Option<f64>, b: Option<f64>, f: impl FnOnce(f64, f64) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        _ => None,
    }
}

fn row_to_photo(row: &Row<'_>) -> rusqlite::Result<PhotoRecord> {
    let capture_time: Option<String> = row.get(2)?;
    let category: String = row.get(9)?;

    Ok(PhotoRecord {
        filename: row.get(0)?,
        path: PathBuf::from(row.get::<_, String>(1)?),
        capture_time: capture_time.and_then(|s| NaiveDateTime::parse_from_str(&s, TIME_FORMAT).ok()),
        raw_position: pair(row.get(3)?, row.get(4)?, |lat, lon| LatLon { lat, lon }),
        projected: pair(row.get(5)?, row.get(6)?, PlanePoint::new),
        original_projected: pair(row.get(7)?, row.get(8)?, PlanePoint::new),
        category: Category::parse(&category).unwrap_or_default(),
        matched_point_id: row.get(10)?,
        distance: row.get(11)?,
        assigned_name: row.get(12)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_photo(name: &str) -> PhotoRecord {
        PhotoRecord::new(PathBuf::from(format!("/field/{name}")))
    }

    fn make_full_photo(name: &str) -> PhotoRecord {
        let mut photo = make_photo(name);
        photo.capture_time = NaiveDate::from_ymd_opt(2024, 5, 17)
            .and_then(|d| d.and_hms_opt(9, 30, 5));
        photo.raw_position = Some(LatLon { lat: 35.68, lon: 139.76 });
        photo.set_projection(PlanePoint::new(-35_000.5, -6_000.25));
        photo.projected = Some(PlanePoint::new(100.0, 200.0));
        photo.category = Category::Close;
        photo.matched_point_id = Some("BM1".to_string());
        photo.distance = Some(3.5);
        photo.assigned_name = Some("BM1-2.jpg".to_string());
        photo
    }

    // ── Photo tests ──────────────────────────────────────────────

    #[test]
    fn test_photo_round_trip() {
        let catalog = Catalog::open_in_memory().unwrap();
        let photo = make_full_photo("IMG_0001.jpg");
        catalog.upsert_photo(&photo).unwrap();

        let photos = catalog.list_photos().unwrap();
        assert_eq!(photos, vec![photo]);
    }

    #[test]
    fn test_bare_photo_round_trip() {
        let catalog = Catalog::open_in_memory().unwrap();
        let photo = make_photo("IMG_0002.jpg");
        catalog.upsert_photo(&photo).unwrap();

        let loaded = &catalog.list_photos().unwrap()[0];
        assert_eq!(loaded.category, Category::Unknown);
        assert!(loaded.projected.is_none());
        assert!(loaded.capture_time.is_none());
    }

    #[test]
    fn test_upsert_updates_existing_row() {
        let catalog = Catalog::open_in_memory().unwrap();
        let mut photo = make_photo("IMG_0003.jpg");
        catalog.upsert_photo(&photo).unwrap();

        photo.assigned_name = Some("BM2-1.jpg".to_string());
        photo.category = Category::Distant;
        catalog.upsert_photo(&photo).unwrap();

        assert_eq!(catalog.count_photos().unwrap(), 1);
        let loaded = &catalog.list_photos().unwrap()[0];
        assert_eq!(loaded.assigned_name.as_deref(), Some("BM2-1.jpg"));
        assert_eq!(loaded.category, Category::Distant);
    }

    #[test]
    fn test_batch_keeps_ingestion_order() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        let photos: Vec<PhotoRecord> = ["c.jpg", "a.jpg", "b.jpg"].iter().map(|n| make_photo(n)).collect();
        assert_eq!(catalog.upsert_photos_batch(&photos).unwrap(), 3);

        // Re-upserting must not move rows.
        catalog.upsert_photos_batch(&photos[..1]).unwrap();

        let names: Vec<String> = catalog.list_photos().unwrap().into_iter().map(|p| p.filename).collect();
        assert_eq!(names, vec!["c.jpg", "a.jpg", "b.jpg"]);
        assert_eq!(catalog.count_photos().unwrap(), 3);
    }

    // ── Config ──────────────────────────────────────────────────

    #[test]
    fn test_set_and_get_config() {
        let catalog = Catalog::open_in_memory().unwrap();
        assert_eq!(catalog.get_config("network_path").unwrap(), None);

        catalog.set_config("network_path", "/tmp/site.sim").unwrap();
        assert_eq!(
            catalog.get_config("network_path").unwrap(),
            Some("/tmp/site.sim".to_string())
        );
    }

    #[test]
    fn test_set_config_overwrite() {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog.set_config("zone", "9").unwrap();
        catalog.set_config("zone", "6").unwrap();
        assert_eq!(catalog.get_config("zone").unwrap(), Some("6".to_string()));
    }

    // ── Schema version tracking ─────────────────────────────────

    #[test]
    fn test_schema_version_set_on_fresh_db() {
        let catalog = Catalog::open_in_memory().unwrap();
        assert_eq!(catalog.get_config("schema_version").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn test_reject_future_schema_version() {
        let conn = Connection::open_in_memory().unwrap();
        schema::initialize(&conn).unwrap();
        conn.execute("INSERT INTO config (key, value) VALUES ('schema_version', '999')", [])
            .unwrap();

        let err = schema::migrate(&conn).unwrap_err();
        assert!(matches!(err, crate::error::Error::SchemaTooNew { db: 999, code: 1 }));
    }

    // ── Data integrity ──────────────────────────────────────────

    #[test]
    fn test_data_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("project").join("catalog.db");
        {
            let catalog = Catalog::open(&db_path).unwrap();
            catalog.upsert_photo(&make_full_photo("IMG_0009.jpg")).unwrap();
            catalog.set_config("identifier", "name").unwrap();
        }
        {
            let catalog = Catalog::open(&db_path).unwrap();
            assert_eq!(catalog.count_photos().unwrap(), 1);
            assert_eq!(catalog.get_config("identifier").unwrap(), Some("name".to_string()));
        }
    }
}
