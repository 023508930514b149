//! The 19 Japanese plane-rectangular coordinate zones (JGD2011).

use crate::error::{Error, Result};

/// One plane-rectangular zone: projection origin and the rough extent of
/// projected coordinates observed in surveys that use it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub number: u8,
    pub region: &'static str,
    /// Origin latitude in degrees.
    pub origin_lat: f64,
    /// Central meridian in degrees.
    pub origin_lon: f64,
    /// Inclusive (min, max) northing range used for zone inference.
    pub x_range: (f64, f64),
    /// Inclusive (min, max) easting range used for zone inference.
    pub y_range: (f64, f64),
}

impl Zone {
    /// EPSG code of the JGD2011 projected system for this zone.
    pub fn epsg(&self) -> u32 {
        6668 + self.number as u32
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.x_range.0..=self.x_range.1).contains(&x) && (self.y_range.0..=self.y_range.1).contains(&y)
    }
}

const STD: (f64, f64) = (-150_000.0, 150_000.0);
const WIDE: (f64, f64) = (-200_000.0, 200_000.0);

pub const ZONES: [Zone; 19] = [
    Zone { number: 1, region: "Nagasaki, Kagoshima islands", origin_lat: 33.0, origin_lon: 129.0 + 30.0 / 60.0, x_range: STD, y_range: (-150_000.0, 100_000.0) },
    Zone { number: 2, region: "Fukuoka, Saga, Kumamoto, Oita, Miyazaki, Kagoshima", origin_lat: 33.0, origin_lon: 131.0, x_range: (-250_000.0, 50_000.0), y_range: (-150_000.0, 100_000.0) },
    Zone { number: 3, region: "Yamaguchi, Shimane, Hiroshima", origin_lat: 36.0, origin_lon: 132.0 + 10.0 / 60.0, x_range: STD, y_range: STD },
    Zone { number: 4, region: "Kagawa, Ehime, Tokushima, Kochi", origin_lat: 33.0, origin_lon: 133.0 + 30.0 / 60.0, x_range: STD, y_range: STD },
    Zone { number: 5, region: "Hyogo, Tottori, Okayama", origin_lat: 36.0, origin_lon: 134.0 + 20.0 / 60.0, x_range: STD, y_range: STD },
    Zone { number: 6, region: "Kyoto, Osaka, Fukui, Shiga, Mie, Nara, Wakayama", origin_lat: 36.0, origin_lon: 136.0, x_range: STD, y_range: STD },
    Zone { number: 7, region: "Ishikawa, Toyama, Gifu, Aichi", origin_lat: 36.0, origin_lon: 137.0 + 10.0 / 60.0, x_range: STD, y_range: STD },
    Zone { number: 8, region: "Niigata, Nagano, Yamanashi, Shizuoka", origin_lat: 36.0, origin_lon: 138.0 + 30.0 / 60.0, x_range: STD, y_range: STD },
    Zone { number: 9, region: "Tokyo, Fukushima, Tochigi, Ibaraki, Saitama, Chiba, Gunma, Kanagawa", origin_lat: 36.0, origin_lon: 139.0 + 50.0 / 60.0, x_range: (-150_000.0, 200_000.0), y_range: STD },
    Zone { number: 10, region: "Aomori, Akita, Yamagata, Iwate, Miyagi", origin_lat: 40.0, origin_lon: 140.0 + 50.0 / 60.0, x_range: STD, y_range: STD },
    Zone { number: 11, region: "Hokkaido (Otaru, Hakodate, Date)", origin_lat: 44.0, origin_lon: 140.0 + 15.0 / 60.0, x_range: STD, y_range: STD },
    Zone { number: 12, region: "Hokkaido (Sapporo, Asahikawa, Kitami)", origin_lat: 44.0, origin_lon: 142.0 + 15.0 / 60.0, x_range: STD, y_range: STD },
    Zone { number: 13, region: "Hokkaido (Kushiro, Nemuro, Abashiri)", origin_lat: 44.0, origin_lon: 144.0 + 15.0 / 60.0, x_range: STD, y_range: STD },
    Zone { number: 14, region: "Tokyo (Ogasawara east of 140.5E)", origin_lat: 26.0, origin_lon: 142.0, x_range: WIDE, y_range: WIDE },
    Zone { number: 15, region: "Okinawa (main islands)", origin_lat: 26.0, origin_lon: 127.0 + 30.0 / 60.0, x_range: STD, y_range: STD },
    Zone { number: 16, region: "Okinawa (Sakishima)", origin_lat: 26.0, origin_lon: 124.0, x_range: STD, y_range: STD },
    Zone { number: 17, region: "Okinawa (Daito islands)", origin_lat: 26.0, origin_lon: 131.0, x_range: STD, y_range: STD },
    Zone { number: 18, region: "Tokyo (Okinotorishima)", origin_lat: 20.0, origin_lon: 136.0, x_range: WIDE, y_range: WIDE },
    Zone { number: 19, region: "Tokyo (Minamitorishima)", origin_lat: 26.0, origin_lon: 154.0, x_range: STD, y_range: STD },
];

/// Look up a zone by its number (1..=19).
pub fn zone(number: u8) -> Result<&'static Zone> {
    if !(1..=19).contains(&number) {
        return Err(Error::ZoneOutOfRange(number));
    }
    Ok(&ZONES[number as usize - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_table_is_ordered() {
        for (i, z) in ZONES.iter().enumerate() {
            assert_eq!(z.number as usize, i + 1);
        }
    }

    #[test]
    fn test_zone_lookup() {
        let z = zone(9).unwrap();
        assert_eq!(z.epsg(), 6677);
        assert!((z.origin_lon - 139.833_333).abs() < 1e-5);
        assert!(zone(0).is_err());
        assert!(zone(20).is_err());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let z = zone(3).unwrap();
        assert!(z.contains(150_000.0, -150_000.0));
        assert!(!z.contains(150_000.1, 0.0));
    }
}
