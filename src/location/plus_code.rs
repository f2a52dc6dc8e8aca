//! Open Location Code ("plus code") encoding.
//!
//! Only full 10-digit codes (≈14 m × 14 m) are produced; that is what the
//! geocoding providers report too.

use super::types::Coordinate;

const ALPHABET: &[u8; 20] = b"23456789CFGHJMPQRVWX";
const BASE: i64 = 20;
const PAIRS: usize = 5;
const SEPARATOR_POSITION: usize = 8;

// Integer arithmetic at full grid precision (15 digits) avoids float
// truncation at cell borders; the grid part is then divided away.
const FINAL_LAT_PRECISION: i64 = 8000 * 3125;
const FINAL_LON_PRECISION: i64 = 8000 * 1024;
const GRID_LAT_DIVISOR: i64 = 3125;
const GRID_LON_DIVISOR: i64 = 1024;

/// Encode a coordinate as a 10-digit plus code, e.g. `7FG49QCJ+2V`.
pub fn encode(coord: Coordinate) -> String {
    let lat = coord.lat.clamp(-90.0, 90.0);
    let lon = normalize_longitude(coord.lon);

    let mut lat_val = (lat * FINAL_LAT_PRECISION as f64).round() as i64 + 90 * FINAL_LAT_PRECISION;
    // The north pole belongs to the cell just below it.
    lat_val = lat_val.min(180 * FINAL_LAT_PRECISION - 1);
    let mut lon_val = (lon * FINAL_LON_PRECISION as f64).round() as i64 + 180 * FINAL_LON_PRECISION;
    lon_val %= 360 * FINAL_LON_PRECISION;

    lat_val /= GRID_LAT_DIVISOR;
    lon_val /= GRID_LON_DIVISOR;

    let mut digits = [0u8; PAIRS * 2];
    for pair in (0..PAIRS).rev() {
        digits[pair * 2] = ALPHABET[(lat_val % BASE) as usize];
        digits[pair * 2 + 1] = ALPHABET[(lon_val % BASE) as usize];
        lat_val /= BASE;
        lon_val /= BASE;
    }

    let mut code = String::with_capacity(PAIRS * 2 + 1);
    for (i, d) in digits.iter().enumerate() {
        if i == SEPARATOR_POSITION {
            code.push('+');
        }
        code.push(*d as char);
    }
    code
}

/// Longitude in [-180, 180).
fn normalize_longitude(lon: f64) -> f64 {
    let mut lon = lon;
    while lon < -180.0 {
        lon += 360.0;
    }
    while lon >= 180.0 {
        lon -= 360.0;
    }
    lon
}

/// Whether `code` is a syntactically valid full plus code.
pub fn is_full_code(code: &str) -> bool {
    let Some((head, tail)) = code.split_once('+') else {
        return false;
    };
    head.len() == SEPARATOR_POSITION
        && tail.len() >= 2
        && head
            .bytes()
            .chain(tail.bytes())
            .all(|b| ALPHABET.contains(&b.to_ascii_uppercase()))
}
