//! Localized time zone names for the published attributes.
//!
//! chrono-tz knows offsets and abbreviations but no long names, so the
//! common zones are mapped by abbreviation; anything else falls back to the
//! CLDR location format ("Riyadh Time").

use chrono::{DateTime, Utc};
use chrono_tz::{OffsetComponents, Tz};
use serde::Serialize;

/// Display data for a zone at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimezoneDisplay {
    pub abbreviation: String,
    pub full_name: String,
    pub is_dst: bool,
}

/// Describe `tz_id` at `at` for `locale`. `None` if the id is not a known zone.
pub fn describe(tz_id: &str, at: DateTime<Utc>, locale: &str) -> Option<TimezoneDisplay> {
    let tz: Tz = tz_id.parse().ok()?;
    let local = at.with_timezone(&tz);
    let is_dst = local.offset().dst_offset().num_seconds() != 0;
    let abbreviation = local.format("%Z").to_string();
    let language = language_of(locale);

    let full_name = zone_override(tz_id, is_dst)
        .filter(|_| language == "en")
        .map(str::to_string)
        .or_else(|| long_name(language, &abbreviation).map(str::to_string))
        .unwrap_or_else(|| location_format(language, tz_id, is_dst));

    Some(TimezoneDisplay {
        abbreviation,
        full_name,
        is_dst,
    })
}

/// "de-DE", "de_DE" and "DE" all become "de".
fn language_of(locale: &str) -> &'static str {
    let lang = locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match lang.as_str() {
        "de" => "de",
        "fr" => "fr",
        "es" => "es",
        _ => "en",
    }
}

/// Zones whose tzdata abbreviation collides with another region's.
fn zone_override(tz_id: &str, is_dst: bool) -> Option<&'static str> {
    let (standard, daylight) = match tz_id {
        "Asia/Kolkata" | "Asia/Calcutta" => ("India Standard Time", "India Standard Time"),
        "Europe/Dublin" => ("Greenwich Mean Time", "Irish Standard Time"),
        "Asia/Jerusalem" | "Asia/Tel_Aviv" => ("Israel Standard Time", "Israel Daylight Time"),
        "Asia/Manila" => ("Philippine Standard Time", "Philippine Summer Time"),
        "Asia/Shanghai" | "Asia/Chongqing" | "Asia/Harbin" => ("China Standard Time", "China Daylight Time"),
        "America/Havana" => ("Cuba Standard Time", "Cuba Daylight Time"),
        _ => return None,
    };
    Some(if is_dst { daylight } else { standard })
}

const EN_NAMES: &[(&str, &str)] = &[
    ("UTC", "Coordinated Universal Time"),
    ("GMT", "Greenwich Mean Time"),
    ("BST", "British Summer Time"),
    ("WET", "Western European Standard Time"),
    ("WEST", "Western European Summer Time"),
    ("CET", "Central European Standard Time"),
    ("CEST", "Central European Summer Time"),
    ("EET", "Eastern European Standard Time"),
    ("EEST", "Eastern European Summer Time"),
    ("MSK", "Moscow Standard Time"),
    ("EST", "Eastern Standard Time"),
    ("EDT", "Eastern Daylight Time"),
    ("CST", "Central Standard Time"),
    ("CDT", "Central Daylight Time"),
    ("MST", "Mountain Standard Time"),
    ("MDT", "Mountain Daylight Time"),
    ("PST", "Pacific Standard Time"),
    ("PDT", "Pacific Daylight Time"),
    ("AKST", "Alaska Standard Time"),
    ("AKDT", "Alaska Daylight Time"),
    ("HST", "Hawaii-Aleutian Standard Time"),
    ("HDT", "Hawaii-Aleutian Daylight Time"),
    ("AST", "Atlantic Standard Time"),
    ("ADT", "Atlantic Daylight Time"),
    ("NST", "Newfoundland Standard Time"),
    ("NDT", "Newfoundland Daylight Time"),
    ("JST", "Japan Standard Time"),
    ("KST", "Korean Standard Time"),
    ("HKT", "Hong Kong Standard Time"),
    ("PKT", "Pakistan Standard Time"),
    ("WIB", "Western Indonesia Time"),
    ("WITA", "Central Indonesia Time"),
    ("WIT", "Eastern Indonesia Time"),
    ("AEST", "Australian Eastern Standard Time"),
    ("AEDT", "Australian Eastern Daylight Time"),
    ("ACST", "Australian Central Standard Time"),
    ("ACDT", "Australian Central Daylight Time"),
    ("AWST", "Australian Western Standard Time"),
    ("NZST", "New Zealand Standard Time"),
    ("NZDT", "New Zealand Daylight Time"),
    ("SAST", "South Africa Standard Time"),
    ("CAT", "Central Africa Time"),
    ("EAT", "East Africa Time"),
    ("WAT", "West Africa Standard Time"),
    ("ChST", "Chamorro Standard Time"),
    ("SST", "Samoa Standard Time"),
];

const DE_NAMES: &[(&str, &str)] = &[
    ("UTC", "Koordinierte Weltzeit"),
    ("GMT", "Mittlere Greenwich-Zeit"),
    ("BST", "Britische Sommerzeit"),
    ("WET", "Westeuropäische Normalzeit"),
    ("WEST", "Westeuropäische Sommerzeit"),
    ("CET", "Mitteleuropäische Normalzeit"),
    ("CEST", "Mitteleuropäische Sommerzeit"),
    ("EET", "Osteuropäische Normalzeit"),
    ("EEST", "Osteuropäische Sommerzeit"),
    ("MSK", "Moskauer Normalzeit"),
];

const FR_NAMES: &[(&str, &str)] = &[
    ("UTC", "temps universel coordonné"),
    ("GMT", "heure moyenne de Greenwich"),
    ("BST", "heure d’été britannique"),
    ("WET", "heure normale d’Europe de l’Ouest"),
    ("WEST", "heure d’été d’Europe de l’Ouest"),
    ("CET", "heure normale d’Europe centrale"),
    ("CEST", "heure d’été d’Europe centrale"),
    ("EET", "heure normale d’Europe de l’Est"),
    ("EEST", "heure d’été d’Europe de l’Est"),
    ("MSK", "heure normale de Moscou"),
];

const ES_NAMES: &[(&str, &str)] = &[
    ("UTC", "tiempo universal coordinado"),
    ("GMT", "hora del meridiano de Greenwich"),
    ("BST", "hora de verano británica"),
    ("WET", "hora estándar de Europa occidental"),
    ("WEST", "hora de verano de Europa occidental"),
    ("CET", "hora estándar de Europa central"),
    ("CEST", "hora de verano de Europa central"),
    ("EET", "hora estándar de Europa oriental"),
    ("EEST", "hora de verano de Europa oriental"),
    ("MSK", "hora estándar de Moscú"),
];

fn long_name(language: &str, abbreviation: &str) -> Option<&'static str> {
    let table = match language {
        "de" => DE_NAMES,
        "fr" => FR_NAMES,
        "es" => ES_NAMES,
        _ => EN_NAMES,
    };
    table
        .iter()
        .find(|(abbr, _)| *abbr == abbreviation)
        .map(|(_, name)| *name)
}

/// CLDR region format built from the zone's exemplar city.
fn location_format(language: &str, tz_id: &str, is_dst: bool) -> String {
    let city = tz_id.rsplit('/').next().unwrap_or(tz_id).replace('_', " ");
    match language {
        "de" => format!("{} (Ortszeit)", city),
        "fr" => format!("heure : {}", city),
        "es" => format!("hora de {}", city),
        _ if is_dst => format!("{} Daylight Time", city),
        _ => format!("{} Time", city),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summer() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
    }

    fn winter() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_paris_summer_and_winter() {
        let s = describe("Europe/Paris", summer(), "en").unwrap();
        assert_eq!(s.abbreviation, "CEST");
        assert!(s.is_dst);
        assert_eq!(s.full_name, "Central European Summer Time");

        let w = describe("Europe/Paris", winter(), "en-US").unwrap();
        assert_eq!(w.abbreviation, "CET");
        assert!(!w.is_dst);
        assert_eq!(w.full_name, "Central European Standard Time");
    }

    #[test]
    fn test_localized_names() {
        let de = describe("Europe/Berlin", summer(), "de_DE").unwrap();
        assert_eq!(de.full_name, "Mitteleuropäische Sommerzeit");

        let fr = describe("Europe/Paris", winter(), "fr").unwrap();
        assert_eq!(fr.full_name, "heure normale d’Europe centrale");
    }

    #[test]
    fn test_new_york() {
        let d = describe("America/New_York", winter(), "en").unwrap();
        assert_eq!(d.abbreviation, "EST");
        assert_eq!(d.full_name, "Eastern Standard Time");
    }

    #[test]
    fn test_override_beats_abbreviation() {
        let d = describe("Asia/Kolkata", summer(), "en").unwrap();
        assert_eq!(d.full_name, "India Standard Time");
    }

    #[test]
    fn test_location_format_fallback() {
        let d = describe("America/Argentina/Buenos_Aires", winter(), "en").unwrap();
        assert_eq!(d.full_name, "Buenos Aires Time");

        let d = describe("America/Argentina/Buenos_Aires", winter(), "es").unwrap();
        assert_eq!(d.full_name, "hora de Buenos Aires");
    }

    #[test]
    fn test_unknown_zone() {
        assert!(describe("Mars/Olympus_Mons", summer(), "en").is_none());
    }

    #[test]
    fn test_language_of() {
        assert_eq!(language_of("de-AT"), "de");
        assert_eq!(language_of("FR"), "fr");
        assert_eq!(language_of("pt-BR"), "en");
        assert_eq!(language_of(""), "en");
    }
}
