//! Embedded supplemental reference tables.
//!
//! The authoritative country table shipped with the raw data only covers a
//! fraction of the partner codes that actually occur in the trade table, so a
//! static ISO-3166 numeric map fills the common gaps. Likewise, commodity
//! sectors are frequently missing; the fixed-width 2-digit HS chapter prefix
//! of the commodity code maps to a chapter-group label.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::models::CountryRef;

/// Supplemental country table: ISO-3166 numeric code -> (name, region).
///
/// Regions form the fixed set used by the geography views: Europe, Asia,
/// Americas, Africa, Oceania.
pub static BUILTIN_COUNTRIES: Lazy<HashMap<i64, CountryRef>> = Lazy::new(|| {
    let entries: &[(i64, &str, &str)] = &[
        // Europe
        (276, "Germany", "Europe"),
        (752, "Sweden", "Europe"),
        (208, "Denmark", "Europe"),
        (578, "Norway", "Europe"),
        (528, "Netherlands", "Europe"),
        (250, "France", "Europe"),
        (826, "United Kingdom", "Europe"),
        (380, "Italy", "Europe"),
        (724, "Spain", "Europe"),
        (616, "Poland", "Europe"),
        (56, "Belgium", "Europe"),
        (203, "Czechia", "Europe"),
        (348, "Hungary", "Europe"),
        (703, "Slovakia", "Europe"),
        (705, "Slovenia", "Europe"),
        (233, "Estonia", "Europe"),
        (428, "Latvia", "Europe"),
        (440, "Lithuania", "Europe"),
        (372, "Ireland", "Europe"),
        (40, "Austria", "Europe"),
        (756, "Switzerland", "Europe"),
        (300, "Greece", "Europe"),
        (620, "Portugal", "Europe"),
        (100, "Bulgaria", "Europe"),
        (642, "Romania", "Europe"),
        (191, "Croatia", "Europe"),
        (246, "Finland", "Europe"),
        (643, "Russia", "Europe"),
        (804, "Ukraine", "Europe"),
        (112, "Belarus", "Europe"),
        (498, "Moldova", "Europe"),
        // Asia
        (156, "China", "Asia"),
        (392, "Japan", "Asia"),
        (410, "South Korea", "Asia"),
        (356, "India", "Asia"),
        (702, "Singapore", "Asia"),
        (764, "Thailand", "Asia"),
        (458, "Malaysia", "Asia"),
        (704, "Vietnam", "Asia"),
        (360, "Indonesia", "Asia"),
        (608, "Philippines", "Asia"),
        (784, "United Arab Emirates", "Asia"),
        (682, "Saudi Arabia", "Asia"),
        (792, "Turkey", "Asia"),
        (368, "Iraq", "Asia"),
        (364, "Iran", "Asia"),
        (398, "Kazakhstan", "Asia"),
        (860, "Uzbekistan", "Asia"),
        // Americas
        (840, "United States", "Americas"),
        (124, "Canada", "Americas"),
        (484, "Mexico", "Americas"),
        (76, "Brazil", "Americas"),
        (32, "Argentina", "Americas"),
        (152, "Chile", "Americas"),
        (170, "Colombia", "Americas"),
        (604, "Peru", "Americas"),
        (858, "Uruguay", "Americas"),
        // Africa
        (710, "South Africa", "Africa"),
        (818, "Egypt", "Africa"),
        (12, "Algeria", "Africa"),
        (504, "Morocco", "Africa"),
        (566, "Nigeria", "Africa"),
        (404, "Kenya", "Africa"),
        // Oceania
        (36, "Australia", "Oceania"),
        (554, "New Zealand", "Oceania"),
    ];

    entries
        .iter()
        .map(|&(code, name, region)| (code, CountryRef::new(code, name, region)))
        .collect()
});

/// Look up a country in the supplemental table.
pub fn builtin_country(code: i64) -> Option<&'static CountryRef> {
    BUILTIN_COUNTRIES.get(&code)
}

/// The fixed-width prefix rule: the HS chapter is the leading two digits of
/// the commodity code rendered as a string ("1001" -> 10, "101" -> 10,
/// "9" -> 9).
pub fn hs_chapter(commodity_code: i64) -> u32 {
    let digits = commodity_code.abs().to_string();
    let prefix: String = digits.chars().take(2).collect();
    prefix.parse().unwrap_or(0)
}

/// HS chapter-group label for a commodity code, used to derive a sector when
/// the reference tables provide none.
pub fn sector_for_code(commodity_code: i64) -> Option<&'static str> {
    let label = match hs_chapter(commodity_code) {
        1..=5 => "Animal products",
        6..=14 => "Vegetable products",
        15 => "Animal & vegetable fats",
        16..=24 => "Foodstuffs & beverages",
        25..=27 => "Mineral products",
        28..=38 => "Chemical products",
        39..=40 => "Plastics & rubber",
        41..=43 => "Hides & leather",
        44..=46 => "Wood products",
        47..=49 => "Pulp & paper",
        50..=63 => "Textiles",
        64..=67 => "Footwear & headgear",
        68..=70 => "Stone & glass",
        71 => "Precious metals & stones",
        72..=83 => "Base metals",
        84..=85 => "Machinery & electrical equipment",
        86..=89 => "Transport equipment",
        90..=92 => "Optical & precision instruments",
        93 => "Arms & ammunition",
        94..=96 => "Miscellaneous manufactures",
        97 => "Art & antiques",
        _ => return None,
    };
    Some(label)
}
