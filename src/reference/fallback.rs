//! Fallback policy: placeholder synthesis and sentinel normalization.
//!
//! Two rules, applied consistently so every downstream aggregation sees one
//! canonical unknown marker:
//!
//! 1. A code absent from every reference table gets a synthesized descriptive
//!    record whose name embeds the numeric code (traceable, stable across
//!    runs) and whose region/sector is exactly [`UNCLASSIFIED`].
//! 2. A *resolved* record whose region/sector equals a known missing-value
//!    sentinel is rewritten to the same [`UNCLASSIFIED`] bucket; resolution
//!    success does not guarantee a usable classification.

use crate::models::{CommodityRef, CountryRef, UNCLASSIFIED};

/// Missing-value sentinels observed in the source tables. Matching is
/// case-insensitive after trimming. "Неизвестно" is the literal sentinel of
/// the upstream country directory encoding.
const SENTINELS: &[&str] = &["", "n/a", "na", "-", "unknown", "неизвестно"];

/// True if a region/sector value means "no usable classification".
pub fn is_sentinel(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    SENTINELS.iter().any(|s| normalized == *s)
}

/// Normalize a region/sector value: sentinels collapse to [`UNCLASSIFIED`],
/// anything else is kept trimmed.
pub fn normalize_classification(value: &str) -> String {
    if is_sentinel(value) {
        UNCLASSIFIED.to_string()
    } else {
        value.trim().to_string()
    }
}

/// Synthesize a placeholder country record for an unresolved partner code.
pub fn synthesize_country(code: i64) -> CountryRef {
    CountryRef::new(code, format!("Country {code}"), UNCLASSIFIED)
}

/// Synthesize a placeholder commodity record for an unresolved commodity code.
pub fn synthesize_commodity(code: i64) -> CommodityRef {
    CommodityRef::new(code, format!("Commodity {code}"), UNCLASSIFIED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        assert!(is_sentinel(""));
        assert!(is_sentinel("  "));
        assert!(is_sentinel("N/A"));
        assert!(is_sentinel("Unknown"));
        assert!(is_sentinel("Неизвестно"));
        assert!(is_sentinel(" - "));
        assert!(!is_sentinel("Europe"));
        assert!(!is_sentinel("Other regions"));
    }

    #[test]
    fn test_normalize_classification() {
        assert_eq!(normalize_classification("Europe"), "Europe");
        assert_eq!(normalize_classification("  Asia "), "Asia");
        assert_eq!(normalize_classification("unknown"), UNCLASSIFIED);
        assert_eq!(normalize_classification(""), UNCLASSIFIED);
    }

    #[test]
    fn test_placeholder_embeds_code() {
        let country = synthesize_country(999_999);
        assert!(country.name.contains("999999"));
        assert_eq!(country.region, UNCLASSIFIED);

        let commodity = synthesize_commodity(42);
        assert!(commodity.name.contains("42"));
        assert_eq!(commodity.sector, UNCLASSIFIED);
    }

    #[test]
    fn test_placeholders_are_distinct_per_code() {
        assert_ne!(synthesize_country(1).name, synthesize_country(2).name);
        assert_ne!(synthesize_commodity(10).name, synthesize_commodity(100).name);
    }

    #[test]
    fn test_placeholder_is_deterministic() {
        assert_eq!(synthesize_country(7).name, synthesize_country(7).name);
    }
}
