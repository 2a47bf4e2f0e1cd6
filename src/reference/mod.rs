//! Reference resolution: code -> descriptive record lookups.
//!
//! Lookup precedence for a partner code:
//!
//! 1. Alias table (configurable; see [`AliasTable`])
//! 2. Authoritative country table from the input files
//! 3. Embedded supplemental table ([`builtin::BUILTIN_COUNTRIES`])
//!
//! When both the authoritative and supplemental tables hold a code, the
//! authoritative record wins in full (name and region together) — no
//! field-by-field merge. The single exception: an authoritative record whose
//! region/sector is a missing-value sentinel gets that one field backfilled
//! from the supplemental source while keeping the authoritative name.
//!
//! All tables are pre-indexed by code at construction, so every lookup is a
//! single hash probe. The resolver is read-only after construction.

pub mod builtin;
pub mod fallback;

use std::collections::HashMap;

use crate::models::{CommodityRef, CountryRef};

// =============================================================================
// Alias Table
// =============================================================================

/// Explicit per-code overrides applied before any table lookup.
///
/// The raw data reports a few continental/regional variants of countries
/// under their own numeric codes (842, 579, 251); whether that is a reporting
/// convention or a data-quality artifact is not determinable from the data,
/// so the overrides live in a configurable table rather than inline logic.
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: HashMap<i64, CountryRef>,
}

impl AliasTable {
    /// An alias table with no entries.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Build from explicit entries.
    pub fn from_entries(entries: impl IntoIterator<Item = CountryRef>) -> Self {
        Self {
            entries: entries.into_iter().map(|c| (c.code, c)).collect(),
        }
    }

    /// Add or replace an override.
    pub fn insert(&mut self, entry: CountryRef) {
        self.entries.insert(entry.code, entry);
    }

    pub fn get(&self, code: i64) -> Option<&CountryRef> {
        self.entries.get(&code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AliasTable {
    /// The continental-variant codes observed in the raw data.
    fn default() -> Self {
        Self::from_entries([
            CountryRef::new(842, "United States", "Americas"),
            CountryRef::new(579, "Norway", "Europe"),
            CountryRef::new(251, "France", "Europe"),
        ])
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Two-tier reference resolver for partner and commodity codes.
pub struct Resolver {
    countries: HashMap<i64, CountryRef>,
    commodities: HashMap<i64, CommodityRef>,
    aliases: AliasTable,
}

impl Resolver {
    /// Index the authoritative tables by code. On duplicate codes the first
    /// occurrence wins, matching the declared uniqueness of the source tables.
    pub fn new(countries: &[CountryRef], commodities: &[CommodityRef], aliases: AliasTable) -> Self {
        let mut country_index = HashMap::with_capacity(countries.len());
        for country in countries {
            country_index
                .entry(country.code)
                .or_insert_with(|| country.clone());
        }

        let mut commodity_index = HashMap::with_capacity(commodities.len());
        for commodity in commodities {
            commodity_index
                .entry(commodity.code)
                .or_insert_with(|| commodity.clone());
        }

        Self {
            countries: country_index,
            commodities: commodity_index,
            aliases,
        }
    }

    /// Resolve a partner code to a country record, or `None` when no table
    /// knows the code (the caller applies the fallback policy).
    pub fn resolve_partner(&self, code: i64) -> Option<CountryRef> {
        if let Some(alias) = self.aliases.get(code) {
            return Some(alias.clone());
        }

        if let Some(authoritative) = self.countries.get(&code) {
            let mut resolved = authoritative.clone();
            if fallback::is_sentinel(&resolved.region) {
                if let Some(supplemental) = builtin::builtin_country(code) {
                    if !fallback::is_sentinel(&supplemental.region) {
                        // Backfill region only; the authoritative name stays.
                        resolved.region = supplemental.region.clone();
                    }
                }
            }
            return Some(resolved);
        }

        builtin::builtin_country(code).cloned()
    }

    /// Resolve a commodity code. The supplemental source for commodities only
    /// carries sectors (the HS chapter rule), so it can backfill a missing
    /// sector but never produce a whole record on its own.
    pub fn resolve_commodity(&self, code: i64) -> Option<CommodityRef> {
        let authoritative = self.commodities.get(&code)?;
        let mut resolved = authoritative.clone();
        if fallback::is_sentinel(&resolved.sector) {
            if let Some(sector) = builtin::sector_for_code(code) {
                resolved.sector = sector.to_string();
            }
        }
        Some(resolved)
    }

    /// Number of authoritative country entries.
    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    /// Number of authoritative commodity entries.
    pub fn commodity_count(&self) -> usize {
        self.commodities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNCLASSIFIED;

    fn resolver() -> Resolver {
        let countries = vec![
            CountryRef::new(276, "Germany", "Europe"),
            CountryRef::new(752, "Sweden", "Неизвестно"),
            CountryRef::new(900, "Special Zone", ""),
        ];
        let commodities = vec![
            CommodityRef::new(1001, "Wheat", "Agriculture"),
            CommodityRef::new(8471, "Computers", ""),
            CommodityRef::new(9901, "Special goods", ""),
        ];
        Resolver::new(&countries, &commodities, AliasTable::default())
    }

    #[test]
    fn test_authoritative_wins_in_full() {
        // 276 exists in both tables; the authoritative record must win whole.
        let resolved = resolver().resolve_partner(276).unwrap();
        assert_eq!(resolved.name, "Germany");
        assert_eq!(resolved.region, "Europe");
    }

    #[test]
    fn test_sentinel_region_backfilled_keeps_name() {
        // Authoritative region is the source sentinel; supplemental has one.
        let resolved = resolver().resolve_partner(752).unwrap();
        assert_eq!(resolved.name, "Sweden");
        assert_eq!(resolved.region, "Europe");
    }

    #[test]
    fn test_sentinel_region_without_supplemental_entry() {
        // 900 is not in the supplemental table: the sentinel stays as-is here
        // and is normalized to the unclassified bucket downstream.
        let resolved = resolver().resolve_partner(900).unwrap();
        assert_eq!(resolved.name, "Special Zone");
        assert!(fallback::is_sentinel(&resolved.region));
    }

    #[test]
    fn test_supplemental_fills_missing_codes() {
        // 156 (China) is absent from the authoritative table.
        let resolved = resolver().resolve_partner(156).unwrap();
        assert_eq!(resolved.name, "China");
        assert_eq!(resolved.region, "Asia");
    }

    #[test]
    fn test_alias_has_highest_precedence() {
        let resolved = resolver().resolve_partner(842).unwrap();
        assert_eq!(resolved.name, "United States");
        assert_eq!(resolved.region, "Americas");

        let resolved = resolver().resolve_partner(579).unwrap();
        assert_eq!(resolved.name, "Norway");
    }

    #[test]
    fn test_unknown_code_is_not_found() {
        assert!(resolver().resolve_partner(999_999).is_none());
        assert!(resolver().resolve_commodity(999_999).is_none());
    }

    #[test]
    fn test_commodity_sector_backfill_from_chapter() {
        let resolved = resolver().resolve_commodity(8471).unwrap();
        assert_eq!(resolved.name, "Computers");
        assert_eq!(resolved.sector, "Machinery & electrical equipment");
    }

    #[test]
    fn test_commodity_sector_unresolvable_chapter() {
        // Chapter 99 has no label; the sentinel survives to normalization.
        let resolved = resolver().resolve_commodity(9901).unwrap();
        assert_eq!(
            fallback::normalize_classification(&resolved.sector),
            UNCLASSIFIED
        );
    }

    #[test]
    fn test_duplicate_codes_first_wins() {
        let countries = vec![
            CountryRef::new(276, "Germany", "Europe"),
            CountryRef::new(276, "Germany (duplicate)", "Europe"),
        ];
        let resolver = Resolver::new(&countries, &[], AliasTable::empty());
        assert_eq!(resolver.resolve_partner(276).unwrap().name, "Germany");
    }
}
