//! Aggregation engine: named read-only views over the reconciled dataset.
//!
//! Every view is a pure function of the immutable [`Dataset`] plus explicit
//! parameters; nothing here mutates shared state, so any number of views may
//! run concurrently (the HTTP layer shares one `Arc<Dataset>` across request
//! handlers).
//!
//! Grouping preserves first-seen order so that descending-by-total sorts are
//! stable: ties keep the order in which their group key first appeared in the
//! data. Truncated views simply drop the remaining mass — truncated sums are
//! not the grand total, and callers must not assume they are.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use crate::models::{Flow, ReconciledRecord, UNCLASSIFIED};
use crate::reference::builtin;

// =============================================================================
// View Rows
// =============================================================================

/// One (year, flow) total; used by the yearly trend and partner series views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyTrendRow {
    pub year: i32,
    pub flow: Flow,
    /// Sum of `valueScaled` (million currency units).
    pub total: f64,
}

/// One commodity total within a flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommodityTotalRow {
    pub commodity_code: i64,
    pub commodity_name: String,
    pub total: f64,
}

/// One sector's share of total trade.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorShareRow {
    pub sector: String,
    pub total: f64,
    /// Percent of the untruncated grand total.
    pub share: f64,
}

/// One partner's export/import pivot over a year range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerBalanceRow {
    pub partner_name: String,
    pub export: f64,
    pub import: f64,
    /// `export + import`.
    pub total: f64,
    /// `export - import`.
    pub balance: f64,
}

/// One commodity's value in two compared years.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralChangeRow {
    pub commodity_code: i64,
    pub commodity_name: String,
    pub base_value: f64,
    pub compare_value: f64,
    /// `(compare - base) / base * 100`; forced to `0` when `base` is zero.
    pub change_pct: f64,
}

// =============================================================================
// Dataset
// =============================================================================

/// The canonical reconciled dataset, immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<ReconciledRecord>,
}

impl Dataset {
    pub fn new(records: Vec<ReconciledRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ReconciledRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Yearly trend: one row per (year, flow) present in the data, sorted by
    /// year then flow. Years with no records are not gap-filled.
    pub fn yearly_trend(&self) -> Vec<YearlyTrendRow> {
        Self::year_flow_totals(self.records.iter())
    }

    /// Top-N commodities for one flow, by summed scaled value, descending.
    pub fn top_commodities(&self, flow: Flow, top: usize) -> Vec<CommodityTotalRow> {
        let groups = group_sum(
            self.records
                .iter()
                .filter(|r| r.flow == flow)
                .map(|r| ((r.commodity_code, r.commodity_name.clone()), r.value_scaled)),
        );

        let mut rows: Vec<CommodityTotalRow> = groups
            .into_iter()
            .map(|((code, name), total)| CommodityTotalRow {
                commodity_code: code,
                commodity_name: name,
                total,
            })
            .collect();
        sort_desc(&mut rows, |r| r.total);
        rows.truncate(top);
        rows
    }

    /// Sector structure: totals per sector key, descending, truncated to the
    /// top N. The excluded remainder is not redistributed.
    pub fn sector_structure(&self, top: usize) -> Vec<SectorShareRow> {
        let grand_total: f64 = self.records.iter().map(|r| r.value_scaled).sum();
        let groups = group_sum(
            self.records
                .iter()
                .map(|r| (sector_key(r), r.value_scaled)),
        );

        let mut rows: Vec<SectorShareRow> = groups
            .into_iter()
            .map(|(sector, total)| SectorShareRow {
                sector,
                total,
                share: if grand_total == 0.0 {
                    0.0
                } else {
                    total / grand_total * 100.0
                },
            })
            .collect();
        sort_desc(&mut rows, |r| r.total);
        rows.truncate(top);
        rows
    }

    /// Top-N partners over an inclusive year range, pivoted to per-partner
    /// export/import with derived total and balance, sorted by total
    /// descending. A partner absent for one flow in the range gets `0`.
    pub fn top_partners(&self, from_year: i32, to_year: i32, top: usize) -> Vec<PartnerBalanceRow> {
        let mut order: Vec<String> = Vec::new();
        let mut pivot: HashMap<String, (f64, f64)> = HashMap::new();

        for record in self
            .records
            .iter()
            .filter(|r| r.period >= from_year && r.period <= to_year)
        {
            let entry = pivot
                .entry(record.partner_name.clone())
                .or_insert_with(|| {
                    order.push(record.partner_name.clone());
                    (0.0, 0.0)
                });
            match record.flow {
                Flow::Export => entry.0 += record.value_scaled,
                Flow::Import => entry.1 += record.value_scaled,
            }
        }

        let mut rows: Vec<PartnerBalanceRow> = order
            .into_iter()
            .map(|name| {
                let (export, import) = pivot[&name];
                PartnerBalanceRow {
                    partner_name: name,
                    export,
                    import,
                    total: export + import,
                    balance: export - import,
                }
            })
            .collect();
        sort_desc(&mut rows, |r| r.total);
        rows.truncate(top);
        rows
    }

    /// Single-partner time series: (year, flow) totals for an exact partner
    /// name match, no truncation.
    pub fn partner_series(&self, partner_name: &str) -> Vec<YearlyTrendRow> {
        Self::year_flow_totals(
            self.records
                .iter()
                .filter(|r| r.partner_name == partner_name),
        )
    }

    /// Structural change between two years: per-commodity totals in each year,
    /// percent change sorted descending, truncated to the top N.
    ///
    /// A zero base-year value makes the ratio undefined; the change is forced
    /// to `0` rather than propagating infinity (documented lossy policy).
    pub fn structural_change(
        &self,
        base_year: i32,
        compare_year: i32,
        top: usize,
    ) -> Vec<StructuralChangeRow> {
        let mut order: Vec<i64> = Vec::new();
        let mut totals: HashMap<i64, (String, f64, f64)> = HashMap::new();

        for record in self
            .records
            .iter()
            .filter(|r| r.period == base_year || r.period == compare_year)
        {
            let entry = totals
                .entry(record.commodity_code)
                .or_insert_with(|| {
                    order.push(record.commodity_code);
                    (record.commodity_name.clone(), 0.0, 0.0)
                });
            if record.period == base_year {
                entry.1 += record.value_scaled;
            } else {
                entry.2 += record.value_scaled;
            }
        }

        let mut rows: Vec<StructuralChangeRow> = order
            .into_iter()
            .map(|code| {
                let (name, base_value, compare_value) = totals[&code].clone();
                let change_pct = if base_value == 0.0 {
                    0.0
                } else {
                    (compare_value - base_value) / base_value * 100.0
                };
                StructuralChangeRow {
                    commodity_code: code,
                    commodity_name: name,
                    base_value,
                    compare_value,
                    change_pct,
                }
            })
            .collect();
        sort_desc(&mut rows, |r| r.change_pct);
        rows.truncate(top);
        rows
    }

    fn year_flow_totals<'a>(
        records: impl Iterator<Item = &'a ReconciledRecord>,
    ) -> Vec<YearlyTrendRow> {
        let groups = group_sum(records.map(|r| ((r.period, r.flow), r.value_scaled)));

        let mut rows: Vec<YearlyTrendRow> = groups
            .into_iter()
            .map(|((year, flow), total)| YearlyTrendRow { year, flow, total })
            .collect();
        rows.sort_by(|a, b| (a.year, a.flow).cmp(&(b.year, b.flow)));
        rows
    }
}

/// Sum values per key, keeping keys in first-seen order.
fn group_sum<K: Eq + Hash + Clone>(items: impl Iterator<Item = (K, f64)>) -> Vec<(K, f64)> {
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, f64)> = Vec::new();

    for (key, value) in items {
        match index.get(&key).copied() {
            Some(i) => groups[i].1 += value,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, value));
            }
        }
    }

    groups
}

/// Stable descending sort by an f64 metric; ties keep first-seen order.
fn sort_desc<T>(rows: &mut [T], metric: impl Fn(&T) -> f64) {
    rows.sort_by(|a, b| {
        metric(b)
            .partial_cmp(&metric(a))
            .unwrap_or(Ordering::Equal)
    });
}

/// Sector key for one record: the explicit sector when usable, otherwise the
/// 2-digit commodity-code prefix rule.
fn sector_key(record: &ReconciledRecord) -> String {
    if record.sector != UNCLASSIFIED {
        record.sector.clone()
    } else {
        builtin::sector_for_code(record.commodity_code)
            .unwrap_or(UNCLASSIFIED)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        period: i32,
        flow: Flow,
        partner: &str,
        commodity_code: i64,
        commodity: &str,
        value_scaled: f64,
    ) -> ReconciledRecord {
        ReconciledRecord {
            period,
            flow_code: flow.code().to_string(),
            flow,
            reporter_code: 246,
            partner_code: 0,
            partner_name: partner.to_string(),
            region: "Europe".to_string(),
            commodity_code,
            commodity_name: commodity.to_string(),
            sector: UNCLASSIFIED.to_string(),
            value: value_scaled * 1_000_000.0,
            value_scaled,
        }
    }

    #[test]
    fn test_yearly_trend_groups_and_sorts() {
        let dataset = Dataset::new(vec![
            record(2023, Flow::Import, "Germany", 1001, "Wheat", 2.0),
            record(2022, Flow::Export, "Germany", 1001, "Wheat", 1.0),
            record(2023, Flow::Export, "Sweden", 8471, "Computers", 4.0),
            record(2023, Flow::Export, "Germany", 1001, "Wheat", 6.0),
        ]);

        let trend = dataset.yearly_trend();
        assert_eq!(trend.len(), 3);
        assert_eq!(trend[0], YearlyTrendRow { year: 2022, flow: Flow::Export, total: 1.0 });
        assert_eq!(trend[1], YearlyTrendRow { year: 2023, flow: Flow::Export, total: 10.0 });
        assert_eq!(trend[2], YearlyTrendRow { year: 2023, flow: Flow::Import, total: 2.0 });
    }

    #[test]
    fn test_yearly_trend_sum_conservation() {
        let dataset = Dataset::new(vec![
            record(2020, Flow::Export, "A", 1, "c1", 1.5),
            record(2021, Flow::Export, "B", 2, "c2", 2.5),
            record(2021, Flow::Import, "B", 2, "c2", 9.0),
        ]);

        let export_sum: f64 = dataset
            .yearly_trend()
            .iter()
            .filter(|r| r.flow == Flow::Export)
            .map(|r| r.total)
            .sum();
        let expected: f64 = dataset
            .records()
            .iter()
            .filter(|r| r.flow == Flow::Export)
            .map(|r| r.value_scaled)
            .sum();
        assert_eq!(export_sum, expected);
    }

    #[test]
    fn test_top_commodities_filters_sorts_truncates() {
        let dataset = Dataset::new(vec![
            record(2023, Flow::Export, "A", 1, "low", 1.0),
            record(2023, Flow::Export, "A", 2, "high", 5.0),
            record(2023, Flow::Export, "A", 3, "mid", 3.0),
            record(2023, Flow::Import, "A", 4, "import-only", 99.0),
        ]);

        let top = dataset.top_commodities(Flow::Export, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].commodity_name, "high");
        assert_eq!(top[1].commodity_name, "mid");
    }

    #[test]
    fn test_top_commodities_tie_break_is_first_seen() {
        let dataset = Dataset::new(vec![
            record(2023, Flow::Export, "A", 7, "first", 2.0),
            record(2023, Flow::Export, "A", 8, "second", 2.0),
        ]);

        let top = dataset.top_commodities(Flow::Export, 5);
        assert_eq!(top[0].commodity_name, "first");
        assert_eq!(top[1].commodity_name, "second");
    }

    #[test]
    fn test_sector_structure_uses_prefix_rule_for_unclassified() {
        let dataset = Dataset::new(vec![
            // Unclassified sector: falls back to HS chapter 10 -> vegetable.
            record(2023, Flow::Export, "A", 1001, "Wheat", 4.0),
            record(2023, Flow::Export, "A", 8471, "Computers", 6.0),
        ]);

        let sectors = dataset.sector_structure(10);
        assert_eq!(sectors[0].sector, "Machinery & electrical equipment");
        assert_eq!(sectors[0].total, 6.0);
        assert_eq!(sectors[0].share, 60.0);
        assert_eq!(sectors[1].sector, "Vegetable products");
    }

    #[test]
    fn test_sector_structure_keeps_explicit_sector() {
        let mut rec = record(2023, Flow::Export, "A", 1001, "Wheat", 4.0);
        rec.sector = "Agriculture".to_string();
        let dataset = Dataset::new(vec![rec]);

        let sectors = dataset.sector_structure(10);
        assert_eq!(sectors[0].sector, "Agriculture");
    }

    #[test]
    fn test_top_partners_pivot() {
        // Sweden: export 300, import 100 over 2019-2023 -> total 400, balance 200.
        let dataset = Dataset::new(vec![
            record(2019, Flow::Export, "Sweden", 1, "c", 100.0),
            record(2021, Flow::Export, "Sweden", 1, "c", 200.0),
            record(2023, Flow::Import, "Sweden", 1, "c", 100.0),
            record(2023, Flow::Export, "Germany", 1, "c", 500.0),
            // Outside the range: ignored.
            record(2018, Flow::Export, "Sweden", 1, "c", 9999.0),
        ]);

        let partners = dataset.top_partners(2019, 2023, 5);
        assert_eq!(partners[0].partner_name, "Germany");
        assert_eq!(partners[0].import, 0.0);
        assert_eq!(partners[1].partner_name, "Sweden");
        assert_eq!(partners[1].total, 400.0);
        assert_eq!(partners[1].balance, 200.0);
    }

    #[test]
    fn test_partner_series_exact_match_no_truncation() {
        let dataset = Dataset::new(vec![
            record(2000, Flow::Export, "Russia", 1, "c", 1.0),
            record(2023, Flow::Import, "Russia", 1, "c", 2.0),
            record(2023, Flow::Import, "Belarus", 1, "c", 50.0),
        ]);

        let series = dataset.partner_series("Russia");
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].year, 2000);
        assert_eq!(series[1].year, 2023);

        assert!(dataset.partner_series("Atlantis").is_empty());
    }

    #[test]
    fn test_structural_change_zero_base_is_zero() {
        let dataset = Dataset::new(vec![
            record(2013, Flow::Export, "A", 1, "appeared", 0.0),
            record(2023, Flow::Export, "A", 1, "appeared", 1.0),
            record(2013, Flow::Export, "A", 2, "doubled", 2.0),
            record(2023, Flow::Export, "A", 2, "doubled", 4.0),
        ]);

        let changes = dataset.structural_change(2013, 2023, 10);
        // "doubled" leads with +100%; "appeared" is forced to 0, not inf.
        assert_eq!(changes[0].commodity_name, "doubled");
        assert_eq!(changes[0].change_pct, 100.0);
        assert_eq!(changes[1].commodity_name, "appeared");
        assert_eq!(changes[1].change_pct, 0.0);
        assert!(changes.iter().all(|c| c.change_pct.is_finite()));
    }

    #[test]
    fn test_structural_change_missing_year_counts_as_zero() {
        let dataset = Dataset::new(vec![
            record(2013, Flow::Export, "A", 3, "vanished", 5.0),
        ]);

        let changes = dataset.structural_change(2013, 2023, 10);
        assert_eq!(changes[0].compare_value, 0.0);
        assert_eq!(changes[0].change_pct, -100.0);
    }

    #[test]
    fn test_views_do_not_mutate_dataset() {
        let dataset = Dataset::new(vec![
            record(2023, Flow::Export, "A", 1001, "Wheat", 4.0),
            record(2022, Flow::Import, "B", 8471, "Computers", 2.0),
        ]);
        let before = dataset.records().to_vec();

        dataset.yearly_trend();
        dataset.top_commodities(Flow::Export, 3);
        dataset.sector_structure(3);
        dataset.top_partners(2000, 2030, 3);
        dataset.partner_series("A");
        dataset.structural_change(2022, 2023, 3);

        assert_eq!(dataset.records(), before.as_slice());
    }
}
