//! Reconciliation: join raw trade records against the reference resolver and
//! derive the canonical row-level dataset.
//!
//! ```text
//! ┌────────────┐    ┌─────────────┐    ┌───────────────────┐
//! │ TradeRecord│───▶│  Resolver   │───▶│ ReconciledRecord  │
//! │  (raw CSV) │    │ + fallback  │    │ (one per input)   │
//! └────────────┘    └─────────────┘    └───────────────────┘
//! ```
//!
//! Left-join semantics: a reference miss never drops a row — the fallback
//! policy synthesizes a placeholder and the miss is counted in the summary.
//! Only a malformed flow code rejects a record, and that rejection is counted
//! and sampled rather than becoming a third, unlabeled flow category.
//!
//! The stage is a pure transformation: output order follows input order, and
//! identical inputs produce identical output.

use serde::Serialize;

use crate::models::{Flow, ReconciledRecord, TradeRecord};
use crate::reference::{fallback, Resolver};

/// How many distinct rejected flow codes to keep as samples.
const REJECT_SAMPLE_LIMIT: usize = 5;

/// Data-quality counters for one reconciliation run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    /// Trade rows fed into reconciliation.
    pub input_rows: usize,
    /// Rows in the reconciled output.
    pub reconciled_rows: usize,
    /// Rows whose partner code missed every reference table.
    pub unresolved_partners: usize,
    /// Rows whose commodity code missed every reference table.
    pub unresolved_commodities: usize,
    /// Rows rejected for a malformed flow code.
    pub rejected_rows: usize,
    /// Distinct rejected flow codes, capped at a small sample.
    pub rejected_flow_samples: Vec<String>,
}

/// Output of [`reconcile`].
#[derive(Debug, Clone)]
pub struct ReconcileOutput {
    pub records: Vec<ReconciledRecord>,
    pub summary: ReconcileSummary,
}

/// Reconcile raw trade records against the resolver.
pub fn reconcile(trades: &[TradeRecord], resolver: &Resolver) -> ReconcileOutput {
    let mut records = Vec::with_capacity(trades.len());
    let mut summary = ReconcileSummary {
        input_rows: trades.len(),
        ..Default::default()
    };

    for trade in trades {
        let Some(flow) = Flow::from_code(&trade.flow_code) else {
            summary.rejected_rows += 1;
            let code = trade.flow_code.trim().to_string();
            if !summary.rejected_flow_samples.contains(&code)
                && summary.rejected_flow_samples.len() < REJECT_SAMPLE_LIMIT
            {
                summary.rejected_flow_samples.push(code);
            }
            continue;
        };

        let country = match resolver.resolve_partner(trade.partner_code) {
            Some(country) => country,
            None => {
                summary.unresolved_partners += 1;
                fallback::synthesize_country(trade.partner_code)
            }
        };

        let commodity = match resolver.resolve_commodity(trade.commodity_code) {
            Some(commodity) => commodity,
            None => {
                summary.unresolved_commodities += 1;
                fallback::synthesize_commodity(trade.commodity_code)
            }
        };

        records.push(ReconciledRecord {
            period: trade.period,
            flow_code: flow.code().to_string(),
            flow,
            reporter_code: trade.reporter_code,
            partner_code: trade.partner_code,
            partner_name: country.name,
            region: fallback::normalize_classification(&country.region),
            commodity_code: trade.commodity_code,
            commodity_name: commodity.name,
            sector: fallback::normalize_classification(&commodity.sector),
            value: trade.value,
            value_scaled: trade.value / 1_000_000.0,
        });
    }

    summary.reconciled_rows = records.len();

    ReconcileOutput { records, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommodityRef, CountryRef, UNCLASSIFIED};
    use crate::reference::AliasTable;

    fn trade(period: i32, flow: &str, partner: i64, commodity: i64, value: f64) -> TradeRecord {
        TradeRecord {
            period,
            flow_code: flow.into(),
            reporter_code: 246,
            partner_code: partner,
            commodity_code: commodity,
            value,
        }
    }

    fn resolver() -> Resolver {
        let countries = vec![CountryRef::new(276, "Germany", "Europe")];
        let commodities = vec![CommodityRef::new(1001, "Machinery", "Manufacturing")];
        Resolver::new(&countries, &commodities, AliasTable::default())
    }

    #[test]
    fn test_fully_resolved_record() {
        let trades = vec![trade(2023, "X", 276, 1001, 5_000_000.0)];
        let output = reconcile(&trades, &resolver());

        assert_eq!(output.records.len(), 1);
        let record = &output.records[0];
        assert_eq!(record.partner_name, "Germany");
        assert_eq!(record.region, "Europe");
        assert_eq!(record.commodity_name, "Machinery");
        assert_eq!(record.sector, "Manufacturing");
        assert_eq!(record.value_scaled, 5.0);
        assert_eq!(record.flow, Flow::Export);
        assert_eq!(record.flow_code, "X");
        assert_eq!(output.summary.unresolved_partners, 0);
    }

    #[test]
    fn test_reference_miss_keeps_row() {
        let trades = vec![trade(2023, "M", 999_999, 777_777, 100.0)];
        let output = reconcile(&trades, &resolver());

        // Left-join completeness: the row survives with placeholders.
        assert_eq!(output.records.len(), 1);
        let record = &output.records[0];
        assert!(record.partner_name.contains("999999"));
        assert_eq!(record.region, UNCLASSIFIED);
        assert!(record.commodity_name.contains("777777"));
        assert_eq!(record.sector, UNCLASSIFIED);
        assert_eq!(output.summary.unresolved_partners, 1);
        assert_eq!(output.summary.unresolved_commodities, 1);
    }

    #[test]
    fn test_malformed_flow_code_rejected() {
        let trades = vec![
            trade(2023, "X", 276, 1001, 100.0),
            trade(2023, "Z", 276, 1001, 200.0),
            trade(2023, "Z", 276, 1001, 300.0),
        ];
        let output = reconcile(&trades, &resolver());

        assert_eq!(output.records.len(), 1);
        assert_eq!(output.summary.rejected_rows, 2);
        assert_eq!(output.summary.rejected_flow_samples, vec!["Z".to_string()]);
    }

    #[test]
    fn test_left_join_completeness() {
        let trades: Vec<TradeRecord> = (0..50)
            .map(|i| trade(2000 + (i % 10), "X", 1000 + i as i64, 2000 + i as i64, i as f64))
            .collect();
        let output = reconcile(&trades, &resolver());
        assert_eq!(output.records.len(), trades.len());
        assert_eq!(output.summary.reconciled_rows, output.summary.input_rows);
    }

    #[test]
    fn test_idempotence_and_order() {
        let trades = vec![
            trade(2023, "X", 276, 1001, 3.0),
            trade(2021, "M", 999, 1001, 1.0),
            trade(2022, "X", 276, 888, 2.0),
        ];
        let resolver = resolver();
        let first = reconcile(&trades, &resolver);
        let second = reconcile(&trades, &resolver);

        assert_eq!(first.records, second.records);
        // Order follows input order, not a resort.
        assert_eq!(first.records[0].period, 2023);
        assert_eq!(first.records[1].period, 2021);
        assert_eq!(first.records[2].period, 2022);
    }

    #[test]
    fn test_zero_and_negative_values_pass_through() {
        let trades = vec![
            trade(2023, "X", 276, 1001, 0.0),
            trade(2023, "M", 276, 1001, -500_000.0),
        ];
        let output = reconcile(&trades, &resolver());
        assert_eq!(output.records[0].value_scaled, 0.0);
        assert_eq!(output.records[1].value_scaled, -0.5);
    }

    #[test]
    fn test_sentinel_region_normalized_on_resolved_path() {
        let countries = vec![CountryRef::new(901, "Free Zone", "n/a")];
        let resolver = Resolver::new(&countries, &[], AliasTable::empty());
        let trades = vec![trade(2023, "X", 901, 1001, 1.0)];
        let output = reconcile(&trades, &resolver);

        assert_eq!(output.records[0].partner_name, "Free Zone");
        assert_eq!(output.records[0].region, UNCLASSIFIED);
    }
}
