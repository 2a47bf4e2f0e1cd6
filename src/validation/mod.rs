//! JSON Schema validation for reconciled output records.
//!
//! The reconciled dataset is the sole data source of the presentation layer,
//! so its shape is pinned by a JSON Schema (Draft 7) embedded at compile time
//! from `schemas/reconciled-record.json`. Validation is a belt check on the
//! pipeline's own invariants (names never empty, flow labels from the
//! two-value enumeration) and can be skipped via pipeline options.

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};

static RECONCILED_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/reconciled-record.json"))
        .expect("Invalid embedded schema")
});

/// Validate a JSON object against a schema.
///
/// Returns `Ok(())` when valid, or the list of violation messages.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {e}")])?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick boolean check against a schema.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate one reconciled record against the embedded schema.
pub fn validate_reconciled_record(data: &Value) -> Result<(), Vec<String>> {
    validate(&RECONCILED_SCHEMA, data)
}

/// Quick check of one reconciled record.
pub fn is_valid_reconciled_record(data: &Value) -> bool {
    is_valid(&RECONCILED_SCHEMA, data)
}

/// Validate a whole reconciled batch; collects failure samples (capped) into
/// a single [`ValidationError::SchemaError`].
pub fn validate_reconciled_batch(records: &[Value]) -> ValidationResult<()> {
    let mut count = 0;
    let mut samples = Vec::new();

    for (i, record) in records.iter().enumerate() {
        if let Err(errors) = validate_reconciled_record(record) {
            count += 1;
            if samples.len() < 5 {
                samples.push(format!("record {}: {}", i, errors.join("; ")));
            }
        }
    }

    if count == 0 {
        Ok(())
    } else {
        Err(ValidationError::SchemaError { count, samples })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_record() -> Value {
        json!({
            "period": 2023,
            "flowCode": "X",
            "flowLabel": "export",
            "reporterCode": 246,
            "partnerCode": 276,
            "partnerName": "Germany",
            "region": "Europe",
            "commodityCode": 1001,
            "commodityName": "Machinery",
            "sector": "Manufacturing",
            "value": 5000000.0,
            "valueScaled": 5.0
        })
    }

    #[test]
    fn test_valid_record() {
        assert!(is_valid_reconciled_record(&valid_record()));
    }

    #[test]
    fn test_empty_partner_name_rejected() {
        let mut record = valid_record();
        record["partnerName"] = json!("");
        assert!(!is_valid_reconciled_record(&record));
    }

    #[test]
    fn test_unknown_flow_label_rejected() {
        let mut record = valid_record();
        record["flowLabel"] = json!("transit");
        let result = validate_reconciled_record(&record);
        assert!(result.is_err());
        assert!(!result.unwrap_err().is_empty());
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut record = valid_record();
        record.as_object_mut().unwrap().remove("region");
        assert!(!is_valid_reconciled_record(&record));
    }

    #[test]
    fn test_batch_collects_samples() {
        let mut bad = valid_record();
        bad["flowCode"] = json!("Z");
        let records = vec![valid_record(), bad.clone(), bad];

        let err = validate_reconciled_batch(&records).unwrap_err();
        match err {
            ValidationError::SchemaError { count, samples } => {
                assert_eq!(count, 2);
                assert_eq!(samples.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reconciled_record_struct_matches_schema() {
        use crate::models::{Flow, ReconciledRecord};

        let record = ReconciledRecord {
            period: 2023,
            flow_code: "M".into(),
            flow: Flow::Import,
            reporter_code: 246,
            partner_code: 999_999,
            partner_name: "Country 999999".into(),
            region: "Unclassified".into(),
            commodity_code: 42,
            commodity_name: "Commodity 42".into(),
            sector: "Unclassified".into(),
            value: 0.0,
            value_scaled: 0.0,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(is_valid_reconciled_record(&json));
    }
}
