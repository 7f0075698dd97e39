use crate::models::{LineItem, MatchResult, MatchStatus, ReconcileReport};

/// 照合結果を CSV に書き出す (チェックリスト用)
pub fn render_csv(report: &ReconcileReport) -> Result<String, Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "status",
        "tender_key",
        "proposal_key",
        "tender_quantity",
        "proposal_quantity",
        "tender_unit",
        "proposal_unit",
        "quantity_difference",
        "unit_mismatch",
        "confidence",
        "page",
        "sheet",
        "reference_number",
    ])?;

    for result in &report.results {
        writer.write_record(csv_record(result))?;
    }

    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

fn csv_record(result: &MatchResult) -> Vec<String> {
    let status = match result.status {
        MatchStatus::Matched => "MATCHED",
        MatchStatus::QuantityMismatch => "QUANTITY_MISMATCH",
        MatchStatus::Missing => "MISSING",
        MatchStatus::Extra => "EXTRA",
    };
    let key = |item: &Option<LineItem>| {
        item.as_ref().map(|i| i.item_key.clone()).unwrap_or_default()
    };
    let quantity = |item: &Option<LineItem>| {
        item.as_ref()
            .and_then(|i| i.quantity.as_ref())
            .map(|q| q.to_string())
            .unwrap_or_default()
    };
    let unit = |item: &Option<LineItem>| {
        item.as_ref()
            .and_then(|i| i.unit.clone())
            .unwrap_or_default()
    };
    // 出所はどちらか存在する側から引く (EXTRA は提案側のみ)
    let provenance = result
        .tender_item
        .as_ref()
        .or(result.proposal_item.as_ref())
        .map(|i| i.provenance.clone())
        .unwrap_or_default();

    vec![
        status.to_string(),
        key(&result.tender_item),
        key(&result.proposal_item),
        quantity(&result.tender_item),
        quantity(&result.proposal_item),
        unit(&result.tender_item),
        unit(&result.proposal_item),
        result
            .quantity_difference
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default(),
        result.unit_mismatch.to_string(),
        format!("{:.3}", result.confidence),
        provenance
            .page_number
            .map(|p| p.to_string())
            .unwrap_or_default(),
        provenance.sheet_name.unwrap_or_default(),
        provenance.reference_number.unwrap_or_default(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldSet, Provenance, ReconcileSummary, Source};
    use chrono::Utc;

    #[test]
    fn csv_has_header_and_one_line_per_result() {
        let tender = LineItem {
            item_key: "土工|掘削|土砂掘削".to_string(),
            quantity: Some("10.0".parse().unwrap()),
            unit: Some("m3".to_string()),
            raw_fields: FieldSet::default(),
            source: Source::Pdf,
            provenance: Provenance {
                page_number: Some(3),
                sheet_name: None,
                reference_number: Some("内1号".to_string()),
            },
        };
        let results = vec![MatchResult {
            status: MatchStatus::Missing,
            confidence: 0.0,
            tender_item: Some(tender),
            proposal_item: None,
            quantity_difference: None,
            unit_mismatch: false,
        }];
        let report = ReconcileReport {
            summary: ReconcileSummary::tally(&results),
            results,
            tender_diagnostics: vec![],
            proposal_diagnostics: vec![],
            generated_at: Utc::now(),
        };

        let csv = render_csv(&report).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("status,tender_key"));
        assert!(lines[1].contains("MISSING"));
        assert!(lines[1].contains("内1号"));
        assert!(lines[1].contains("土工|掘削|土砂掘削"));
    }
}
