//! CSV and JSON exports of the catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use apidash_shared::{ApiRecord, ApidashError, Result, TeamApiDocument, ValidValues};

use crate::catalog::Catalog;

/// Column headers of the CSV export.
pub const CSV_HEADERS: [&str; 9] = [
    "API Name",
    "Asset ID",
    "Team",
    "Owner",
    "Owner Email",
    "MUnit Exempt",
    "Custom Coverage",
    "Business Groups",
    "Last Updated",
];

/// Shape of the JSON export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogExport {
    pub teams: ValidValues,
    /// Per-team documents keyed by file name.
    pub apis: BTreeMap<String, TeamApiDocument>,
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

fn csv_row(api: &ApiRecord) -> String {
    let groups: Vec<&str> = api.business_groups.iter().map(String::as_str).collect();
    let cells = [
        api.api_name.clone(),
        api.asset_id.clone(),
        api.team_name.clone(),
        api.api_owner.clone(),
        api.api_owner_email.clone(),
        if api.munit_exempt { "Yes" } else { "No" }.to_string(),
        api.custom_coverage
            .map(|c| c.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        groups.join("; "),
        api.last_updated.format("%Y-%m-%d").to_string(),
    ];
    cells.iter().map(|c| quote(c)).collect::<Vec<_>>().join(",")
}

/// Render `apis` as CSV, header first, rows joined by `\n`.
pub fn apis_to_csv<'a>(apis: impl IntoIterator<Item = &'a ApiRecord>) -> String {
    let header = CSV_HEADERS.map(quote).join(",");
    std::iter::once(header)
        .chain(apis.into_iter().map(csv_row))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every API in the catalog as CSV.
pub fn to_csv(catalog: &Catalog) -> String {
    apis_to_csv(catalog.apis())
}

/// The whole catalog as pretty-printed JSON.
pub fn to_json(catalog: &Catalog) -> Result<String> {
    let (teams, documents) = catalog.to_documents();
    let export = CatalogExport {
        teams,
        apis: documents
            .into_iter()
            .map(|document| (document.file_name(), document))
            .collect(),
    };
    serde_json::to_string_pretty(&export)
        .map_err(|e| ApidashError::decode(format!("failed to serialize export: {e}")))
}

/// Rebuild a catalog from a JSON export.
pub fn catalog_from_json(json: &str) -> Result<Catalog> {
    let export: CatalogExport = serde_json::from_str(json)
        .map_err(|e| ApidashError::decode(format!("invalid catalog export: {e}")))?;
    Ok(Catalog::new(export.teams, export.apis.into_values().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{api, sample};

    #[test]
    fn csv_quotes_every_cell() {
        let mut record = api("q-1", "Data", &["Finance", "Retail"]);
        record.api_name = "Say \"hi\"".into();
        record.munit_exempt = true;
        record.custom_coverage = Some(75);

        let csv = apis_to_csv([&record]);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("\"API Name\",\"Asset ID\",\"Team\""));
        assert_eq!(
            lines[1],
            "\"Say \"\"hi\"\"\",\"q-1\",\"Data\",\"Ada Byron\",\"ada@example.com\",\
             \"Yes\",\"75\",\"Finance; Retail\",\"2024-03-01\""
        );
    }

    #[test]
    fn csv_marks_missing_coverage() {
        let csv = to_csv(&sample());
        assert!(csv.lines().nth(1).unwrap().contains("\"No\",\"N/A\""));
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn json_round_trip_keeps_teams_and_apis() {
        let catalog = sample();
        let json = to_json(&catalog).unwrap();
        assert!(json.contains("\"data-mule-apis.json\""));
        assert!(json.contains("\"platform-mule-apis.json\""));

        let restored = catalog_from_json(&json).unwrap();
        assert_eq!(restored, catalog);
    }

    #[test]
    fn bad_json_is_decode_error() {
        assert!(matches!(
            catalog_from_json("{\"teams\": 3}"),
            Err(ApidashError::Decode { .. })
        ));
    }
}
