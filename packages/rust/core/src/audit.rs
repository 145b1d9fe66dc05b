//! Invariant report over loaded source data.
//!
//! Loaded documents are never rejected; this pass lists everything in them
//! that a fresh `upsert_api` would have refused.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::Catalog;

/// One invariant violation found in the loaded documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Team whose document holds the record.
    pub team: String,
    pub asset_id: String,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let asset = if self.asset_id.is_empty() {
            "<no asset id>"
        } else {
            &self.asset_id
        };
        write!(f, "[{}] {asset}: {} {}", self.team, self.field, self.message)
    }
}

impl Catalog {
    /// Every invariant violation present in the catalog, in document order.
    pub fn audit(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut seen: HashMap<&str, &str> = HashMap::new();

        for document in self.documents() {
            for api in &document.apis {
                let mut report = |field: &str, message: String| {
                    violations.push(Violation {
                        team: document.team_name.clone(),
                        asset_id: api.asset_id.clone(),
                        field: field.to_string(),
                        message,
                    });
                };

                for problem in self.check_record(api) {
                    report(problem.field, problem.message);
                }

                if api.team_name != document.team_name {
                    report(
                        "teamName",
                        format!(
                            "names '{}' but is filed under '{}'",
                            api.team_name, document.team_name
                        ),
                    );
                }

                if !api.munit_exempt && api.custom_coverage.is_some() {
                    report(
                        "customCoverage",
                        "is set although MUnit testing is not exempt".to_string(),
                    );
                }

                if api.asset_id.is_empty() {
                    continue;
                }
                if let Some(first) = seen.get(api.asset_id.as_str()) {
                    report(
                        "assetId",
                        format!("duplicates an API already listed under '{first}'"),
                    );
                } else {
                    seen.insert(&api.asset_id, &document.team_name);
                }
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{api, sample};
    use apidash_shared::{TeamApiDocument, TeamEntry, ValidValues};

    #[test]
    fn clean_catalog_has_no_violations() {
        assert!(sample().audit().is_empty());
    }

    #[test]
    fn reports_each_broken_invariant() {
        let valid = ValidValues {
            valid_team_names: vec![TeamEntry::Name("Data".into()), TeamEntry::Name("Ops".into())],
            valid_cmdb_assignment_groups: vec![],
            valid_business_groups: vec!["Finance".into()],
        };

        let mut over = api("over", "Data", &["Finance"]);
        over.munit_exempt = true;
        over.custom_coverage = Some(140);

        let data = TeamApiDocument {
            team_name: "Data".into(),
            apis: vec![
                api("dup", "Data", &["Finance"]),
                api("bad id", "Data", &["Finance"]),
                api("misfiled", "Ops", &["Finance"]),
                api("unknown-group", "Data", &["Marketing"]),
                over,
            ],
        };
        let ops = TeamApiDocument {
            team_name: "Ops".into(),
            apis: vec![api("dup", "Ops", &["Finance"])],
        };

        let violations = Catalog::new(valid, vec![data, ops]).audit();
        let summary: Vec<(&str, &str)> = violations
            .iter()
            .map(|v| (v.asset_id.as_str(), v.field.as_str()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("bad id", "assetId"),
                ("misfiled", "teamName"),
                ("unknown-group", "businessGroups"),
                ("over", "customCoverage"),
                ("dup", "assetId"),
            ]
        );
        assert!(violations[4].message.contains("'Data'"));
        assert_eq!(violations[4].team, "Ops");
        assert!(violations[0].to_string().starts_with("[Data] bad id: assetId"));
    }
}
