//! Core domain types for the API catalog documents.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Suffix shared by every per-team API document.
pub const TEAM_API_FILE_SUFFIX: &str = "-mule-apis.json";

// ---------------------------------------------------------------------------
// RepoRef
// ---------------------------------------------------------------------------

/// Identifies the backing repository as `(owner, repo)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// A team record. Bare-string entries in the valid-values document are
/// normalized into this shape with empty owner metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Unique, case-sensitive team name.
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub owner_email: String,
    #[serde(default)]
    pub cmdb_assignment_group: String,
    #[serde(default)]
    pub business_groups: BTreeSet<String>,
}

impl Team {
    /// A team known only by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: String::new(),
            owner_email: String::new(),
            cmdb_assignment_group: String::new(),
            business_groups: BTreeSet::new(),
        }
    }
}

/// A `validTeamNames` entry as it appears on the wire: either a bare name or
/// a full team object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TeamEntry {
    Name(String),
    Record(Team),
}

impl TeamEntry {
    /// The team name regardless of entry shape.
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Record(team) => &team.name,
        }
    }
}

impl From<TeamEntry> for Team {
    fn from(entry: TeamEntry) -> Self {
        match entry {
            TeamEntry::Name(name) => Team::named(name),
            TeamEntry::Record(team) => team,
        }
    }
}

// ---------------------------------------------------------------------------
// ValidValues
// ---------------------------------------------------------------------------

/// The shared valid-values document enumerating teams, CMDB assignment
/// groups, and business groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidValues {
    #[serde(default)]
    pub valid_team_names: Vec<TeamEntry>,
    #[serde(default, alias = "validCmdbTeamNames")]
    pub valid_cmdb_assignment_groups: Vec<String>,
    #[serde(default)]
    pub valid_business_groups: Vec<String>,
}

impl ValidValues {
    /// Team names in document order.
    pub fn team_names(&self) -> Vec<String> {
        self.valid_team_names
            .iter()
            .map(|entry| entry.name().to_string())
            .collect()
    }
}

/// Which plain-string list of the valid-values document an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueList {
    CmdbAssignmentGroups,
    BusinessGroups,
}

impl ValueList {
    /// Wire key of the list inside the valid-values document.
    pub fn document_key(self) -> &'static str {
        match self {
            Self::CmdbAssignmentGroups => "validCmdbAssignmentGroups",
            Self::BusinessGroups => "validBusinessGroups",
        }
    }
}

impl std::fmt::Display for ValueList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CmdbAssignmentGroups => write!(f, "CMDB assignment groups"),
            Self::BusinessGroups => write!(f, "business groups"),
        }
    }
}

// ---------------------------------------------------------------------------
// ApiRecord
// ---------------------------------------------------------------------------

/// One API entry in a team's API document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiRecord {
    pub api_name: String,
    /// Catalog-wide unique identifier, `[A-Za-z0-9_-]+`.
    pub asset_id: String,
    pub api_owner: String,
    pub api_owner_email: String,
    /// Owning team; must reference a valid team.
    pub team_name: String,
    /// Whether the API carries a custom MUnit coverage requirement.
    pub munit_exempt: bool,
    /// Required coverage percentage when `munit_exempt` is set.
    pub custom_coverage: Option<i64>,
    pub business_groups: BTreeSet<String>,
    pub last_updated: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// TeamApiDocument
// ---------------------------------------------------------------------------

/// Per-team API list document (`<team>-mule-apis.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamApiDocument {
    pub team_name: String,
    #[serde(default)]
    pub apis: Vec<ApiRecord>,
}

impl TeamApiDocument {
    /// An empty document for a team with no APIs yet.
    pub fn empty(team_name: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
            apis: Vec::new(),
        }
    }

    /// File name this document is stored under.
    pub fn file_name(&self) -> String {
        team_api_filename(&self.team_name)
    }
}

/// Derive the per-team document file name: lowercase, each whitespace run
/// collapsed to a single hyphen, suffixed with `-mule-apis.json`.
pub fn team_api_filename(team_name: &str) -> String {
    let mut stem = String::with_capacity(team_name.len());
    let mut in_space = false;
    for c in team_name.chars() {
        if c.is_whitespace() {
            if !in_space {
                stem.push('-');
                in_space = true;
            }
        } else {
            stem.extend(c.to_lowercase());
            in_space = false;
        }
    }
    format!("{stem}{TEAM_API_FILE_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_collapses_whitespace() {
        assert_eq!(team_api_filename("Platform"), "platform-mule-apis.json");
        assert_eq!(
            team_api_filename("Data   Integration\tTeam"),
            "data-integration-team-mule-apis.json"
        );
    }

    #[test]
    fn team_entries_normalize() {
        let json = r#"{
            "validTeamNames": [
                "Platform",
                { "name": "Data", "owner": "Ada", "ownerEmail": "ada@example.com" }
            ],
            "validCmdbTeamNames": ["DATA_OPS"],
            "validBusinessGroups": ["Finance"]
        }"#;
        let parsed: ValidValues = serde_json::from_str(json).expect("deserialize");
        assert_eq!(parsed.team_names(), vec!["Platform", "Data"]);
        assert_eq!(parsed.valid_cmdb_assignment_groups, vec!["DATA_OPS"]);

        let teams: Vec<Team> = parsed.valid_team_names.into_iter().map(Team::from).collect();
        assert_eq!(teams[0], Team::named("Platform"));
        assert_eq!(teams[1].owner, "Ada");
        assert!(teams[1].cmdb_assignment_group.is_empty());
    }

    #[test]
    fn api_record_tolerates_missing_fields() {
        let json = r#"{
            "apiName": "Orders",
            "assetId": "orders-api",
            "teamName": "Data",
            "customCoverage": null,
            "businessGroups": ["Finance", "Retail"],
            "lastUpdated": "2024-03-01T12:00:00Z"
        }"#;
        let api: ApiRecord = serde_json::from_str(json).expect("deserialize");
        assert_eq!(api.asset_id, "orders-api");
        assert!(!api.munit_exempt);
        assert_eq!(api.custom_coverage, None);
        assert!(api.api_owner.is_empty());
        assert_eq!(api.business_groups.len(), 2);
    }

    #[test]
    fn api_record_serializes_camel_case() {
        let api = ApiRecord {
            asset_id: "abc-123".into(),
            munit_exempt: true,
            custom_coverage: Some(60),
            ..ApiRecord::default()
        };
        let json = serde_json::to_string(&api).expect("serialize");
        assert!(json.contains("\"assetId\":\"abc-123\""));
        assert!(json.contains("\"munitExempt\":true"));
        assert!(json.contains("\"customCoverage\":60"));
    }

    #[test]
    fn valid_values_fixture_validates() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/valid-platform-values.json")
            .expect("read fixture");
        let parsed: ValidValues = serde_json::from_str(&fixture).expect("deserialize fixture");
        assert_eq!(parsed.team_names(), vec!["Platform", "Data", "Integration Services"]);
        assert!(parsed.valid_business_groups.contains(&"Finance".to_string()));
    }

    #[test]
    fn team_document_fixture_validates() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/data-mule-apis.json")
            .expect("read fixture");
        let parsed: TeamApiDocument = serde_json::from_str(&fixture).expect("deserialize fixture");
        assert_eq!(parsed.team_name, "Data");
        assert_eq!(parsed.apis.len(), 2);
        assert_eq!(parsed.file_name(), "data-mule-apis.json");
    }

    #[test]
    fn repo_ref_display() {
        assert_eq!(RepoRef::new("octo", "catalog").to_string(), "octo/catalog");
    }
}
