//! In-memory catalog of teams and their APIs.
//!
//! The catalog merges the valid-values document with every per-team API
//! document. Every mutation validates first and commits only when all checks
//! pass, so a rejected call leaves the catalog untouched.
//!
//! Internally `documents[i]` always belongs to `teams[i]`.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::SecondsFormat;
use regex::Regex;
use tracing::{debug, warn};

use apidash_shared::{
    ApiRecord, ApidashError, Result, Team, TeamApiDocument, TeamEntry, ValidValues, ValueList,
    team_api_filename,
};

/// Allowed asset id characters.
static ASSET_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("asset id regex"));

/// Inclusive bounds for a custom MUnit coverage requirement.
pub const COVERAGE_RANGE: std::ops::RangeInclusive<i64> = 0..=100;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// What [`Catalog::upsert_api`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// One row of the per-team summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSummary {
    pub name: String,
    pub owner: String,
    pub api_count: usize,
}

/// MUnit coverage counts across the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub total: usize,
    pub munit_required: usize,
    pub munit_exempt: usize,
}

/// A single invariant failure on one field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldProblem {
    pub field: &'static str,
    pub message: String,
}

impl FieldProblem {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl From<FieldProblem> for ApidashError {
    fn from(problem: FieldProblem) -> Self {
        ApidashError::validation(problem.field, problem.message)
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Validated, addressable view over all teams and APIs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    teams: Vec<Team>,
    cmdb_groups: Vec<String>,
    business_groups: Vec<String>,
    documents: Vec<TeamApiDocument>,
}

impl Catalog {
    /// Merge the valid-values document with the per-team API documents.
    ///
    /// Team entries are normalized into [`Team`] records. Each team gets the
    /// document whose `teamName` matches, or an empty one. Documents for
    /// unknown teams and repeated team names are dropped with a warning.
    pub fn new(valid: ValidValues, documents: Vec<TeamApiDocument>) -> Self {
        let mut teams: Vec<Team> = Vec::with_capacity(valid.valid_team_names.len());
        for entry in valid.valid_team_names {
            let team = Team::from(entry);
            if teams.iter().any(|t| t.name == team.name) {
                warn!(team = %team.name, "duplicate team entry ignored");
                continue;
            }
            teams.push(team);
        }

        let mut pool = documents;
        let documents = teams
            .iter()
            .map(|team| match pool.iter().position(|d| d.team_name == team.name) {
                Some(idx) => pool.swap_remove(idx),
                None => TeamApiDocument::empty(&team.name),
            })
            .collect();

        for orphan in &pool {
            warn!(
                team = %orphan.team_name,
                apis = orphan.apis.len(),
                "document for unknown team dropped"
            );
        }

        Self {
            teams,
            cmdb_groups: valid.valid_cmdb_assignment_groups,
            business_groups: valid.valid_business_groups,
            documents,
        }
    }

    // -- read access --------------------------------------------------------

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.team_index(name).map(|idx| &self.teams[idx])
    }

    pub fn cmdb_groups(&self) -> &[String] {
        &self.cmdb_groups
    }

    pub fn business_groups(&self) -> &[String] {
        &self.business_groups
    }

    /// Per-team API documents, in team order.
    pub fn documents(&self) -> &[TeamApiDocument] {
        &self.documents
    }

    pub fn document(&self, team_name: &str) -> Option<&TeamApiDocument> {
        self.team_index(team_name).map(|idx| &self.documents[idx])
    }

    /// Every API, in team order then document order.
    pub fn apis(&self) -> impl Iterator<Item = &ApiRecord> {
        self.documents.iter().flat_map(|d| d.apis.iter())
    }

    pub fn api_count(&self) -> usize {
        self.documents.iter().map(|d| d.apis.len()).sum()
    }

    /// First API with this asset id, scanning teams in order.
    pub fn find_api(&self, asset_id: &str) -> Option<&ApiRecord> {
        self.locate(asset_id)
            .map(|(doc, api)| &self.documents[doc].apis[api])
    }

    /// Name of the team whose document holds `asset_id`.
    pub fn owner_of(&self, asset_id: &str) -> Option<&str> {
        self.locate(asset_id)
            .map(|(doc, _)| self.documents[doc].team_name.as_str())
    }

    fn team_index(&self, name: &str) -> Option<usize> {
        self.teams.iter().position(|t| t.name == name)
    }

    fn locate(&self, asset_id: &str) -> Option<(usize, usize)> {
        self.documents.iter().enumerate().find_map(|(doc_idx, doc)| {
            doc.apis
                .iter()
                .position(|api| api.asset_id == asset_id)
                .map(|api_idx| (doc_idx, api_idx))
        })
    }

    // -- validation ---------------------------------------------------------

    /// Every field-level invariant `record` breaks, in check order.
    ///
    /// Only record-local checks and references into the valid-values lists;
    /// asset id uniqueness depends on the caller's intent and is checked
    /// separately.
    pub(crate) fn check_record(&self, record: &ApiRecord) -> Vec<FieldProblem> {
        let mut problems = Vec::new();

        let required = [
            ("apiName", &record.api_name),
            ("assetId", &record.asset_id),
            ("apiOwner", &record.api_owner),
            ("apiOwnerEmail", &record.api_owner_email),
            ("teamName", &record.team_name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                problems.push(FieldProblem::new(field, "is required"));
            }
        }

        if !record.asset_id.trim().is_empty() && !ASSET_ID_RE.is_match(&record.asset_id) {
            problems.push(FieldProblem::new(
                "assetId",
                format!(
                    "'{}' may only contain letters, digits, hyphens and underscores",
                    record.asset_id
                ),
            ));
        }

        if record.munit_exempt {
            match record.custom_coverage {
                None => problems.push(FieldProblem::new(
                    "customCoverage",
                    "is required when MUnit testing is exempt",
                )),
                Some(coverage) if !COVERAGE_RANGE.contains(&coverage) => {
                    problems.push(FieldProblem::new(
                        "customCoverage",
                        format!("{coverage} is outside 0..=100"),
                    ))
                }
                Some(_) => {}
            }
        }

        if !record.team_name.trim().is_empty() && self.team_index(&record.team_name).is_none() {
            problems.push(FieldProblem::new(
                "teamName",
                format!("'{}' is not a valid team", record.team_name),
            ));
        }

        if record.business_groups.is_empty() {
            problems.push(FieldProblem::new(
                "businessGroups",
                "at least one business group is required",
            ));
        }
        for group in &record.business_groups {
            if !self.business_groups.contains(group) {
                problems.push(FieldProblem::new(
                    "businessGroups",
                    format!("'{group}' is not a valid business group"),
                ));
            }
        }

        problems
    }

    // -- API mutations ------------------------------------------------------

    /// Insert a new API or overwrite the existing record with the same asset
    /// id in place.
    ///
    /// The asset id may already exist only under the same team; moving an
    /// API between teams goes through [`Catalog::reassign_api`].
    pub fn upsert_api(&mut self, mut record: ApiRecord) -> Result<UpsertOutcome> {
        if let Some(problem) = self.check_record(&record).into_iter().next() {
            return Err(problem.into());
        }

        // check_record guarantees the team exists.
        let team_idx = self
            .team_index(&record.team_name)
            .ok_or_else(|| ApidashError::validation("teamName", "unknown team"))?;

        let existing = self.locate(&record.asset_id);
        if let Some((doc_idx, _)) = existing {
            if doc_idx != team_idx {
                return Err(ApidashError::validation(
                    "assetId",
                    format!(
                        "'{}' already belongs to team '{}'",
                        record.asset_id, self.documents[doc_idx].team_name
                    ),
                ));
            }
        }

        if !record.munit_exempt {
            record.custom_coverage = None;
        }

        debug!(asset_id = %record.asset_id, team = %record.team_name, "upserting API");
        match existing {
            Some((doc_idx, api_idx)) => {
                self.documents[doc_idx].apis[api_idx] = record;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                self.documents[team_idx].apis.push(record);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    /// Move an API to another team. Returns the record as it now stands.
    pub fn reassign_api(&mut self, asset_id: &str, new_team: &str) -> Result<ApiRecord> {
        let (doc_idx, api_idx) = self
            .locate(asset_id)
            .ok_or_else(|| ApidashError::NotFound(format!("API '{asset_id}'")))?;

        if self.documents[doc_idx].team_name == new_team {
            return Err(ApidashError::NoOp(format!(
                "API '{asset_id}' is already assigned to team '{new_team}'"
            )));
        }

        let target = self.team_index(new_team).ok_or_else(|| {
            ApidashError::validation("teamName", format!("'{new_team}' is not a valid team"))
        })?;

        let mut record = self.documents[doc_idx].apis.remove(api_idx);
        record.team_name = new_team.to_string();
        self.documents[target].apis.push(record.clone());
        Ok(record)
    }

    /// Remove the first API with this asset id. Absent ids are a silent no-op.
    pub fn delete_api(&mut self, asset_id: &str) -> Option<ApiRecord> {
        let (doc_idx, api_idx) = self.locate(asset_id)?;
        Some(self.documents[doc_idx].apis.remove(api_idx))
    }

    // -- team mutations -----------------------------------------------------

    /// Add a team with an empty API document. Unknown CMDB and business
    /// groups it names are added to the valid lists.
    pub fn add_team(&mut self, team: Team) -> Result<()> {
        if team.name.trim().is_empty() {
            return Err(ApidashError::validation("name", "is required"));
        }
        if self.team_index(&team.name).is_some() {
            return Err(ApidashError::validation(
                "name",
                format!("team '{}' already exists", team.name),
            ));
        }
        let file_name = team_api_filename(&team.name);
        if let Some(existing) = self.teams.iter().find(|t| team_api_filename(&t.name) == file_name) {
            return Err(ApidashError::validation(
                "name",
                format!("team '{}' would share {file_name} with '{}'", team.name, existing.name),
            ));
        }
        if team.cmdb_assignment_group.trim().is_empty() {
            return Err(ApidashError::validation("cmdbAssignmentGroup", "is required"));
        }
        if team.business_groups.is_empty() {
            return Err(ApidashError::validation(
                "businessGroups",
                "at least one business group is required",
            ));
        }

        if !self.cmdb_groups.contains(&team.cmdb_assignment_group) {
            self.cmdb_groups.push(team.cmdb_assignment_group.clone());
        }
        for group in &team.business_groups {
            if !self.business_groups.contains(group) {
                self.business_groups.push(group.clone());
            }
        }

        self.documents.push(TeamApiDocument::empty(&team.name));
        self.teams.push(team);
        Ok(())
    }

    /// Remove a team that owns no APIs.
    pub fn delete_team(&mut self, name: &str) -> Result<Team> {
        let idx = self
            .team_index(name)
            .ok_or_else(|| ApidashError::NotFound(format!("team '{name}'")))?;

        let owned = self.documents[idx].apis.len();
        if owned > 0 {
            return Err(ApidashError::Conflict(format!(
                "team '{name}' still owns {owned} API(s); reassign them first"
            )));
        }

        self.documents.remove(idx);
        Ok(self.teams.remove(idx))
    }

    // -- valid-value lists --------------------------------------------------

    fn value_list_mut(&mut self, list: ValueList) -> &mut Vec<String> {
        match list {
            ValueList::CmdbAssignmentGroups => &mut self.cmdb_groups,
            ValueList::BusinessGroups => &mut self.business_groups,
        }
    }

    pub fn values(&self, list: ValueList) -> &[String] {
        match list {
            ValueList::CmdbAssignmentGroups => &self.cmdb_groups,
            ValueList::BusinessGroups => &self.business_groups,
        }
    }

    pub fn add_valid_value(&mut self, list: ValueList, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ApidashError::validation(list.document_key(), "value is required"));
        }
        let values = self.value_list_mut(list);
        if values.iter().any(|v| v == value) {
            return Err(ApidashError::validation(
                list.document_key(),
                format!("'{value}' already exists"),
            ));
        }
        values.push(value.to_string());
        Ok(())
    }

    /// Remove a value that nothing references any more.
    pub fn remove_valid_value(&mut self, list: ValueList, value: &str) -> Result<()> {
        let Some(idx) = self.values(list).iter().position(|v| v == value) else {
            return Err(ApidashError::NotFound(format!("'{value}' in {list}")));
        };

        let users = match list {
            ValueList::BusinessGroups => {
                self.apis()
                    .filter(|api| api.business_groups.contains(value))
                    .count()
                    + self
                        .teams
                        .iter()
                        .filter(|t| t.business_groups.contains(value))
                        .count()
            }
            ValueList::CmdbAssignmentGroups => self
                .teams
                .iter()
                .filter(|t| t.cmdb_assignment_group == value)
                .count(),
        };
        if users > 0 {
            return Err(ApidashError::Conflict(format!(
                "'{value}' is still referenced {users} time(s)"
            )));
        }

        self.value_list_mut(list).remove(idx);
        Ok(())
    }

    // -- queries ------------------------------------------------------------

    /// Case-insensitive substring match against every field of every API.
    pub fn search(&self, term: &str) -> Vec<&ApiRecord> {
        if term.trim().is_empty() {
            return self.apis().collect();
        }
        let needle = term.to_lowercase();
        self.apis().filter(|api| matches_term(api, &needle)).collect()
    }

    /// APIs whose `teamName` is exactly `team_name`; blank returns all.
    pub fn filter_by_team(&self, team_name: &str) -> Vec<&ApiRecord> {
        if team_name.trim().is_empty() {
            return self.apis().collect();
        }
        self.apis().filter(|api| api.team_name == team_name).collect()
    }

    /// Team filter, then search, as the dashboard table applies them.
    pub fn query(&self, team_filter: &str, term: &str) -> Vec<&ApiRecord> {
        let needle = term.to_lowercase();
        self.filter_by_team(team_filter)
            .into_iter()
            .filter(|api| needle.trim().is_empty() || matches_term(api, &needle))
            .collect()
    }

    pub fn team_summaries(&self) -> Vec<TeamSummary> {
        self.teams
            .iter()
            .zip(&self.documents)
            .map(|(team, doc)| TeamSummary {
                name: team.name.clone(),
                owner: team.owner.clone(),
                api_count: doc.apis.len(),
            })
            .collect()
    }

    pub fn stats(&self) -> CatalogStats {
        self.apis().fold(CatalogStats::default(), |mut stats, api| {
            stats.total += 1;
            if api.munit_exempt {
                stats.munit_exempt += 1;
            } else {
                stats.munit_required += 1;
            }
            stats
        })
    }

    // -- documents ----------------------------------------------------------

    /// The valid-values document as it should now be stored. Teams without
    /// metadata are written back as bare names.
    pub fn valid_values(&self) -> ValidValues {
        ValidValues {
            valid_team_names: self
                .teams
                .iter()
                .map(|team| {
                    if *team == Team::named(&team.name) {
                        TeamEntry::Name(team.name.clone())
                    } else {
                        TeamEntry::Record(team.clone())
                    }
                })
                .collect(),
            valid_cmdb_assignment_groups: self.cmdb_groups.clone(),
            valid_business_groups: self.business_groups.clone(),
        }
    }

    /// Split the catalog back into its backing documents.
    pub fn to_documents(&self) -> (ValidValues, Vec<TeamApiDocument>) {
        (self.valid_values(), self.documents.clone())
    }
}

/// String forms of every field, lowercased, checked for `needle`.
fn matches_term(api: &ApiRecord, needle: &str) -> bool {
    let coverage = api
        .custom_coverage
        .map(|c| c.to_string())
        .unwrap_or_default();
    let groups = api
        .business_groups
        .iter()
        .cloned()
        .collect::<Vec<_>>()
        .join(",");
    let updated = api.last_updated.to_rfc3339_opts(SecondsFormat::AutoSi, true);
    let exempt = api.munit_exempt.to_string();

    [
        api.api_name.as_str(),
        api.asset_id.as_str(),
        api.api_owner.as_str(),
        api.api_owner_email.as_str(),
        api.team_name.as_str(),
        exempt.as_str(),
        coverage.as_str(),
        groups.as_str(),
        updated.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Convenience for building business-group sets.
pub fn groups<I, S>(items: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    pub(crate) fn api(asset_id: &str, team: &str, business_groups: &[&str]) -> ApiRecord {
        ApiRecord {
            api_name: format!("{asset_id} API"),
            asset_id: asset_id.into(),
            api_owner: "Ada Byron".into(),
            api_owner_email: "ada@example.com".into(),
            team_name: team.into(),
            munit_exempt: false,
            custom_coverage: None,
            business_groups: groups(business_groups.iter().copied()),
            last_updated: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    /// "Platform" with no APIs, "Data" owning `abc-123`.
    pub(crate) fn sample() -> Catalog {
        let valid = ValidValues {
            valid_team_names: vec![
                TeamEntry::Name("Platform".into()),
                TeamEntry::Name("Data".into()),
            ],
            valid_cmdb_assignment_groups: vec!["DATA_OPS".into()],
            valid_business_groups: vec!["Finance".into(), "Retail".into()],
        };
        let data = TeamApiDocument {
            team_name: "Data".into(),
            apis: vec![api("abc-123", "Data", &["Finance"])],
        };
        Catalog::new(valid, vec![data])
    }

    #[test]
    fn new_aligns_documents_with_teams() {
        let catalog = sample();
        assert_eq!(catalog.teams().len(), 2);
        assert_eq!(catalog.documents()[0], TeamApiDocument::empty("Platform"));
        assert_eq!(catalog.documents()[1].apis.len(), 1);
        assert_eq!(catalog.owner_of("abc-123"), Some("Data"));
    }

    #[test]
    fn new_drops_orphans_and_duplicate_teams() {
        let valid = ValidValues {
            valid_team_names: vec![
                TeamEntry::Name("Data".into()),
                TeamEntry::Record(Team {
                    owner: "someone".into(),
                    ..Team::named("Data")
                }),
            ],
            ..ValidValues::default()
        };
        let orphan = TeamApiDocument {
            team_name: "Ghost".into(),
            apis: vec![api("ghost-1", "Ghost", &["Finance"])],
        };
        let catalog = Catalog::new(valid, vec![orphan]);
        assert_eq!(catalog.teams().len(), 1);
        assert_eq!(catalog.api_count(), 0);
    }

    #[test]
    fn upsert_inserts_then_search_finds_exactly_one() {
        let mut catalog = sample();
        let outcome = catalog
            .upsert_api(api("orders_v2", "Platform", &["Retail"]))
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);

        let hits = catalog.search("orders_v2");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].team_name, "Platform");
        assert_eq!(catalog.document("Platform").unwrap().apis.len(), 1);
    }

    #[test]
    fn upsert_overwrites_in_place() {
        let mut catalog = sample();
        catalog
            .upsert_api(api("second", "Data", &["Finance"]))
            .unwrap();

        let mut changed = api("abc-123", "Data", &["Retail"]);
        changed.api_name = "Renamed".into();
        assert_eq!(catalog.upsert_api(changed).unwrap(), UpsertOutcome::Updated);

        let data = catalog.document("Data").unwrap();
        assert_eq!(data.apis.len(), 2);
        assert_eq!(data.apis[0].api_name, "Renamed");
        assert_eq!(data.apis[1].asset_id, "second");
    }

    #[test]
    fn upsert_rejects_bad_asset_id() {
        let mut catalog = sample();
        let before = catalog.clone();

        let err = catalog
            .upsert_api(api("bad id!", "Data", &["Finance"]))
            .unwrap_err();
        assert_eq!(err.field(), Some("assetId"));
        assert_eq!(catalog, before);
    }

    #[test]
    fn upsert_rejects_coverage_out_of_range() {
        let mut catalog = sample();
        let before = catalog.clone();

        for coverage in [-1, 101, 250] {
            let mut record = api("cov", "Data", &["Finance"]);
            record.munit_exempt = true;
            record.custom_coverage = Some(coverage);
            let err = catalog.upsert_api(record).unwrap_err();
            assert_eq!(err.field(), Some("customCoverage"));
            assert_eq!(catalog, before);
        }

        let mut missing = api("cov", "Data", &["Finance"]);
        missing.munit_exempt = true;
        assert_eq!(
            catalog.upsert_api(missing).unwrap_err().field(),
            Some("customCoverage")
        );
    }

    #[test]
    fn coverage_bounds_are_inclusive_and_cleared_when_not_exempt() {
        let mut catalog = sample();
        for (id, coverage) in [("zero", 0), ("full", 100)] {
            let mut record = api(id, "Data", &["Finance"]);
            record.munit_exempt = true;
            record.custom_coverage = Some(coverage);
            catalog.upsert_api(record).unwrap();
        }

        let mut ignored = api("plain", "Data", &["Finance"]);
        ignored.custom_coverage = Some(500);
        catalog.upsert_api(ignored).unwrap();
        assert_eq!(catalog.find_api("plain").unwrap().custom_coverage, None);
    }

    #[test]
    fn upsert_checks_references() {
        let mut catalog = sample();

        let err = catalog
            .upsert_api(api("x1", "Nobody", &["Finance"]))
            .unwrap_err();
        assert_eq!(err.field(), Some("teamName"));

        let err = catalog.upsert_api(api("x1", "Data", &[])).unwrap_err();
        assert_eq!(err.field(), Some("businessGroups"));

        let err = catalog
            .upsert_api(api("x1", "Data", &["Finance", "Marketing"]))
            .unwrap_err();
        assert_eq!(err.field(), Some("businessGroups"));
        assert!(err.to_string().contains("Marketing"));

        let mut blank = api("x1", "Data", &["Finance"]);
        blank.api_owner_email = "  ".into();
        assert_eq!(
            catalog.upsert_api(blank).unwrap_err().field(),
            Some("apiOwnerEmail")
        );
    }

    #[test]
    fn upsert_rejects_asset_id_owned_by_other_team() {
        let mut catalog = sample();
        let err = catalog
            .upsert_api(api("abc-123", "Platform", &["Finance"]))
            .unwrap_err();
        assert_eq!(err.field(), Some("assetId"));
        assert_eq!(catalog.owner_of("abc-123"), Some("Data"));
    }

    #[test]
    fn reassign_to_same_team_is_noop() {
        let mut catalog = sample();
        let before = catalog.clone();
        let err = catalog.reassign_api("abc-123", "Data").unwrap_err();
        assert!(matches!(err, ApidashError::NoOp(_)));
        assert_eq!(catalog, before);
    }

    #[test]
    fn reassign_unknown_asset_or_team() {
        let mut catalog = sample();
        assert!(catalog.reassign_api("nope", "Data").unwrap_err().is_not_found());

        let before = catalog.clone();
        let err = catalog.reassign_api("abc-123", "Nobody").unwrap_err();
        assert_eq!(err.field(), Some("teamName"));
        assert_eq!(catalog, before);
    }

    #[test]
    fn reassign_then_delete_team() {
        let mut catalog = sample();

        let err = catalog.delete_team("Data").unwrap_err();
        assert!(matches!(err, ApidashError::Conflict(_)));

        let moved = catalog.reassign_api("abc-123", "Platform").unwrap();
        assert_eq!(moved.team_name, "Platform");

        let removed = catalog.delete_team("Data").unwrap();
        assert_eq!(removed.name, "Data");
        assert!(catalog.team("Data").is_none());
        assert_eq!(catalog.documents().len(), 1);

        let platform = catalog.document("Platform").unwrap();
        assert_eq!(platform.apis.len(), 1);
        assert_eq!(platform.apis[0].asset_id, "abc-123");
        assert_eq!(catalog.filter_by_team("Platform").len(), 1);
    }

    #[test]
    fn delete_unknown_team_is_not_found() {
        let mut catalog = sample();
        assert!(catalog.delete_team("Ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn delete_api_is_silent_when_absent() {
        let mut catalog = sample();
        assert!(catalog.delete_api("missing").is_none());
        assert_eq!(catalog.api_count(), 1);

        let removed = catalog.delete_api("abc-123").unwrap();
        assert_eq!(removed.asset_id, "abc-123");
        assert_eq!(catalog.api_count(), 0);
    }

    #[test]
    fn delete_api_removes_only_first_duplicate() {
        let valid = ValidValues {
            valid_team_names: vec![
                TeamEntry::Name("Platform".into()),
                TeamEntry::Name("Data".into()),
            ],
            valid_business_groups: vec!["Finance".into()],
            ..ValidValues::default()
        };
        let platform = TeamApiDocument {
            team_name: "Platform".into(),
            apis: vec![api("dup-1", "Platform", &["Finance"])],
        };
        let data = TeamApiDocument {
            team_name: "Data".into(),
            apis: vec![api("dup-1", "Data", &["Finance"])],
        };
        let mut catalog = Catalog::new(valid, vec![platform, data]);

        let removed = catalog.delete_api("dup-1").unwrap();
        assert_eq!(removed.team_name, "Platform");
        assert_eq!(catalog.api_count(), 1);
        assert_eq!(catalog.owner_of("dup-1"), Some("Data"));
    }

    #[test]
    fn add_team_extends_valid_lists() {
        let mut catalog = sample();
        let team = Team {
            name: "Integration".into(),
            owner: "Alan".into(),
            owner_email: "alan@example.com".into(),
            cmdb_assignment_group: "INT_OPS".into(),
            business_groups: groups(["Finance", "Logistics"]),
        };
        catalog.add_team(team.clone()).unwrap();

        assert_eq!(catalog.team("Integration"), Some(&team));
        assert!(catalog.cmdb_groups().contains(&"INT_OPS".to_string()));
        assert!(catalog.business_groups().contains(&"Logistics".to_string()));
        assert_eq!(
            catalog.document("Integration"),
            Some(&TeamApiDocument::empty("Integration"))
        );

        let err = catalog.add_team(team).unwrap_err();
        assert_eq!(err.field(), Some("name"));
    }

    #[test]
    fn add_team_rejects_name_sharing_a_document() {
        let mut catalog = sample();
        let before = catalog.clone();

        for name in ["data", "DATA"] {
            let team = Team {
                cmdb_assignment_group: "DATA_OPS".into(),
                business_groups: groups(["Finance"]),
                ..Team::named(name)
            };
            let err = catalog.add_team(team).unwrap_err();
            assert_eq!(err.field(), Some("name"), "{name}");
        }
        assert_eq!(catalog, before);
    }

    #[test]
    fn add_team_requires_cmdb_group_and_business_groups() {
        let mut catalog = sample();
        let before = catalog.clone();

        let err = catalog.add_team(Team::named("Bare")).unwrap_err();
        assert_eq!(err.field(), Some("cmdbAssignmentGroup"));

        let err = catalog
            .add_team(Team {
                cmdb_assignment_group: "X".into(),
                ..Team::named("Bare")
            })
            .unwrap_err();
        assert_eq!(err.field(), Some("businessGroups"));
        assert_eq!(catalog, before);
    }

    #[test]
    fn valid_value_lists() {
        let mut catalog = sample();

        catalog
            .add_valid_value(ValueList::BusinessGroups, "Logistics")
            .unwrap();
        assert!(catalog
            .add_valid_value(ValueList::BusinessGroups, "Logistics")
            .is_err());

        let err = catalog
            .remove_valid_value(ValueList::BusinessGroups, "Finance")
            .unwrap_err();
        assert!(matches!(err, ApidashError::Conflict(_)));

        catalog
            .remove_valid_value(ValueList::BusinessGroups, "Logistics")
            .unwrap();
        assert!(catalog
            .remove_valid_value(ValueList::CmdbAssignmentGroups, "NOPE")
            .unwrap_err()
            .is_not_found());
        catalog
            .remove_valid_value(ValueList::CmdbAssignmentGroups, "DATA_OPS")
            .unwrap();
        assert!(catalog.cmdb_groups().is_empty());
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let catalog = sample();
        assert_eq!(catalog.search("").len(), 1);
        assert_eq!(catalog.search("ABC").len(), 1);
        assert_eq!(catalog.search("finance").len(), 1);
        assert_eq!(catalog.search("ADA@EXAMPLE").len(), 1);
        assert_eq!(catalog.search("2024-03-01").len(), 1);
        assert_eq!(catalog.search("false").len(), 1);
        assert!(catalog.search("platform").is_empty());
    }

    #[test]
    fn query_applies_team_then_term() {
        let mut catalog = sample();
        catalog
            .upsert_api(api("orders", "Platform", &["Retail"]))
            .unwrap();

        assert_eq!(catalog.filter_by_team("").len(), 2);
        assert_eq!(catalog.filter_by_team("  ").len(), 2);
        assert_eq!(catalog.search("   ").len(), 2);
        assert_eq!(catalog.query(" ", "\t").len(), 2);
        assert_eq!(catalog.filter_by_team("Platform").len(), 1);
        assert_eq!(catalog.query("Data", "orders").len(), 0);
        assert_eq!(catalog.query("", "orders").len(), 1);
        assert_eq!(catalog.query("Platform", "").len(), 1);
    }

    #[test]
    fn summaries_and_stats() {
        let mut catalog = sample();
        let mut exempt = api("exempt", "Data", &["Finance"]);
        exempt.munit_exempt = true;
        exempt.custom_coverage = Some(50);
        catalog.upsert_api(exempt).unwrap();

        let summaries = catalog.team_summaries();
        assert_eq!(summaries[0].api_count, 0);
        assert_eq!(summaries[1].api_count, 2);

        let stats = catalog.stats();
        assert_eq!(
            stats,
            CatalogStats {
                total: 2,
                munit_required: 1,
                munit_exempt: 1
            }
        );
    }

    #[test]
    fn valid_values_preserve_entry_shape() {
        let mut catalog = sample();
        catalog
            .add_team(Team {
                owner: "Alan".into(),
                cmdb_assignment_group: "DATA_OPS".into(),
                business_groups: groups(["Finance"]),
                ..Team::named("Integration")
            })
            .unwrap();

        let valid = catalog.valid_values();
        assert_eq!(valid.valid_team_names[0], TeamEntry::Name("Platform".into()));
        assert!(matches!(valid.valid_team_names[2], TeamEntry::Record(_)));
        assert_eq!(valid.valid_cmdb_assignment_groups, vec!["DATA_OPS"]);
    }
}
