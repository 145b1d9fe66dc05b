//! Catalog domain logic for apidash.
//!
//! This crate ties the resolver and the document store together: it loads
//! the catalog, enforces its invariants on every edit, exports it, and turns
//! accepted edits into change requests.

pub mod app;
pub mod audit;
pub mod catalog;
pub mod export;
pub mod load;
pub mod submit;
pub mod view;

pub use app::AppContext;
pub use audit::Violation;
pub use catalog::{Catalog, CatalogStats, TeamSummary, UpsertOutcome};
pub use load::{LoadReporter, LoadSummary, SilentReporter, load_catalog};
pub use submit::{ChangeAction, ChangeRequest, ChangeSubmitter, SubmitOutcome};
pub use view::{EditIntent, Notification, NotificationLevel, ViewState};
