//! MagIC Contribution Core
//!
//! # Philosophy: Text In, Tables Out, Versions Forward
//!
//! The contribution lifecycle:
//!
//! 1. **Parse**: Tab-delimited text becomes named tables of string rows
//! 2. **Diagnose**: Structural problems are reported, never hidden
//! 3. **Upgrade**: Rows are migrated one data model version at a time
//!    using the lineage declared in the schema catalog
//!
//! Values are strings end to end. No coercion, no type inference.
//! Every call returns its result together with the diagnostics it produced,
//! so a partial result can always be shown next to what went wrong.
//!
//! # Modules
//!
//! - [`contribution`]: Ordered table/row representation of a contribution
//! - [`diagnostics`]: Error/warning channels and the keyed diagnostics sink
//! - [`catalog`]: Versioned data model definitions
//! - [`upgrade_map`]: Derives rename/merge/split mappings from column lineage
//! - [`parse`]: Tab-delimited text parser
//! - [`upgrade`]: Stepwise version migration
//! - [`pipeline`]: Parse-then-upgrade convenience over a shared sink

pub mod catalog;
pub mod contribution;
pub mod diagnostics;
pub mod parse;
pub mod pipeline;
pub mod upgrade;
pub mod upgrade_map;

pub use catalog::{CatalogError, ColumnDefinition, ColumnRef, DataModel, SchemaCatalog, TableDefinition};
pub use contribution::{Contribution, ContributionError, Row, CONTRIBUTION_TABLE, VERSION_COLUMN};
pub use diagnostics::{Diagnostic, Diagnostics, DiagnosticsSink, OperationId, Outcome, Severity};
pub use parse::{parse, ParseError, ParseWarning};
pub use pipeline::{ingest, ingest_into, Ingested};
pub use upgrade::{UpgradeError, Upgrader};
pub use upgrade_map::{build_upgrade_map, UpgradeMap};
