//! Upgrade Engine
//!
//! Migrates a contribution forward through the catalog's data model versions,
//! one version at a time, until a requested version or the newest one.
//!
//! # Pre-flight (fatal)
//!
//! Each step first validates the contribution. A failure records exactly one
//! error and returns the contribution of that step unchanged:
//!
//! 1. The contribution is not empty
//! 2. The requested maximum version, if any, is known
//! 3. The `contribution` table exists with exactly one row
//! 4. That row carries a known `magic_version`
//!
//! # Per-column rewrite (local)
//!
//! Unknown tables and columns are reported and skipped; deleted columns are
//! warned about and dropped. Everything else is copied to each destination
//! the upgrade map lists for it.

use crate::catalog::{DataModel, SchemaCatalog};
use crate::contribution::{Contribution, Row, CONTRIBUTION_TABLE, VERSION_COLUMN};
use crate::diagnostics::{Diagnostics, Outcome};
use crate::upgrade_map::{build_upgrade_map, UpgradeMap};
use indexmap::IndexMap;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

/// Pre-flight failures. Any of these stops the upgrade call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpgradeError {
    #[error("The contribution to upgrade is empty.")]
    EmptyContribution,

    #[error("The maximum data model version \"{version}\" is invalid. Expected one of: {expected}.")]
    InvalidMaxVersion { version: String, expected: String },

    #[error("Failed to find the \"contribution\" table.")]
    MissingContributionTable,

    #[error("The \"contribution\" table does not have exactly one row (found {rows}).")]
    ContributionRowCount { rows: usize },

    #[error("The \"contribution\" table does not include the \"magic_version\" column.")]
    MissingVersionColumn,

    #[error("Data model version \"{version}\" is invalid. Expected one of: {expected}.")]
    InvalidVersion { version: String, expected: String },
}

/// Problems local to one table or column during a step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
enum MigrationIssue {
    #[error("Table \"{table}\" is not defined in data model version {version}.")]
    TableNotDefined { table: String, version: String },

    #[error("Column \"{column}\" in table \"{table}\" is not defined in data model version {version}.")]
    ColumnNotDefined {
        table: String,
        column: String,
        version: String,
    },

    #[error(
        "Column \"{column}\" in table \"{table}\" maps to column \"{target_column}\" in table \
         \"{target_table}\" in data model version {version}. Moving values between tables is \
         not supported; the value was not copied there."
    )]
    CrossTableMove {
        table: String,
        column: String,
        target_table: String,
        target_column: String,
        version: String,
    },

    #[error("Column \"{column}\" in table \"{table}\" was deleted in data model version {version}.")]
    ColumnDeleted {
        table: String,
        column: String,
        version: String,
    },

    #[error("Table \"{table}\" was deleted in data model version {version}.")]
    TableDeleted { table: String, version: String },
}

/// One version transition, borrowed from the catalog.
#[derive(Debug, Clone, Copy)]
struct Transition<'a> {
    from: &'a str,
    to: &'a str,
}

/// Upgrades contributions against one schema catalog.
#[derive(Debug, Clone, Copy)]
pub struct Upgrader<'a> {
    catalog: &'a SchemaCatalog,
}

impl<'a> Upgrader<'a> {
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        Self { catalog }
    }

    /// Upgrade to `max_version`, or to the newest version when `None`.
    ///
    /// Diagnostics from every step are collected into one [`Diagnostics`].
    pub fn upgrade(&self, contribution: &Contribution, max_version: Option<&str>) -> Outcome<Contribution> {
        let mut diagnostics = Diagnostics::new();
        let mut current = contribution.clone();

        loop {
            let transition = match self.check(&current, max_version) {
                Ok(Some(transition)) => transition,
                Ok(None) => break,
                Err(err) => {
                    diagnostics.error(err);
                    break;
                }
            };
            current = self.migrate(&current, transition, &mut diagnostics);
        }

        Outcome::new(current, diagnostics)
    }

    /// Upgrade by exactly one version, if there is a newer one.
    pub fn step(&self, contribution: &Contribution) -> Outcome<Contribution> {
        let mut diagnostics = Diagnostics::new();
        let upgraded = match self.check(contribution, None) {
            Ok(Some(transition)) => self.migrate(contribution, transition, &mut diagnostics),
            Ok(None) => contribution.clone(),
            Err(err) => {
                diagnostics.error(err);
                contribution.clone()
            }
        };
        Outcome::new(upgraded, diagnostics)
    }

    /// Pre-flight validation; `Ok(None)` when there is nothing left to do.
    fn check(
        &self,
        contribution: &Contribution,
        max_version: Option<&str>,
    ) -> Result<Option<Transition<'a>>, UpgradeError> {
        let catalog = self.catalog;

        if contribution.is_empty() {
            return Err(UpgradeError::EmptyContribution);
        }

        let max_position = match max_version {
            Some(version) => Some(catalog.position(version).ok_or_else(|| {
                UpgradeError::InvalidMaxVersion {
                    version: version.to_string(),
                    expected: catalog.quoted_versions(),
                }
            })?),
            None => None,
        };

        let rows = contribution
            .table(CONTRIBUTION_TABLE)
            .ok_or(UpgradeError::MissingContributionTable)?;
        let [row] = rows else {
            return Err(UpgradeError::ContributionRowCount { rows: rows.len() });
        };
        let version = row
            .get(VERSION_COLUMN)
            .filter(|v| !v.is_empty())
            .ok_or(UpgradeError::MissingVersionColumn)?;
        let position = catalog
            .position(version)
            .ok_or_else(|| UpgradeError::InvalidVersion {
                version: version.clone(),
                expected: catalog.quoted_versions(),
            })?;

        // Never downgrade; a maximum at or below the current version is a no-op
        if max_position.is_some_and(|max| position >= max) {
            return Ok(None);
        }

        let from = catalog.versions()[position].as_str();
        Ok(catalog.next_version(from).map(|to| Transition { from, to }))
    }

    /// One sweep over every table, row and column.
    fn migrate(
        &self,
        contribution: &Contribution,
        transition: Transition<'a>,
        diagnostics: &mut Diagnostics,
    ) -> Contribution {
        let Transition { from, to } = transition;
        let (Some(old_model), Some(new_model)) = (self.catalog.model(from), self.catalog.model(to)) else {
            // Unreachable for catalogs built through SchemaCatalog::new
            return contribution.clone();
        };
        let map = build_upgrade_map(new_model);
        debug!(from, to, mapped_columns = map.len(), "Built upgrade map");

        let mut reported: HashSet<String> = HashSet::new();
        let mut report = |issue: MigrationIssue, diagnostics: &mut Diagnostics| {
            let message = issue.to_string();
            if reported.insert(message.clone()) {
                match issue {
                    MigrationIssue::ColumnDeleted { .. } | MigrationIssue::TableDeleted { .. } => {
                        diagnostics.warning(message)
                    }
                    _ => diagnostics.error(message),
                }
            }
        };

        let mut upgraded = Contribution::new();
        for (table, rows) in contribution.tables() {
            let Some(definition) = old_model.table(table) else {
                report(
                    MigrationIssue::TableNotDefined {
                        table: table.to_string(),
                        version: from.to_string(),
                    },
                    diagnostics,
                );
                continue;
            };

            let Some(home) = home_table(&map, new_model, table) else {
                report(
                    MigrationIssue::TableDeleted {
                        table: table.to_string(),
                        version: to.to_string(),
                    },
                    diagnostics,
                );
                continue;
            };

            upgraded.insert_table(home);
            for row in rows {
                let mut new_row = Row::new();
                for (column, value) in row {
                    if table == CONTRIBUTION_TABLE && column == VERSION_COLUMN {
                        new_row.insert(column.clone(), to.to_string());
                        continue;
                    }

                    if !definition.has_column(column) {
                        report(
                            MigrationIssue::ColumnNotDefined {
                                table: table.to_string(),
                                column: column.clone(),
                                version: from.to_string(),
                            },
                            diagnostics,
                        );
                        continue;
                    }

                    let Some(destinations) = map.destinations(table, column) else {
                        report(
                            MigrationIssue::ColumnDeleted {
                                table: table.to_string(),
                                column: column.clone(),
                                version: to.to_string(),
                            },
                            diagnostics,
                        );
                        continue;
                    };

                    for destination in destinations {
                        if destination.table != home {
                            report(
                                MigrationIssue::CrossTableMove {
                                    table: table.to_string(),
                                    column: column.clone(),
                                    target_table: destination.table.clone(),
                                    target_column: destination.column.clone(),
                                    version: to.to_string(),
                                },
                                diagnostics,
                            );
                            continue;
                        }
                        new_row.insert(destination.column.clone(), value.clone());
                    }
                }
                upgraded.push_row(home, new_row);
            }
        }

        info!(from, to, tables = upgraded.len(), "Upgraded contribution");
        upgraded
    }
}

/// Table that rows of `table` land in after the step.
///
/// Destinations are tallied per new table, carried-over columns first; a
/// merge destination only counts when the table has no carried column at
/// all. Rows stay put when their own table is among the candidates,
/// otherwise they move to the candidate receiving the most columns (first
/// discovered on a tie). `None` when nothing maps and the table is gone.
fn home_table<'m>(map: &'m UpgradeMap, new_model: &DataModel, table: &'m str) -> Option<&'m str> {
    let mut carried: IndexMap<&str, usize> = IndexMap::new();
    let mut merged: IndexMap<&str, usize> = IndexMap::new();

    let destinations = map.table(table).into_iter().flat_map(|columns| columns.values().flatten());
    for destination in destinations {
        let is_merge = new_model
            .table(&destination.table)
            .and_then(|t| t.columns.get(&destination.column))
            .is_some_and(|c| c.previous_columns.len() > 1);
        let tally = if is_merge { &mut merged } else { &mut carried };
        *tally.entry(destination.table.as_str()).or_default() += 1;
    }

    let candidates = if carried.is_empty() { merged } else { carried };
    if candidates.is_empty() {
        return new_model.table(table).map(|_| table);
    }
    if candidates.contains_key(table) {
        return Some(table);
    }

    let mut best: Option<(&str, usize)> = None;
    for (name, count) in candidates {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((name, count));
        }
    }
    best.map(|(name, _)| name)
}
