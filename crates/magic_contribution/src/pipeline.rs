//! Parse-then-upgrade over one diagnostics sink.

use crate::catalog::SchemaCatalog;
use crate::contribution::Contribution;
use crate::diagnostics::{DiagnosticsSink, OperationId};
use crate::parse::parse;
use crate::upgrade::Upgrader;
use tracing::debug;

/// Result of [`ingest`]: the final contribution and everything reported.
#[derive(Debug, Default)]
pub struct Ingested {
    pub contribution: Contribution,
    pub sink: DiagnosticsSink,
}

/// Parse `text` and, given a catalog, upgrade the result.
///
/// The upgrade only runs when parsing produced no errors. Parse diagnostics
/// land under [`OperationId::PARSE_CONTRIBUTION`], upgrade diagnostics under
/// [`OperationId::UPGRADE_CONTRIBUTION`].
pub fn ingest(text: &str, catalog: Option<&SchemaCatalog>, max_version: Option<&str>) -> Ingested {
    let mut sink = DiagnosticsSink::new();
    let contribution = ingest_into(&mut sink, text, catalog, max_version);
    Ingested { contribution, sink }
}

/// Like [`ingest`], appending to a caller-owned sink.
pub fn ingest_into(
    sink: &mut DiagnosticsSink,
    text: &str,
    catalog: Option<&SchemaCatalog>,
    max_version: Option<&str>,
) -> Contribution {
    let (parsed, diagnostics) = parse(text).into_parts();
    sink.absorb(&OperationId::parse_contribution(), &diagnostics);

    let Some(catalog) = catalog else {
        return parsed;
    };
    if diagnostics.has_errors() {
        debug!(errors = diagnostics.errors.len(), "Skipping upgrade of contribution with parse errors");
        return parsed;
    }

    let (upgraded, diagnostics) = Upgrader::new(catalog).upgrade(&parsed, max_version).into_parts();
    sink.absorb(&OperationId::upgrade_contribution(), &diagnostics);
    upgraded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    const CATALOG: &str = r#"{
        "versions": ["2.5", "3.0"],
        "models": {
            "2.5": { "tables": {
                "contribution": { "columns": { "magic_version": {} } },
                "er_sites": { "columns": { "er_site_name": {} } }
            } },
            "3.0": { "tables": {
                "contribution": { "columns": { "magic_version": {
                    "previous_columns": [{ "table": "contribution", "column": "magic_version" }]
                } } },
                "sites": { "columns": { "site": {
                    "previous_columns": [{ "table": "er_sites", "column": "er_site_name" }]
                } } }
            } }
        }
    }"#;

    const TEXT: &str = "tab\tcontribution\nmagic_version\n2.5\ntab\ter_sites\ner_site_name\nak01\n";

    #[test]
    fn test_ingest_parses_and_upgrades() {
        let catalog = SchemaCatalog::from_json_str(CATALOG).unwrap();
        let ingested = ingest(TEXT, Some(&catalog), None);

        assert!(!ingested.sink.has_errors());
        assert_eq!(ingested.contribution.version(), Some("3.0"));
        assert_eq!(ingested.contribution.table("sites").unwrap()[0]["site"], "ak01");
    }

    #[test]
    fn test_ingest_without_catalog_only_parses() {
        let ingested = ingest(TEXT, None, None);
        assert_eq!(ingested.contribution.version(), Some("2.5"));
        assert!(ingested.contribution.table("er_sites").is_some());
    }

    #[test]
    fn test_parse_errors_skip_upgrade() {
        let catalog = SchemaCatalog::from_json_str(CATALOG).unwrap();
        let ingested = ingest("nonsense", Some(&catalog), None);

        let parse_op = OperationId::parse_contribution();
        let upgrade_op = OperationId::upgrade_contribution();
        assert_eq!(ingested.sink.read(Severity::Error, &parse_op).len(), 1);
        assert!(ingested.sink.read(Severity::Error, &upgrade_op).is_empty());
    }

    #[test]
    fn test_shared_sink_accumulates_runs() {
        let mut sink = DiagnosticsSink::new();
        ingest_into(&mut sink, "", None, None);
        ingest_into(&mut sink, "", None, None);

        let warnings = sink.read(Severity::Warning, &OperationId::parse_contribution());
        assert_eq!(warnings.len(), 2);
    }
}
