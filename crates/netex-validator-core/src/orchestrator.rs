//! Dataset-level coordination: two-phase (common-first, then line files)
//! concurrent validation, cross-file passes, and final aggregation
//! (`spec.md` §4.8, §4.9).

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::cache::ValidationCache;
use crate::id_repository::{ExternalReferenceValidator, FrenchReferenceValidator, IdRepository};
use crate::options::ValidationOptions;
use crate::registry;
use crate::report::{DataLocation, Finding, ReportAggregator, RuleMeta, Severity, ValidationReport, ValidationReportEntry};
use crate::rule_runner::RuleRunner;
use crate::schema::SchemaManager;
use crate::xml;

/// An external cancellation signal, checked between phases, once per file at
/// the top of each `run_phase` task, and once per rule inside
/// [`crate::rule_runner::RuleRunner::run`]. Cheap to clone; every clone
/// observes the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A `(filename, bytes)` pair as the orchestrator and `validate_zip`
/// boundary both deal in (`spec.md` §6).
pub type DatasetEntry = (String, Vec<u8>);

fn is_common_file(file_name: &str) -> bool {
    let basename = file_name.rsplit('/').next().unwrap_or(file_name);
    basename.starts_with('_')
}

/// Step 2 of the per-file pipeline (`spec.md` §4.9): parse, schema-check,
/// rule-evaluate, harvest, and cache one file's result. Exposed standalone
/// so `validate_content` (single-document entry point) can reuse it without
/// going through the full dataset orchestrator.
pub fn validate_file(
    bytes: &[u8],
    file_name: &str,
    options: &ValidationOptions,
    schema_manager: &SchemaManager,
    rule_runner: &RuleRunner,
    id_repo: &IdRepository,
    cache: Option<&ValidationCache>,
    cancellation: &CancellationToken,
) -> Vec<ValidationReportEntry> {
    let cache_key = cache.map(|_| ValidationCache::key_for(bytes, &options.cache_selector()));
    if let (Some(cache), Some(key)) = (cache, &cache_key) {
        if let Some(hit) = cache.get(key) {
            return hit;
        }
    }

    let tree = match xml::parse(bytes, options.max_document_bytes) {
        Ok(tree) => tree,
        Err(err) => {
            let entries: Vec<ValidationReportEntry> = vec![ValidationReportEntry::from(Finding::new(
                RuleMeta {
                    code: "XML-PARSE".into(),
                    name: "XML not well-formed".into(),
                    message: err.to_string(),
                    severity: Severity::Error,
                },
                DataLocation::for_file(file_name),
            ))];
            if let (Some(cache), Some(key)) = (cache, cache_key) {
                cache.set(key, entries.clone());
            }
            return entries;
        }
    };

    let mut findings = Vec::new();

    if !options.skip_schema {
        findings.extend(schema_manager.validate(
            &tree,
            file_name,
            options.strict_schema,
            options.max_schema_errors as usize,
            bytes,
        ));
    }

    if !options.skip_xpath_rules {
        let outcome = rule_runner.run(&tree, file_name, id_repo, cancellation);
        findings.extend(outcome.findings);
    }

    let entries: Vec<ValidationReportEntry> = findings.into_iter().map(ValidationReportEntry::from).collect();

    if let (Some(cache), Some(key)) = (cache, cache_key) {
        cache.set(key, entries.clone());
    }

    entries
}

fn content_hash_report_id(entries: &[DatasetEntry]) -> String {
    let mut hasher = Sha256::new();
    for (name, bytes) in entries {
        hasher.update(name.as_bytes());
        hasher.update(bytes);
    }
    let digest = hasher.finalize();
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

/// Coordinates a whole dataset run: partitioning, two-phase concurrent
/// per-file validation, cross-file passes, and aggregation.
pub struct Orchestrator {
    external_validators: Vec<Box<dyn ExternalReferenceValidator>>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            external_validators: vec![Box::new(FrenchReferenceValidator)],
        }
    }

    pub fn with_external_validators(mut self, validators: Vec<Box<dyn ExternalReferenceValidator>>) -> Self {
        self.external_validators = validators;
        self
    }

    pub fn run(
        &self,
        entries: Vec<DatasetEntry>,
        options: &ValidationOptions,
        codespace: &str,
        cancellation: &CancellationToken,
    ) -> ValidationReport {
        let started = Instant::now();
        let report_id = content_hash_report_id(&entries);

        let id_repo = IdRepository::new();
        let rule_set = registry::build_rule_set(options);
        let disabled_rule_entries: Vec<ValidationReportEntry> = registry::current_disabled_rules()
            .map(|def| {
                ValidationReportEntry::from(Finding::new(
                    RuleMeta {
                        code: "CURRENT-RULE-DISABLED".into(),
                        name: "Rule requires current() and is disabled".into(),
                        message: format!(
                            "rule '{}' uses XPath 2.0 current() for cross-context comparison, which this engine does not support; it is excluded from the active rule set",
                            def.code
                        ),
                        severity: Severity::Info,
                    },
                    DataLocation::default(),
                ))
            })
            .collect();
        let rule_runner = RuleRunner::new(rule_set, options.max_findings as usize);
        let schema_manager = SchemaManager::new(
            Some(options.schema_cache_dir.clone()),
            options.allow_schema_network,
            options.schema_timeout_seconds,
        );
        let cache = options
            .validation_cache
            .enabled
            .then(|| ValidationCache::new(
                options.validation_cache.max_entries,
                options.validation_cache.max_memory_mb as usize,
                options.validation_cache.ttl_hours,
            ));

        let (mut common, mut line): (Vec<DatasetEntry>, Vec<DatasetEntry>) =
            entries.into_iter().partition(|(name, _)| is_common_file(name));
        common.sort_by(|a, b| a.0.cmp(&b.0));
        line.sort_by(|a, b| a.0.cmp(&b.0));
        let files_processed = common.len() + line.len();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.effective_concurrency().max(1))
            .build();
        let pool = match pool {
            Ok(pool) => pool,
            Err(_) => {
                return ReportAggregator::new().finish(
                    codespace,
                    report_id,
                    now_rfc3339(),
                    Some("failed to construct worker pool".to_owned()),
                );
            }
        };

        if cancellation.is_cancelled() {
            return ReportAggregator::new().finish(codespace, report_id, now_rfc3339(), Some("cancelled".to_owned()));
        }

        let phase1 = pool.install(|| {
            run_phase(
                &common,
                options,
                &schema_manager,
                &rule_runner,
                &id_repo,
                cache.as_ref(),
                cancellation,
            )
        });
        for (name, _) in &common {
            id_repo.mark_common(name);
        }

        if cancellation.is_cancelled() {
            let mut aggregator = ReportAggregator::new();
            for entries in phase1 {
                aggregator.extend_entries(entries);
            }
            return aggregator.finish(codespace, report_id, now_rfc3339(), Some("cancelled".to_owned()));
        }

        let phase2 = pool.install(|| {
            run_phase(
                &line,
                options,
                &schema_manager,
                &rule_runner,
                &id_repo,
                cache.as_ref(),
                cancellation,
            )
        });

        let mut aggregator = ReportAggregator::new();
        aggregator.extend_entries(disabled_rule_entries);
        for entries in phase1 {
            aggregator.extend_entries(entries);
        }
        for entries in phase2 {
            aggregator.extend_entries(entries);
        }

        if !cancellation.is_cancelled() {
            aggregator.extend(id_repo.duplicate_ids());
            aggregator.extend(id_repo.validate_references(&self.external_validators));
            aggregator.extend(id_repo.validate_id_format());
            aggregator.extend(id_repo.validate_versions());
            aggregator.extend(id_repo.validate_version_consistency_across_files());
        }

        let error = cancellation.is_cancelled().then(|| "cancelled".to_owned());
        let elapsed_ms = started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;
        aggregator.finish_with_meta(codespace, report_id, now_rfc3339(), error, elapsed_ms, files_processed)
    }
}

fn run_phase(
    files: &[DatasetEntry],
    options: &ValidationOptions,
    schema_manager: &SchemaManager,
    rule_runner: &RuleRunner,
    id_repo: &IdRepository,
    cache: Option<&ValidationCache>,
    cancellation: &CancellationToken,
) -> Vec<Vec<ValidationReportEntry>> {
    files
        .par_iter()
        .map(|(name, bytes)| -> Vec<ValidationReportEntry> {
            if cancellation.is_cancelled() {
                return Vec::new();
            }
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                validate_file(bytes, name, options, schema_manager, rule_runner, id_repo, cache, cancellation)
            }));
            match result {
                Ok(entries) => entries,
                Err(_) => vec![ValidationReportEntry::from(Finding::new(
                    RuleMeta {
                        code: "FILE-PROCESSING-FAILED".into(),
                        name: "File processing failed".into(),
                        message: format!("an internal error occurred while validating '{name}'"),
                        severity: Severity::Critical,
                    },
                    DataLocation::for_file(name),
                ))],
            }
        })
        .collect()
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_common_file_detects_leading_underscore() {
        assert!(is_common_file("_shared.xml"));
        assert!(is_common_file("dir/_shared.xml"));
        assert!(!is_common_file("line.xml"));
    }

    #[test]
    fn cancellation_token_starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn orchestrator_run_reports_duplicate_across_files() {
        let common = br#"<PublicationDelivery xmlns="http://www.netex.org.uk/netex" version="1.15">
            <PublicationTimestamp>2023-01-01T00:00:00</PublicationTimestamp>
            <ParticipantRef>TEST</ParticipantRef>
            <dataObjects><Line id="T:Line:1" version="1"/></dataObjects>
        </PublicationDelivery>"#;
        let line = br#"<PublicationDelivery xmlns="http://www.netex.org.uk/netex" version="1.15">
            <PublicationTimestamp>2023-01-01T00:00:00</PublicationTimestamp>
            <ParticipantRef>TEST</ParticipantRef>
            <dataObjects><Line id="T:Line:1" version="1"/></dataObjects>
        </PublicationDelivery>"#;

        let mut options = ValidationOptions::default();
        options.skip_schema = true;
        options.skip_xpath_rules = true;
        options.validation_cache.enabled = false;

        let orchestrator = Orchestrator::new();
        let report = orchestrator.run(
            vec![("_shared.xml".to_owned(), common.to_vec()), ("line.xml".to_owned(), line.to_vec())],
            &options,
            "TEST",
            &CancellationToken::new(),
        );

        assert!(report.entries.iter().any(|e| e.code == "DUPLICATE-ID"));
    }

    #[test]
    fn orchestrator_honors_cancellation() {
        let options = ValidationOptions::default();
        let orchestrator = Orchestrator::new();
        let token = CancellationToken::new();
        token.cancel();
        let report = orchestrator.run(vec![("a.xml".to_owned(), b"<Root/>".to_vec())], &options, "TEST", &token);
        assert_eq!(report.error.as_deref(), Some("cancelled"));
    }
}
