//! [`ValidationOptions`]: the single typed configuration struct threaded
//! through every component. There is no config-file parser in this crate —
//! that is an out-of-scope, external concern — callers build this struct
//! directly (the CLI builds one from parsed `clap` arguments).

use std::path::PathBuf;

/// Configuration for the in-memory validation cache.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub enabled: bool,
    pub max_entries: usize,
    pub max_memory_mb: u64,
    pub ttl_hours: u64,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 512,
            max_memory_mb: 256,
            ttl_hours: 24,
        }
    }
}

/// Typed configuration plumbed to every component, per `spec.md` §6.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Organizational prefix identifying the data publisher, used for
    /// reporting only.
    pub codespace: String,
    pub skip_schema: bool,
    pub skip_xpath_rules: bool,
    pub verbose: bool,
    /// `0` means "use the schema engine's own default".
    pub max_schema_errors: u32,
    /// `0` means unlimited.
    pub max_findings: u32,
    /// Only `"eu"` is currently a recognized value; anything else keeps
    /// every built-in rule not explicitly profile-gated.
    pub profile: String,
    pub allow_schema_network: bool,
    pub schema_cache_dir: PathBuf,
    pub schema_timeout_seconds: u64,
    /// `0` means auto: `min(available_parallelism(), 4)`.
    pub concurrent_files: usize,
    /// Documents larger than this are rejected before parsing begins
    /// (`ParseError::TooLarge`), rather than left to an unbounded
    /// `quick_xml` read.
    pub max_document_bytes: u64,
    pub validation_cache: CacheOptions,
    /// When schema acquisition fails, escalate the finding to `ERROR`
    /// instead of `WARNING`.
    pub strict_schema: bool,
    /// Rule codes to disable outright.
    pub disabled_rules: Vec<String>,
    /// Per-rule severity overrides.
    pub rule_severity_overrides: Vec<(String, crate::report::Severity)>,
    /// User-defined rules appended after the built-in, filtered set.
    pub custom_rules: Vec<crate::rule::CustomRuleDef>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            codespace: String::new(),
            skip_schema: false,
            skip_xpath_rules: false,
            verbose: false,
            max_schema_errors: 0,
            max_findings: 0,
            profile: "eu".to_owned(),
            allow_schema_network: true,
            schema_cache_dir: PathBuf::from(".netex-schema-cache"),
            schema_timeout_seconds: 30,
            concurrent_files: 0,
            max_document_bytes: 64 * 1024 * 1024,
            validation_cache: CacheOptions::default(),
            strict_schema: false,
            disabled_rules: Vec::new(),
            rule_severity_overrides: Vec::new(),
            custom_rules: Vec::new(),
        }
    }
}

impl ValidationOptions {
    /// Resolves `concurrent_files = 0` ("auto") to `min(parallelism, 4)`.
    pub fn effective_concurrency(&self) -> usize {
        if self.concurrent_files != 0 {
            return self.concurrent_files;
        }
        std::thread::available_parallelism()
            .map(|n| n.get().min(4))
            .unwrap_or(1)
    }

    /// A stable string selector of the options that affect cached results,
    /// used as part of the validation cache key (`spec.md` §4.7).
    pub fn cache_selector(&self) -> String {
        format!(
            "profile={}|skip_schema={}|skip_xpath_rules={}|max_findings={}|disabled={}|overrides={}|custom={}",
            self.profile,
            self.skip_schema,
            self.skip_xpath_rules,
            self.max_findings,
            self.disabled_rules.join(","),
            self.rule_severity_overrides
                .iter()
                .map(|(code, sev)| format!("{code}:{sev}"))
                .collect::<Vec<_>>()
                .join(","),
            self.custom_rules
                .iter()
                .map(|r| format!("{}:{}", r.code, r.xpath))
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}
