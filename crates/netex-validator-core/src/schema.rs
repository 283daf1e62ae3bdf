//! NetEX version detection and XSD schema acquisition/caching
//! (`spec.md` §4.4).
//!
//! Acquisition order is in-memory cache, then on-disk cache, then HTTP with
//! retry and exponential backoff; network access is skippable entirely. A
//! full XSD engine is an optional plug-in (`XsdEngine`) — absent one, only
//! the "basic" structural checks run, which is enough to satisfy the EU
//! profile's mandatory elements.

use std::collections::HashMap;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::report::{DataLocation, Finding, RuleMeta, Severity};
use crate::xml::XmlTree;

/// Schema versions this engine knows how to map detected versions onto
/// (`spec.md` §4.4). Ordered ascending.
pub const KNOWN_VERSIONS: &[&str] = &["1.0", "1.1", "1.2", "1.3", "1.4", "1.15", "1.16"];

const NETEX_NAMESPACE_HINT: &str = "netex.org.uk";
const MAX_DOWNLOAD_BYTES: u64 = 32 * 1024 * 1024;
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

fn parse_major_minor(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.splitn(2, '.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().unwrap_or("0").parse().ok()?;
    Some((major, minor))
}

/// Maps a detected version onto the nearest known one: among known versions
/// sharing the detected major, the highest minor not exceeding it; if none
/// share the major, the newest known version overall.
pub fn map_to_known_version(detected: &str) -> &'static str {
    let Some((major, minor)) = parse_major_minor(detected) else {
        return newest_known_version();
    };
    KNOWN_VERSIONS
        .iter()
        .filter_map(|v| parse_major_minor(v).map(|mm| (*v, mm)))
        .filter(|&(_, (v_major, v_minor))| v_major == major && v_minor <= minor)
        .max_by_key(|&(_, mm)| mm)
        .map(|(v, _)| v)
        .unwrap_or_else(newest_known_version)
}

fn newest_known_version() -> &'static str {
    KNOWN_VERSIONS
        .iter()
        .max_by_key(|v| parse_major_minor(v).unwrap_or((0, 0)))
        .copied()
        .unwrap_or("1.0")
}

/// Detects the NetEX version and namespace presence from the document root.
#[derive(Debug, Clone, Default)]
pub struct DetectedDocument {
    pub has_netex_namespace: bool,
    pub root_is_publication_delivery: bool,
    pub raw_version: Option<String>,
    pub has_publication_timestamp: bool,
    pub has_participant_ref: bool,
    pub has_data_objects: bool,
}

pub fn detect(tree: &XmlTree) -> DetectedDocument {
    let Some(root) = tree.root() else {
        return DetectedDocument::default();
    };
    let Some(element) = tree.get(root) else {
        return DetectedDocument::default();
    };

    let has_netex_namespace = element
        .attributes
        .iter()
        .any(|a| a.name.starts_with("xmlns") && a.value.to_ascii_lowercase().contains(NETEX_NAMESPACE_HINT))
        || element.name.to_ascii_lowercase().contains("netex");

    let raw_version = element.attr("version").map(str::to_owned);

    let descendants = tree.descendants(root);
    let has_publication_timestamp = descendants
        .iter()
        .any(|&n| tree.get(n).is_some_and(|e| e.local_name == "PublicationTimestamp"));
    let has_participant_ref = descendants
        .iter()
        .any(|&n| tree.get(n).is_some_and(|e| e.local_name == "ParticipantRef"));
    let has_data_objects = descendants
        .iter()
        .any(|&n| tree.get(n).is_some_and(|e| e.local_name == "dataObjects"));

    DetectedDocument {
        has_netex_namespace,
        root_is_publication_delivery: element.local_name == "PublicationDelivery",
        raw_version,
        has_publication_timestamp,
        has_participant_ref,
        has_data_objects,
    }
}

/// A pluggable full XSD validator. Absent one, only the basic structural
/// checks in [`SchemaManager::validate`] run.
pub trait XsdEngine: Send + Sync {
    fn validate(&self, xml: &[u8], schema_xsd: &[u8], max_errors: usize) -> Vec<String>;
}

#[derive(Debug, Clone)]
struct CachedSchema {
    bytes: Vec<u8>,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CachedSchema {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Acquires and caches NetEX XSD schemas, and runs basic structural checks.
/// One instance is shared across all workers in a dataset run; the
/// in-memory cache is guarded by a single mutex (double-checked locking
/// during download, `spec.md` §5).
pub struct SchemaManager {
    memory: Mutex<HashMap<String, CachedSchema>>,
    cache_dir: Option<PathBuf>,
    allow_network: bool,
    timeout: Duration,
    ttl: Duration,
    http: Option<reqwest::blocking::Client>,
    xsd_engine: Option<Box<dyn XsdEngine>>,
    base_url: String,
}

impl SchemaManager {
    pub fn new(cache_dir: Option<PathBuf>, allow_network: bool, timeout_seconds: u64) -> Self {
        let http = if allow_network {
            reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(timeout_seconds))
                .user_agent(concat!("netex-validator/", env!("CARGO_PKG_VERSION")))
                .build()
                .ok()
        } else {
            None
        };
        Self {
            memory: Mutex::new(HashMap::new()),
            cache_dir,
            allow_network,
            timeout: Duration::from_secs(timeout_seconds),
            ttl: DEFAULT_CACHE_TTL,
            http,
            xsd_engine: None,
            base_url: "https://netex-cen.eu/schema".to_owned(),
        }
    }

    pub fn with_xsd_engine(mut self, engine: Box<dyn XsdEngine>) -> Self {
        self.xsd_engine = Some(engine);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn disk_path(&self, version: &str) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("NeTEx_publication_{version}.xsd")))
    }

    fn read_disk_cache(&self, version: &str) -> Option<CachedSchema> {
        let path = self.disk_path(version)?;
        let bytes = fs::read(&path).ok()?;
        let modified: DateTime<Utc> = fs::metadata(&path).ok()?.modified().ok()?.into();
        let expires_at = modified + chrono::Duration::from_std(self.ttl).unwrap_or_default();
        Some(CachedSchema {
            bytes,
            cached_at: modified,
            expires_at,
        })
    }

    fn write_disk_cache(&self, version: &str, bytes: &[u8]) {
        let Some(path) = self.disk_path(version) else {
            return;
        };
        let Some(parent) = path.parent() else { return };
        if fs::create_dir_all(parent).is_err() {
            return;
        }
        let tmp = path.with_extension("xsd.tmp");
        if let Ok(mut f) = fs::File::create(&tmp) {
            if f.write_all(bytes).is_ok() {
                let _ = fs::rename(&tmp, &path);
            }
        }
    }

    fn download(&self, version: &str) -> Result<Vec<u8>, String> {
        let Some(client) = &self.http else {
            return Err("network access disabled".to_owned());
        };
        let url = format!("{}/NeTEx_publication_{version}.xsd", self.base_url);
        let mut last_err = String::new();
        for attempt in 0..3u32 {
            if attempt > 0 {
                std::thread::sleep(Duration::from_millis(200 * 2u64.pow(attempt)));
            }
            match client.get(&url).send() {
                Ok(response) if response.status().is_success() => {
                    match response.bytes() {
                        Ok(body) if (body.len() as u64) <= MAX_DOWNLOAD_BYTES => {
                            return Ok(body.to_vec());
                        }
                        Ok(body) => {
                            last_err = format!("schema of {} bytes exceeds download cap", body.len());
                        }
                        Err(e) => last_err = e.to_string(),
                    }
                }
                Ok(response) => last_err = format!("HTTP {}", response.status()),
                Err(e) => last_err = e.to_string(),
            }
        }
        Err(last_err)
    }

    /// Acquires the schema for `version`, trying memory, then disk, then
    /// network in order. Returns `None` when unavailable by every path.
    pub fn acquire(&self, version: &str) -> Option<Vec<u8>> {
        let now = Utc::now();
        {
            let memory = self.memory.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = memory.get(version) {
                if !cached.is_expired(now) {
                    return Some(cached.bytes.clone());
                }
            }
        }

        if let Some(disk) = self.read_disk_cache(version) {
            if !disk.is_expired(now) {
                let mut memory = self.memory.lock().unwrap_or_else(|e| e.into_inner());
                memory.entry(version.to_owned()).or_insert(disk.clone());
                return Some(disk.bytes);
            }
        }

        if !self.allow_network {
            return None;
        }

        let mut memory = self.memory.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = memory.get(version) {
            if !cached.is_expired(now) {
                return Some(cached.bytes.clone());
            }
        }
        drop(memory);

        let bytes = self.download(version).ok()?;
        self.write_disk_cache(version, &bytes);
        let mut memory = self.memory.lock().unwrap_or_else(|e| e.into_inner());
        memory.insert(
            version.to_owned(),
            CachedSchema {
                bytes: bytes.clone(),
                cached_at: now,
                expires_at: now + chrono::Duration::from_std(self.ttl).unwrap_or_default(),
            },
        );
        Some(bytes)
    }

    /// Runs basic structural checks, and the full XSD engine when one is
    /// configured and the schema was acquired. Returns SCHEMA-UNAVAILABLE at
    /// ERROR (strict) or WARNING (lenient) when acquisition fails.
    pub fn validate(
        &self,
        tree: &XmlTree,
        file_name: &str,
        strict: bool,
        max_errors: usize,
        raw_bytes: &[u8],
    ) -> Vec<Finding> {
        let mut findings = Vec::new();
        let detected = detect(tree);

        if !detected.has_netex_namespace {
            findings.push(basic_finding(
                "SCHEMA-2",
                "Missing NetEX namespace",
                "document does not declare the NetEX namespace",
                file_name,
            ));
        } else if !detected.root_is_publication_delivery {
            findings.push(basic_finding(
                "SCHEMA-1",
                "Missing PublicationDelivery root",
                "NetEX namespace present but root element is not PublicationDelivery",
                file_name,
            ));
        }

        for (present, label) in [
            (detected.has_publication_timestamp, "PublicationTimestamp"),
            (detected.has_participant_ref, "ParticipantRef"),
            (detected.has_data_objects, "dataObjects"),
        ] {
            if !present {
                findings.push(basic_finding(
                    "SCHEMA-3",
                    "Missing required structural element",
                    &format!("document is missing required element {label}"),
                    file_name,
                ));
            }
        }

        let detected_version = detected.raw_version.as_deref().unwrap_or("1.16");
        let known_version = map_to_known_version(detected_version);

        match self.acquire(known_version) {
            Some(schema_bytes) => {
                if let Some(engine) = &self.xsd_engine {
                    for msg in engine.validate(raw_bytes, &schema_bytes, max_errors) {
                        findings.push(Finding::new(
                            RuleMeta {
                                code: "SCHEMA-4".into(),
                                name: "Schema validation error".into(),
                                message: msg,
                                severity: Severity::Error,
                            },
                            DataLocation::for_file(file_name),
                        ));
                    }
                }
            }
            None => {
                findings.push(Finding::new(
                    RuleMeta {
                        code: "SCHEMA-UNAVAILABLE".into(),
                        name: "Schema unavailable".into(),
                        message: format!("could not acquire schema for NetEX version {known_version}"),
                        severity: if strict { Severity::Error } else { Severity::Warning },
                    },
                    DataLocation::for_file(file_name),
                ));
            }
        }

        findings
    }
}

fn basic_finding(code: &str, name: &str, message: &str, file_name: &str) -> Finding {
    Finding::new(
        RuleMeta {
            code: code.to_owned(),
            name: name.to_owned(),
            message: message.to_owned(),
            severity: Severity::Error,
        },
        DataLocation::for_file(file_name),
    )
}
