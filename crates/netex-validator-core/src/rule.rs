//! Rule data model: a `Rule` is a plain value, never a Rust type per rule
//! (`spec.md` §9 — "Rule definitions... expressed as data, not code").

use std::collections::HashSet;
use std::fmt;

use crate::report::Severity;

/// A validation rule's category, derived from its code's prefix
/// (`spec.md` §4.3). Unknown prefixes map to `Custom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Line,
    Route,
    ServiceJourney,
    FlexibleLine,
    Network,
    JourneyPattern,
    StopPoint,
    Version,
    TransportMode,
    Booking,
    Calendar,
    Validity,
    DatedServiceJourney,
    DeadRun,
    Interchange,
    Notice,
    Frame,
    FlexibleService,
    Block,
    CourseOfJourneys,
    TariffZone,
    ResponsibilitySet,
    TypeOfService,
    Group,
    ReferenceConsistency,
    Custom,
}

impl Category {
    /// Categories kept when `profile == "eu"` (see Glossary: EU allow-list).
    pub fn in_eu_allow_list(self) -> bool {
        matches!(
            self,
            Category::Line
                | Category::Route
                | Category::TransportMode
                | Category::Version
                | Category::JourneyPattern
                | Category::StopPoint
                | Category::Calendar
                | Category::Validity
                | Category::Interchange
                | Category::Group
                | Category::TariffZone
                | Category::ResponsibilitySet
                | Category::TypeOfService
        )
    }

    /// Derives a category from a rule code's prefix (the token before the
    /// first `_`), case-insensitively.
    pub fn from_code(code: &str) -> Self {
        let prefix = code.split('_').next().unwrap_or(code).to_ascii_uppercase();
        match prefix.as_str() {
            "LINE" => Category::Line,
            "ROUTE" => Category::Route,
            "SERVICEJOURNEY" | "SJ" => Category::ServiceJourney,
            "FLEXIBLELINE" => Category::FlexibleLine,
            "NETWORK" => Category::Network,
            "JOURNEYPATTERN" | "JP" => Category::JourneyPattern,
            "STOPPOINT" | "SP" => Category::StopPoint,
            "VERSION" => Category::Version,
            "TRANSPORTMODE" | "TM" => Category::TransportMode,
            "BOOKING" => Category::Booking,
            "CALENDAR" => Category::Calendar,
            "VALIDITY" => Category::Validity,
            "DATEDSERVICEJOURNEY" | "DSJ" => Category::DatedServiceJourney,
            "DEADRUN" => Category::DeadRun,
            "INTERCHANGE" => Category::Interchange,
            "NOTICE" => Category::Notice,
            "FRAME" => Category::Frame,
            "FLEXIBLESERVICE" => Category::FlexibleService,
            "BLOCK" => Category::Block,
            "COURSEOFJOURNEYS" | "COJ" => Category::CourseOfJourneys,
            "TARIFFZONE" | "TZ" => Category::TariffZone,
            "RESPONSIBILITYSET" | "RS" => Category::ResponsibilitySet,
            "TYPEOFSERVICE" | "TOS" => Category::TypeOfService,
            "GROUP" => Category::Group,
            "REF" | "REFERENCE" => Category::ReferenceConsistency,
            _ => Category::Custom,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Line => "line",
            Category::Route => "route",
            Category::ServiceJourney => "service_journey",
            Category::FlexibleLine => "flexible_line",
            Category::Network => "network",
            Category::JourneyPattern => "journey_pattern",
            Category::StopPoint => "stop_point",
            Category::Version => "version",
            Category::TransportMode => "transport_mode",
            Category::Booking => "booking",
            Category::Calendar => "calendar",
            Category::Validity => "validity",
            Category::DatedServiceJourney => "dated_service_journey",
            Category::DeadRun => "dead_run",
            Category::Interchange => "interchange",
            Category::Notice => "notice",
            Category::Frame => "frame",
            Category::FlexibleService => "flexible_service",
            Category::Block => "block",
            Category::CourseOfJourneys => "course_of_journeys",
            Category::TariffZone => "tariff_zone",
            Category::ResponsibilitySet => "responsibility_set",
            Category::TypeOfService => "type_of_service",
            Category::Group => "group",
            Category::ReferenceConsistency => "reference-consistency",
            Category::Custom => "custom",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A built-in rule definition, as a `const`-constructible literal. No
/// per-rule Rust type exists; adding a rule is purely additive — append a
/// `RuleDef` to `registry::BUILTIN_RULES`.
#[derive(Debug, Clone, Copy)]
pub struct RuleDef {
    pub code: &'static str,
    pub name: &'static str,
    pub message: &'static str,
    pub severity: Severity,
    pub xpath: &'static str,
    /// `true` for rules the source engine could not execute correctly
    /// because they depended on `current()`; these are disabled with a
    /// one-time informational entry (`spec.md` §9 Open Questions).
    pub requires_current: bool,
}

impl RuleDef {
    pub fn category(&self) -> Category {
        Category::from_code(self.code)
    }
}

/// A user-supplied rule, appended after the filtered built-in set
/// (`spec.md` §4.3 step 4).
#[derive(Debug, Clone)]
pub struct CustomRuleDef {
    pub code: String,
    pub name: String,
    pub message: String,
    pub severity: Severity,
    pub xpath: String,
}

/// A fully-resolved rule ready for the XPath Rule Runner: either a built-in
/// `RuleDef` reference or an owned custom definition, normalized to one
/// shape so the runner does not need to special-case the source.
#[derive(Debug, Clone)]
pub struct Rule {
    pub code: String,
    pub name: String,
    pub message: String,
    pub severity: Severity,
    pub xpath: String,
    pub category: Category,
}

impl From<&RuleDef> for Rule {
    fn from(def: &RuleDef) -> Self {
        Self {
            code: def.code.to_owned(),
            name: def.name.to_owned(),
            message: def.message.to_owned(),
            severity: def.severity,
            xpath: def.xpath.to_owned(),
            category: def.category(),
        }
    }
}

impl From<&CustomRuleDef> for Rule {
    fn from(def: &CustomRuleDef) -> Self {
        Self {
            code: def.code.clone(),
            name: def.name.clone(),
            message: def.message.clone(),
            severity: def.severity,
            xpath: def.xpath.clone(),
            category: Category::from_code(&def.code),
        }
    }
}

/// Returns the set of categories present in `rules`, for
/// `Registry::list_categories`.
pub fn categories_of<'a>(rules: impl IntoIterator<Item = &'a Rule>) -> HashSet<Category> {
    rules.into_iter().map(|r| r.category).collect()
}
