//! Structured NetEX id generation, matching the `Codespace:EntityType:Id`
//! shape `id_repository::validate_id_format` accepts (see its `STRUCTURED`
//! pattern and the `KNOWN_ENTITY_TYPES` allow-list).

use rand::Rng;

/// Builds a structured id of the form `{codespace}:{entity_type}:{counter}`.
pub fn structured_id(codespace: &str, entity_type: &str, counter: u64) -> String {
    format!("{codespace}:{entity_type}:{counter}")
}

/// Every version attribute this generator emits; kept at `"1"` so
/// `VERSION_1` and version-consistency checks never fire spuriously.
pub const VERSION: &str = "1";

const TRANSPORT_MODES: &[&str] = &["bus", "rail", "tram", "metro", "coach", "water", "air"];

pub fn random_transport_mode(rng: &mut impl Rng) -> &'static str {
    TRANSPORT_MODES[rng.gen_range(0..TRANSPORT_MODES.len())]
}

const TRANSPORT_SUBMODES: &[&str] = &["localBus", "expressBus", "localTram", "urbanRail"];

pub fn random_transport_submode(rng: &mut impl Rng) -> &'static str {
    TRANSPORT_SUBMODES[rng.gen_range(0..TRANSPORT_SUBMODES.len())]
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn structured_id_has_three_colon_separated_parts() {
        let id = structured_id("BENCH", "Line", 7);
        let parts: Vec<&str> = id.split(':').collect();
        assert_eq!(parts, vec!["BENCH", "Line", "7"]);
    }
}
