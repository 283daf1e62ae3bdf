//! Assembles a [`super::NetexDataset`]: one common file declaring the
//! shared network/operators/stop points, plus one file per line declaring
//! a `Line`, its `Route`s, `JourneyPattern`s and `ServiceJourney`s.

use std::fmt::Write as _;

use rand::Rng;
use rand::rngs::StdRng;

use super::identifiers::{VERSION, random_transport_mode, random_transport_submode, structured_id};
use super::{GeneratorConfig, NetexDataset};

const TIMESTAMP: &str = "2024-01-01T00:00:00";

fn wrap(codespace: &str, body: &str) -> Vec<u8> {
    format!(
        r#"<PublicationDelivery xmlns="http://www.netex.org.uk/netex" version="1.15">
    <PublicationTimestamp>{TIMESTAMP}</PublicationTimestamp>
    <ParticipantRef>{codespace}</ParticipantRef>
    <dataObjects>{body}</dataObjects>
</PublicationDelivery>"#
    )
    .into_bytes()
}

fn maybe_dangling(id: &str, rng: &mut StdRng, rate: f64) -> String {
    if rng.gen_bool(rate.clamp(0.0, 1.0)) {
        format!("{id}-DANGLING")
    } else {
        id.to_owned()
    }
}

pub fn build(config: &GeneratorConfig, rng: &mut StdRng) -> NetexDataset {
    let codespace = config.codespace.as_str();

    let authority_id = structured_id(codespace, "Authority", 1);
    let network_id = structured_id(codespace, "Network", 1);

    let operator_ids: Vec<String> = (1..=config.num_operators.max(1))
        .map(|i| structured_id(codespace, "Operator", i as u64))
        .collect();

    let stop_point_ids: Vec<String> = (1..=config.num_stop_points.max(1))
        .map(|i| structured_id(codespace, "ScheduledStopPoint", i as u64))
        .collect();

    let mut common = String::new();
    let _ = write!(
        common,
        r#"<Authority id="{authority_id}" version="{VERSION}"><Name>Bench Authority</Name></Authority>"#
    );
    let _ = write!(
        common,
        r#"<Network id="{network_id}" version="{VERSION}"><Name>Bench Network</Name><AuthorityRef ref="{authority_id}" version="{VERSION}"/></Network>"#
    );
    for operator_id in &operator_ids {
        let _ = write!(
            common,
            r#"<Operator id="{operator_id}" version="{VERSION}"><Name>Operator {operator_id}</Name></Operator>"#
        );
    }
    for stop_id in &stop_point_ids {
        let _ = write!(
            common,
            r#"<ScheduledStopPoint id="{stop_id}" version="{VERSION}"><Name>Stop {stop_id}</Name></ScheduledStopPoint>"#
        );
    }

    let mut entries = vec![("_common.xml".to_owned(), wrap(codespace, &common))];

    for line_index in 1..=config.num_lines.max(1) {
        let line_id = structured_id(codespace, "Line", line_index as u64);
        let operator_ref = &operator_ids[(line_index - 1) % operator_ids.len()];
        let mode = random_transport_mode(rng);
        let submode = random_transport_submode(rng);

        let mut body = String::new();
        let _ = write!(
            body,
            r#"<Line id="{line_id}" version="{VERSION}"><Name>Line {line_id}</Name><TransportMode>{mode}</TransportMode><TransportSubmode>{submode}</TransportSubmode><OperatorRef ref="{}" version="{VERSION}"/></Line>"#,
            maybe_dangling(operator_ref, rng, config.dangling_ref_rate)
        );

        for route_index in 1..=config.num_routes_per_line.max(1) {
            let route_id = structured_id(codespace, "Route", (line_index * 1000 + route_index) as u64);
            let _ = write!(
                body,
                r#"<Route id="{route_id}" version="{VERSION}"><Name>Route {route_id}</Name><LineRef ref="{}" version="{VERSION}"/></Route>"#,
                maybe_dangling(&line_id, rng, config.dangling_ref_rate)
            );

            for pattern_index in 1..=config.num_journey_patterns_per_route.max(1) {
                let pattern_base = (line_index * 1_000_000 + route_index * 1000 + pattern_index) as u64;
                let pattern_id = structured_id(codespace, "JourneyPattern", pattern_base);
                let mut points_in_sequence = String::new();
                for (stop_order, stop_id) in stop_point_ids.iter().take(4).enumerate() {
                    let stop_point_id = structured_id(
                        codespace,
                        "StopPointInJourneyPattern",
                        pattern_base * 10 + (stop_order as u64 + 1),
                    );
                    let _ = write!(
                        points_in_sequence,
                        r#"<StopPointInJourneyPattern id="{stop_point_id}" version="{VERSION}" order="{}"><ScheduledStopPointRef ref="{}" version="{VERSION}"/></StopPointInJourneyPattern>"#,
                        stop_order + 1,
                        maybe_dangling(stop_id, rng, config.dangling_ref_rate)
                    );
                }
                let _ = write!(
                    body,
                    r#"<JourneyPattern id="{pattern_id}" version="{VERSION}"><RouteRef ref="{}" version="{VERSION}"/><pointsInSequence>{points_in_sequence}</pointsInSequence></JourneyPattern>"#,
                    maybe_dangling(&route_id, rng, config.dangling_ref_rate)
                );

                for journey_index in 1..=config.num_service_journeys_per_pattern.max(1) {
                    let journey_id = structured_id(
                        codespace,
                        "ServiceJourney",
                        (line_index * 1_000_000_000 + route_index * 1_000_000 + pattern_index * 1000 + journey_index)
                            as u64,
                    );
                    let mut passing_times = String::new();
                    for stop_order in 1..=4 {
                        let _ = write!(
                            passing_times,
                            r#"<TimetabledPassingTime id="{journey_id}-TPT-{stop_order}" version="{VERSION}"/>"#
                        );
                    }
                    let _ = write!(
                        body,
                        r#"<ServiceJourney id="{journey_id}" version="{VERSION}"><JourneyPatternRef ref="{}" version="{VERSION}"/>{passing_times}</ServiceJourney>"#,
                        maybe_dangling(&pattern_id, rng, config.dangling_ref_rate)
                    );
                }
            }
        }

        let file_name = format!("line_{line_index:05}.xml");
        entries.push((file_name, wrap(codespace, &body)));

        if rng.gen_bool(config.duplicate_id_rate.clamp(0.0, 1.0)) {
            let duplicate_body = format!(
                r#"<Line id="{line_id}" version="{VERSION}"><Name>Duplicate of {line_id}</Name><TransportMode>{mode}</TransportMode><TransportSubmode>{submode}</TransportSubmode><OperatorRef ref="{operator_ref}" version="{VERSION}"/></Line>"#
            );
            entries.push((format!("line_{line_index:05}_dup.xml"), wrap(codespace, &duplicate_body)));
        }
    }

    NetexDataset { entries }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use rand::SeedableRng;

    use super::*;
    use crate::generator::SizeTier;

    #[test]
    fn small_tier_produces_common_plus_one_file_per_line() {
        let config = SizeTier::Small.config(1);
        let mut rng = StdRng::seed_from_u64(config.seed);
        let dataset = build(&config, &mut rng);
        assert_eq!(dataset.entries.len(), config.num_lines + 1);
        assert_eq!(dataset.entries[0].0, "_common.xml");
    }

    #[test]
    fn dangling_ref_rate_one_always_breaks_operator_ref() {
        let mut config = SizeTier::Small.config(1);
        config.dangling_ref_rate = 1.0;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let dataset = build(&config, &mut rng);
        let line_file = std::str::from_utf8(&dataset.entries[1].1).expect("utf8");
        assert!(line_file.contains("-DANGLING"));
    }
}
