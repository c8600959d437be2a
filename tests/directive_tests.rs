// tests/directive_tests.rs
use lb_chatops::balancer::Algorithm;
use lb_chatops::directive::{DirectiveAction, DirectiveParser};

use proptest::prelude::*;

#[test]
fn parses_well_formed_chat_text_with_typos() {
    let parser = DirectiveParser::new();
    let text = "loadbalcer name :demo\n\
                algo:roundrobin\n\
                instacen count:2\n\
                url:http://localhost:8080/chat";

    let directive = parser.parse(text);

    assert_eq!(directive.action, DirectiveAction::CreateLoadBalancer);
    assert_eq!(directive.criteria.name.as_deref(), Some("demo"));
    assert_eq!(directive.parameters.algorithm, Algorithm::RoundRobin);

    let instances = &directive.parameters.instances;
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0].name, "instance1");
    assert_eq!(instances[1].name, "instance2");
    for instance in instances {
        assert_eq!(instance.url, "http://localhost:8080/chat");
        assert_eq!(instance.weight, 1);
    }
}

#[test]
fn parses_clean_spelling_and_equals_separators() {
    let parser = DirectiveParser::new();
    let text = "load balancer name = payments\n\
                algorithm = leastconn\n\
                instance count = 3\n\
                url = https://pay.internal:9000";

    let directive = parser.parse(text);

    assert_eq!(directive.criteria.name.as_deref(), Some("payments"));
    assert_eq!(directive.parameters.algorithm, Algorithm::LeastConn);
    assert_eq!(directive.parameters.instances.len(), 3);
    assert_eq!(directive.parameters.instances[2].name, "instance3");
}

#[test]
fn missing_url_yields_no_instances() {
    let parser = DirectiveParser::new();
    let text = "loadbalcer name :demo\nalgo:roundrobin\ninstacen count:2";

    let directive = parser.parse(text);

    assert_eq!(directive.criteria.name.as_deref(), Some("demo"));
    assert!(directive.parameters.instances.is_empty());
}

#[test]
fn instance_count_defaults_to_one() {
    let parser = DirectiveParser::new();
    let directive = parser.parse("url:http://localhost:3000");

    assert_eq!(directive.parameters.instances.len(), 1);
    assert_eq!(directive.parameters.instances[0].name, "instance1");
}

#[test]
fn explicit_zero_count_suppresses_synthesis() {
    let parser = DirectiveParser::new();
    let directive = parser.parse("instance count:0\nurl:http://localhost:3000");

    assert!(directive.parameters.instances.is_empty());
}

#[test]
fn algorithm_tokens_map_to_canonical_names() {
    let parser = DirectiveParser::new();

    let cases = [
        ("algo:roundrobin", Algorithm::RoundRobin),
        ("algo:leastconn", Algorithm::LeastConn),
        ("algo:LEASTCONN", Algorithm::LeastConn),
        ("algo:random", Algorithm::Other("random".to_string())),
        ("algo:magic", Algorithm::RoundRobin),
        ("algorithm:weighted", Algorithm::RoundRobin),
    ];

    for (line, expected) in cases {
        let directive = parser.parse(line);
        assert_eq!(directive.parameters.algorithm, expected, "line: {line}");
    }
}

#[test]
fn algorithm_defaults_to_round_robin_when_absent() {
    let parser = DirectiveParser::new();
    let directive = parser.parse("url:http://localhost:3000");

    assert_eq!(directive.parameters.algorithm, Algorithm::RoundRobin);
}

#[test]
fn last_match_wins_for_recurring_fields() {
    let parser = DirectiveParser::new();
    let text = "algo:leastconn\n\
                url:http://first.internal\n\
                algo:roundrobin\n\
                url:http://second.internal";

    let directive = parser.parse(text);

    assert_eq!(directive.parameters.algorithm, Algorithm::RoundRobin);
    assert_eq!(directive.parameters.instances[0].url, "http://second.internal");
}

#[test]
fn unmatched_lines_are_silently_skipped() {
    let parser = DirectiveParser::new();
    let text = "hey can you set something up for me?\n\
                loadbalcer name :demo\n\
                thanks!!\n\
                url:http://localhost:8080/chat\n\
                :::\n";

    let directive = parser.parse(text);

    assert_eq!(directive.criteria.name.as_deref(), Some("demo"));
    assert_eq!(directive.parameters.instances.len(), 1);
}

#[test]
fn text_matching_nothing_still_yields_a_directive() {
    let parser = DirectiveParser::new();
    let directive = parser.parse("good morning team");

    assert_eq!(directive.action, DirectiveAction::CreateLoadBalancer);
    assert_eq!(directive.criteria.name, None);
    assert_eq!(directive.parameters.algorithm, Algorithm::RoundRobin);
    assert!(directive.parameters.instances.is_empty());
}

proptest! {
    #[test]
    fn parsing_never_panics_and_is_deterministic(text in any::<String>()) {
        let parser = DirectiveParser::new();
        let first = parser.parse(&text);
        let second = parser.parse(&text);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn field_order_is_irrelevant(
        lines in Just(vec![
            "loadbalcer name :demo".to_string(),
            "algo:leastconn".to_string(),
            "instacen count:3".to_string(),
            "url:http://localhost:8080/chat".to_string(),
        ]).prop_shuffle()
    ) {
        let parser = DirectiveParser::new();
        let directive = parser.parse(&lines.join("\n"));

        prop_assert_eq!(directive.criteria.name.as_deref(), Some("demo"));
        prop_assert_eq!(&directive.parameters.algorithm, &Algorithm::LeastConn);
        prop_assert_eq!(directive.parameters.instances.len(), 3);
    }
}
