//! Integration tests for rule matching.

use audit_logging::audit::LogType;
use audit_logging::rules::{is_applicable, most_relevant, Directive, Rule};

fn rule(selector: &str, directive: Directive) -> Rule {
    Rule::new(selector, directive, LogType::DataAccess)
}

fn method_names() -> Vec<&'static str> {
    vec![
        "",
        "a",
        "foo.get",
        "foo.getgud",
        "foo.bar.baz",
        "google.pubsub.v1.Publisher.Publish",
    ]
}

#[test]
fn wildcard_applies_to_every_method() {
    let star = rule("*", Directive::Audit);
    for method in method_names() {
        assert!(is_applicable(&star, method), "'*' should cover '{method}'");
    }
}

#[test]
fn selector_applicability_examples() {
    assert!(is_applicable(&rule("foo.*", Directive::Audit), "foo.get"));
    assert!(!is_applicable(&rule("foo.*", Directive::Audit), "bar.get"));
    assert!(is_applicable(&rule("foo.get", Directive::Audit), "foo.get"));
    assert!(!is_applicable(&rule("foo.get", Directive::Audit), "bar.getgud"));
}

#[test]
fn most_relevant_returns_longest_applicable_selector() {
    let rules = vec![
        rule("*", Directive::Audit),
        rule("google.*", Directive::AuditRequestOnly),
        rule("google.pubsub.v1.*", Directive::AuditRequestAndResponse),
        rule("foo.*", Directive::Audit),
    ];

    for method in method_names() {
        let best = most_relevant(method, &rules);
        let longest = rules
            .iter()
            .filter(|r| is_applicable(r, method))
            .map(|r| r.selector.len())
            .max()
            .unwrap_or(0);
        assert_eq!(best.selector.len(), longest, "method '{method}'");
        assert!(is_applicable(&best, method));
    }
}

#[test]
fn exact_selector_wins_regardless_of_position() {
    let exact = rule("foo.get", Directive::AuditRequestAndResponse);
    let others = [
        rule("*", Directive::Audit),
        rule("foo.*", Directive::AuditRequestOnly),
        rule("foo.get*", Directive::Audit),
    ];

    for position in 0..=others.len() {
        let mut rules = others.to_vec();
        rules.insert(position, exact.clone());
        assert_eq!(most_relevant("foo.get", &rules), exact, "position {position}");
    }
}

#[test]
fn no_applicable_rule_yields_zero_rule() {
    let rules = vec![
        rule("foo.*", Directive::Audit),
        rule("bar.get", Directive::Audit),
    ];
    for method in ["baz.get", "bar.getgud", "fo"] {
        let matched = most_relevant(method, &rules);
        assert!(matched.is_unset(), "method '{method}'");
        assert_eq!(matched.directive, Directive::Unspecified);
    }
}

#[test]
fn matching_is_deterministic() {
    let rules = vec![rule("a.*", Directive::Audit), rule("b.*", Directive::AuditRequestOnly)];
    let first = most_relevant("a.x", &rules);
    for _ in 0..10 {
        assert_eq!(most_relevant("a.x", &rules), first);
    }
}
