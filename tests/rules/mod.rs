//! Rules module tests.

mod matcher_test;

/// Verify all public rule types are exported from the library.
#[test]
fn test_all_rule_types_exported() {
    use audit_logging::rules::{is_applicable, most_relevant, Directive, Rule, RuleError};

    let rule = Rule::default();
    assert!(rule.is_unset());
    assert!(!is_applicable(&rule, "pkg.Service.Get"));
    assert!(most_relevant("pkg.Service.Get", &[rule]).is_unset());

    let _: fn() -> RuleError = || RuleError::EmptySelector;
    let _ = Directive::AuditRequestOnly;
}
