//! Selection of the most specific rule for a method.

use super::rule::Rule;

/// Check whether a rule's selector covers the given method.
///
/// `*` covers every method, a selector ending in `*` covers methods starting
/// with the rest of the selector, and any other selector must equal the
/// method name.
#[must_use]
pub fn is_applicable(rule: &Rule, method_name: &str) -> bool {
    if rule.selector == "*" {
        return true;
    }
    match rule.selector.strip_suffix('*') {
        Some(prefix) => method_name.starts_with(prefix),
        None => rule.selector == method_name,
    }
}

/// Return the applicable rule with the longest selector.
///
/// An exact match is returned as soon as it is seen. A wildcard as long as
/// the method name (`foo.ge*` for `foo.get`) does not stop the scan, so an
/// exact selector later in `rules` still wins. When two applicable
/// selectors have the same length the first one in `rules` wins, but which
/// one wins on such a tie is not part of the contract.
///
/// Returns [`Rule::default`] when no rule applies.
#[must_use]
pub fn most_relevant(method_name: &str, rules: &[Rule]) -> Rule {
    let mut best: Option<&Rule> = None;

    for rule in rules.iter().filter(|rule| is_applicable(rule, method_name)) {
        if rule.selector == method_name {
            best = Some(rule);
            break;
        }
        if best.map_or(true, |b| rule.selector.len() > b.selector.len()) {
            best = Some(rule);
        }
    }

    match best {
        Some(rule) => {
            tracing::trace!(method = %method_name, selector = %rule.selector, "Matched audit rule");
            rule.clone()
        }
        None => {
            tracing::trace!(method = %method_name, "No audit rule applies");
            Rule::default()
        }
    }
}
