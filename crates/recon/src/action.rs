//! Action resolution: (tag, diff code) → configured action.
//!
//! Two-tier lookup, kept deliberately small and pure: tag-specific entries
//! first, then the `default` identifier, else no action. A tag whose
//! entries don't cover the current diff code falls through only to
//! `default`, never to another tag.

use bibsift_record::DiffCode;

use crate::rules::{RuleCondition, RuleEntry, RuleIndex};

/// Optional evaluator for rule conditions. `None` ignores conditions,
/// matching the shipping pipeline; a predicate skips entries whose
/// condition it rejects.
pub type ConditionPredicate<'a> = &'a dyn Fn(&RuleCondition) -> bool;

/// Look up the configured action for a tag and diff code.
pub fn resolve(
    tag: &str,
    code: DiffCode,
    rules: &RuleIndex,
    predicate: Option<ConditionPredicate<'_>>,
) -> Option<crate::rules::Action> {
    scan(rules.entries(tag), code, predicate)
        .or_else(|| scan(rules.default_entries(), code, predicate))
}

fn scan(
    entries: &[RuleEntry],
    code: DiffCode,
    predicate: Option<ConditionPredicate<'_>>,
) -> Option<crate::rules::Action> {
    let letter = code.letter();
    for entry in entries {
        if let (Some(cond), Some(pred)) = (&entry.condition, predicate) {
            if !pred(cond) {
                continue;
            }
        }
        for (codes, action) in &entry.actions {
            if codes.contains(letter) {
                return Some(*action);
            }
        }
    }
    None
}
