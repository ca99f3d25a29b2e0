//! Action-rule table: line-oriented configuration mapping field tags and
//! diff codes to reconciliation actions.
//!
//! Grammar per non-blank line:
//!
//! ```text
//! identifier, [$subfield=value,] code1 -> action1, code2 -> action2, ...
//! ```
//!
//! `identifier` is a field tag or the literal `default`; a second token
//! starting with `$` introduces a condition clause. Repeated identifiers
//! accumulate entries in file order. Commas inside condition values are
//! not escapable.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::ReconError;

/// Identifier whose entries back every tag without a specific rule.
pub const DEFAULT_RULE_ID: &str = "default";

const DIFF_CODE_LETTERS: &str = "rca";

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Add the harvested field content next to the stored content.
    Append,
    /// Replace the stored fields with the harvested ones.
    Correct,
    /// Route the whole record update to manual review.
    HoldingPen,
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "append" => Ok(Self::Append),
            "correct" => Ok(Self::Correct),
            "holdingpen" => Ok(Self::HoldingPen),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Append => write!(f, "append"),
            Self::Correct => write!(f, "correct"),
            Self::HoldingPen => write!(f, "holdingpen"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rule entries
// ---------------------------------------------------------------------------

/// Condition clause of a rule line, e.g. `$9=arXiv`.
///
/// Parsed and carried as a typed value; whether it is evaluated is up to
/// the caller of [`crate::action::resolve`] (the shipping pipeline passes
/// no predicate and so ignores conditions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCondition {
    /// Subfield code the condition inspects (the `$`-prefixed token).
    pub subfield: String,
    /// Expected value, when the clause carried an `=`.
    pub value: Option<String>,
}

/// One rule line: optional condition plus an ordered action list.
#[derive(Debug, Clone)]
pub struct RuleEntry {
    pub condition: Option<RuleCondition>,
    /// `(code set, action)` pairs; a code set like `"ca"` matches either
    /// letter. Scanned in file order, first match wins.
    pub actions: Vec<(String, Action)>,
}

/// Rule table indexed by identifier, entry order preserved per identifier.
#[derive(Debug, Default)]
pub struct RuleIndex {
    entries: HashMap<String, Vec<RuleEntry>>,
}

impl RuleIndex {
    /// Parse a rule file. The table must define `default`.
    pub fn parse(input: &str) -> Result<Self, ReconError> {
        let mut index = RuleIndex::default();

        for (lineno, line) in input.lines().enumerate() {
            let lineno = lineno + 1;
            if line.trim().is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() < 2 {
                return Err(ReconError::RuleSyntax {
                    line: lineno,
                    message: format!(
                        "expected 'identifier, code -> action, ...', got '{}'",
                        line.trim()
                    ),
                });
            }

            let identifier = parts[0].trim().to_string();
            if identifier.is_empty() {
                return Err(ReconError::RuleSyntax {
                    line: lineno,
                    message: "empty identifier".into(),
                });
            }

            let (condition, action_parts) = if parts[1].trim().starts_with('$') {
                (Some(parse_condition(parts[1])), &parts[2..])
            } else {
                (None, &parts[1..])
            };

            if action_parts.is_empty() {
                return Err(ReconError::RuleSyntax {
                    line: lineno,
                    message: "condition clause without any 'code -> action' pair".into(),
                });
            }

            let mut actions = Vec::with_capacity(action_parts.len());
            for token in action_parts {
                actions.push(parse_action_pair(token, lineno)?);
            }

            index
                .entries
                .entry(identifier)
                .or_default()
                .push(RuleEntry { condition, actions });
        }

        if !index.entries.contains_key(DEFAULT_RULE_ID) {
            return Err(ReconError::MissingDefaultRule);
        }

        Ok(index)
    }

    /// Entries for an identifier, in file order. Empty when unknown.
    pub fn entries(&self, identifier: &str) -> &[RuleEntry] {
        self.entries
            .get(identifier)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn default_entries(&self) -> &[RuleEntry] {
        self.entries(DEFAULT_RULE_ID)
    }
}

fn parse_condition(token: &str) -> RuleCondition {
    let token = token.trim();
    match token.split_once('=') {
        Some((subfield, value)) => RuleCondition {
            subfield: subfield.trim_start_matches('$').to_string(),
            value: Some(value.to_string()),
        },
        None => RuleCondition {
            subfield: token.trim_start_matches('$').to_string(),
            value: None,
        },
    }
}

fn parse_action_pair(token: &str, lineno: usize) -> Result<(String, Action), ReconError> {
    let (code, action) = token.split_once("->").ok_or_else(|| ReconError::RuleSyntax {
        line: lineno,
        message: format!("'{}' is not a 'code -> action' pair", token.trim()),
    })?;

    let code = code.trim();
    if code.is_empty() || !code.chars().all(|c| DIFF_CODE_LETTERS.contains(c)) {
        return Err(ReconError::InvalidDiffCodes {
            line: lineno,
            token: code.into(),
        });
    }

    let action_token = action.trim();
    let action = action_token
        .parse::<Action>()
        .map_err(|_| ReconError::UnknownAction {
            line: lineno,
            token: action_token.into(),
        })?;

    Ok((code.to_string(), action))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
