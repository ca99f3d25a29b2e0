//! Reconciliation orchestrator: classify each harvested record into the
//! insert / append / correct / holding-pen batches.

use serde::Serialize;

use bibsift_record::{field_list_contains, record_diff, DiffCode, Field, Record};

use crate::action;
use crate::catalog::Catalog;
use crate::error::ReconError;
use crate::identity::{self, Identity, RECORD_ID_TAG};
use crate::rules::{Action, RuleIndex};

/// Title field with the dedicated change policy.
pub const TITLE_TAG: &str = "245";
/// Alternate-title field receiving rejected or accepted title updates.
pub const ALT_TITLE_TAG: &str = "246";
/// Transient attachment list, stripped before a record enters the holding pen.
pub const ATTACHMENT_TAG: &str = "FFT";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Run-level knobs. The rule index is passed separately so a loaded table
/// can back concurrent, test-isolated runs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub identity: crate::identity::IdentityConfig,
    /// Origin marker naming the external source, e.g. `arXiv`.
    pub origin_marker: String,
    /// Subfield code carrying the origin marker.
    pub origin_subfield: char,
    /// Skip identity resolution entirely; every record becomes an insert.
    pub skip_identity: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            identity: crate::identity::IdentityConfig::default(),
            origin_marker: "arXiv".into(),
            origin_subfield: '9',
            skip_identity: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The four output batches, in classification order. A record may appear
/// in more than one batch (e.g. corrected fields plus a holding-pen copy).
#[derive(Debug, Default)]
pub struct Batches {
    pub insert: Vec<Record>,
    pub append: Vec<Record>,
    pub correct: Vec<Record>,
    pub holding_pen: Vec<Record>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub inserted: usize,
    pub appended: usize,
    pub corrected: usize,
    pub held: usize,
}

impl Batches {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            inserted: self.insert.len(),
            appended: self.append.len(),
            corrected: self.correct.len(),
            held: self.holding_pen.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Classify every harvested record. Strictly sequential; the only fatal
/// errors are deployment-level (rule/identity configuration, failed
/// search). Per-record anomalies degrade to the holding pen.
pub fn run(
    records: Vec<Record>,
    rules: &RuleIndex,
    config: &EngineConfig,
    catalog: &dyn Catalog,
) -> Result<Batches, ReconError> {
    let mut batches = Batches::default();

    for record in records {
        let identity = if config.skip_identity {
            Identity::New
        } else {
            identity::resolve(&record, &config.identity, catalog)?
        };

        match identity {
            Identity::New => batches.insert.push(record),
            Identity::Ambiguous => batches.holding_pen.push(record),
            Identity::Existing(recid) => {
                // A vanished stored record is a per-record anomaly, not a
                // fatal error.
                match catalog.fetch(&recid) {
                    Ok(Some(stored)) => {
                        reconcile_existing(record, &stored, &recid, rules, config, &mut batches);
                    }
                    Ok(None) | Err(_) => batches.holding_pen.push(record),
                }
            }
        }
    }

    Ok(batches)
}

/// Field-level reconciliation of one harvested record against its stored
/// counterpart.
fn reconcile_existing(
    record: Record,
    stored: &Record,
    recid: &str,
    rules: &RuleIndex,
    config: &EngineConfig,
    batches: &mut Batches,
) {
    let mut to_append: Vec<(String, Vec<Field>)> = Vec::new();
    let mut to_correct: Vec<(String, Vec<Field>)> = Vec::new();
    let mut holding_pen = false;

    let diff = record_diff(stored, &record);
    for (tag, code) in &diff {
        let tag = tag.as_str();
        let harvested_fields = record.fields(tag);
        let stored_fields = stored.fields(tag);

        if tag == TITLE_TAG && *code == DiffCode::Changed {
            let Some(title) = harvested_fields.first() else {
                continue;
            };
            // A title correction is only trusted when both sides came from
            // the external source.
            if both_sides_origin_marked(harvested_fields, stored_fields, config) {
                to_correct.push((tag.to_string(), vec![title.clone()]));
            } else {
                holding_pen = true;
            }
            // Either way, stage the incoming title as an alternate title
            // unless one is already on file.
            if !field_list_contains(stored.fields(ALT_TITLE_TAG), title) {
                to_append.push((ALT_TITLE_TAG.to_string(), vec![title.clone()]));
            }
            continue;
        }

        // Origin-marked on both sides: merge instead of blindly replacing.
        // Keep the origin-marked stored instances, add harvested instances
        // not already present, and treat the tag as corrected whatever the
        // rule table says.
        let mut merged: Vec<Field> = Vec::new();
        if both_sides_origin_marked(harvested_fields, stored_fields, config) {
            for field in stored_fields {
                if has_origin_marker(field, config) {
                    merged.push(field.clone());
                }
            }
            for field in harvested_fields {
                if !field_list_contains(&merged, field) {
                    merged.push(field.clone());
                }
            }
        }

        let configured = action::resolve(tag, *code, rules, None);

        if configured == Some(Action::HoldingPen) {
            holding_pen = true;
        }

        if configured == Some(Action::Correct) || !merged.is_empty() {
            let fields = if merged.is_empty() {
                harvested_fields.to_vec()
            } else {
                merged
            };
            to_correct.push((tag.to_string(), fields));
        }

        if configured == Some(Action::Append) {
            to_append.push((tag.to_string(), harvested_fields.to_vec()));
        }
    }

    if let Some(rec) = record_from_groups(recid, &to_append) {
        batches.append.push(rec);
    }
    if let Some(rec) = record_from_groups(recid, &to_correct) {
        batches.correct.push(rec);
    }
    if holding_pen {
        let mut held = record;
        held.remove_tag(ATTACHMENT_TAG);
        batches.holding_pen.push(held);
    }
}

fn has_origin_marker(field: &Field, config: &EngineConfig) -> bool {
    field
        .subfield_values(config.origin_subfield)
        .any(|v| v == config.origin_marker)
}

fn any_origin_marker(fields: &[Field], config: &EngineConfig) -> bool {
    fields.iter().any(|f| has_origin_marker(f, config))
}

fn both_sides_origin_marked(
    harvested: &[Field],
    stored: &[Field],
    config: &EngineConfig,
) -> bool {
    any_origin_marker(harvested, config) && any_origin_marker(stored, config)
}

/// Minimal record carrying the staged field groups plus the catalog
/// identifier. `None` when nothing was staged.
fn record_from_groups(recid: &str, groups: &[(String, Vec<Field>)]) -> Option<Record> {
    let mut rec = Record::new();
    for (tag, fields) in groups {
        for field in fields {
            if Record::is_control_tag(tag) {
                rec.add_control(tag, field.value.clone());
            } else {
                rec.add_data(tag, field.ind1, field.ind2, field.subfields.clone());
            }
        }
    }
    if rec.is_empty() {
        return None;
    }
    rec.add_control(RECORD_ID_TAG, recid);
    Some(rec)
}
