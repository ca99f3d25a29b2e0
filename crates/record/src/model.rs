use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// Stable handle to one field instance within a [`Record`].
///
/// Handles are unique within their record and survive deletion or
/// replacement of *other* fields; they are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u32);

/// One `(code, value)` pair nested within a data field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subfield {
    pub code: char,
    pub value: String,
}

impl Subfield {
    pub fn new(code: char, value: impl Into<String>) -> Self {
        Self { code, value: value.into() }
    }
}

/// A single field instance.
///
/// Control fields (tag numerically < 011) carry `value` and nothing else;
/// data fields carry two indicators plus subfields and leave `value` empty.
#[derive(Debug, Clone)]
pub struct Field {
    id: FieldId,
    pub ind1: char,
    pub ind2: char,
    pub subfields: Vec<Subfield>,
    pub value: String,
}

impl Field {
    pub fn id(&self) -> FieldId {
        self.id
    }

    /// Values of every subfield with the given code, in order.
    pub fn subfield_values(&self, code: char) -> impl Iterator<Item = &str> {
        self.subfields
            .iter()
            .filter(move |s| s.code == code)
            .map(|s| s.value.as_str())
    }

    /// Structural duplicate check: same indicators and control value, and
    /// every subfield of `other` also present on `self`. Used to avoid
    /// staging a field the stored record already carries.
    pub fn covers(&self, other: &Field) -> bool {
        self.ind1 == other.ind1
            && self.ind2 == other.ind2
            && self.value == other.value
            && other.subfields.iter().all(|s| self.subfields.contains(s))
    }
}

// Handle identity is excluded: two fields are equal when their content is.
impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.ind1 == other.ind1
            && self.ind2 == other.ind2
            && self.value == other.value
            && self.subfields == other.subfields
    }
}

impl Eq for Field {}

/// True when some instance in `list` structurally duplicates `field`.
pub fn field_list_contains(list: &[Field], field: &Field) -> bool {
    list.iter().any(|existing| field.covers(existing))
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// An ordered mapping from 3-character tag to field instances.
///
/// Tags iterate in sorted order; instances for one tag keep harvest order.
/// Fields live in an owned arena per tag and are addressed by [`FieldId`]
/// for structural edits, so a delete or replace never invalidates handles
/// to the remaining fields.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: BTreeMap<String, Vec<Field>>,
    next_id: u32,
}

// Content equality; the handle counter is bookkeeping.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for Record {}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a tag addresses a control field (numerically < 011).
    pub fn is_control_tag(tag: &str) -> bool {
        tag.parse::<u32>().map(|n| n < 11).unwrap_or(false)
    }

    fn alloc_id(&mut self) -> FieldId {
        let id = FieldId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a control field instance.
    pub fn add_control(&mut self, tag: &str, value: impl Into<String>) -> FieldId {
        let id = self.alloc_id();
        self.fields.entry(tag.to_string()).or_default().push(Field {
            id,
            ind1: ' ',
            ind2: ' ',
            subfields: Vec::new(),
            value: value.into(),
        });
        id
    }

    /// Append a data field instance.
    pub fn add_data(
        &mut self,
        tag: &str,
        ind1: char,
        ind2: char,
        subfields: Vec<Subfield>,
    ) -> FieldId {
        let id = self.alloc_id();
        self.fields.entry(tag.to_string()).or_default().push(Field {
            id,
            ind1,
            ind2,
            subfields,
            value: String::new(),
        });
        id
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.fields.get(tag).map(|v| !v.is_empty()).unwrap_or(false)
    }

    /// Field instances for a tag, harvest order. Empty slice when absent.
    pub fn fields(&self, tag: &str) -> &[Field] {
        self.fields.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First control value for a tag (e.g. the `001` record identifier).
    pub fn control_value(&self, tag: &str) -> Option<&str> {
        self.fields(tag).first().map(|f| f.value.as_str())
    }

    /// Subfield values with `code` across every instance of `tag`.
    pub fn subfield_values(&self, tag: &str, code: char) -> Vec<&str> {
        self.fields(tag)
            .iter()
            .flat_map(|f| f.subfield_values(code))
            .collect()
    }

    /// Remove every instance of a tag. Returns whether anything was removed.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.fields.remove(tag).is_some()
    }

    /// Remove one field instance by handle.
    pub fn remove_field(&mut self, id: FieldId) -> bool {
        for instances in self.fields.values_mut() {
            if let Some(pos) = instances.iter().position(|f| f.id == id) {
                instances.remove(pos);
                return true;
            }
        }
        false
    }

    /// Replace the subfields of one data field in place, keeping its handle.
    pub fn replace_subfields(&mut self, id: FieldId, subfields: Vec<Subfield>) -> bool {
        for instances in self.fields.values_mut() {
            if let Some(field) = instances.iter_mut().find(|f| f.id == id) {
                field.subfields = subfields;
                return true;
            }
        }
        false
    }

    /// Tags present, sorted. Tags whose instance list emptied out are skipped.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Field])> {
        self.fields
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(Vec::is_empty)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn title(value: &str) -> Vec<Subfield> {
        vec![Subfield::new('a', value)]
    }

    #[test]
    fn control_tag_boundary() {
        assert!(Record::is_control_tag("001"));
        assert!(Record::is_control_tag("010"));
        assert!(!Record::is_control_tag("011"));
        assert!(!Record::is_control_tag("245"));
        assert!(!Record::is_control_tag("FFT"));
    }

    #[test]
    fn instances_keep_harvest_order() {
        let mut rec = Record::new();
        rec.add_data("650", ' ', ' ', title("first"));
        rec.add_data("650", ' ', ' ', title("second"));
        rec.add_data("100", ' ', ' ', title("author"));

        let values: Vec<_> = rec.subfield_values("650", 'a');
        assert_eq!(values, vec!["first", "second"]);

        // Tag iteration is sorted regardless of insertion order.
        let tags: Vec<_> = rec.tags().collect();
        assert_eq!(tags, vec!["100", "650"]);
    }

    #[test]
    fn handles_survive_removal_of_other_fields() {
        let mut rec = Record::new();
        let a = rec.add_data("650", ' ', ' ', title("a"));
        let b = rec.add_data("650", ' ', ' ', title("b"));
        let c = rec.add_data("650", ' ', ' ', title("c"));

        assert!(rec.remove_field(b));
        assert!(!rec.remove_field(b), "handle is gone after removal");

        let remaining: Vec<_> = rec.fields("650").iter().map(Field::id).collect();
        assert_eq!(remaining, vec![a, c]);

        assert!(rec.replace_subfields(c, title("c2")));
        assert_eq!(rec.subfield_values("650", 'a'), vec!["a", "c2"]);
    }

    #[test]
    fn handles_are_never_reused() {
        let mut rec = Record::new();
        let a = rec.add_data("650", ' ', ' ', title("a"));
        rec.remove_field(a);
        let b = rec.add_data("650", ' ', ' ', title("b"));
        assert_ne!(a, b);
    }

    #[test]
    fn control_value_reads_first_instance() {
        let mut rec = Record::new();
        rec.add_control("001", "42");
        assert_eq!(rec.control_value("001"), Some("42"));
        assert_eq!(rec.control_value("003"), None);
    }

    #[test]
    fn covers_ignores_extra_subfields_on_candidate() {
        let mut rec = Record::new();
        rec.add_data(
            "246",
            ' ',
            ' ',
            vec![Subfield::new('a', "A title"), Subfield::new('9', "arXiv")],
        );
        let stored = rec.fields("246")[0].clone();

        let mut other = Record::new();
        other.add_data("246", ' ', ' ', vec![Subfield::new('a', "A title")]);
        let incoming = other.fields("246")[0].clone();

        // The stored instance carries everything the incoming one does.
        assert!(stored.covers(&incoming));
        assert!(!incoming.covers(&stored));
        assert!(!field_list_contains(&[stored], &incoming));
    }

    #[test]
    fn field_equality_ignores_handles() {
        let mut a = Record::new();
        a.add_data("650", '1', ' ', title("x"));
        let mut b = Record::new();
        b.add_control("001", "7");
        b.add_data("650", '1', ' ', title("x"));
        assert_eq!(a.fields("650")[0], b.fields("650")[0]);
    }
}
