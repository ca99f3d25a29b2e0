//! Identity resolution: does a harvested record already exist in the
//! target catalog?

use bibsift_record::{Field, Record};

use crate::catalog::Catalog;
use crate::error::ReconError;

/// Control tag carrying a self-declared catalog identifier.
pub const RECORD_ID_TAG: &str = "001";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Where origin identifiers live and how catalog queries are built.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Primary field path holding the external-origin identifier.
    pub origin_field: String,
    /// Older field path consulted when the primary one has no match.
    pub legacy_field: String,
    /// Namespace prefix an origin identifier must start with.
    pub origin_prefix: String,
    /// Search index for the report-number fallback query.
    pub report_number_index: String,
    /// Prefix prepended to the origin identifier's suffix in that query.
    pub report_number_prefix: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            origin_field: "035__a".into(),
            legacy_field: "035__z".into(),
            origin_prefix: "oai:arXiv.org:".into(),
            report_number_index: "reportnumber".into(),
            report_number_prefix: "arXiv:".into(),
        }
    }
}

/// Parsed `tttiic` field path (tag, two indicators, subfield code).
#[derive(Debug, Clone, Copy)]
struct FieldPath<'a> {
    tag: &'a str,
    ind1: char,
    ind2: char,
    code: char,
}

impl<'a> FieldPath<'a> {
    /// A deployment misconfiguration here is fatal for the whole run.
    fn parse(spec: &'a str) -> Result<Self, ReconError> {
        let chars: Vec<char> = spec.chars().collect();
        if chars.len() != 6 || !spec.is_char_boundary(3) {
            return Err(ReconError::InvalidFieldPath(spec.into()));
        }
        Ok(Self {
            tag: &spec[..3],
            ind1: normalize_indicator(chars[3]),
            ind2: normalize_indicator(chars[4]),
            code: chars[5],
        })
    }
}

/// `_` in a field path stands for a blank indicator.
fn normalize_indicator(c: char) -> char {
    if c == '_' {
        ' '
    } else {
        c
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Outcome of resolving a harvested record against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// The record exists; carries its catalog identifier.
    Existing(String),
    /// No trace of the record anywhere; safe to insert. Reached only
    /// when an origin identifier was found and every candidate query
    /// came back empty; a record with no identifier at all resolves to
    /// [`Identity::Ambiguous`] instead, never a direct insert.
    New,
    /// No origin identifier, or no unique catalog hit; needs manual
    /// placement, never a direct insert.
    Ambiguous,
}

/// Resolve a harvested record's catalog identity.
///
/// Fast path: a `001` value is returned as-is without touching the search
/// index. Otherwise the origin identifier is extracted from the configured
/// field paths and a list of progressively more specific queries is tried;
/// the first query with exactly one hit wins. Queries with zero or several
/// hits are skipped rather than trusted, so a too-broad query never causes
/// an accidental merge.
pub fn resolve(
    record: &Record,
    config: &IdentityConfig,
    catalog: &dyn Catalog,
) -> Result<Identity, ReconError> {
    if let Some(recid) = record.control_value(RECORD_ID_TAG) {
        return Ok(Identity::Existing(recid.to_string()));
    }

    let primary = FieldPath::parse(&config.origin_field)?;
    let legacy = FieldPath::parse(&config.legacy_field)?;

    let origin_id = find_origin_id(record, &primary, &config.origin_prefix)
        .or_else(|| find_origin_id(record, &legacy, &config.origin_prefix));
    let Some(origin_id) = origin_id else {
        return Ok(Identity::Ambiguous);
    };

    // Suffix after the namespace, report-number style.
    let suffix = origin_id.rsplit(':').next().unwrap_or(origin_id);
    let queries = [
        format!("{}__{}:{}", primary.tag, primary.code, origin_id),
        format!("{}__{}:{}", legacy.tag, legacy.code, origin_id),
        format!(
            "{}:{}{}",
            config.report_number_index, config.report_number_prefix, suffix
        ),
    ];

    let mut saw_multiple = false;
    for query in &queries {
        let hits = catalog
            .search(query)
            .map_err(|e| ReconError::Lookup(e.to_string()))?;
        match hits.len() {
            1 => return Ok(Identity::Existing(hits[0].clone())),
            0 => {}
            _ => saw_multiple = true,
        }
    }

    if saw_multiple {
        Ok(Identity::Ambiguous)
    } else {
        Ok(Identity::New)
    }
}

/// First value at the field path that carries the origin prefix.
fn find_origin_id<'r>(
    record: &'r Record,
    path: &FieldPath<'_>,
    prefix: &str,
) -> Option<&'r str> {
    record
        .fields(path.tag)
        .iter()
        .filter(|f| indicator_matches(f, path))
        .flat_map(|f| f.subfield_values(path.code))
        .find(|v| v.starts_with(prefix))
}

fn indicator_matches(field: &Field, path: &FieldPath<'_>) -> bool {
    field.ind1 == path.ind1 && field.ind2 == path.ind2
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogError;
    use bibsift_record::Subfield;

    /// Catalog stub with scripted search results; panics on fetch.
    struct Scripted(Vec<Vec<&'static str>>, std::cell::Cell<usize>);

    impl Scripted {
        fn new(results: Vec<Vec<&'static str>>) -> Self {
            Self(results, std::cell::Cell::new(0))
        }
    }

    impl Catalog for Scripted {
        fn search(&self, _query: &str) -> Result<Vec<String>, CatalogError> {
            let i = self.1.get();
            self.1.set(i + 1);
            Ok(self
                .0
                .get(i)
                .map(|hits| hits.iter().map(|s| s.to_string()).collect())
                .unwrap_or_default())
        }

        fn fetch(&self, _recid: &str) -> Result<Option<Record>, CatalogError> {
            unreachable!("identity resolution never fetches")
        }
    }

    /// Catalog that panics on any access; proves the `001` fast path.
    struct Untouchable;

    impl Catalog for Untouchable {
        fn search(&self, query: &str) -> Result<Vec<String>, CatalogError> {
            panic!("unexpected search: {query}")
        }

        fn fetch(&self, recid: &str) -> Result<Option<Record>, CatalogError> {
            panic!("unexpected fetch: {recid}")
        }
    }

    fn harvested(oai: Option<&str>) -> Record {
        let mut rec = Record::new();
        if let Some(id) = oai {
            rec.add_data("035", ' ', ' ', vec![Subfield::new('a', id)]);
        }
        rec.add_data("245", ' ', ' ', vec![Subfield::new('a', "Some title")]);
        rec
    }

    #[test]
    fn self_declared_identifier_skips_search() {
        let mut rec = harvested(None);
        rec.add_control("001", "42");
        let identity = resolve(&rec, &IdentityConfig::default(), &Untouchable).unwrap();
        assert_eq!(identity, Identity::Existing("42".into()));
    }

    #[test]
    fn missing_origin_id_is_ambiguous() {
        let rec = harvested(None);
        let catalog = Scripted::new(vec![]);
        let identity = resolve(&rec, &IdentityConfig::default(), &catalog).unwrap();
        assert_eq!(identity, Identity::Ambiguous);
        assert_eq!(catalog.1.get(), 0, "no origin id means no query at all");
    }

    #[test]
    fn wrong_namespace_prefix_is_ambiguous() {
        let rec = harvested(Some("oai:elsewhere.org:1"));
        let identity =
            resolve(&rec, &IdentityConfig::default(), &Scripted::new(vec![])).unwrap();
        assert_eq!(identity, Identity::Ambiguous);
    }

    #[test]
    fn legacy_field_is_consulted() {
        let mut rec = harvested(None);
        rec.add_data(
            "035",
            ' ',
            ' ',
            vec![Subfield::new('z', "oai:arXiv.org:1001.0001")],
        );
        let catalog = Scripted::new(vec![vec![], vec!["42"]]);
        let identity = resolve(&rec, &IdentityConfig::default(), &catalog).unwrap();
        assert_eq!(identity, Identity::Existing("42".into()));
    }

    #[test]
    fn unique_hit_on_later_query_wins() {
        let rec = harvested(Some("oai:arXiv.org:1001.0001"));
        // First query ambiguous, second empty, report-number query unique.
        let catalog = Scripted::new(vec![vec!["1", "2"], vec![], vec!["42"]]);
        let identity = resolve(&rec, &IdentityConfig::default(), &catalog).unwrap();
        assert_eq!(identity, Identity::Existing("42".into()));
    }

    #[test]
    fn only_ambiguous_hits_route_to_manual_placement() {
        let rec = harvested(Some("oai:arXiv.org:1001.0001"));
        let catalog = Scripted::new(vec![vec!["1", "2"], vec![], vec![]]);
        let identity = resolve(&rec, &IdentityConfig::default(), &catalog).unwrap();
        assert_eq!(identity, Identity::Ambiguous);
    }

    #[test]
    fn zero_hits_everywhere_is_new() {
        let rec = harvested(Some("oai:arXiv.org:1001.0001"));
        let catalog = Scripted::new(vec![vec![], vec![], vec![]]);
        let identity = resolve(&rec, &IdentityConfig::default(), &catalog).unwrap();
        assert_eq!(identity, Identity::New);
    }

    #[test]
    fn malformed_field_path_is_fatal() {
        let rec = harvested(Some("oai:arXiv.org:1001.0001"));
        let config = IdentityConfig {
            origin_field: "35a".into(),
            ..IdentityConfig::default()
        };
        let err = resolve(&rec, &config, &Scripted::new(vec![])).unwrap_err();
        assert!(matches!(err, ReconError::InvalidFieldPath(_)));
    }
}
