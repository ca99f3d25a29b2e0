//! Catalog collaborators: the search/fetch contract the engine consumes,
//! plus an in-memory snapshot implementation backing the CLI and tests.

use std::collections::BTreeMap;
use std::fmt;

use bibsift_record::Record;

#[derive(Debug)]
pub struct CatalogError(pub String);

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CatalogError {}

/// Read-only view of the target catalog during a run.
pub trait Catalog {
    /// Evaluate a search expression, returning matching record identifiers.
    ///
    /// Expressions are either `tag__code:value` (subfield equality, `_`
    /// standing for a blank indicator) or `reportnumber:value`.
    fn search(&self, query: &str) -> Result<Vec<String>, CatalogError>;

    /// Fetch a stored record by identifier; `Ok(None)` when it vanished.
    fn fetch(&self, recid: &str) -> Result<Option<Record>, CatalogError>;
}

// ---------------------------------------------------------------------------
// Snapshot catalog
// ---------------------------------------------------------------------------

/// Report numbers live in `037` subfield `a`.
const REPORT_NUMBER_TAG: &str = "037";
const REPORT_NUMBER_CODE: char = 'a';

/// Catalog backed by an in-memory set of records keyed by their `001`
/// value. Records without `001` are dropped at construction.
#[derive(Debug, Default)]
pub struct SnapshotCatalog {
    records: BTreeMap<String, Record>,
}

impl SnapshotCatalog {
    pub fn new(records: Vec<Record>) -> Self {
        let records = records
            .into_iter()
            .filter_map(|r| {
                let id = r.control_value("001").map(|id| id.to_string());
                id.map(|id| (id, r))
            })
            .collect();
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Catalog for SnapshotCatalog {
    fn search(&self, query: &str) -> Result<Vec<String>, CatalogError> {
        let (index, value) = query
            .split_once(':')
            .ok_or_else(|| CatalogError(format!("malformed query '{query}'")))?;

        let (tag, code) = if index == "reportnumber" {
            (REPORT_NUMBER_TAG.to_string(), REPORT_NUMBER_CODE)
        } else {
            // tag__code shape, e.g. 035__a. Indicators are not used for
            // snapshot matching.
            if index.len() != 6 || !index.is_char_boundary(3) {
                return Err(CatalogError(format!("unknown search index '{index}'")));
            }
            let code = index.chars().nth(5).unwrap_or(' ');
            (index[..3].to_string(), code)
        };

        let mut hits = Vec::new();
        for (recid, record) in &self.records {
            if record.subfield_values(&tag, code).iter().any(|v| *v == value) {
                hits.push(recid.clone());
            }
        }
        Ok(hits)
    }

    fn fetch(&self, recid: &str) -> Result<Option<Record>, CatalogError> {
        Ok(self.records.get(recid).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibsift_record::Subfield;

    fn catalog() -> SnapshotCatalog {
        let mut a = Record::new();
        a.add_control("001", "42");
        a.add_data("035", ' ', ' ', vec![Subfield::new('a', "oai:arXiv.org:1001.0001")]);

        let mut b = Record::new();
        b.add_control("001", "43");
        b.add_data("037", ' ', ' ', vec![Subfield::new('a', "arXiv:1001.0002")]);

        // No 001: never indexed.
        let mut c = Record::new();
        c.add_data("035", ' ', ' ', vec![Subfield::new('a', "oai:arXiv.org:1001.0003")]);

        SnapshotCatalog::new(vec![a, b, c])
    }

    #[test]
    fn records_without_identifier_are_dropped() {
        assert_eq!(catalog().len(), 2);
    }

    #[test]
    fn subfield_query_matches() {
        let hits = catalog().search("035__a:oai:arXiv.org:1001.0001").unwrap();
        assert_eq!(hits, vec!["42"]);
    }

    #[test]
    fn report_number_query_matches() {
        let hits = catalog().search("reportnumber:arXiv:1001.0002").unwrap();
        assert_eq!(hits, vec!["43"]);
    }

    #[test]
    fn no_hits_is_empty_not_error() {
        assert!(catalog().search("035__z:oai:arXiv.org:9999.9999").unwrap().is_empty());
    }

    #[test]
    fn malformed_query_is_an_error() {
        assert!(catalog().search("no-colon").is_err());
        assert!(catalog().search("03__a:x").is_err());
    }

    #[test]
    fn fetch_round_trip() {
        let cat = catalog();
        assert!(cat.fetch("42").unwrap().is_some());
        assert!(cat.fetch("999").unwrap().is_none());
    }
}
