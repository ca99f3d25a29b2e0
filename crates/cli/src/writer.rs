//! Batch writer: one `<collection>`-wrapped interchange file per
//! non-empty batch, named after the input file.

use std::io;
use std::path::{Path, PathBuf};

use bibsift_record::xml::collection_xml;
use bibsift_recon::Batches;

/// Write each non-empty batch next to the input file. Returns the paths
/// written, in batch order. An empty batch produces no file at all.
pub fn write_batches(input: &Path, batches: &Batches) -> io::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (suffix, records) in [
        ("insert", &batches.insert),
        ("append", &batches.append),
        ("correct", &batches.correct),
        ("holdingpen", &batches.holding_pen),
    ] {
        if records.is_empty() {
            continue;
        }
        let path = batch_path(input, suffix);
        std::fs::write(&path, collection_xml(records))?;
        written.push(path);
    }
    Ok(written)
}

/// `<input>.<suffix>.xml`, appended to the full input file name.
fn batch_path(input: &Path, suffix: &str) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(format!(".{suffix}.xml"));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibsift_record::{Record, Subfield};

    fn record(title: &str) -> Record {
        let mut rec = Record::new();
        rec.add_control("001", "42");
        rec.add_data("245", ' ', ' ', vec![Subfield::new('a', title)]);
        rec
    }

    #[test]
    fn empty_batches_produce_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("harvest.xml");

        let written = write_batches(&input, &Batches::default()).unwrap();
        assert!(written.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn non_empty_batches_are_written_with_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("harvest.xml");

        let batches = Batches {
            insert: vec![record("New")],
            holding_pen: vec![record("Held")],
            ..Batches::default()
        };
        let written = write_batches(&input, &batches).unwrap();
        assert_eq!(
            written,
            vec![
                dir.path().join("harvest.xml.insert.xml"),
                dir.path().join("harvest.xml.holdingpen.xml"),
            ],
        );

        let insert = std::fs::read_to_string(&written[0]).unwrap();
        assert!(insert.starts_with("<collection>"));
        assert!(insert.ends_with("</collection>"));
        assert!(insert.contains("New"));
    }

    #[test]
    fn rewriting_the_same_batches_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("harvest.xml");

        let batches = Batches {
            correct: vec![record("Fixed"), record("Also fixed")],
            ..Batches::default()
        };
        let first_paths = write_batches(&input, &batches).unwrap();
        let first = std::fs::read(&first_paths[0]).unwrap();
        let second_paths = write_batches(&input, &batches).unwrap();
        let second = std::fs::read(&second_paths[0]).unwrap();
        assert_eq!(first_paths, second_paths);
        assert_eq!(first, second);
    }
}
