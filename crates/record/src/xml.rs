//! Interchange XML: `<collection>` / `<record>` / `<controlfield>` /
//! `<datafield>` / `<subfield>`.

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::RecordError;
use crate::model::{Record, Subfield};

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

/// Parse an interchange document into records.
///
/// Accepts either a `<collection>` of `<record>` elements or a single
/// `<record>` root. Text outside value-bearing elements is ignored.
pub fn parse_collection(input: &str) -> Result<Vec<Record>, RecordError> {
    let mut reader = Reader::from_str(input);

    let mut records = Vec::new();
    let mut current: Option<Record> = None;
    // In-flight datafield: (tag, ind1, ind2, subfields).
    let mut datafield: Option<(String, char, char, Vec<Subfield>)> = None;
    // In-flight value element: Some(code) for a subfield, None-coded via
    // control_tag for a controlfield.
    let mut control_tag: Option<String> = None;
    let mut subfield_code: Option<char> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                open_element(
                    e,
                    false,
                    &mut records,
                    &mut current,
                    &mut datafield,
                    &mut control_tag,
                    &mut subfield_code,
                    &mut text,
                )?;
            }
            Ok(Event::Empty(ref e)) => {
                // Self-closing value elements yield an empty value.
                open_element(
                    e,
                    true,
                    &mut records,
                    &mut current,
                    &mut datafield,
                    &mut control_tag,
                    &mut subfield_code,
                    &mut text,
                )?;
            }
            Ok(Event::Text(e)) => {
                if control_tag.is_some() || subfield_code.is_some() {
                    let decoded =
                        e.unescape().map_err(|err| RecordError::Xml(err.to_string()))?;
                    text.push_str(&decoded);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"controlfield" => {
                    if let (Some(tag), Some(rec)) = (control_tag.take(), current.as_mut()) {
                        rec.add_control(&tag, std::mem::take(&mut text));
                    }
                }
                b"subfield" => {
                    if let (Some(code), Some(df)) = (subfield_code.take(), datafield.as_mut()) {
                        df.3.push(Subfield::new(code, std::mem::take(&mut text)));
                    }
                }
                b"datafield" => {
                    if let (Some((tag, ind1, ind2, subfields)), Some(rec)) =
                        (datafield.take(), current.as_mut())
                    {
                        rec.add_data(&tag, ind1, ind2, subfields);
                    }
                }
                b"record" => {
                    if let Some(rec) = current.take() {
                        records.push(rec);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(RecordError::Xml(e.to_string())),
            _ => {}
        }
    }

    Ok(records)
}

#[allow(clippy::too_many_arguments)]
fn open_element(
    e: &BytesStart<'_>,
    self_closing: bool,
    records: &mut Vec<Record>,
    current: &mut Option<Record>,
    datafield: &mut Option<(String, char, char, Vec<Subfield>)>,
    control_tag: &mut Option<String>,
    subfield_code: &mut Option<char>,
    text: &mut String,
) -> Result<(), RecordError> {
    match e.local_name().as_ref() {
        b"collection" => {}
        b"record" => {
            *current = Some(Record::new());
            if self_closing {
                records.push(current.take().unwrap_or_default());
            }
        }
        b"controlfield" => {
            if current.is_none() {
                return Err(unexpected("controlfield", "document root"));
            }
            let tag = required_attr(e, "controlfield", "tag")?;
            if self_closing {
                if let Some(rec) = current.as_mut() {
                    rec.add_control(&tag, "");
                }
            } else {
                *control_tag = Some(tag);
                text.clear();
            }
        }
        b"datafield" => {
            if current.is_none() {
                return Err(unexpected("datafield", "document root"));
            }
            let tag = required_attr(e, "datafield", "tag")?;
            let ind1 = indicator_attr(e, "ind1")?;
            let ind2 = indicator_attr(e, "ind2")?;
            if self_closing {
                if let Some(rec) = current.as_mut() {
                    rec.add_data(&tag, ind1, ind2, Vec::new());
                }
            } else {
                *datafield = Some((tag, ind1, ind2, Vec::new()));
            }
        }
        b"subfield" => {
            if datafield.is_none() {
                return Err(unexpected("subfield", "record (outside a datafield)"));
            }
            let code = required_attr(e, "subfield", "code")?
                .chars()
                .next()
                .unwrap_or(' ');
            if self_closing {
                if let Some(df) = datafield.as_mut() {
                    df.3.push(Subfield::new(code, ""));
                }
            } else {
                *subfield_code = Some(code);
                text.clear();
            }
        }
        _ => {}
    }
    Ok(())
}

fn unexpected(element: &str, context: &str) -> RecordError {
    RecordError::UnexpectedElement {
        element: element.into(),
        context: context.into(),
    }
}

fn required_attr(e: &BytesStart<'_>, element: &str, name: &str) -> Result<String, RecordError> {
    let attr = e
        .try_get_attribute(name)
        .map_err(|err| RecordError::Xml(err.to_string()))?
        .ok_or_else(|| RecordError::MissingAttribute {
            element: element.into(),
            attribute: name.into(),
        })?;
    let value = attr
        .unescape_value()
        .map_err(|err| RecordError::Xml(err.to_string()))?;
    Ok(value.into_owned())
}

/// Indicator attributes default to blank when absent or empty.
fn indicator_attr(e: &BytesStart<'_>, name: &str) -> Result<char, RecordError> {
    let attr = e
        .try_get_attribute(name)
        .map_err(|err| RecordError::Xml(err.to_string()))?;
    match attr {
        Some(attr) => {
            let value = attr
                .unescape_value()
                .map_err(|err| RecordError::Xml(err.to_string()))?;
            Ok(value.chars().next().unwrap_or(' '))
        }
        None => Ok(' '),
    }
}

// ---------------------------------------------------------------------------
// Serialize
// ---------------------------------------------------------------------------

/// Serialize one record. Deterministic: sorted tags, harvest order within
/// a tag, two-space indent, no trailing newline.
pub fn record_xml(record: &Record) -> String {
    let mut out = String::from("<record>");
    for (tag, fields) in record.iter() {
        for field in fields {
            if Record::is_control_tag(tag) {
                out.push_str(&format!(
                    "\n  <controlfield tag=\"{}\">{}</controlfield>",
                    escape(tag),
                    escape(&field.value),
                ));
            } else {
                out.push_str(&format!(
                    "\n  <datafield tag=\"{}\" ind1=\"{}\" ind2=\"{}\">",
                    escape(tag),
                    field.ind1,
                    field.ind2,
                ));
                for sub in &field.subfields {
                    out.push_str(&format!(
                        "\n    <subfield code=\"{}\">{}</subfield>",
                        sub.code,
                        escape(&sub.value),
                    ));
                }
                out.push_str("\n  </datafield>");
            }
        }
    }
    out.push_str("\n</record>");
    out
}

/// Serialize records inside a single `<collection>` wrapper.
pub fn collection_xml(records: &[Record]) -> String {
    let mut parts = Vec::with_capacity(records.len() + 2);
    parts.push("<collection>".to_string());
    for record in records {
        parts.push(record_xml(record));
    }
    parts.push("</collection>".to_string());
    parts.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
