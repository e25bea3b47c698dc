//! Streaming element scanner for health-data exports.
//!
//! Exports routinely run to hundreds of megabytes, so the document is read
//! forward-only with a single reusable buffer. Every start or self-closing tag
//! becomes an [`Element`]: its name plus its unescaped attributes.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Errors raised while reading the export.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid XML at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },
    #[error("Element name at byte {0} is not valid UTF-8")]
    Encoding(usize),
}

/// A tagged attribute bag taken from the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Element name, as written (no namespace resolution).
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
}

impl Element {
    #[cfg(test)]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Look up an attribute value by key.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Lazy sequence of elements in document order.
///
/// Yields `Err` at most once; the stream is finished after an error.
pub struct ElementStream<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    only: Option<String>,
    done: bool,
}

impl ElementStream<BufReader<File>> {
    /// Open an export file for scanning.
    pub fn open(path: &Path) -> Result<Self, ScanError> {
        let file = File::open(path).map_err(|source| ScanError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Scanning {}", path.display());
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<'a> ElementStream<&'a [u8]> {
    /// Scan an in-memory document.
    #[cfg(test)]
    pub fn from_text(xml: &'a str) -> Self {
        Self::from_reader(xml.as_bytes())
    }
}

impl<R: BufRead> ElementStream<R> {
    pub fn from_reader(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);

        Self {
            reader,
            buf: Vec::new(),
            only: None,
            done: false,
        }
    }

    /// Only yield elements with this name.
    ///
    /// Attributes of every other element are never decoded.
    pub fn only(mut self, name: impl Into<String>) -> Self {
        self.only = Some(name.into());
        self
    }
}

impl<R: BufRead> Iterator for ElementStream<R> {
    type Item = Result<Element, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.buf.clear();
            let position = self.reader.buffer_position();

            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    if let Some(ref only) = self.only {
                        if e.name().as_ref() != only.as_bytes() {
                            continue;
                        }
                    }

                    let decoded = decode_element(&e, position);
                    if decoded.is_err() {
                        self.done = true;
                    }
                    return Some(decoded);
                }
                Ok(Event::Eof) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(source) => {
                    self.done = true;
                    return Some(Err(ScanError::Xml {
                        position: self.reader.buffer_position(),
                        source,
                    }));
                }
            }
        }
    }
}

fn decode_element(e: &BytesStart<'_>, position: usize) -> Result<Element, ScanError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|_| ScanError::Encoding(position))?
        .to_string();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ScanError::Xml {
            position,
            source: err.into(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|source| ScanError::Xml { position, source })?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(Element { name, attributes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE HealthData [
<!ELEMENT HealthData (ExportDate,Me,(Record|Workout)*)>
]>
<HealthData locale="en_US">
  <ExportDate value="2024-01-02 09:00:00 +0100"/>
  <Workout workoutActivityType="HKWorkoutActivityTypeRunning" duration="30">
    <!-- nested statistics -->
    <WorkoutStatistics type="HKQuantityTypeIdentifierDistanceWalkingRunning" sum="5.0" unit="km"/>
    <WorkoutStatistics type="HKQuantityTypeIdentifierHeartRate" average="150" unit="count/min"></WorkoutStatistics>
  </Workout>
</HealthData>
"#;

    #[test]
    fn test_yields_elements_in_document_order() {
        let names: Vec<String> = ElementStream::from_text(SAMPLE)
            .map(|e| e.unwrap().name)
            .collect();

        assert_eq!(
            names,
            vec![
                "HealthData",
                "ExportDate",
                "Workout",
                "WorkoutStatistics",
                "WorkoutStatistics"
            ]
        );
    }

    #[test]
    fn test_attributes_are_collected() {
        let stats: Vec<Element> = ElementStream::from_text(SAMPLE)
            .only("WorkoutStatistics")
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(
            stats[0].attr("type"),
            Some("HKQuantityTypeIdentifierDistanceWalkingRunning")
        );
        assert_eq!(stats[0].attr("sum"), Some("5.0"));
        assert_eq!(stats[1].attr("sum"), None);
        assert_eq!(stats[1].attr("average"), Some("150"));
    }

    #[test]
    fn test_attribute_values_are_unescaped() {
        let xml = r#"<Root><Item note="a &amp; b" other="&lt;x&gt;"/></Root>"#;
        let item = ElementStream::from_text(xml)
            .only("Item")
            .next()
            .unwrap()
            .unwrap();

        assert_eq!(item.attr("note"), Some("a & b"));
        assert_eq!(item.attr("other"), Some("<x>"));
    }

    #[test]
    fn test_malformed_document_yields_one_error() {
        let xml = "<Root><Item a=\"1\"></Wrong></Root>";
        let results: Vec<_> = ElementStream::from_text(xml).collect();

        assert!(results.iter().any(|r| r.is_err()));
        assert!(results.last().unwrap().is_err());
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    }

    #[test]
    fn test_open_missing_file() {
        let err = ElementStream::open(Path::new("/nonexistent/export.xml"))
            .err()
            .unwrap();
        assert!(matches!(err, ScanError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/export.xml"));
    }

    #[test]
    fn test_open_file_on_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let count = ElementStream::open(file.path())
            .unwrap()
            .only("WorkoutStatistics")
            .filter(|e| e.is_ok())
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_element_builder() {
        let e = Element::new("WorkoutStatistics")
            .with_attr("type", "x")
            .with_attr("sum", "1.5");
        assert_eq!(e.attr("sum"), Some("1.5"));
        assert_eq!(e.attr("missing"), None);
    }
}
