//! Document acquisition and namespace-free XML element tree.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use flate2::read::GzDecoder;
use roxmltree::{Document, Node};

use crate::error::{Result, WaferMapError};

/// Root element every wafer map document must have.
pub const ROOT_ELEMENT: &str = "Map";

/// An element with its namespace stripped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XmlElement {
    /// Local name, without prefix or namespace URI.
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
    /// Trimmed concatenation of the direct text and CDATA content.
    pub text: String,
}

impl XmlElement {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Optional attribute parsed as `T`. Present but unparsable is an error.
    pub fn parse_attr<T: FromStr>(&self, key: &'static str) -> Result<Option<T>> {
        match self.attr(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| WaferMapError::InvalidNumber {
                    field: key,
                    value: raw.to_string(),
                }),
        }
    }

    /// First child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn from_node(node: Node<'_, '_>) -> Self {
        let attributes = node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect();

        let mut children = Vec::new();
        let mut text = String::new();
        for child in node.children() {
            if child.is_element() {
                children.push(XmlElement::from_node(child));
            } else if child.is_text() {
                text.push_str(child.text().unwrap_or_default());
            }
        }

        Self {
            name: node.tag_name().name().to_string(),
            attributes,
            children,
            text: text.trim().to_string(),
        }
    }
}

/// Read a wafer map file (supports .xml and .xml.gz) into memory.
///
/// The file handle is closed before this returns, on success and on error.
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let file = File::open(path)?;

    // Detect gzip by extension
    let is_gz = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

    if is_gz {
        read_from(BufReader::new(GzDecoder::new(file)))
    } else {
        read_from(BufReader::new(file))
    }
}

/// Drain a reader and decode it as UTF-8.
pub fn read_from<R: Read>(mut reader: R) -> Result<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| WaferMapError::MalformedDocument(format!("document is not UTF-8: {e}")))
}

/// Parse `xml` and return its `Map` root with every namespace stripped.
pub fn normalize(xml: &str) -> Result<XmlElement> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    let name = root.tag_name().name();
    if name != ROOT_ELEMENT {
        return Err(WaferMapError::MalformedDocument(format!(
            "expected root element `{ROOT_ELEMENT}`, found `{name}`"
        )));
    }
    Ok(XmlElement::from_node(root))
}
