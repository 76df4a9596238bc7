//! Wafer map data types and structures.

#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// `BinQuality` values with special meaning. Anything else is a failing bin.
pub const QUALITY_PASS: &str = "Pass";
pub const QUALITY_NULL: &str = "NULL";

/// Description given to a null bin injected because nothing declared it.
pub const NULL_DESCRIPTION: &str = "NULL";

/// Micrometers per millimeter, used when deriving a die size from the wafer.
const UM_PER_MM: f64 = 1000.0;

/// Map a declared `BinQuality` to a pixel status.
pub fn status_from_quality(quality: &str) -> Option<bool> {
    match quality {
        QUALITY_PASS => Some(true),
        QUALITY_NULL => None,
        _ => Some(false),
    }
}

/// Physical die size as declared by `DeviceSizeX`/`DeviceSizeY`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChipSize {
    /// At least one of the size attributes was absent.
    Unspecified,
    Explicit { width: f64, height: f64 },
}

impl ChipSize {
    /// Resolve to a concrete (width, height).
    ///
    /// An unspecified size is estimated as `1000 * wafer_size / cols` by
    /// `1000 * wafer_size / rows`, i.e. the wafer diameter in millimeters
    /// spread over the grid and expressed in micrometers. This is a heuristic:
    /// the format does not define it, and grid normalization does not depend
    /// on the result.
    pub fn resolve(&self, wafer_size: f64, rows: u32, cols: u32) -> (f64, f64) {
        match *self {
            ChipSize::Explicit { width, height } => (width, height),
            ChipSize::Unspecified => (
                UM_PER_MM * wafer_size / f64::from(cols),
                UM_PER_MM * wafer_size / f64::from(rows),
            ),
        }
    }

    /// Legacy pair form, `(0, 0)` when unspecified.
    pub fn as_pair(&self) -> (f64, f64) {
        match *self {
            ChipSize::Explicit { width, height } => (width, height),
            ChipSize::Unspecified => (0.0, 0.0),
        }
    }
}

/// Encoding of the per-die tokens in `Data/Row`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BinType {
    Decimal,
    HexaDecimal,
    /// Any other declared value, or `None` when `BinType` is absent.
    Other(Option<String>),
}

impl BinType {
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("Decimal") => BinType::Decimal,
            Some("HexaDecimal") => BinType::HexaDecimal,
            other => BinType::Other(other.map(str::to_string)),
        }
    }

    /// Characters per die: 3 for decimal codes, 2 for everything else.
    pub fn token_width(&self) -> usize {
        match self {
            BinType::Decimal => 3,
            _ => 2,
        }
    }
}

/// Wafer and device level metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "python", pyclass)]
pub struct DeviceAttributes {
    #[cfg_attr(feature = "python", pyo3(get))]
    pub wafer_id: Option<String>,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub lot_id: Option<String>,
    /// Wafer diameter in millimeters.
    #[cfg_attr(feature = "python", pyo3(get))]
    pub wafer_size: f64,
    pub chip_size: ChipSize,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub product_id: Option<String>,
    /// Opaque creation date token, never parsed as a date.
    #[cfg_attr(feature = "python", pyo3(get))]
    pub created: Option<String>,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub rows: u32,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub cols: u32,
}

/// One entry of the bin registry.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(feature = "python", pyclass)]
pub struct BinDefinition {
    /// `Some(true)` passing, `Some(false)` failing, `None` null quality.
    #[cfg_attr(feature = "python", pyo3(get))]
    pub status: Option<bool>,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub description: Option<String>,
    /// Declared `BinCount`, kept verbatim. `None` only for an injected null bin.
    #[cfg_attr(feature = "python", pyo3(get))]
    pub count: Option<String>,
}

impl BinDefinition {
    pub fn injected_null() -> Self {
        Self {
            status: None,
            description: Some(NULL_DESCRIPTION.to_string()),
            count: None,
        }
    }
}

/// Bin code to definition mapping that keeps declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BinRegistry {
    entries: Vec<(String, BinDefinition)>,
    index: HashMap<String, usize>,
}

impl BinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced code keeps its original position.
    pub fn insert(&mut self, code: String, def: BinDefinition) -> Option<BinDefinition> {
        match self.index.get(&code) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, def)),
            None => {
                self.index.insert(code.clone(), self.entries.len());
                self.entries.push((code, def));
                None
            }
        }
    }

    pub fn get(&self, code: &str) -> Option<&BinDefinition> {
        self.index.get(code).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BinDefinition)> {
        self.entries.iter().map(|(code, def)| (code.as_str(), def))
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(code, _)| code.as_str())
    }
}

impl FromIterator<(String, BinDefinition)> for BinRegistry {
    fn from_iter<I: IntoIterator<Item = (String, BinDefinition)>>(iter: I) -> Self {
        let mut registry = BinRegistry::new();
        for (code, def) in iter {
            registry.insert(code, def);
        }
        registry
    }
}

impl Serialize for BinRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (code, def) in &self.entries {
            map.serialize_entry(code, def)?;
        }
        map.end()
    }
}

/// One die of the grid in normalized coordinates.
///
/// The unit square has its origin at the bottom-left with y growing upward;
/// `origin` is the bottom-left corner of the die.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(feature = "python", pyclass)]
pub struct Pixel {
    #[cfg_attr(feature = "python", pyo3(get))]
    pub origin: (f64, f64),
    #[cfg_attr(feature = "python", pyo3(get))]
    pub size: (f64, f64),
    #[cfg_attr(feature = "python", pyo3(get))]
    pub status: Option<bool>,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub description: Option<String>,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub code: String,
    /// Zero-based grid row, 0 being the first row of the document (top).
    #[cfg_attr(feature = "python", pyo3(get))]
    pub row: u32,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub col: u32,
}

/// Top-level parsed wafer map. Built once per parse and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "python", pyclass)]
pub struct WaferMapModel {
    #[cfg_attr(feature = "python", pyo3(get))]
    pub format_revision: Option<String>,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub is_valid: bool,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub device_attributes: DeviceAttributes,
    pub bin_type: BinType,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub null_bin: String,
    pub bin_registry: BinRegistry,
    /// Die size after resolving `ChipSize::Unspecified`.
    #[cfg_attr(feature = "python", pyo3(get))]
    pub die_size: (f64, f64),
    #[cfg_attr(feature = "python", pyo3(get))]
    pub pixels: Vec<Pixel>,
}

impl WaferMapModel {
    pub fn bin(&self, code: &str) -> Option<&BinDefinition> {
        self.bin_registry.get(code)
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl DeviceAttributes {
    /// Declared die size, `(0, 0)` when unspecified.
    #[getter]
    fn chip_size(&self) -> (f64, f64) {
        self.chip_size.as_pair()
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl WaferMapModel {
    /// Registry entries in declaration order.
    #[getter]
    fn bin_codes(&self) -> Vec<(String, BinDefinition)> {
        self.bin_registry
            .iter()
            .map(|(code, def)| (code.to_string(), def.clone()))
            .collect()
    }

    #[getter]
    fn token_width(&self) -> usize {
        self.bin_type.token_width()
    }

    #[pyo3(name = "summary")]
    fn py_summary(&self) -> crate::summary::WaferSummary {
        self.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(status: Option<bool>, count: &str) -> BinDefinition {
        BinDefinition {
            status,
            description: None,
            count: Some(count.to_string()),
        }
    }

    #[test]
    fn test_status_from_quality() {
        assert_eq!(status_from_quality("Pass"), Some(true));
        assert_eq!(status_from_quality("Fail"), Some(false));
        assert_eq!(status_from_quality("NULL"), None);
        assert_eq!(status_from_quality("pass"), Some(false));
        assert_eq!(status_from_quality(""), Some(false));
    }

    #[test]
    fn test_token_width() {
        assert_eq!(BinType::from_attr(Some("Decimal")).token_width(), 3);
        assert_eq!(BinType::from_attr(Some("HexaDecimal")).token_width(), 2);
        assert_eq!(BinType::from_attr(Some("ASCII")).token_width(), 2);
        assert_eq!(BinType::from_attr(None).token_width(), 2);
    }

    #[test]
    fn test_chip_size_resolve() {
        let explicit = ChipSize::Explicit { width: 42.0, height: 24.0 };
        assert_eq!(explicit.resolve(300.0, 10, 10), (42.0, 24.0));

        let (w, h) = ChipSize::Unspecified.resolve(300.0, 60, 50);
        assert!((w - 6000.0).abs() < 1e-9);
        assert!((h - 5000.0).abs() < 1e-9);
        assert_eq!(ChipSize::Unspecified.as_pair(), (0.0, 0.0));
    }

    #[test]
    fn test_registry_keeps_insertion_order() {
        let mut registry = BinRegistry::new();
        registry.insert("111".to_string(), def(Some(false), "10"));
        registry.insert("000".to_string(), def(Some(true), "100"));
        registry.insert("255".to_string(), BinDefinition::injected_null());

        let codes: Vec<_> = registry.codes().collect();
        assert_eq!(codes, vec!["111", "000", "255"]);
        assert_eq!(registry.get("255").unwrap().description.as_deref(), Some("NULL"));
        assert!(registry.get("999").is_none());
    }

    #[test]
    fn test_registry_replace_in_place() {
        let mut registry = BinRegistry::new();
        registry.insert("00".to_string(), def(Some(true), "1"));
        registry.insert("01".to_string(), def(Some(false), "2"));
        let old = registry.insert("00".to_string(), def(Some(false), "3"));

        assert_eq!(old.unwrap().count.as_deref(), Some("1"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.codes().next(), Some("00"));
        assert_eq!(registry.get("00").unwrap().status, Some(false));
    }

    #[test]
    fn test_registry_serializes_in_order() {
        let registry: BinRegistry = vec![
            ("FF".to_string(), BinDefinition::injected_null()),
            ("00".to_string(), def(Some(true), "5")),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&registry).unwrap();
        assert!(json.find("\"FF\"").unwrap() < json.find("\"00\"").unwrap());
    }
}
