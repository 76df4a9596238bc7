//! PyO3 bindings — exposes `parse_wafer_map_rs()` to Python.

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::config::ParseConfig;
use crate::error::WaferMapError;
use crate::parser;
use crate::summary::WaferSummary;
use crate::types::{BinDefinition, DeviceAttributes, Pixel, WaferMapModel};

fn to_py_err(e: WaferMapError) -> PyErr {
    match e {
        WaferMapError::Io(io) => PyIOError::new_err(io.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// Parse a SEMI G85 wafer map file and return the normalized model.
///
/// Supports both `.xml` and `.xml.gz` files.
#[pyfunction]
#[pyo3(signature = (path, supported_revisions = None))]
fn parse_wafer_map_rs(path: &str, supported_revisions: Option<Vec<String>>) -> PyResult<WaferMapModel> {
    let mut config = ParseConfig::default();
    if let Some(revisions) = supported_revisions {
        config.supported_revisions = revisions;
    }
    parser::parse_wafer_map_file(path, &config).map_err(to_py_err)
}

/// Python module: g85map
#[pymodule]
fn g85map(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(parse_wafer_map_rs, m)?)?;
    m.add_class::<WaferMapModel>()?;
    m.add_class::<DeviceAttributes>()?;
    m.add_class::<BinDefinition>()?;
    m.add_class::<Pixel>()?;
    m.add_class::<WaferSummary>()?;
    Ok(())
}
