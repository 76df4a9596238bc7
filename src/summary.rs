//! Die counts and yield derived from a parsed wafer map.

#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::Serialize;

use crate::types::{Pixel, WaferMapModel};

/// Tested-die counts. Null-status dies are not counted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "python", pyclass)]
pub struct WaferSummary {
    #[cfg_attr(feature = "python", pyo3(get))]
    pub total_die: usize,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub pass: usize,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub fail: usize,
    /// Percentage rounded to two decimals, `None` when nothing was tested.
    #[cfg_attr(feature = "python", pyo3(get))]
    pub yield_percent: Option<f64>,
}

impl WaferSummary {
    pub fn from_pixels(pixels: &[Pixel]) -> Self {
        let mut total_die = 0;
        let mut pass = 0;
        for pixel in pixels {
            match pixel.status {
                Some(true) => {
                    pass += 1;
                    total_die += 1;
                }
                Some(false) => total_die += 1,
                None => {}
            }
        }

        let yield_percent = (total_die > 0)
            .then(|| (pass as f64 / total_die as f64 * 100.0 * 100.0).round() / 100.0);

        Self {
            total_die,
            pass,
            fail: total_die - pass,
            yield_percent,
        }
    }
}

impl WaferMapModel {
    pub fn summary(&self) -> WaferSummary {
        WaferSummary::from_pixels(&self.pixels)
    }
}

/// Pixel count per bin code, in registry order. Codes with no dies report 0.
pub fn bin_tallies(model: &WaferMapModel) -> Vec<(String, usize)> {
    model
        .bin_registry
        .codes()
        .map(|code| {
            let n = model.pixels.iter().filter(|p| p.code == code).count();
            (code.to_string(), n)
        })
        .collect()
}
