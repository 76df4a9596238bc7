//! g85map: SEMI G85-1101 wafer map parser with optional Python bindings.
//!
//! A parse turns one XML document into one [`WaferMapModel`]: device
//! metadata, a bin registry, and a row-major grid of normalized die
//! rectangles on the unit square.

pub mod config;
pub mod error;
pub mod parser;
pub mod reader;
pub mod summary;
pub mod types;

#[cfg(feature = "python")]
mod python;

pub use config::ParseConfig;
pub use error::{Result, WaferMapError};
pub use parser::{parse_wafer_map_file, parse_wafer_map_reader, parse_wafer_map_str};
pub use summary::WaferSummary;
pub use types::{BinDefinition, BinRegistry, BinType, ChipSize, DeviceAttributes, Pixel, WaferMapModel};
