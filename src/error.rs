//! Error type shared by every parse stage.

use thiserror::Error;

/// Result alias for wafer map parsing.
pub type Result<T> = std::result::Result<T, WaferMapError>;

/// Fatal parse failures. An unsupported format revision is not one of them.
#[derive(Error, Debug)]
pub enum WaferMapError {
    /// The document could not be opened or decompressed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Not well-formed XML, or the root element is not `Map`.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("missing required `Device` element")]
    MissingRequiredDeviceBlock,

    /// An attribute or element with no default is absent.
    #[error("missing required field `{field}` on `{element}`")]
    MissingRequiredField {
        element: &'static str,
        field: &'static str,
    },

    #[error("invalid number for `{field}`: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid wafer geometry: {rows} rows x {cols} columns")]
    InvalidGeometry { rows: u32, cols: u32 },

    /// A die token did not resolve in the bin registry, usually because
    /// `BinType` disagrees with the width of the row data.
    #[error("unknown bin code {code:?} at row {row}, column {col}")]
    UnknownBinCode { code: String, row: u32, col: u32 },
}

impl From<roxmltree::Error> for WaferMapError {
    fn from(e: roxmltree::Error) -> Self {
        WaferMapError::MalformedDocument(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_bin_code_message() {
        let err = WaferMapError::UnknownBinCode {
            code: "001".to_string(),
            row: 0,
            col: 0,
        };
        assert_eq!(err.to_string(), "unknown bin code \"001\" at row 0, column 0");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: WaferMapError = io.into();
        assert!(matches!(err, WaferMapError::Io(_)));
    }
}
