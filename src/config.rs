//! Parse configuration passed into the entry points.

/// Format revision written by SEMI G85-1101 documents.
pub const SEMI_G85_1101: &str = "SEMI G85-1101";

/// Wafer diameter in millimeters assumed when `WaferSize` is absent.
pub const DEFAULT_WAFER_SIZE: f64 = 300.0;

/// Knobs for a single parse call.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseConfig {
    /// Revisions accepted as valid. Anything else only clears `is_valid`.
    pub supported_revisions: Vec<String>,
    pub default_wafer_size: f64,
}

impl ParseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_supported_revision(mut self, revision: impl Into<String>) -> Self {
        let revision = revision.into();
        if !self.supported_revisions.contains(&revision) {
            self.supported_revisions.push(revision);
        }
        self
    }

    pub fn with_default_wafer_size(mut self, size: f64) -> Self {
        self.default_wafer_size = size;
        self
    }

    pub fn is_supported(&self, revision: Option<&str>) -> bool {
        revision.is_some_and(|r| self.supported_revisions.iter().any(|s| s == r))
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            supported_revisions: vec![SEMI_G85_1101.to_string()],
            default_wafer_size: DEFAULT_WAFER_SIZE,
        }
    }
}
