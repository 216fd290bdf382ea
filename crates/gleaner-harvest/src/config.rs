//! Harvest configuration

/// Size limit the repository handles comfortably; larger files are skipped.
const DEFAULT_MAX_FILE_BYTES: u64 = 1000 * 1024 * 1024;

/// Limits and switches of one harvesting run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Largest staged artifact that still becomes a FileObject
    pub max_file_bytes: u64,
    /// Discard artifact content instead of staging and uploading it
    pub skip_content: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            skip_content: false,
        }
    }
}

impl HarvestConfig {
    /// Defaults: 1000 MiB limit, content uploaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the per-file size limit.
    #[must_use]
    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// Toggle skip-content mode.
    #[must_use]
    pub fn with_skip_content(mut self, skip_content: bool) -> Self {
        self.skip_content = skip_content;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let config = HarvestConfig::new()
            .with_max_file_bytes(64)
            .with_skip_content(true);
        assert_eq!(config.max_file_bytes, 64);
        assert!(config.skip_content);
        assert!(!HarvestConfig::default().skip_content);
    }
}
