//! The two competing compression algorithms

use serde::{Deserialize, Serialize};

/// Compression algorithm applied to the tar stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Primary algorithm, always run first
    Gzip,
    /// Secondary algorithm, run after the primary has completed
    Brotli,
}

impl Algorithm {
    /// Run order within a campaign tick
    pub const ALL: [Algorithm; 2] = [Algorithm::Gzip, Algorithm::Brotli];

    /// Deterministic artifact file name inside the target directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Algorithm::Gzip => "files.tgz",
            Algorithm::Brotli => "files.tar.br",
        }
    }

    /// Label used in the results log
    pub fn label(&self) -> &'static str {
        match self {
            Algorithm::Gzip => "Gzip",
            Algorithm::Brotli => "Brotli",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_runs_first() {
        assert_eq!(Algorithm::ALL[0], Algorithm::Gzip);
        assert_eq!(Algorithm::ALL[1], Algorithm::Brotli);
    }

    #[test]
    fn test_artifact_names_are_distinct() {
        assert_ne!(Algorithm::Gzip.file_name(), Algorithm::Brotli.file_name());
        assert_eq!(Algorithm::Brotli.to_string(), "Brotli");
    }
}
