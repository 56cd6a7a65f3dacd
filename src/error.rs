//! # Error Module
//!
//! Failures the world core can report. Configuration problems and lost workers are
//! errors here; rejected mounts and similar rule violations are reported with `bool`
//! flags by the entity store, and chunk coordinates outside the world bounds are
//! simply skipped.

use std::fmt;
use std::path::PathBuf;

/// Errors produced while configuring or generating the world.
#[derive(Debug)]
pub enum WorldError {
    /// A material name referenced by the terrain configuration is not in the registry.
    ///
    /// This is fatal for the chunk being generated: it means the registry is incomplete,
    /// and substituting another block would bake wrong terrain into the world.
    UnknownMaterial {
        /// The name that failed to resolve.
        name: String,
    },
    /// The configuration file could not be read.
    ConfigIo {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The configuration file is not valid JSON for [`crate::config::GameConfig`].
    ConfigParse(serde_json::Error),
    /// The configuration parsed but holds values the world cannot run with.
    InvalidConfig(String),
    /// A generation worker stopped before returning its task's result.
    WorkerLost,
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMaterial { name } => {
                write!(f, "material '{name}' is not present in the material registry")
            }
            Self::ConfigIo { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            Self::ConfigParse(err) => write!(f, "failed to parse config: {err}"),
            Self::InvalidConfig(reason) => write!(f, "invalid config: {reason}"),
            Self::WorkerLost => f.write_str("a generation worker stopped with work outstanding"),
        }
    }
}

impl std::error::Error for WorldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigIo { source, .. } => Some(source),
            Self::ConfigParse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for WorldError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigParse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_material_names_the_material() {
        let err = WorldError::UnknownMaterial {
            name: "obsidian".to_string(),
        };
        assert!(err.to_string().contains("obsidian"));
    }

    #[test]
    fn parse_errors_keep_their_source() {
        let parse_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = WorldError::from(parse_err);
        assert!(std::error::Error::source(&err).is_some());
    }
}
