//! Error types for chain solver setup.

use thiserror::Error;

/// Errors raised while building or configuring a chain solver.
///
/// Runtime failures (a collider driver bone missing from this frame's pose, a
/// degenerate edge) are never errors; they disable the affected contribution
/// for the frame instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// A named bone could not be found in the skeleton.
    #[error("Unresolved bone '{name}' ({role})")]
    UnresolvedBone {
        /// Bone name as configured.
        name: String,
        /// What the bone was meant to drive (chain root, gravity driver, ...).
        role: &'static str,
    },

    /// A chain resolved to fewer than two bones.
    #[error("Chain rooted at '{root}' has {found} bone(s), need at least 2")]
    ChainTooShort {
        /// Root bone name of the chain.
        root: String,
        /// Number of bones gathered.
        found: usize,
    },

    /// No chains were configured.
    #[error("No chains configured")]
    NoChains,

    /// Configuration value out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A per-frame call was made before a successful initialization.
    #[error("Solver is not initialized")]
    NotInitialized,
}

impl ChainError {
    /// Create an unresolved bone error.
    pub fn unresolved_bone(name: impl Into<String>, role: &'static str) -> Self {
        Self::UnresolvedBone {
            name: name.into(),
            role,
        }
    }

    /// Create a chain-too-short error.
    pub fn chain_too_short(root: impl Into<String>, found: usize) -> Self {
        Self::ChainTooShort {
            root: root.into(),
            found,
        }
    }

    /// Create an invalid config error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type for chain solver operations.
pub type Result<T> = std::result::Result<T, ChainError>;
