//! Error types for network construction and state introspection.
//!
//! Unresolved paired layers are not errors: they are logged at build time and
//! the dependent operation is skipped. Everything here is either a structural
//! problem caught by `Network::build()` or a bad lookup by variable name/index.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GateError {
    #[error("layer '{0}' not found")]
    UnknownLayer(String),

    #[error("layer '{0}' already exists in this network")]
    DuplicateLayer(String),

    #[error("layer '{layer}' is a {found} layer, expected {expected}")]
    LayerKindMismatch {
        layer: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("pool count mismatch: '{a}' has {a_pools} pools, '{b}' has {b_pools}")]
    PoolCountMismatch {
        a: String,
        a_pools: usize,
        b: String,
        b_pools: usize,
    },

    #[error("shape mismatch between '{a}' and '{b}': {detail}")]
    ShapeMismatch { a: String, b: String, detail: String },

    #[error(
        "deep layer '{layer}' has {deep_rows} unit rows but super layer '{super_layer}' has {super_rows}; \
         expected a row ratio of {expected}"
    )]
    DynRowMismatch {
        layer: String,
        super_layer: String,
        deep_rows: usize,
        super_rows: usize,
        expected: usize,
    },

    #[error("unknown unit variable '{0}'")]
    UnknownUnitVar(String),

    #[error("unknown synapse variable '{0}'")]
    UnknownSynVar(String),

    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("network '{0}' has not been built")]
    NotBuilt(String),

    #[error("invalid parameter {name}: {detail}")]
    InvalidParam { name: &'static str, detail: String },
}

pub type Result<T> = std::result::Result<T, GateError>;
