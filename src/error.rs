//! Error taxonomy
//!
//! Every variant is recoverable: level setup logs it and skips the entity.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown bird type: {0}")]
    UnknownBird(String),

    #[error("unknown pig type: {0}")]
    UnknownPig(String),

    #[error("unsupported block: material={material} shape={shape} type={subtype}")]
    UnsupportedBlock {
        material: String,
        shape: String,
        subtype: u32,
    },

    #[error("no map data for level {0}")]
    MissingLevel(u32),

    #[error("malformed map data: {0}")]
    Map(#[from] serde_json::Error),
}
