//! Unified Error Model
//!
//! Only the outer edges fail: reading configuration documents and
//! serializing outputs. The engine itself recovers from every malformed
//! input and reports through [`crate::events`].
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PivtreeError {
    #[error("CONFIG/IO {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CONFIG/JSON: {0}")]
    ConfigJson(#[from] serde_json::Error),

    #[error("CONFIG/YAML: {0}")]
    ConfigYaml(#[from] serde_yaml::Error),
}
