//! Unified error types for the fuse composition layer.

use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur while composing zones and layouts.
#[derive(Error, Debug)]
pub enum FuseError {
    // --- Configuration ---

    /// A configuration or zone registry file was not found or could not be read.
    #[error("config file not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration or zone registry file exists but contains invalid JSON.
    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // --- Resources ---

    /// A template resource could not be located or opened.
    #[error("template resource not found: {path}")]
    ResourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template resource was opened but its contents could not be read as text.
    #[error("failed to read template resource {path}")]
    ResourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A unit identifier would resolve outside the loader root (absolute path or `..`).
    #[error("invalid unit identifier: {0:?}")]
    InvalidUnit(String),

    // --- Templates ---

    /// Handlebars rejected the template source (malformed syntax).
    #[error("failed to compile template {path}")]
    TemplateCompile {
        path: PathBuf,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    /// Handlebars failed while rendering a compiled template.
    #[error("template rendering failed: {0}")]
    Render(#[source] Box<handlebars::RenderError>),

    // --- Zones ---

    /// `defineZone` was called with an empty name.
    #[error("zone name cannot be empty")]
    EmptyZoneName,

    /// A zone was resolved while another zone of the same request was still resolving.
    #[error("cannot resolve zone '{requested}' while zone '{active}' is being resolved")]
    NestedZone { active: String, requested: String },

    // --- General ---

    /// A filesystem I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A catch-all for errors from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<handlebars::RenderError> for FuseError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Render(Box::new(err))
    }
}

/// Alias for `Result<T, FuseError>`.
pub type Result<T> = std::result::Result<T, FuseError>;
