//! Error types for fz3d.

use thiserror::Error;

/// Why a container could not be used as the rendering canvas.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerFault {
    /// No element with the given id exists in the document.
    #[error("element \"{0}\" not found")]
    NotFound(String),

    /// The element exists but is not a `<canvas>`.
    #[error("element must be a canvas, found <{tag}>")]
    NotCanvas {
        /// The tag name of the offending element.
        tag: String,
    },
}

/// Errors raised while constructing or driving a [`Viewer`](crate::viewer::Viewer).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    /// The mount target is missing or is not a canvas. Fatal.
    #[error("invalid container: {0}")]
    InvalidContainer(#[from] ContainerFault),

    /// An asset failed to load.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The engine could not create its renderer.
    #[error("engine error: {0}")]
    Engine(String),

    /// The viewer is borrowed elsewhere, or its loader is already draining a queue.
    #[error("the viewer is busy")]
    Busy,

    /// The viewer was destroyed.
    #[error("the viewer has been destroyed")]
    Destroyed,
}

/// Errors reported by the sequential asset loader.
///
/// These never abort the process; the loader's
/// [`ErrorPolicy`](crate::loader::ErrorPolicy) decides whether the queue advances.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The request's format tag is not one of `obj`, `gltf`, `glb`, `fbx`, `json`.
    #[error("unsupported asset format `{0}`; only obj, gltf, glb, fbx and json can be loaded")]
    UnsupportedFormat(String),

    /// A sub-loader reported an error.
    #[error("failed to load `{url}`: {message}")]
    LoadFailure {
        /// The resolved URL that failed.
        url: String,
        /// The sub-loader's error message.
        message: String,
    },
}

impl LoadError {
    /// Builds a [`LoadError::LoadFailure`].
    pub fn failure(url: impl Into<String>, message: impl Into<String>) -> Self {
        LoadError::LoadFailure {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LoadError::LoadFailure { .. })
    }
}

/// Errors raised while reading the build environment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvError {
    /// The mode tag is not `development`, `production` or `test`.
    #[error("invalid mode `{0}`; expected development, production or test")]
    InvalidMode(String),
}

/// Result type alias for viewer operations.
pub type Result<T> = std::result::Result<T, ViewerError>;
