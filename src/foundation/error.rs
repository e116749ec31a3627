/// Convenience result type used across slotreveal.
pub type RevealResult<T> = Result<T, RevealError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Export failures are terminal for the export attempt only; none of these variants is ever
/// raised from the live compositor path.
#[derive(thiserror::Error, Debug)]
pub enum RevealError {
    /// Invalid user-provided settings, mapping, or project data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A mapping references an asset id that is not in the current asset list.
    #[error("asset missing: '{0}'")]
    AssetMissing(String),

    /// The slot effect is enabled but there are no assets to spin through.
    #[error("slot effect is enabled but no assets were provided")]
    NoAssetsForSlotEffect,

    /// The raster-capture or sequence-encoder collaborator failed.
    #[error("capture failed: {0}")]
    CaptureFailure(String),

    /// A capability (font loading, decoding) is not available in this environment.
    #[error("unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RevealError {
    /// Build a [`RevealError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RevealError::AssetMissing`] value.
    pub fn asset_missing(id: impl Into<String>) -> Self {
        Self::AssetMissing(id.into())
    }

    /// Build a [`RevealError::CaptureFailure`] value.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::CaptureFailure(msg.into())
    }

    /// Build a [`RevealError::UnsupportedEnvironment`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedEnvironment(msg.into())
    }

    /// Build a [`RevealError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
