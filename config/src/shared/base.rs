use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,
    /// Upstream pages must contain at least one document.
    #[error("`upstream.page_size` cannot be zero")]
    PageSizeZero,
    /// The trailing time window requested from the upstream API is empty.
    #[error("`upstream.window_days` cannot be zero")]
    WindowDaysZero,
    /// The upstream API url is not an absolute http(s) url.
    #[error("Invalid upstream api url `{0}`")]
    InvalidApiUrl(String),
    /// A staging schema name is required to address staged tables.
    #[error("`staging.schema` cannot be empty")]
    EmptyStagingSchema,
}
