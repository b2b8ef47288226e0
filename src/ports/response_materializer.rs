use crate::core::{CanonicalResponse, TransportError, TransportResponse};

/// Port writing a [`CanonicalResponse`] onto the live transport response.
pub trait ResponseMaterializer: Send + Sync + 'static {
    /// Apply commands, set the exit code header and status, then send the
    /// payload. Fails with [`TransportError::AlreadySent`] if the target was
    /// already finished.
    fn materialize(
        &self,
        response: CanonicalResponse,
        target: &mut TransportResponse,
    ) -> Result<(), TransportError>;
}
