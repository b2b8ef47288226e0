use crate::core::{FlowError, TransportResponse};

/// Result of translating an error.
#[derive(Debug)]
pub enum Translation {
    /// A response was written to the target; nothing else to do.
    Handled,
    /// Not ours to answer: continue on the transport's generic failure path.
    Forward(FlowError),
}

/// Port classifying flow errors into responses.
pub trait ErrorTranslator: Send + Sync + 'static {
    fn translate(&self, error: FlowError, target: &mut TransportResponse) -> Translation;
}
