pub mod command_executor;
pub mod dispatcher;
pub mod error_translator;
pub mod http_adapter;
pub mod materializer;
pub mod middleware;
pub mod normalizer;
pub mod pipeline;

/// Re-export commonly used types from adapters
pub use command_executor::{CommandError, CommandExecutor};
pub use dispatcher::{Dispatcher, METHOD_BINDINGS, MethodBinding};
pub use error_translator::DefaultErrorTranslator;
pub use http_adapter::{AdapterError, HttpAdapter};
pub use materializer::DefaultResponseMaterializer;
pub use middleware::*;
pub use normalizer::DefaultRequestNormalizer;
pub use pipeline::{ForwardedError, RequestPipeline, Stage};
pub use crate::core::{RawRequest, RawRequestError, TransportError, TransportResponse};
