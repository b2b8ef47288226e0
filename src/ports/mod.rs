pub mod error_translator;
pub mod request_flow;
pub mod request_normalizer;
pub mod response_materializer;
pub mod route_container;

pub use error_translator::{ErrorTranslator, Translation};
pub use request_flow::{FlowOutcome, Reply, RequestFlow, flow_fn};
pub use request_normalizer::RequestNormalizer;
pub use response_materializer::ResponseMaterializer;
pub use route_container::RouteContainer;
