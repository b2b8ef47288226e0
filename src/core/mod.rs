pub mod command;
pub mod error;
pub mod events;
pub mod method;
pub mod raw_request;
pub mod request;
pub mod response;
pub mod route;
pub mod transport_response;

pub use command::{Command, CommandEntry, CookieSpec, SameSite};
pub use error::{ApiError, FlowError};
pub use events::{AdapterEvent, EventBus};
pub use method::HttpMethod;
pub use raw_request::{RawRequest, RawRequestError, RequestId};
pub use request::{CanonicalRequest, ParamBag, ParamSource};
pub use response::{CanonicalResponse, Payload};
pub use route::{LoadedRouteIndex, RouteDescriptor};
pub use transport_response::{TransportError, TransportResponse};
