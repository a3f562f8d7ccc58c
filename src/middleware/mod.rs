pub mod gatekeeper;
pub mod response;

pub use gatekeeper::{classify, gatekeeper, RouteClass};
pub use response::{ApiResponse, ApiResult};
