pub mod managed_context;
pub mod response;

pub use managed_context::{managed_context_middleware, read_managed_context};
pub use response::{ApiResponse, ApiResult};
