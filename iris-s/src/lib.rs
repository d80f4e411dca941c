pub mod api_server;
pub mod error;
pub mod metrics;
pub mod model;
pub mod util;

pub use api_server::ApiServer;
pub use error::ServiceError;
