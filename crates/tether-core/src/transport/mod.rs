pub mod errors;
pub mod http;
pub mod traits;

pub use errors::TransportError;
pub use http::HttpBackend;
pub use traits::Backend;
