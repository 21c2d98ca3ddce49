//! HTTP plumbing for the Tethr API: client construction, the authenticated
//! session transport, binary downloads and the error taxonomy.

pub mod error;
pub mod http;
pub mod stream;
pub mod transport;

pub use error::{Result, TethrError};
pub use http::{HttpClient, HttpClientFactory, TransportOptions, SDK_VERSION};
pub use stream::AudioStream;
pub use transport::{SessionTransport, DEFAULT_DATA_MEDIA_TYPE};
