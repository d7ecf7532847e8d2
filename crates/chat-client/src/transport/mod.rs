//! HTTP and relay transports.

pub mod api;
pub mod http;
pub mod relay;

pub use api::ChatApi;
pub use http::HttpChatApi;
pub use relay::RelayConnection;
