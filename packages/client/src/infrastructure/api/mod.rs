//! HTTP implementation of the snapshot/history collaborator.

pub mod http;

pub use http::HttpChatApi;
