//! Data Transfer Objects (DTOs) for the chat protocol.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket frame DTOs
//! - `http`: HTTP API response DTOs
//! - `conversion`: DTO → domain model conversions

pub mod conversion;
pub mod http;
pub mod websocket;
