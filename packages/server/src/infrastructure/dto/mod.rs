//! Data Transfer Objects (DTOs) for the room coordination server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket frame DTOs (chat and call rooms)
//! - `http`: HTTP API request / response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
