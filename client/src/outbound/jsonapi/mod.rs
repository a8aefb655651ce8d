//! JSON:API outbound adapter.
//!
//! This module provides a thin HTTP implementation of the `ResourceGateway`
//! port.

mod dto;
mod gateway;

pub use gateway::{JSON_API_MEDIA_TYPE, JsonApiGateway};
