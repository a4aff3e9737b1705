//! Core library for the Google Maps directions proxy.
//!
//! - [`query`]: typed directions and geocode queries and URI-component encoding
//! - [`config`]: startup configuration read from the environment
//! - [`client`]: async client for the upstream Directions and Geocoding APIs
//! - [`error`]: the library [`Error`] type
//!
//! The crate has no HTTP server code; the service crates wrap it with axum.

pub mod client;
pub mod config;
pub mod error;
pub mod query;

pub use client::{Endpoint, MapsClient, UpstreamPayload};
pub use config::{ProxyConfig, UpstreamConfig};
pub use error::{Error, Result};
pub use query::{DirectionsQuery, GeocodeQuery, Overview, TravelMode, Units};
