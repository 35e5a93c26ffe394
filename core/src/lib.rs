//! API client core for the storefront backend.
//!
//! # Overview
//! Resolves endpoint URLs through a fixed table, attaches the stored bearer
//! token, dispatches one request per call and normalizes every response into
//! an [`Envelope`] or a classified [`ApiError`].
//!
//! # Design
//! - `StorefrontClient` is stateless and does no I/O: `build` produces an
//!   `HttpRequest`, `parse` consumes an `HttpResponse`.
//! - `ApiClient` adds the two I/O seams, a [`Transport`] and a
//!   [`TokenStore`], both injected so tests need no live backend.
//! - `Session` is the only writer of the token store (login, logout, and
//!   clearing a token the server rejected).
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod http;
pub mod session;
pub mod token;
pub mod transport;
pub mod types;

#[cfg(test)]
mod fakes;

pub use api::{expect_data, ApiClient};
pub use client::{normalize, resolve, StorefrontClient};
pub use config::{BaseUrl, ClientConfig};
pub use endpoints::{EndpointKey, EndpointTable};
pub use envelope::{Envelope, Pagination};
pub use error::{ApiError, ConfigError, ErrorKind, StorageError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestDescriptor};
pub use session::Session;
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use transport::Transport;
pub use types::{
    CartItem, Location, LocationQuery, SendOtp, UpdateProfile, UserProfile, VerifiedLogin,
    VerifyOtp,
};
