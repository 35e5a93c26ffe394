//! Async client: token read, build, one dispatch, normalize.
//!
//! # Design
//! `ApiClient` composes the stateless `StorefrontClient` with an injected
//! `Transport` and `TokenStore`. It holds immutable configuration and two
//! `Arc`s, so clones are cheap and concurrent calls share nothing mutable.
//! Each call suspends twice: on the bounded token read and on the transport.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::client::{normalize, requests, StorefrontClient};
use crate::config::ClientConfig;
use crate::endpoints::EndpointTable;
use crate::envelope::Envelope;
use crate::error::{ApiError, StorageError};
use crate::http::RequestDescriptor;
use crate::token::TokenStore;
use crate::transport::Transport;
use crate::types::{CartItem, LocationQuery, SendOtp, UpdateProfile, VerifyOtp};

pub struct ApiClient<T, S> {
    core: StorefrontClient,
    transport: Arc<T>,
    tokens: Arc<S>,
    request_timeout: Option<Duration>,
    storage_timeout: Duration,
}

impl<T, S> Clone for ApiClient<T, S> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            transport: Arc::clone(&self.transport),
            tokens: Arc::clone(&self.tokens),
            request_timeout: self.request_timeout,
            storage_timeout: self.storage_timeout,
        }
    }
}

impl<T, S> fmt::Debug for ApiClient<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", self.core.base_url())
            .field("request_timeout", &self.request_timeout)
            .field("storage_timeout", &self.storage_timeout)
            .finish_non_exhaustive()
    }
}

impl<T: Transport, S: TokenStore> ApiClient<T, S> {
    pub fn new(config: ClientConfig, transport: T, tokens: Arc<S>) -> Self {
        Self::with_endpoints(config, EndpointTable::standard(), transport, tokens)
    }

    pub fn with_endpoints(
        config: ClientConfig,
        endpoints: EndpointTable,
        transport: T,
        tokens: Arc<S>,
    ) -> Self {
        Self {
            core: StorefrontClient::with_endpoints(config.base_url, endpoints),
            transport: Arc::new(transport),
            tokens,
            request_timeout: config.request_timeout,
            storage_timeout: config.storage_timeout,
        }
    }

    /// The request builder this client dispatches through.
    pub fn storefront(&self) -> &StorefrontClient {
        &self.core
    }

    pub(crate) fn tokens(&self) -> &S {
        &self.tokens
    }

    /// Read the stored token, waiting at most `storage_timeout`.
    pub async fn current_token(&self) -> Result<Option<String>, ApiError> {
        match tokio::time::timeout(self.storage_timeout, self.tokens.get()).await {
            Ok(token) => Ok(token?),
            Err(_) => Err(StorageError::Timeout.into()),
        }
    }

    /// Resolve, authenticate, dispatch once and normalize.
    pub async fn send(&self, descriptor: RequestDescriptor<'_>) -> Result<Envelope, ApiError> {
        // Configuration problems surface before any I/O.
        self.core.resolve(descriptor.endpoint)?;

        let token = self.current_token().await?;
        let request = self.core.build(&descriptor, token.as_deref())?;
        let method = request.method;
        let url = request.url.clone();

        tracing::debug!(%method, %url, "dispatching request");
        let response = match self.transport.execute(request, self.request_timeout).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%method, %url, error = %e, "transport failed");
                return Err(e.into());
            }
        };

        let status = response.status;
        match normalize(response) {
            Ok(envelope) => {
                tracing::debug!(%method, %url, status, "request succeeded");
                Ok(envelope)
            }
            Err(e) => {
                tracing::warn!(
                    %method,
                    %url,
                    status,
                    kind = ?e.kind(),
                    error = %e,
                    "request failed"
                );
                Err(e)
            }
        }
    }

    pub async fn get_locations(&self, query: Option<&LocationQuery>) -> Result<Envelope, ApiError> {
        self.send(requests::get_locations(query)).await
    }

    pub async fn get_profile(&self) -> Result<Envelope, ApiError> {
        self.send(requests::get_profile()).await
    }

    pub async fn update_profile(&self, input: &UpdateProfile) -> Result<Envelope, ApiError> {
        self.send(requests::update_profile(input)?).await
    }

    pub async fn send_otp(&self, input: &SendOtp) -> Result<Envelope, ApiError> {
        self.send(requests::send_otp(input)?).await
    }

    pub async fn verify_otp(&self, input: &VerifyOtp) -> Result<Envelope, ApiError> {
        self.send(requests::verify_otp(input)?).await
    }

    pub async fn add_or_update_cart(&self, input: &CartItem) -> Result<Envelope, ApiError> {
        self.send(requests::add_or_update_cart(input)?).await
    }
}

/// Decode a successful envelope's payload, treating a missing or mistyped
/// payload as a parse failure.
pub fn expect_data<D: DeserializeOwned>(envelope: &Envelope) -> Result<D, ApiError> {
    let parse = |message: String| ApiError::Parse {
        status: 200,
        message,
    };
    envelope
        .decode_data()
        .map_err(|e| parse(format!("unexpected data shape: {e}")))?
        .ok_or_else(|| parse("response has no data".to_string()))
}
