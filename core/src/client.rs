//! Stateless request builder and response normalizer for the storefront API.
//!
//! # Design
//! `StorefrontClient` holds only a base URL and an endpoint table and carries
//! no mutable state between calls. `build` turns a `RequestDescriptor` plus an
//! optional token into an `HttpRequest`; `parse` turns an `HttpResponse` into
//! an `Envelope` or an `ApiError`. The round-trip in between belongs to the
//! caller (or to [`ApiClient`](crate::ApiClient)), keeping this half
//! deterministic and free of I/O.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::BaseUrl;
use crate::endpoints::{EndpointKey, EndpointTable};
use crate::envelope::Envelope;
use crate::error::{ApiError, ConfigError, TransportError};
use crate::http::{
    HttpRequest, HttpResponse, RequestDescriptor, ACCEPT, APPLICATION_JSON, AUTHORIZATION,
    CONTENT_TYPE,
};
use crate::types::{CartItem, LocationQuery, SendOtp, UpdateProfile, VerifyOtp};

/// Join `base` and the table entry for `key` into an absolute URL.
///
/// The base never ends with `/` and table paths always start with one, so the
/// join has exactly one separator. Missing keys fail with
/// `ConfigError::UnknownEndpoint`.
pub fn resolve(
    base: &BaseUrl,
    table: &EndpointTable,
    key: EndpointKey<'_>,
) -> Result<String, ConfigError> {
    let url = format!("{}{}", base.as_str(), table.path(key)?);
    if let Err(e) = Url::parse(&url) {
        return Err(ConfigError::MalformedUrl {
            reason: e.to_string(),
            url,
        });
    }
    Ok(url)
}

/// Map a raw response to an envelope or a classified error.
pub fn normalize(response: HttpResponse) -> Result<Envelope, ApiError> {
    let status = response.status;
    let parsed = parse_envelope(&response.body);
    match parsed {
        Ok(envelope) if envelope.success && response.is_success() => Ok(envelope),
        Ok(envelope) => Err(ApiError::Application { status, envelope }),
        Err(message) if response.is_success() => Err(ApiError::Parse { status, message }),
        Err(_) => Err(ApiError::Transport(TransportError::Status {
            status,
            body: response.body,
        })),
    }
}

fn parse_envelope(body: &str) -> Result<Envelope, String> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| format!("body is not valid JSON: {e}"))?;
    serde_json::from_value(value).map_err(|e| format!("body is not a response envelope: {e}"))
}

pub(crate) fn to_body<T: Serialize>(input: &T) -> Result<Value, ApiError> {
    serde_json::to_value(input).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Descriptors for the typed storefront operations.
pub mod requests {
    use super::*;

    pub fn get_locations(query: Option<&LocationQuery>) -> RequestDescriptor<'static> {
        let mut descriptor = RequestDescriptor::get(EndpointKey::LOCATIONS_GET_ALL);
        if let Some(query) = query {
            descriptor.query = query.pairs();
        }
        descriptor
    }

    pub fn get_profile() -> RequestDescriptor<'static> {
        RequestDescriptor::get(EndpointKey::USER_PROFILE)
    }

    pub fn update_profile(input: &UpdateProfile) -> Result<RequestDescriptor<'static>, ApiError> {
        Ok(RequestDescriptor::post(EndpointKey::USER_UPDATE, to_body(input)?))
    }

    pub fn send_otp(input: &SendOtp) -> Result<RequestDescriptor<'static>, ApiError> {
        Ok(RequestDescriptor::post(EndpointKey::AUTH_SEND_OTP, to_body(input)?))
    }

    pub fn verify_otp(input: &VerifyOtp) -> Result<RequestDescriptor<'static>, ApiError> {
        Ok(RequestDescriptor::post(
            EndpointKey::AUTH_VERIFY_OTP_MOBILE,
            to_body(input)?,
        ))
    }

    pub fn add_or_update_cart(input: &CartItem) -> Result<RequestDescriptor<'static>, ApiError> {
        Ok(RequestDescriptor::post(
            EndpointKey::CART_ADD_OR_UPDATE,
            to_body(input)?,
        ))
    }
}

/// Synchronous, stateless client for the storefront API.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    base_url: BaseUrl,
    endpoints: Arc<EndpointTable>,
}

impl StorefrontClient {
    pub fn new(base_url: BaseUrl) -> Self {
        Self::with_endpoints(base_url, EndpointTable::standard())
    }

    pub fn with_endpoints(base_url: BaseUrl, endpoints: EndpointTable) -> Self {
        Self {
            base_url,
            endpoints: Arc::new(endpoints),
        }
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    pub fn endpoints(&self) -> &EndpointTable {
        &self.endpoints
    }

    pub fn resolve(&self, key: EndpointKey<'_>) -> Result<String, ConfigError> {
        resolve(&self.base_url, &self.endpoints, key)
    }

    /// Build the request for `descriptor`, attaching `token` as a bearer
    /// credential when it is present and not blank.
    pub fn build(
        &self,
        descriptor: &RequestDescriptor<'_>,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let mut url = self.resolve(descriptor.endpoint)?;
        if !descriptor.query.is_empty() {
            let query = serde_urlencoded::to_string(&descriptor.query)
                .map_err(|e| ConfigError::Query(e.to_string()))?;
            url.push('?');
            url.push_str(&query);
        }

        let mut headers = vec![
            (CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()),
            (ACCEPT.to_string(), APPLICATION_JSON.to_string()),
        ];
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            headers.push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
        }

        let body = descriptor
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::Serialization(e.to_string()))?;

        tracing::debug!(
            endpoint = %descriptor.endpoint,
            method = %descriptor.method,
            url = %url,
            authenticated = (headers.len() > 2),
            "built request"
        );

        Ok(HttpRequest {
            method: descriptor.method,
            url,
            headers,
            body,
        })
    }

    pub fn build_get_locations(
        &self,
        query: Option<&LocationQuery>,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        self.build(&requests::get_locations(query), token)
    }

    pub fn build_get_profile(&self, token: Option<&str>) -> Result<HttpRequest, ApiError> {
        self.build(&requests::get_profile(), token)
    }

    pub fn build_update_profile(
        &self,
        input: &UpdateProfile,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        self.build(&requests::update_profile(input)?, token)
    }

    pub fn build_send_otp(&self, input: &SendOtp) -> Result<HttpRequest, ApiError> {
        self.build(&requests::send_otp(input)?, None)
    }

    pub fn build_verify_otp(&self, input: &VerifyOtp) -> Result<HttpRequest, ApiError> {
        self.build(&requests::verify_otp(input)?, None)
    }

    pub fn build_add_or_update_cart(
        &self,
        input: &CartItem,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        self.build(&requests::add_or_update_cart(input)?, token)
    }

    pub fn parse(&self, response: HttpResponse) -> Result<Envelope, ApiError> {
        normalize(response)
    }
}
