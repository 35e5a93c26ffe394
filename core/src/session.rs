//! Login and logout: the only code that writes the token store.

use crate::api::{expect_data, ApiClient};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::token::TokenStore;
use crate::transport::Transport;
use crate::types::{SendOtp, VerifiedLogin, VerifyOtp};

/// OTP login flow on top of an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct Session<T, S> {
    api: ApiClient<T, S>,
}

impl<T: Transport, S: TokenStore> Session<T, S> {
    pub fn new(api: ApiClient<T, S>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient<T, S> {
        &self.api
    }

    pub async fn request_otp(&self, mobile: &str) -> Result<Envelope, ApiError> {
        self.api
            .send_otp(&SendOtp {
                mobile: mobile.to_string(),
            })
            .await
    }

    /// Verify the OTP and persist the issued token.
    pub async fn login(&self, input: &VerifyOtp) -> Result<VerifiedLogin, ApiError> {
        let envelope = self.api.verify_otp(input).await?;
        let login: VerifiedLogin = expect_data(&envelope)?;
        if login.token.trim().is_empty() {
            return Err(ApiError::Parse {
                status: 200,
                message: "login response carries an empty token".to_string(),
            });
        }
        self.api.tokens().set(&login.token).await?;
        tracing::info!("logged in");
        Ok(login)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.api.tokens().delete().await?;
        tracing::info!("logged out");
        Ok(())
    }

    pub async fn is_logged_in(&self) -> Result<bool, ApiError> {
        Ok(self
            .api
            .current_token()
            .await?
            .is_some_and(|t| !t.trim().is_empty()))
    }

    /// Pass `result` through, dropping the stored token first when the server
    /// refused the credentials.
    pub async fn guard<R>(&self, result: Result<R, ApiError>) -> Result<R, ApiError> {
        if let Err(err) = &result {
            if err.is_auth_failure() {
                tracing::warn!(status = ?err.status(), "credentials rejected, clearing token");
                if let Err(e) = self.api.tokens().delete().await {
                    tracing::warn!(error = %e, "failed to clear rejected token");
                }
            }
        }
        result
    }
}
