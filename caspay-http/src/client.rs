//! Authenticated JSON client for the CasPay backend.
//!
//! Every request carries the merchant API key, the SDK version and a JSON
//! content type. Failures are folded into [`CasPayError`]:
//!
//! - a non-2xx response with a JSON body becomes a backend passthrough error
//!   (`code`, `error` and HTTP status taken from the body)
//! - transport failures and undecodable bodies become `NETWORK_ERROR`

use std::fmt;
use std::sync::Arc;

use caspay::config::{CasPayConfig, ConfigError};
use caspay::error::CasPayError;
use caspay::types::ValidateKeyResponse;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::constants::{API_KEY_HEADER, SDK_VERSION, SDK_VERSION_HEADER, VALIDATE_KEY_PATH, user_agent};

/// Fallback message of a backend error without an `error` field.
const DEFAULT_ERROR_MESSAGE: &str = "Request failed";

/// Fallback code of a backend error without a `code` field.
const DEFAULT_ERROR_CODE: &str = "UNKNOWN_ERROR";

/// Message used when the backend answers but reports the key as invalid.
const INVALID_KEY_MESSAGE: &str = "Invalid API key";

/// Client for the CasPay REST API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpClient {
    config: Arc<CasPayConfig>,
    /// Base URL without a trailing slash.
    base_url: String,
    client: Client,
    headers: HeaderMap,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiErrorBody {
    error: Option<String>,
    code: Option<String>,
}

impl HttpClient {
    /// Creates a client with a default `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(config: CasPayConfig) -> Result<Self, ConfigError> {
        Self::with_http_client(config, Client::new())
    }

    /// Creates a client on top of a pre-configured `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid or the API key
    /// cannot be sent as a header value.
    pub fn with_http_client(config: CasPayConfig, client: Client) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| ConfigError::InvalidHeaderValue { field: "apiKey" })?;
        api_key.set_sensitive(true);

        let header_name = |name: &'static str| {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ConfigError::InvalidHeaderValue { field: name })
        };

        let mut headers = HeaderMap::new();
        headers.insert(header_name(API_KEY_HEADER)?, api_key);
        headers.insert(
            header_name(SDK_VERSION_HEADER)?,
            HeaderValue::from_static(SDK_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(agent) = HeaderValue::from_str(&user_agent()) {
            headers.insert(USER_AGENT, agent);
        }

        Ok(Self {
            base_url: config.base_url().to_owned(),
            config: Arc::new(config),
            client,
            headers,
        })
    }

    /// Returns the merchant id.
    #[must_use]
    pub fn merchant_id(&self) -> &str {
        &self.config.merchant_id
    }

    /// Returns the configuration this client was built from.
    #[must_use]
    pub fn config(&self) -> &CasPayConfig {
        &self.config
    }

    /// Returns the base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends a request and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns a backend passthrough error for non-2xx responses and
    /// `NETWORK_ERROR` for transport or decoding failures.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, CasPayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.client.request(method, self.url(path));
        let (status, value) = self.send(builder, body).await?;
        decode(status, value)
    }

    /// Sends a `GET` request.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::request`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CasPayError> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    /// Sends a `GET` request with URL-encoded query parameters.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::request`].
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CasPayError> {
        let mut url =
            Url::parse(&self.url(path)).map_err(|e| CasPayError::network(e.to_string()))?;
        url.query_pairs_mut().extend_pairs(query);
        let (status, value) = self.send::<()>(self.client.get(url), None).await?;
        decode(status, value)
    }

    /// Sends a `POST` request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::request`].
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, CasPayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Sends a request and returns the status with the raw JSON body,
    /// leaving status handling to the caller.
    ///
    /// # Errors
    ///
    /// Returns `NETWORK_ERROR` for transport failures or a non-JSON body.
    pub(crate) async fn send_raw<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(StatusCode, Value), CasPayError>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.client.request(method, self.url(path)), body)
            .await
    }

    async fn send<B>(
        &self,
        mut builder: RequestBuilder,
        body: Option<&B>,
    ) -> Result<(StatusCode, Value), CasPayError>
    where
        B: Serialize + ?Sized,
    {
        builder = builder.headers(self.headers.clone());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| CasPayError::network(e.to_string()))?;
        let status = response.status();
        let value = response
            .json::<Value>()
            .await
            .map_err(|e| CasPayError::network(e.to_string()))?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(status = status.as_u16(), "caspay response");

        Ok((status, value))
    }

    /// Validates the API key against the backend.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_API_KEY` when the backend rejects the key and
    /// `VALIDATION_ERROR` when the key could not be checked.
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(name = "caspay.validate_api_key", skip_all, err)
    )]
    pub async fn validate_api_key(&self) -> Result<ValidateKeyResponse, CasPayError> {
        let response: ValidateKeyResponse = self
            .get(VALIDATE_KEY_PATH)
            .await
            .map_err(|err| match err {
                CasPayError::Api {
                    message, status, ..
                } => CasPayError::invalid_api_key(message, status),
                other => CasPayError::validation(format!(
                    "Failed to validate API key: {}",
                    other.message()
                )),
            })?;
        if response.valid == Some(false) {
            return Err(CasPayError::invalid_api_key(
                INVALID_KEY_MESSAGE,
                StatusCode::UNAUTHORIZED.as_u16(),
            ));
        }
        Ok(response)
    }
}

/// Turns a raw response into `T` or a backend error.
fn decode<T: DeserializeOwned>(status: StatusCode, value: Value) -> Result<T, CasPayError> {
    if !status.is_success() {
        return Err(api_error(status, value));
    }
    serde_json::from_value(value).map_err(|e| CasPayError::network(e.to_string()))
}

/// Builds the passthrough error for a non-2xx response body.
pub(crate) fn api_error(status: StatusCode, value: Value) -> CasPayError {
    let body: ApiErrorBody = serde_json::from_value(value).unwrap_or_default();
    CasPayError::api(
        body.code.unwrap_or_else(|| DEFAULT_ERROR_CODE.to_owned()),
        body.error
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_owned()),
        status.as_u16(),
    )
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("merchant_id", &self.config.merchant_id)
            .finish_non_exhaustive()
    }
}
