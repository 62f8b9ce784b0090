//! SigV4-signed Cost Explorer client.
//!
//! Cost Explorer speaks the AWS JSON 1.1 protocol: every call is a `POST /`
//! with the operation named in `X-Amz-Target`. The service has a single
//! endpoint per partition, so requests are always signed for `us-east-1`
//! (or `cn-northwest-1` in the China partition).
//!
//! # Examples
//!
//! ## Default credential chain
//!
//! ```no_run
//! use awsce_client::CostExplorerClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CostExplorerClient::new().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Using a Specific Profile
//!
//! ```no_run
//! use awsce_client::CostExplorerClient;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CostExplorerClient::builder()
//!         .profile("billing")
//!         .timeout(Duration::from_secs(30))
//!         .build()
//!         .await?;
//!     Ok(())
//! }
//! ```

use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    sign, SignableBody, SignableRequest, SigningParams, SigningSettings,
};
use aws_sigv4::sign::v4;
use aws_types::region::Region;
use awsce_core::{ApiError, CostExplorerApi, GetCostAndUsageRequest, GetCostForecastRequest};
use http::header::{CONTENT_TYPE, HOST};
use http::Method;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::aws_error::{parse_aws_error, transport_error};
use crate::config::ConfigError;

/// Signing name of the Cost Explorer service
pub const SERVICE_NAME: &str = "ce";

/// `X-Amz-Target` prefix for Cost Explorer operations
pub const TARGET_PREFIX: &str = "AWSInsightsIndexService";

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

const CONTENT_TYPE_JSON: &str = "application/x-amz-json-1.1";
const X_AMZ_TARGET: &str = "x-amz-target";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Cost Explorer client backed by `reqwest` and `aws-sigv4`.
///
/// Cheap to clone; clones share the HTTP connection pool and credentials
/// provider.
#[derive(Clone)]
pub struct CostExplorerClient {
    client: Client,
    credentials_provider: Arc<dyn ProvideCredentials>,
    endpoint: String,
    host: String,
    signing_region: String,
}

/// Builder for [`CostExplorerClient`].
///
/// ```no_run
/// use awsce_client::CostExplorerClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = CostExplorerClient::builder()
///         .static_credentials("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY", None)
///         .region("cn-north-1")
///         .build()
///         .await?;
///     assert_eq!(client.endpoint(), "https://ce.cn-northwest-1.amazonaws.com.cn");
///     Ok(())
/// }
/// ```
#[derive(Default)]
pub struct CostExplorerClientBuilder {
    profile: Option<String>,
    region: Option<String>,
    endpoint_url: Option<String>,
    timeout: Option<Duration>,
    credentials_provider: Option<Arc<dyn ProvideCredentials>>,
}

// ============================================================================
// Builder Implementation
// ============================================================================

impl CostExplorerClientBuilder {
    /// Set the AWS profile to load credentials from.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set the region. Only the partition matters: Cost Explorer is served
    /// from one region per partition.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Override the endpoint URL (for proxies, VPC endpoints and tests).
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Set the HTTP request timeout (default: 60 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use fixed access keys instead of the default credential chain.
    pub fn static_credentials(
        self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            session_token,
            None,
            "awsce-static",
        );
        self.credentials_provider(Arc::new(credentials))
    }

    /// Inject a custom credentials provider (useful for testing).
    ///
    /// When set, skips the default AWS credential chain.
    pub fn credentials_provider(mut self, provider: Arc<dyn ProvideCredentials>) -> Self {
        self.credentials_provider = Some(provider);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No AWS credentials are found (and no provider was set)
    /// - The endpoint URL is invalid
    /// - The HTTP client fails to initialize
    pub async fn build(self) -> Result<CostExplorerClient, ConfigError> {
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let region = self.region.as_deref().unwrap_or(DEFAULT_REGION);
        let signing_region = partition_region(region).to_string();

        let credentials_provider = if let Some(provider) = self.credentials_provider {
            provider
        } else {
            let mut config_loader = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(signing_region.clone()));

            if let Some(profile_name) = &self.profile {
                config_loader = config_loader.profile_name(profile_name);
            }

            let config = config_loader.load().await;

            config
                .credentials_provider()
                .map(Arc::from)
                .ok_or(ConfigError::NoCredentials)?
        };

        let endpoint = match self.endpoint_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => get_endpoint(&signing_region),
        };
        let host = host_header(&endpoint)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to create HTTP client: {}", e)))?;

        log::debug!(
            "cost explorer client: endpoint={}, signing_region={}",
            endpoint,
            signing_region
        );

        Ok(CostExplorerClient {
            client,
            credentials_provider,
            endpoint,
            host,
            signing_region,
        })
    }
}

// ============================================================================
// CostExplorerClient Implementation
// ============================================================================

impl CostExplorerClient {
    /// Create a client using the default AWS credential chain:
    /// 1. Environment variables (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY)
    /// 2. Shared credentials file (~/.aws/credentials)
    /// 3. IAM instance profile (on EC2)
    /// 4. Container credentials (in ECS/Fargate)
    /// 5. SSO credentials (if configured)
    ///
    /// # Errors
    ///
    /// Returns an error if no AWS credentials are found.
    pub async fn new() -> Result<Self, ConfigError> {
        Self::builder().build().await
    }

    /// Create a builder for custom configuration.
    pub fn builder() -> CostExplorerClientBuilder {
        CostExplorerClientBuilder::default()
    }

    /// Endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Region requests are signed for
    pub fn signing_region(&self) -> &str {
        &self.signing_region
    }

    /// Call a Cost Explorer operation with a JSON body and return the JSON
    /// response unchanged.
    pub async fn call<T: Serialize + ?Sized>(
        &self,
        operation: &str,
        payload: &T,
    ) -> Result<Value, ApiError> {
        let body = serde_json::to_string(payload)?;
        let request = self.build_signed_request(operation, body).await?;

        log::debug!("ce.{}: POST {}", operation, self.endpoint);

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| transport_error(operation, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(operation, e))?;

        log::debug!("ce.{}: HTTP {}", operation, status.as_u16());

        if !status.is_success() {
            return Err(parse_aws_error(operation, status, &body));
        }

        Ok(serde_json::from_str(&body).unwrap_or_else(|_| serde_json::json!({ "raw_response": body })))
    }

    /// Build a signed `POST /` for `operation`
    async fn build_signed_request(
        &self,
        operation: &str,
        body: String,
    ) -> Result<reqwest::Request, ApiError> {
        let mut request = http::Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.as_str())
            .header(HOST, self.host.as_str())
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header(X_AMZ_TARGET, format!("{}.{}", TARGET_PREFIX, operation))
            .body(body)
            .map_err(|e| ApiError::Other(format!("failed to build request: {}", e)))?;

        self.sign_request(&mut request).await?;

        reqwest::Request::try_from(request)
            .map_err(|e| ApiError::Other(format!("failed to build request: {}", e)))
    }

    /// Sign `request` in place.
    ///
    /// The signer adds `x-amz-date`, `authorization` and, for temporary
    /// credentials, `x-amz-security-token`.
    async fn sign_request(&self, request: &mut http::Request<String>) -> Result<(), ApiError> {
        let credentials = self
            .credentials_provider
            .provide_credentials()
            .await
            .map_err(|e| ApiError::Authentication(format!("failed to get AWS credentials: {}", e)))?;

        let identity = credentials.into();
        let signing_params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.signing_region)
            .name(SERVICE_NAME)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| ApiError::Other(format!("failed to build signing params: {}", e)))?
            .into();

        let uri = request.uri().to_string();
        let headers = request
            .headers()
            .iter()
            .map(|(name, value)| value.to_str().map(|value| (name.as_str(), value)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ApiError::Other(format!("invalid header: {}", e)))?;

        let signable = SignableRequest::new(
            request.method().as_str(),
            uri,
            headers.into_iter(),
            SignableBody::Bytes(request.body().as_bytes()),
        )
        .map_err(|e| ApiError::Other(format!("failed to create signable request: {}", e)))?;

        let (instructions, _signature) = sign(signable, &signing_params)
            .map_err(|e| ApiError::Other(format!("failed to sign request: {}", e)))?
            .into_parts();

        instructions.apply_to_request_http1x(request);
        Ok(())
    }
}

#[async_trait::async_trait]
impl CostExplorerApi for CostExplorerClient {
    async fn get_cost_and_usage(
        &self,
        request: &GetCostAndUsageRequest,
    ) -> Result<Value, ApiError> {
        self.call("GetCostAndUsage", request).await
    }

    async fn get_cost_forecast(
        &self,
        request: &GetCostForecastRequest,
    ) -> Result<Value, ApiError> {
        self.call("GetCostForecast", request).await
    }
}

impl std::fmt::Debug for CostExplorerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostExplorerClient")
            .field("endpoint", &self.endpoint)
            .field("signing_region", &self.signing_region)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Region Cost Explorer is served from for the partition `region` belongs to
fn partition_region(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "cn-northwest-1"
    } else {
        DEFAULT_REGION
    }
}

/// `Host` header value for an endpoint URL, port included when explicit
fn host_header(endpoint: &str) -> Result<String, ConfigError> {
    let url = url::Url::parse(endpoint)
        .map_err(|e| ConfigError::Invalid(format!("invalid endpoint URL '{}': {}", endpoint, e)))?;

    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => Ok(format!("{}:{}", host, port)),
        (Some(host), None) => Ok(host.to_string()),
        (None, _) => Err(ConfigError::Invalid(format!(
            "endpoint URL '{}' has no host",
            endpoint
        ))),
    }
}

/// Endpoint URL for a signing region
fn get_endpoint(signing_region: &str) -> String {
    if signing_region.starts_with("cn-") {
        format!("https://ce.{}.amazonaws.com.cn", signing_region)
    } else {
        format!("https://ce.{}.amazonaws.com", signing_region)
    }
}
