// =============================================================================
// GOOGLE DOCS API CLIENT WITH SERVICE ACCOUNT AUTHENTICATION
// =============================================================================
//
// Implements the core DocsApi port against the Google Docs REST API.
//
// **Setup Instructions for Service Account:**
//
// 1. Go to Google Cloud Console: https://console.cloud.google.com/
// 2. Create a new project (or select existing)
// 3. Enable the Google Docs API:
//    - Go to "APIs & Services" > "Library"
//    - Search for "Google Docs API" and enable it
// 4. Create a Service Account:
//    - Go to "APIs & Services" > "Credentials"
//    - Click "Create Credentials" > "Service Account"
// 5. Create a JSON key:
//    - Click on the service account you created
//    - Go to "Keys" tab
//    - "Add Key" > "Create new key" > JSON
//    - Save the downloaded JSON file securely
// 6. Share your Google Doc:
//    - Click "Share" in the document
//    - Add the service account email (name@project.iam.gserviceaccount.com)
//    - Give it "Editor" access so batch updates are allowed
// 7. Set environment variables:
//    - `GOOGLE_SERVICE_ACCOUNT_KEY` - Path to the JSON key file
//      OR
//    - `GOOGLE_SERVICE_ACCOUNT_JSON` - The JSON content directly (for deployment)

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use crate::core::docs::{Document, DocsApi, DocsError};
use async_trait::async_trait;

const DOCS_SCOPE: &str = "https://www.googleapis.com/auth/documents";
const DOCS_BASE_URL: &str = "https://docs.googleapis.com/v1/documents";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// SERVICE ACCOUNT AUTHENTICATION
// =============================================================================

/// Service account credentials from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    /// The service account email (used as issuer in JWT).
    client_email: String,

    /// The private key in PEM format.
    private_key: String,

    /// The token URI (where to exchange JWT for access token).
    token_uri: String,
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Cached access token with expiration.
struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

/// Authenticator that handles OAuth2 with service account credentials.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    client: Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl ServiceAccountAuth {
    /// Creates a new authenticator from a JSON key file path.
    pub async fn from_file(path: &str) -> Result<Self, DocsError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DocsError::Auth(format!("Cannot read key file '{path}': {e}")))?;
        Self::from_json(&content)
    }

    /// Creates a new authenticator from JSON content.
    pub fn from_json(json: &str) -> Result<Self, DocsError> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json)
            .map_err(|e| DocsError::Auth(format!("Invalid service account JSON: {e}")))?;
        Ok(Self {
            credentials,
            client: Client::new(),
            cached_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Creates from environment variables.
    pub async fn from_env() -> Result<Self, DocsError> {
        if let Ok(path) = std::env::var("GOOGLE_SERVICE_ACCOUNT_KEY") {
            return Self::from_file(&path).await;
        }

        if let Ok(json) = std::env::var("GOOGLE_SERVICE_ACCOUNT_JSON") {
            return Self::from_json(&json);
        }

        Err(DocsError::Auth(
            "Neither GOOGLE_SERVICE_ACCOUNT_KEY nor GOOGLE_SERVICE_ACCOUNT_JSON is set."
                .to_string(),
        ))
    }

    /// Gets a valid access token, refreshing if necessary.
    pub async fn get_access_token(&self) -> Result<String, DocsError> {
        // Check if we have a valid cached token
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > SystemTime::now() + Duration::from_secs(60) {
                    return Ok(token.token.clone());
                }
            }
        }

        let new_token = self.fetch_new_token().await?;

        {
            let mut cached = self.cached_token.write().await;
            *cached = Some(CachedToken {
                token: new_token.clone(),
                expires_at: SystemTime::now() + Duration::from_secs(55 * 60),
            });
        }

        Ok(new_token)
    }

    /// Fetches a new access token from Google.
    async fn fetch_new_token(&self) -> Result<String, DocsError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| DocsError::Auth(e.to_string()))?
            .as_secs();

        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: DOCS_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let header = Header::new(Algorithm::RS256);
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| DocsError::Auth(format!("Invalid private key: {e}")))?;
        let jwt = encode(&header, &claims, &key)
            .map_err(|e| DocsError::Auth(format!("JWT signing failed: {e}")))?;

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await
            .map_err(|e| DocsError::Auth(format!("Token exchange request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DocsError::Auth(format!(
                "Token exchange failed ({status}): {text}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| DocsError::Auth(format!("Malformed token response: {e}")))?;
        Ok(token_response.access_token)
    }
}

// =============================================================================
// DOCS API CLIENT
// =============================================================================

/// HTTP implementation of the DocsApi port.
pub struct GoogleDocsApiClient {
    client: Client,
    auth: ServiceAccountAuth,
    base_url: String,
}

impl GoogleDocsApiClient {
    pub fn new(auth: ServiceAccountAuth) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            auth,
            base_url: DOCS_BASE_URL.to_string(),
        }
    }

    /// Map an error response to the core error taxonomy by status code.
    async fn classify_error(
        document_id: &str,
        status: StatusCode,
        response: reqwest::Response,
    ) -> DocsError {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, document_id, "Google Docs API error: {body}");

        match status {
            StatusCode::NOT_FOUND => DocsError::NotFound(document_id.to_string()),
            StatusCode::FORBIDDEN => DocsError::PermissionDenied(document_id.to_string()),
            StatusCode::BAD_REQUEST => DocsError::InvalidRequest(body),
            _ => DocsError::Api(format!("{status}: {body}")),
        }
    }
}

#[async_trait]
impl DocsApi for GoogleDocsApiClient {
    async fn get_document(
        &self,
        document_id: &str,
        fields: Option<&str>,
        include_tabs_content: bool,
    ) -> Result<Document, DocsError> {
        let token = self.auth.get_access_token().await?;

        let mut request = self
            .client
            .get(format!("{}/{}", self.base_url, document_id))
            .bearer_auth(token);
        if let Some(fields) = fields {
            request = request.query(&[("fields", fields)]);
        }
        if include_tabs_content {
            request = request.query(&[("includeTabsContent", "true")]);
        }

        tracing::debug!(document_id, include_tabs_content, "Fetching document");
        let response = request
            .send()
            .await
            .map_err(|e| DocsError::Api(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_error(document_id, status, response).await);
        }

        response
            .json::<Document>()
            .await
            .map_err(|e| DocsError::Api(format!("Malformed document response: {e}")))
    }

    async fn batch_update(
        &self,
        document_id: &str,
        requests: Vec<Value>,
    ) -> Result<Value, DocsError> {
        let token = self.auth.get_access_token().await?;

        tracing::debug!(
            document_id,
            requests = requests.len(),
            "Submitting batchUpdate"
        );
        let response = self
            .client
            .post(format!("{}/{}:batchUpdate", self.base_url, document_id))
            .bearer_auth(token)
            .json(&json!({"requests": requests}))
            .send()
            .await
            .map_err(|e| DocsError::Api(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_error(document_id, status, response).await);
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| DocsError::Api(format!("Malformed batchUpdate response: {e}")))
    }
}
