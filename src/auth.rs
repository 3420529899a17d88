//! Installed-application OAuth2 authentication for the Google Drive API.
//!
//! Tokens are persisted under `~/.archiver` so the browser consent flow only
//! runs on first use; afterwards the stored refresh token keeps the session
//! alive across runs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use regex::Regex;
use reqwest::{Client, Url};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{ArchiverError, Result};
use crate::models::{ClientSecretsFile, InstalledClientSecrets, StoredToken, TokenResponse};

/// Scopes required for listing and exporting Drive content.
const SCOPES: &str = "https://www.googleapis.com/auth/drive.metadata.readonly \
                      https://www.googleapis.com/auth/drive.readonly";

/// Directory under the home directory holding credentials and tokens.
const BASE_DIR: &str = ".archiver";
const CLIENT_SECRETS_FILE: &str = "credentials.json";
const TOKEN_STORAGE_FILE: &str = "token.json";

/// Request line of the loopback redirect, e.g. `GET /?code=... HTTP/1.1`.
static REQUEST_LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^GET (\S+) HTTP/1\.[01]").expect("Invalid request line regex"));

/// Cached access token with expiration.
#[derive(Clone, Debug)]
struct CachedToken {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: SystemTime,
}

/// Authenticator for the Drive API using an installed-app OAuth flow.
///
/// Acquired once at startup and passed by reference to every operation that
/// needs an access token.
#[derive(Clone, Debug)]
pub struct Authenticator {
    secrets: Arc<InstalledClientSecrets>,
    token_path: PathBuf,
    client: Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl Authenticator {
    /// Create an authenticator from the default `~/.archiver` files,
    /// creating the directory on first use.
    pub fn from_default_files() -> Result<Self> {
        let base_dir = default_base_dir()?;
        fs::create_dir_all(&base_dir)?;
        Self::from_files(
            base_dir.join(CLIENT_SECRETS_FILE),
            base_dir.join(TOKEN_STORAGE_FILE),
        )
    }

    /// Create an authenticator from an explicit client secrets file, storing
    /// tokens in the default location.
    pub fn from_secrets_file<P: AsRef<Path>>(secrets_path: P) -> Result<Self> {
        let base_dir = default_base_dir()?;
        fs::create_dir_all(&base_dir)?;
        Self::from_files(secrets_path, base_dir.join(TOKEN_STORAGE_FILE))
    }

    /// Create an authenticator from explicit secrets and token store paths.
    pub fn from_files<P: AsRef<Path>, Q: Into<PathBuf>>(
        secrets_path: P,
        token_path: Q,
    ) -> Result<Self> {
        let secrets_path = secrets_path.as_ref();
        if !secrets_path.exists() {
            return Err(ArchiverError::MissingClientSecrets(
                secrets_path.display().to_string(),
            ));
        }
        let content = fs::read_to_string(secrets_path)?;
        let secrets: ClientSecretsFile = serde_json::from_str(&content)?;
        Ok(Self::new(secrets.installed, token_path.into()))
    }

    /// Create an authenticator from already-parsed client secrets.
    pub fn new(secrets: InstalledClientSecrets, token_path: PathBuf) -> Self {
        Self {
            secrets: Arc::new(secrets),
            token_path,
            client: Client::new(),
            cached_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Get a valid access token, refreshing or re-authorizing if necessary.
    pub async fn get_access_token(&self) -> Result<String> {
        // Check if we have a valid cached token
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if still_valid(token.expires_at) {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let new_token = self.acquire_token().await?;
        let access_token = new_token.access_token.clone();

        // Cache the new token
        {
            let mut cached = self.cached_token.write().await;
            *cached = Some(new_token);
        }

        Ok(access_token)
    }

    /// Produce a usable token from the store, a refresh grant, or the
    /// interactive consent flow, persisting whatever was obtained.
    async fn acquire_token(&self) -> Result<CachedToken> {
        let stored = self.load_stored_token();

        if let Some(token) = stored.as_ref() {
            let expires_at = UNIX_EPOCH + Duration::from_secs(token.expires_at);
            if still_valid(expires_at) {
                debug!("using persisted access token");
                return Ok(CachedToken {
                    access_token: token.access_token.clone(),
                    refresh_token: token.refresh_token.clone(),
                    expires_at,
                });
            }
        }

        let token = match stored.as_ref().and_then(|t| t.refresh_token.clone()) {
            Some(refresh_token) => self.refresh_token(&refresh_token).await?,
            None => self.consent_flow().await?,
        };

        self.persist_token(&token)?;
        Ok(token)
    }

    /// Refresh the access token using the stored refresh token.
    async fn refresh_token(&self, refresh_token: &str) -> Result<CachedToken> {
        debug!("refreshing access token");

        let params = [
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.secrets.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ArchiverError::TokenRefreshError(format!(
                "Status {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(cache_entry(token_response, Some(refresh_token.to_string())))
    }

    /// Run the interactive consent flow: print the authorization URL, wait
    /// for the browser redirect on a loopback port, exchange the code.
    async fn consent_flow(&self) -> Result<CachedToken> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{}", port);

        let auth_url = Url::parse_with_params(
            &self.secrets.auth_uri,
            &[
                ("response_type", "code"),
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("scope", SCOPES),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| ArchiverError::AuthenticationError(format!("Invalid auth URI: {}", e)))?;

        println!("Open this URL in your browser to authorize access:");
        println!("\n  {}\n", auth_url);

        let code = wait_for_redirect(&listener).await?;
        self.exchange_code(&code, &redirect_uri).await
    }

    /// Exchange an authorization code for the initial token pair.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<CachedToken> {
        let params = [
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .client
            .post(&self.secrets.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ArchiverError::AuthenticationError(format!(
                "Code exchange failed with status {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(cache_entry(token_response, None))
    }

    fn load_stored_token(&self) -> Option<StoredToken> {
        let content = fs::read_to_string(&self.token_path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Save the token for the next run.
    fn persist_token(&self, token: &CachedToken) -> Result<()> {
        let expires_at = token
            .expires_at
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_secs();

        let stored = StoredToken {
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            expires_at,
        };

        if let Some(parent) = self.token_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.token_path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }
}

/// Whether a token expiring at `expires_at` is still usable.
fn still_valid(expires_at: SystemTime) -> bool {
    // 60 second buffer before expiration
    let buffer = Duration::from_secs(60);
    expires_at > SystemTime::now() + buffer
}

fn cache_entry(response: TokenResponse, previous_refresh: Option<String>) -> CachedToken {
    let expires_at = SystemTime::now() + Duration::from_secs(response.expires_in);
    CachedToken {
        access_token: response.access_token,
        refresh_token: response.refresh_token.or(previous_refresh),
        expires_at,
    }
}

fn default_base_dir() -> Result<PathBuf> {
    let user_dirs = directories::UserDirs::new().ok_or(ArchiverError::HomeDirNotFound)?;
    Ok(user_dirs.home_dir().join(BASE_DIR))
}

/// Accept loopback connections until one carries the authorization code.
///
/// Browsers often probe with extra requests (favicon and the like) before or
/// after delivering the redirect, so keep listening until a code or an
/// explicit consent error shows up.
async fn wait_for_redirect(listener: &TcpListener) -> Result<String> {
    loop {
        let (mut stream, _) = listener.accept().await?;
        let mut buf = vec![0u8; 4096];
        let n = stream.read(&mut buf).await?;
        let request = String::from_utf8_lossy(&buf[..n]).into_owned();

        let outcome = parse_redirect(&request);

        let body = match &outcome {
            Some(Ok(_)) => "Authorization received. You can close this tab.",
            Some(Err(_)) => "Authorization failed. You can close this tab.",
            None => "Waiting for authorization...",
        };
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await?;
        let _ = stream.shutdown().await;

        if let Some(result) = outcome {
            return result;
        }
    }
}

/// Pull the authorization code (or consent error) out of a redirect request.
///
/// Returns `None` for unrelated requests so the caller keeps waiting.
fn parse_redirect(request: &str) -> Option<Result<String>> {
    let target = REQUEST_LINE_REGEX.captures(request)?.get(1)?.as_str();
    let url = Url::parse(&format!("http://localhost{}", target)).ok()?;

    if let Some((_, error)) = url.query_pairs().find(|(key, _)| key == "error") {
        return Some(Err(ArchiverError::AuthenticationError(format!(
            "Consent denied: {}",
            error
        ))));
    }

    url.query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| Ok(value.into_owned()))
}
