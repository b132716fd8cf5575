//! Blocking REST client.

use crate::{error::EeError, expr::Expr, service::Service};
use log::{debug, info};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://earthengine.googleapis.com/v1";

/// Everything needed to talk to the service on behalf of a cloud
/// project.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Cloud project id requests are billed to.
    pub project: String,

    /// OAuth2 bearer token.
    pub access_token: String,

    /// API root, without a trailing `/`.
    pub base_url: String,

    /// Per request timeout. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Credentials {
    pub fn new(project: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: None,
        }
    }
}

/// An initialized session with the Earth Engine REST API.
///
/// Create one per process with [`EarthEngine::initialize`] and share
/// it by reference.
pub struct EarthEngine {
    http: Client,
    credentials: Credentials,
}

impl EarthEngine {
    pub fn initialize(credentials: Credentials) -> Result<Self, EeError> {
        let http = Client::builder().timeout(credentials.timeout).build()?;
        info!(
            "initialized session for project {} at {}",
            credentials.project, credentials.base_url
        );
        Ok(Self { http, credentials })
    }

    pub fn project(&self) -> &str {
        &self.credentials.project
    }

    fn project_url(&self, method: &str) -> String {
        format!(
            "{}/projects/{}/{}",
            self.credentials.base_url.trim_end_matches('/'),
            self.credentials.project,
            method
        )
    }

    fn post(&self, url: &str, body: &Value) -> Result<Response, EeError> {
        debug!("POST {url}");
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.credentials.access_token)
            .json(body)
            .send()?;
        check_status(resp)
    }
}

impl Service for EarthEngine {
    fn compute(&self, expr: &Expr) -> Result<Value, EeError> {
        #[derive(Deserialize)]
        struct ComputeResponse {
            #[serde(default)]
            result: Value,
        }

        let body = json!({ "expression": expr.encode() });
        let resp: ComputeResponse = self.post(&self.project_url("value:compute"), &body)?.json()?;
        Ok(resp.result)
    }

    fn thumbnail_url(&self, expr: &Expr) -> Result<String, EeError> {
        #[derive(Deserialize)]
        struct ThumbnailResponse {
            name: String,
        }

        let body = json!({ "expression": expr.encode(), "fileFormat": "PNG" });
        let resp: ThumbnailResponse = self.post(&self.project_url("thumbnails"), &body)?.json()?;
        Ok(thumbnail_pixels_url(&self.credentials.base_url, &resp.name))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, EeError> {
        debug!("GET {url}");
        let resp = check_status(self.http.get(url).send()?)?;
        Ok(resp.bytes()?.to_vec())
    }
}

fn thumbnail_pixels_url(base_url: &str, name: &str) -> String {
    format!("{}/{}:getPixels", base_url.trim_end_matches('/'), name)
}

/// Maps non-2xx responses to [`EeError::Service`], preferring the
/// message from the service's error body.
fn check_status(resp: Response) -> Result<Response, EeError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text()?;
    Err(EeError::Service {
        code: status.as_u16(),
        message: error_message(&text),
    })
}

fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error }) => error.message,
        Err(_) => body.to_owned(),
    }
}
