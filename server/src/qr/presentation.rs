//! What a client needs to show a ticket's QR code: the verification link,
//! the rendered image link and a download name, plus the state machine a
//! client walks through while asking the server to issue one.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::models::{EntityKind, EntityRef, QrPayload};

pub const QR_IMAGE_SIZE: &str = "300x300";
pub const VERIFICATION_PATH: &str = "/ticket";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrArtifact {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub token: String,
    pub payload: QrPayload,
    pub verification_url: String,
    pub image_url: String,
    pub download_filename: String,
}

#[derive(Debug, Error)]
#[error("invalid {name} url '{value}': {reason}")]
pub struct InvalidLink {
    pub name: &'static str,
    pub value: String,
    pub reason: String,
}

/// Builds verification and image links from the public app origin and the
/// external QR rendering endpoint.
#[derive(Debug, Clone)]
pub struct QrLinks {
    app_origin: Url,
    image_endpoint: Url,
}

impl QrLinks {
    pub fn new(app_origin: &str, image_endpoint: &str) -> Result<Self, InvalidLink> {
        let parse = |name: &'static str, value: &str| {
            Url::parse(value).map_err(|e| InvalidLink {
                name,
                value: value.to_string(),
                reason: e.to_string(),
            })
        };
        Ok(Self {
            app_origin: parse("app origin", app_origin)?,
            image_endpoint: parse("QR image endpoint", image_endpoint)?,
        })
    }

    /// `<origin>/ticket?token=<urlencoded token>`
    pub fn verification_url(&self, token: &str) -> Url {
        let mut url = self.app_origin.clone();
        url.set_path(VERIFICATION_PATH);
        url.set_query(None);
        url.query_pairs_mut().append_pair("token", token);
        url
    }

    pub fn image_url(&self, verification_url: &Url) -> Url {
        let mut url = self.image_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("size", QR_IMAGE_SIZE)
            .append_pair("data", verification_url.as_str());
        url
    }

    pub fn artifact(&self, payload: &QrPayload) -> QrArtifact {
        let verification = self.verification_url(&payload.token);
        let image = self.image_url(&verification);
        QrArtifact {
            kind: payload.kind,
            token: payload.token.clone(),
            payload: payload.clone(),
            verification_url: verification.to_string(),
            image_url: image.to_string(),
            download_filename: download_filename(payload.kind, &payload.token),
        }
    }
}

/// `<type>-qr-<first 8 token chars>.png`. Token characters outside
/// `[A-Za-z0-9-]` are dropped so the name is always a single path component.
pub fn download_filename(kind: EntityKind, token: &str) -> String {
    let short: String = token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .take(8)
        .collect();
    format!("{kind}-qr-{short}.png")
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server rejected request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("server response did not include a QR code")]
    EmptyResponse,

    #[error("no QR code is ready to download")]
    NotReady,

    #[error("refusing to save QR image as '{0}'")]
    UnsafeFilename(String),

    #[error("failed to save QR image: {0}")]
    Io(#[from] std::io::Error),
}

/// The authenticated request path a client uses to reach issuance.
#[async_trait]
pub trait IssuanceClient: Send + Sync {
    async fn request_issue(&self, entity: EntityRef) -> Result<QrArtifact, ClientError>;

    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, ClientError>;
}

/// Calls `POST /api/qr/generate` on a passgate server with a bearer token.
#[derive(Clone)]
pub struct HttpIssuanceClient {
    http: reqwest::Client,
    generate_url: Url,
    access_token: String,
}

impl HttpIssuanceClient {
    /// `api_base` may carry a path prefix; the generate route is resolved
    /// beneath it.
    pub fn new(api_base: Url, access_token: impl Into<String>) -> Result<Self, InvalidLink> {
        Ok(Self {
            http: reqwest::Client::new(),
            generate_url: generate_url(&api_base)?,
            access_token: access_token.into(),
        })
    }
}

pub(crate) fn generate_url(api_base: &Url) -> Result<Url, InvalidLink> {
    let mut base = api_base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("api/qr/generate").map_err(|e| InvalidLink {
        name: "API base",
        value: api_base.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Deserialize)]
struct Envelope {
    data: Option<QrArtifact>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub(crate) fn generate_body(entity: EntityRef) -> serde_json::Value {
    match entity.kind {
        EntityKind::Ticket => json!({ "ticketId": entity.id, "type": "ticket" }),
        EntityKind::Subscription => {
            json!({ "subscriptionId": entity.id, "type": "subscription" })
        }
    }
}

#[async_trait]
impl IssuanceClient for HttpIssuanceClient {
    async fn request_issue(&self, entity: EntityRef) -> Result<QrArtifact, ClientError> {
        let resp = self
            .http
            .post(self.generate_url.clone())
            .bearer_auth(&self.access_token)
            .json(&generate_body(entity))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>()
                .await
                .map(|b| b.error)
                .unwrap_or_else(|_| "unexpected error response".to_string());
            return Err(ClientError::Rejected { status, message });
        }

        resp.json::<Envelope>()
            .await?
            .data
            .ok_or(ClientError::EmptyResponse)
    }

    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, ClientError> {
        let resp = self.http.get(image_url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Rejected {
                status,
                message: "QR image service returned an error".to_string(),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QrState {
    Unrequested,
    Pending,
    Ready(QrArtifact),
    Failed(String),
}

/// What to draw for the current state.
#[derive(Debug, PartialEq)]
pub enum QrDisplay<'a> {
    Loading,
    Absent,
    Present(&'a QrArtifact),
    Error(&'a str),
}

pub struct QrPresenter<C> {
    client: C,
    entity: Option<EntityRef>,
    state: QrState,
}

impl<C: IssuanceClient> QrPresenter<C> {
    /// A cached artifact starts the presenter in `Ready`.
    pub fn new(client: C, entity: Option<EntityRef>, cached: Option<QrArtifact>) -> Self {
        let state = match cached {
            Some(artifact) => QrState::Ready(artifact),
            None => QrState::Unrequested,
        };
        Self {
            client,
            entity,
            state,
        }
    }

    pub fn state(&self) -> &QrState {
        &self.state
    }

    pub fn display(&self) -> QrDisplay<'_> {
        match &self.state {
            QrState::Unrequested => QrDisplay::Absent,
            QrState::Pending => QrDisplay::Loading,
            QrState::Ready(artifact) => QrDisplay::Present(artifact),
            QrState::Failed(message) => QrDisplay::Error(message),
        }
    }

    /// Move to `Pending` and hand back the entity to request, or `None` when
    /// there is nothing to request or a request is already in flight.
    pub fn begin(&mut self) -> Option<EntityRef> {
        if self.state == QrState::Pending {
            return None;
        }
        let entity = self.entity?;
        self.state = QrState::Pending;
        Some(entity)
    }

    pub fn complete(&mut self, result: Result<QrArtifact, ClientError>) {
        self.state = match result {
            Ok(artifact) => QrState::Ready(artifact),
            Err(e) => {
                debug!(error = %e, "QR issuance request failed");
                QrState::Failed(e.to_string())
            }
        };
    }

    /// Issue only when nothing is cached yet.
    pub async fn on_mount(&mut self) {
        if self.state == QrState::Unrequested {
            self.request().await;
        }
    }

    pub async fn regenerate(&mut self) {
        self.request().await;
    }

    async fn request(&mut self) {
        if let Some(entity) = self.begin() {
            let result = self.client.request_issue(entity).await;
            self.complete(result);
        }
    }

    /// Fetch the rendered image and save it directly under `dir`. The file
    /// name is rebuilt from the token; the name the server sent is ignored.
    pub async fn download(&self, dir: &Path) -> Result<PathBuf, ClientError> {
        let QrState::Ready(artifact) = &self.state else {
            return Err(ClientError::NotReady);
        };
        let name = download_filename(artifact.kind, &artifact.token);
        if Path::new(&name).file_name() != Some(OsStr::new(&name)) {
            return Err(ClientError::UnsafeFilename(name));
        }

        let bytes = self.client.fetch_image(&artifact.image_url).await?;
        let path = dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}
