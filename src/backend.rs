//! Classroom Backend Client
//!
//! The REST collaborator that owns chapters and panels. The generation tracker
//! and exporter talk to it through [`ComicBackend`]; [`HttpBackend`] is the
//! reqwest implementation. The base address is always passed in explicitly.

use crate::error::ComicError;
use crate::models::{Chapter, ChapterSummary, CommitAck, IdeaBatch};
use crate::types::{ChapterId, ClassroomId, IdeaId};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Backend operations used by the tracker, the exporter and the CLI.
#[async_trait]
pub trait ComicBackend: Send + Sync {
    /// Generate candidate story ideas for a new chapter.
    async fn generate_ideas(
        &self,
        classroom: &ClassroomId,
        teacher_outline: &str,
    ) -> Result<IdeaBatch, ComicError>;

    /// Begin chapter generation for the chosen idea.
    async fn commit_chapter(
        &self,
        chapter: &ChapterId,
        idea: &IdeaId,
    ) -> Result<CommitAck, ComicError>;

    /// Current chapter state including its panels.
    async fn get_chapter(&self, chapter: &ChapterId) -> Result<Chapter, ComicError>;

    /// All chapters of a classroom.
    async fn list_chapters(&self, classroom: &ClassroomId)
        -> Result<Vec<ChapterSummary>, ComicError>;

    async fn delete_chapter(&self, chapter: &ChapterId) -> Result<(), ComicError>;

    async fn health(&self) -> Result<String, ComicError>;
}

/// HTTP timeouts for the backend client.
#[derive(Debug, Clone, Copy)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(30),
        }
    }
}

#[derive(Serialize)]
struct GenerateIdeasRequest<'a> {
    classroom_id: &'a str,
    teacher_outline: &'a str,
}

#[derive(Serialize)]
struct CommitRequest<'a> {
    chapter_id: &'a str,
    chosen_idea_id: &'a str,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ChapterEnvelope {
    chapter: Chapter,
}

#[derive(Deserialize)]
struct ChaptersEnvelope {
    #[serde(default)]
    chapters: Vec<ChapterSummary>,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Deserialize)]
struct ErrorDetail {
    detail: Option<String>,
}

fn map_transport_error(error: reqwest::Error) -> ComicError {
    if error.is_timeout() {
        ComicError::RemoteUnavailable(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ComicError::RemoteUnavailable(format!("Connection error: {}", error))
    } else if error.is_decode() {
        ComicError::InvalidResponse(format!("Failed to decode response: {}", error))
    } else {
        ComicError::RemoteUnavailable(format!("HTTP error: {}", error))
    }
}

/// Pull the FastAPI `detail` message out of an error body.
async fn error_detail(response: Response) -> String {
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    serde_json::from_str::<ErrorDetail>(&text)
        .ok()
        .and_then(|body| body.detail)
        .unwrap_or(text)
}

async fn rejected(response: Response, what: &str) -> ComicError {
    let status = response.status();
    let detail = error_detail(response).await;
    if status == StatusCode::NOT_FOUND {
        ComicError::NotFound(format!("{}: {}", what, detail))
    } else {
        ComicError::RemoteRejected {
            status: status.as_u16(),
            detail,
        }
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ComicError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ComicError::InvalidResponse(format!("Failed to parse response: {}", e)))
}

/// reqwest-backed [`ComicBackend`].
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeouts: HttpTimeouts) -> Result<Self, ComicError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ComicError::ConfigError("Backend base URL is empty".to_string()));
        }
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .build()
            .map_err(|e| ComicError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ComicBackend for HttpBackend {
    async fn generate_ideas(
        &self,
        classroom: &ClassroomId,
        teacher_outline: &str,
    ) -> Result<IdeaBatch, ComicError> {
        let response = self
            .client
            .post(self.url("/chapters/ideas"))
            .json(&GenerateIdeasRequest {
                classroom_id: classroom.as_str(),
                teacher_outline,
            })
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(rejected(response, "Classroom").await);
        }
        let envelope: DataEnvelope<IdeaBatch> = parse_json(response).await?;
        Ok(envelope.data)
    }

    async fn commit_chapter(
        &self,
        chapter: &ChapterId,
        idea: &IdeaId,
    ) -> Result<CommitAck, ComicError> {
        debug!(chapter = %chapter, idea = %idea, "Committing story idea");
        let response = self
            .client
            .post(self.url("/chapters/commit"))
            .json(&CommitRequest {
                chapter_id: chapter.as_str(),
                chosen_idea_id: idea.as_str(),
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response).await;
            return Err(match status.as_u16() {
                400 | 404 | 422 => ComicError::InvalidChoice(detail),
                code => ComicError::RemoteRejected {
                    status: code,
                    detail,
                },
            });
        }
        parse_json(response).await
    }

    async fn get_chapter(&self, chapter: &ChapterId) -> Result<Chapter, ComicError> {
        let response = self
            .client
            .get(self.url(&format!("/chapters/{}", chapter)))
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(rejected(response, "Chapter").await);
        }
        let envelope: ChapterEnvelope = parse_json(response).await?;
        Ok(envelope.chapter)
    }

    async fn list_chapters(
        &self,
        classroom: &ClassroomId,
    ) -> Result<Vec<ChapterSummary>, ComicError> {
        let response = self
            .client
            .get(self.url(&format!("/classrooms/{}/chapters", classroom)))
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(rejected(response, "Classroom").await);
        }
        let envelope: ChaptersEnvelope = parse_json(response).await?;
        Ok(envelope.chapters)
    }

    async fn delete_chapter(&self, chapter: &ChapterId) -> Result<(), ComicError> {
        let response = self
            .client
            .delete(self.url(&format!("/chapters/{}", chapter)))
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(rejected(response, "Chapter").await);
        }
        Ok(())
    }

    async fn health(&self) -> Result<String, ComicError> {
        let response = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(rejected(response, "Health endpoint").await);
        }
        let health: HealthResponse = parse_json(response).await?;
        Ok(health.status)
    }
}
