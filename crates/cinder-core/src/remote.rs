//! HTTP store backend
//!
//! Talks to `cinder serve`. Status codes map back onto the store's own
//! errors, so callers see `NotFound`/`Gone` the same as with a local store.

use std::time::Duration;

use cinder_store::StoreError;
use reqwest::{Response, StatusCode};

use crate::backend::NoteBackend;
use crate::wire::{CreateNoteRequest, CreateReceipt, ErrorBody, NoteView, NOTES_PATH};
use crate::{NoteError, Result};

#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NoteError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn notes_url(&self) -> String {
        format!("{}{}", self.base_url, NOTES_PATH)
    }

    fn note_url(&self, id: &str) -> String {
        format!("{}{}/{}", self.base_url, NOTES_PATH, id)
    }
}

impl NoteBackend for HttpBackend {
    async fn create(&self, request: &CreateNoteRequest) -> Result<CreateReceipt> {
        let resp = self
            .client
            .post(self.notes_url())
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        if resp.status().is_success() {
            resp.json().await.map_err(transport)
        } else {
            Err(error_from_response(resp).await)
        }
    }

    async fn read(&self, id: &str) -> Result<NoteView> {
        let resp = self
            .client
            .get(self.note_url(id))
            .send()
            .await
            .map_err(transport)?;

        if resp.status().is_success() {
            resp.json().await.map_err(transport)
        } else {
            Err(error_from_response(resp).await)
        }
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.note_url(id))
            .send()
            .await
            .map_err(transport)?;

        // Unknown ids already report success server-side
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(resp).await)
        }
    }
}

fn transport(e: reqwest::Error) -> NoteError {
    NoteError::Transport(e.to_string())
}

async fn error_from_response(resp: Response) -> NoteError {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return StoreError::NotFound.into();
    }
    if status == StatusCode::GONE {
        return StoreError::Gone.into();
    }
    if status.is_client_error() {
        let reason = resp
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| "request rejected".to_string());
        return StoreError::Validation(reason).into();
    }
    NoteError::Transport(format!("unexpected status {status}"))
}
