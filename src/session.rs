use crate::post::POST_COLLECTION;
use crate::{Blob, Client, Did, Error, Post, RecordRef};
use reqwest::header::CONTENT_TYPE;
use reqwest::Body;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Logged-in session.
#[derive(Clone)]
pub struct Session {
    pub(crate) client: Client,
    pub(crate) access_jwt: String,
    pub(crate) did: Did,
    pub(crate) handle: String,
}

impl Session {
    /// Logs into `bsky.social` with a handle (or email) and password, returning a `Session`.
    ///
    /// Securely storing the user's password is an exercise left to the caller.
    pub async fn login(identifier: &str, password: &str) -> Result<Session, Error> {
        Client::new().login(identifier, password).await
    }

    /// The client this session was created from. It can resolve handles.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The DID of the logged-in account. Records are written to this repository.
    #[must_use]
    pub fn did(&self) -> &Did {
        &self.did
    }

    /// The handle of the logged-in account, as reported by the server.
    #[must_use]
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Upload raw bytes as a blob. The returned [`Blob`] can be embedded in a record.
    ///
    /// No size limit is enforced here; [`Attachment`][`crate::Attachment`] enforces one before
    /// calling this.
    #[tracing::instrument(skip(self, body))]
    pub async fn upload_blob(
        &self,
        body: impl Into<Body>,
        content_type: &str,
    ) -> Result<Blob, Error> {
        let response = self
            .client
            .post("com.atproto.repo.uploadBlob")
            .header(CONTENT_TYPE, content_type)
            .bearer_auth(&self.access_jwt)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(%status, "failed to upload blob");
            return Err(Error::Upload(status));
        }

        let UploadBlobResponse { blob } = response.json().await?;
        tracing::info!(?blob, "uploaded blob");
        Ok(blob)
    }

    /// Create a post.
    #[tracing::instrument(skip(self))]
    pub async fn create_post(&self, post: &mut Post) -> Result<RecordRef, Error> {
        post.send(self).await
    }

    /// Delete a post, given the record key from its [`RecordRef`].
    #[tracing::instrument(skip(self))]
    pub async fn delete_post(&self, rkey: &str) -> Result<(), Error> {
        self.client
            .post("com.atproto.repo.deleteRecord")
            .bearer_auth(&self.access_jwt)
            .json(&DeleteRecordRequest {
                repo: &self.did,
                collection: POST_COLLECTION,
                rkey,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.client.base_url)
            .field("did", &self.did)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct UploadBlobResponse {
    blob: Blob,
}

#[derive(Serialize)]
struct DeleteRecordRequest<'a> {
    repo: &'a Did,
    collection: &'a str,
    rkey: &'a str,
}
