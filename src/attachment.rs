use crate::{Client, Error, Session};
use bytes::Bytes;
use reqwest::Body;
use serde::{Deserialize, Serialize};

/// Largest image, in bytes, that will be uploaded.
pub const MAX_IMAGE_SIZE: u64 = 1_000_000;

/// Reference to an uploaded blob, as returned by the server. The contents are opaque and are
/// embedded into records unchanged.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Blob(pub serde_json::Value);

/// Width and height of an image, sent along so clients can lay it out before loading it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct AspectRatio {
    /// Width in pixels.
    pub width: u64,
    /// Height in pixels.
    pub height: u64,
}

/// An image to embed in a post.
#[derive(Debug)]
pub struct Attachment {
    /// Alt text shown to screen reader users.
    pub alt_text: String,
    pub(crate) aspect_ratio: Option<AspectRatio>,
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    New {
        stream: Body,
        content_type: String,
        content_length: u64,
    },
    Uploaded(Blob),
    Failed,
}

impl Attachment {
    /// Create an `Attachment` from a buffer.
    pub fn new(content: impl Into<Bytes>, content_type: String) -> Attachment {
        let content: Bytes = content.into();
        Attachment {
            alt_text: String::new(),
            aspect_ratio: aspect_ratio(&content),
            inner: Inner::New {
                content_length: u64::try_from(content.len()).unwrap_or(u64::MAX),
                stream: content.into(),
                content_type,
            },
        }
    }

    /// Create an `Attachment` from a file on disk.
    #[cfg(feature = "fs")]
    pub async fn new_from_file(
        path: impl AsRef<std::path::Path>,
        content_type: String,
    ) -> Result<Attachment, std::io::Error> {
        use tokio::fs::File;
        use tokio_util::codec::{BytesCodec, FramedRead};

        let file = File::open(path).await?;
        let content_length = file.metadata().await?.len();
        let stream = Body::wrap_stream(FramedRead::new(file, BytesCodec::new()));

        Ok(Attachment {
            alt_text: String::new(),
            aspect_ratio: None,
            inner: Inner::New {
                stream,
                content_type,
                content_length,
            },
        })
    }

    /// Download an image, keeping it in memory until the post is sent.
    #[tracing::instrument(skip(client))]
    pub async fn fetch(
        client: &Client,
        url: &str,
        content_type: String,
    ) -> Result<Attachment, Error> {
        let response = client
            .client
            .get(url)
            .send()
            .await
            .map_err(Error::ImageFetch)?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(%status, "image not found");
            return Err(Error::ImageNotFound(status));
        }

        let content = response.bytes().await.map_err(Error::ImageFetch)?;
        tracing::info!(len = content.len(), "fetched image");
        Ok(Attachment::new(content, content_type))
    }

    /// Set the alt text.
    #[must_use]
    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Attachment {
        self.alt_text = alt_text.into();
        self
    }

    /// Not uploaded yet.
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self.inner, Inner::New { .. })
    }

    #[must_use]
    pub fn is_uploaded(&self) -> bool {
        matches!(self.inner, Inner::Uploaded(_))
    }

    /// An upload was attempted and failed; the post can't be sent.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.inner, Inner::Failed)
    }

    /// The uploaded blob, once the attachment has been sent.
    pub fn blob(&self) -> Option<&Blob> {
        match &self.inner {
            Inner::Uploaded(blob) => Some(blob),
            _ => None,
        }
    }

    /// Uploads the attachment if it hasn't been already. Anything over [`MAX_IMAGE_SIZE`] is
    /// rejected without contacting the server, and leaves the attachment failed.
    #[tracing::instrument(skip(session))]
    pub(crate) async fn upload(&mut self, session: &Session) -> Result<(), Error> {
        let (stream, content_type, content_length) =
            match std::mem::replace(&mut self.inner, Inner::Failed) {
                Inner::New {
                    stream,
                    content_type,
                    content_length,
                } => (stream, content_type, content_length),
                Inner::Uploaded(blob) => {
                    self.inner = Inner::Uploaded(blob);
                    return Ok(());
                }
                Inner::Failed => return Err(Error::FailedAttachment),
            };

        if content_length > MAX_IMAGE_SIZE {
            tracing::error!(content_length, "image too large");
            return Err(Error::ImageTooLarge(content_length));
        }

        self.inner = Inner::Uploaded(session.upload_blob(stream, &content_type).await?);
        Ok(())
    }
}

#[cfg(feature = "imagesize")]
fn aspect_ratio(content: &[u8]) -> Option<AspectRatio> {
    let size = imagesize::blob_size(content).ok()?;
    Some(AspectRatio {
        width: size.width.try_into().ok()?,
        height: size.height.try_into().ok()?,
    })
}

#[cfg(not(feature = "imagesize"))]
fn aspect_ratio(_content: &[u8]) -> Option<AspectRatio> {
    None
}
