use reqwest::StatusCode;

/// Errors that might occur when using the library.
///
/// The `Display` output of each variant is the message reported in a failed
/// [`Outcome`][`crate::Outcome`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The server rejected the identifier and password.
    #[error("Failed to authenticate")]
    Authentication,

    /// The server accepted the credentials but did not hand out an access token.
    #[error("Failed to authenticate, no jwt")]
    MissingAccessJwt,

    /// Attempted to create a post with no text and no image.
    #[error("post is empty (no text or image)")]
    EmptyPost,

    /// Attempted to create a post with an [`Attachment`][`crate::Attachment`] marked as failed.
    #[error("attempted to use post with failed attachment")]
    FailedAttachment,

    /// The image URL answered with a non-success status.
    #[error("Image not found: {}", .0.as_u16())]
    ImageNotFound(StatusCode),

    /// The image could not be downloaded at all.
    #[error("Error converting image to Blob: {0}")]
    ImageFetch(#[source] reqwest::Error),

    /// The image is over [`MAX_IMAGE_SIZE`][`crate::MAX_IMAGE_SIZE`] bytes.
    #[error("Image file size too large. Maximum 1 megabyte (1000000 bytes), got: {0}")]
    ImageTooLarge(u64),

    /// The blob upload answered with a non-success status.
    #[error("Failed to upload image. Status: {}", .0.as_u16())]
    Upload(StatusCode),

    /// The server refused to create the record.
    #[error("Failed to create record")]
    CreateRecord,

    /// The server answered without a content identifier for the new record; carries the
    /// server's message.
    #[error("Failed to create record: {0}")]
    MissingCid(String),

    /// An I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// An HTTP client error (including status codes indicating failure).
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
}

/// Why a handle could not be turned into a DID.
///
/// Every variant is recoverable: a mention whose handle fails to resolve is left as plain text.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ResolveError {
    /// The server answered 400 Bad Request; the handle does not exist.
    #[error("handle does not resolve")]
    NotFound,

    /// The server answered successfully but the response had no DID.
    #[error("resolution response had no did")]
    MissingDid,

    /// An HTTP client error (including status codes other than 400 indicating failure).
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
}
