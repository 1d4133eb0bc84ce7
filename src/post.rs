use crate::attachment::AspectRatio;
use crate::{extract_facets, Attachment, Blob, Did, Error, Facet, HandleResolver, Session};
use chrono::{DateTime, SecondsFormat, Utc};
use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

pub(crate) const POST_COLLECTION: &str = "app.bsky.feed.post";

/// A content identifier: the hash of a record as stored in the repository.
#[derive(
    Clone,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(transparent)]
pub struct Cid(pub String);

/// Where a created post lives.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordRef {
    /// `at://` URI of the record.
    pub uri: String,
    /// Content identifier of the record.
    pub cid: Cid,
}

impl RecordRef {
    /// The record key: the last path segment of the URI.
    #[must_use]
    pub fn rkey(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or_default()
    }
}

/// Describes a post's contents.
///
/// When you send a post with [`Session::create_post`], the `Post` must be mutable. This is
/// because the [`image`][`Post::image`] is uploaded and replaced with its blob reference.
#[derive(Debug, Default)]
#[must_use]
pub struct Post {
    /// Post text.
    pub text: String,
    /// Mentions and links within [`text`][`Post::text`]. See [`Post::detect_facets`].
    pub facets: Vec<Facet>,
    /// An image displayed below the text.
    pub image: Option<Attachment>,
    /// Languages the text is written in, as BCP 47 tags.
    pub langs: Vec<String>,
    /// When the post was written. Defaults to the time it is sent.
    pub created_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Creates a post with the given text and nothing else.
    pub fn new(text: impl Into<String>) -> Post {
        Post {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Returns true if the post has no content (no text or image).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.image.is_none()
    }

    /// Replaces [`facets`][`Post::facets`] with the mentions and links found in the text.
    /// Mentions whose handle doesn't resolve are left as plain text.
    pub async fn detect_facets<R>(&mut self, resolver: &R)
    where
        R: HandleResolver,
    {
        self.facets = extract_facets(&self.text, resolver).await;
    }

    pub(crate) async fn send(&mut self, session: &Session) -> Result<RecordRef, Error> {
        if self.is_empty() {
            return Err(Error::EmptyPost);
        }
        if self.image.as_ref().map_or(false, Attachment::is_failed) {
            return Err(Error::FailedAttachment);
        }

        if let Some(image) = &mut self.image {
            image.upload(session).await?;
        }

        let created_at = self.created_at.unwrap_or_else(Utc::now);
        let response = session
            .client
            .post("com.atproto.repo.createRecord")
            .bearer_auth(&session.access_jwt)
            .json(&CreateRecordRequest {
                repo: &session.did,
                collection: POST_COLLECTION,
                record: self.as_api(created_at),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "createRecord rejected");
            return Err(Error::CreateRecord);
        }

        let CreateRecordResponse { uri, cid, message } = response.json().await?;
        match cid {
            Some(cid) => {
                tracing::info!(%cid, ?uri, "created post");
                Ok(RecordRef {
                    uri: uri.unwrap_or_default(),
                    cid,
                })
            }
            None => {
                tracing::error!(?message, "createRecord returned no cid");
                Err(Error::MissingCid(message.unwrap_or_default()))
            }
        }
    }

    fn as_api(&self, created_at: DateTime<Utc>) -> ApiPost<'_> {
        let embed = self.image.as_ref().and_then(|image| {
            image.blob().map(|blob| ApiEmbed::Images {
                images: vec![ApiImage {
                    alt: &image.alt_text,
                    image: blob,
                    aspect_ratio: image.aspect_ratio,
                }],
            })
        });

        let post = ApiPost {
            record_type: POST_COLLECTION,
            text: &self.text,
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            facets: (!self.facets.is_empty()).then_some(&self.facets[..]),
            embed,
            langs: (!self.langs.is_empty()).then_some(&self.langs[..]),
        };
        tracing::debug!(?post);
        post
    }
}

#[derive(Serialize)]
struct CreateRecordRequest<'a> {
    repo: &'a Did,
    collection: &'a str,
    record: ApiPost<'a>,
}

#[allow(clippy::module_name_repetitions)]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiPost<'a> {
    #[serde(rename = "$type")]
    record_type: &'a str,
    text: &'a str,
    created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    facets: Option<&'a [Facet]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    embed: Option<ApiEmbed<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    langs: Option<&'a [String]>,
}

impl Debug for ApiPost<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::to_value(self).map_err(|_| fmt::Error)?)
    }
}

#[derive(Serialize)]
#[serde(tag = "$type")]
enum ApiEmbed<'a> {
    #[serde(rename = "app.bsky.embed.images")]
    Images { images: Vec<ApiImage<'a>> },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiImage<'a> {
    alt: &'a str,
    image: &'a Blob,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<AspectRatio>,
}

#[derive(Deserialize)]
struct CreateRecordResponse {
    uri: Option<String>,
    cid: Option<Cid>,
    message: Option<String>,
}
