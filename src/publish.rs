use crate::{Attachment, Client, Error, Outcome, Post, RecordRef};
use std::fmt::{self, Debug};

const ALT_TEXT_CHARS: usize = 50;

/// Everything needed to publish one post.
#[derive(Clone, Default)]
pub struct PublishRequest {
    /// Handle or email to log in with.
    pub identifier: String,
    /// Account or app password.
    pub password: String,
    /// Post text. Mentions and links are detected automatically.
    pub text: String,
    /// Image to download and attach.
    pub image_url: Option<String>,
    /// MIME type sent when uploading the image.
    pub image_content_type: String,
    /// Alt text for the image. Defaults to the start of the post text.
    pub alt_text: Option<String>,
}

impl Debug for PublishRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishRequest")
            .field("identifier", &self.identifier)
            .field("text", &self.text)
            .field("image_url", &self.image_url)
            .field("image_content_type", &self.image_content_type)
            .field("alt_text", &self.alt_text)
            .finish_non_exhaustive()
    }
}

/// Logs in, detects facets, attaches the image if there is one, and creates the post.
///
/// Steps run one after another and the first failure ends the run. A mention that doesn't
/// resolve is not a failure; it stays plain text. This never returns an error: the result is
/// always an [`Outcome`].
#[tracing::instrument(skip(client))]
pub async fn publish(client: Client, request: &PublishRequest) -> Outcome {
    let outcome = Outcome::from(try_publish(client, request).await);
    match &outcome {
        Outcome::Success { cid, .. } => tracing::info!(?cid, "published"),
        Outcome::Failure { message } => tracing::error!(error = %message, "publish failed"),
    }
    outcome
}

async fn try_publish(client: Client, request: &PublishRequest) -> Result<RecordRef, Error> {
    let session = client
        .login(&request.identifier, &request.password)
        .await?;

    let mut post = Post::new(request.text.clone());
    post.detect_facets(session.client()).await;

    if let Some(url) = &request.image_url {
        let alt_text = request
            .alt_text
            .clone()
            .unwrap_or_else(|| default_alt_text(&request.text));
        let image = Attachment::fetch(session.client(), url, request.image_content_type.clone())
            .await?
            .with_alt_text(alt_text);
        post.image = Some(image);
    }

    session.create_post(&mut post).await
}

fn default_alt_text(text: &str) -> String {
    let mut alt_text = text.chars().take(ALT_TEXT_CHARS).collect::<String>();
    alt_text.push_str("...");
    alt_text
}
