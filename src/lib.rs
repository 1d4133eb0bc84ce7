//! skypost publishes a single post to [Bluesky](https://bsky.app) (or any AT Protocol PDS):
//! it logs in, turns `@handle` mentions and URLs in the text into rich-text facets, optionally
//! attaches an image, and creates the post record.
//!
//! ```no_run
//! use skypost::{Attachment, Post, Session};
//!
//! # async fn f() -> Result<(), Box<dyn std::error::Error>> {
//! // Log in
//! let session = Session::login("alice.bsky.social", "app-password").await?;
//!
//! // Describe a post; mentions are resolved through the session's client
//! let mut post = Post::new("hello @bob.bsky.social, see https://atproto.com!");
//! post.detect_facets(session.client()).await;
//! post.image = Some(
//!     Attachment::fetch(session.client(), "https://example.com/cat.jpg", "image/jpeg".into())
//!         .await?
//!         .with_alt_text("a cat"),
//! );
//!
//! // Create it
//! let record = session.create_post(&mut post).await?;
//! println!("{}", record.cid);
//! # Ok(())
//! # }
//! ```
//!
//! For one-shot automation, [`publish`] runs the whole flow and reports an [`Outcome`] instead
//! of an error.

#![deny(elided_lifetimes_in_paths)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(clippy::missing_errors_doc)]

mod attachment;
mod client;
mod error;
mod facet;
mod outcome;
mod post;
mod publish;
mod scan;
mod session;

pub use crate::attachment::{AspectRatio, Attachment, Blob, MAX_IMAGE_SIZE};
pub use crate::client::Client;
pub use crate::error::{Error, ResolveError};
pub use crate::facet::{
    extract_facets, extract_link_spans, extract_mention_spans, link_facets, resolve_mentions,
    ByteSlice, Did, Facet, Feature, HandleResolver, LinkSpan, MentionSpan,
};
pub use crate::outcome::Outcome;
pub use crate::post::{Cid, Post, RecordRef};
pub use crate::publish::{publish, PublishRequest};
pub use crate::session::Session;
