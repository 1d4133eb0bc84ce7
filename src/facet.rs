//! Rich-text facets: byte ranges of a post's text tagged as mentions or links.

use crate::error::ResolveError;
use crate::scan;
use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};

/// A decentralized identifier, such as `did:plc:abc123`.
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
pub struct Did(pub String);

/// Something that can turn a handle (`alice.bsky.social`) into a [`Did`].
///
/// [`Client`][`crate::Client`] implements this against the PDS.
#[allow(async_fn_in_trait)]
pub trait HandleResolver {
    /// Resolve `handle`, which has no leading `@`.
    async fn resolve_handle(&self, handle: &str) -> Result<Did, ResolveError>;
}

/// An `@handle` found in text, before resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionSpan {
    /// Byte offset of the `@`.
    pub start: usize,
    /// Byte offset just past the handle.
    pub end: usize,
    /// The handle without its leading `@`.
    pub handle: String,
}

/// A URL found in text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkSpan {
    /// Byte offset of the first character of the URL.
    pub start: usize,
    /// Byte offset just past the URL.
    pub end: usize,
    /// The URL text.
    pub url: String,
}

/// A range of UTF-8 bytes in the post text, end exclusive.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteSlice {
    /// Inclusive start.
    pub byte_start: usize,
    /// Exclusive end.
    pub byte_end: usize,
}

/// A facet attached to a post.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Facet {
    /// The tagged text.
    pub index: ByteSlice,
    /// What the text is tagged as. Facets built by this crate carry exactly one feature.
    pub features: Vec<Feature>,
}

/// What a facet marks its text as.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "$type")]
pub enum Feature {
    /// A mention of an account.
    #[serde(rename = "app.bsky.richtext.facet#mention")]
    Mention {
        /// The mentioned account.
        did: Did,
    },
    /// A hyperlink.
    #[serde(rename = "app.bsky.richtext.facet#link")]
    Link {
        /// Link target.
        uri: String,
    },
}

impl Facet {
    /// Builds a mention facet over `span`.
    pub fn mention(span: &MentionSpan, did: Did) -> Facet {
        Facet {
            index: ByteSlice {
                byte_start: span.start,
                byte_end: span.end,
            },
            features: vec![Feature::Mention { did }],
        }
    }

    /// Builds a link facet over `span`.
    pub fn link(span: &LinkSpan) -> Facet {
        Facet {
            index: ByteSlice {
                byte_start: span.start,
                byte_end: span.end,
            },
            features: vec![Feature::Link {
                uri: span.url.clone(),
            }],
        }
    }
}

/// Finds every `@handle` in `text`, left to right.
#[must_use]
pub fn extract_mention_spans(text: &str) -> Vec<MentionSpan> {
    scan::mentions(text)
        .into_iter()
        .map(|range| MentionSpan {
            handle: text[range.start + 1..range.end].to_owned(),
            start: range.start,
            end: range.end,
        })
        .collect()
}

/// Finds every `http://` or `https://` URL in `text`, left to right.
#[must_use]
pub fn extract_link_spans(text: &str) -> Vec<LinkSpan> {
    scan::links(text)
        .into_iter()
        .map(|range| LinkSpan {
            url: text[range.clone()].to_owned(),
            start: range.start,
            end: range.end,
        })
        .collect()
}

/// Resolves each mention in turn, keeping the ones whose handle resolves.
///
/// Handles that fail to resolve are dropped and the text stays plain. This never fails.
pub async fn resolve_mentions<R>(spans: &[MentionSpan], resolver: &R) -> Vec<Facet>
where
    R: HandleResolver,
{
    let mut facets = Vec::with_capacity(spans.len());
    for span in spans {
        match resolver.resolve_handle(&span.handle).await {
            Ok(did) => {
                tracing::debug!(handle = %span.handle, %did, "resolved mention");
                facets.push(Facet::mention(span, did));
            }
            Err(ResolveError::NotFound) => {
                tracing::debug!(handle = %span.handle, "handle does not resolve, skipping");
            }
            Err(err) => {
                tracing::warn!(handle = %span.handle, error = %err, "failed to resolve handle");
            }
        }
    }
    facets
}

/// Turns every link span into a link facet, in order.
#[must_use]
pub fn link_facets(spans: &[LinkSpan]) -> Vec<Facet> {
    spans.iter().map(Facet::link).collect()
}

/// Extracts all facets from `text`: resolved mentions first, then links.
///
/// The result is not sorted by byte offset.
#[tracing::instrument(skip(resolver))]
pub async fn extract_facets<R>(text: &str, resolver: &R) -> Vec<Facet>
where
    R: HandleResolver,
{
    let mut facets = resolve_mentions(&extract_mention_spans(text), resolver).await;
    facets.extend(link_facets(&extract_link_spans(text)));
    facets
}

#[cfg(test)]
mod tests {
    use super::{
        extract_facets, extract_link_spans, extract_mention_spans, link_facets,
        resolve_mentions, Did, Facet, Feature, HandleResolver, LinkSpan,
    };
    use crate::ResolveError;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const TEXT: &str = "Hello @alice.bsky.social, check https://example.com/page!";

    #[derive(Default)]
    struct MapResolver {
        dids: HashMap<&'static str, &'static str>,
        broken: Vec<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl HandleResolver for MapResolver {
        async fn resolve_handle(&self, handle: &str) -> Result<Did, ResolveError> {
            self.calls.borrow_mut().push(handle.to_owned());
            if self.broken.iter().any(|broken| *broken == handle) {
                return Err(ResolveError::MissingDid);
            }
            self.dids
                .get(handle)
                .map(|did| Did((*did).to_owned()))
                .ok_or(ResolveError::NotFound)
        }
    }

    fn alice() -> MapResolver {
        MapResolver {
            dids: HashMap::from([("alice.bsky.social", "did:plc:abc123")]),
            ..Default::default()
        }
    }

    #[test]
    fn mention_span_strips_at() {
        let spans = extract_mention_spans(TEXT);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].handle, "alice.bsky.social");
        assert_eq!((spans[0].start, spans[0].end), (6, 24));
        assert_eq!(&TEXT[spans[0].start..spans[0].end], "@alice.bsky.social");
    }

    #[test]
    fn link_facets_preserve_order_and_length() {
        let spans = extract_link_spans("https://b.example.org/x then http://a.example.com");
        let facets = link_facets(&spans);
        assert_eq!(facets.len(), spans.len());
        let uris = facets
            .iter()
            .map(|facet| match &facet.features[..] {
                [Feature::Link { uri }] => uri.as_str(),
                other => panic!("unexpected features {other:?}"),
            })
            .collect::<Vec<_>>();
        assert_eq!(uris, ["https://b.example.org/x", "http://a.example.com"]);
        assert!(link_facets(&[]).is_empty());
    }

    #[tokio::test]
    async fn resolves_mention_then_link() {
        let facets = extract_facets(TEXT, &alice()).await;
        assert_eq!(
            serde_json::to_value(&facets).unwrap(),
            json!([
                {
                    "index": { "byteStart": 6, "byteEnd": 24 },
                    "features": [{
                        "$type": "app.bsky.richtext.facet#mention",
                        "did": "did:plc:abc123",
                    }],
                },
                {
                    "index": { "byteStart": 32, "byteEnd": 56 },
                    "features": [{
                        "$type": "app.bsky.richtext.facet#link",
                        "uri": "https://example.com/page",
                    }],
                },
            ])
        );
    }

    #[tokio::test]
    async fn unresolvable_handle_leaves_only_link() {
        let facets = extract_facets(TEXT, &MapResolver::default()).await;
        assert_eq!(
            facets,
            [Facet::link(&LinkSpan {
                start: 32,
                end: 56,
                url: "https://example.com/page".into(),
            })]
        );
    }

    #[tokio::test]
    async fn other_resolution_failures_also_drop() {
        let resolver = MapResolver {
            dids: HashMap::from([("bob.test", "did:plc:bob")]),
            broken: vec!["alice.test"],
            ..Default::default()
        };
        let spans = extract_mention_spans("@alice.test @carol.test @bob.test");
        let facets = resolve_mentions(&spans, &resolver).await;
        assert_eq!(facets, [Facet::mention(&spans[2], Did("did:plc:bob".into()))]);
        assert_eq!(
            *resolver.calls.borrow(),
            ["alice.test", "carol.test", "bob.test"]
        );
    }

    #[tokio::test]
    async fn mentions_come_before_links_regardless_of_position() {
        let text = "https://example.com first, then @alice.bsky.social";
        let facets = extract_facets(text, &alice()).await;
        assert_eq!(facets.len(), 2);
        assert!(matches!(facets[0].features[0], Feature::Mention { .. }));
        assert!(facets[0].index.byte_start > facets[1].index.byte_start);
    }

    #[test]
    fn facet_round_trips_through_json() {
        let value = json!({
            "index": { "byteStart": 0, "byteEnd": 5 },
            "features": [{ "$type": "app.bsky.richtext.facet#mention", "did": "did:plc:x" }],
        });
        let facet: Facet = serde_json::from_value(value).unwrap();
        assert_eq!(facet.features, [Feature::Mention { did: "did:plc:x".parse().unwrap() }]);
    }
}
