use crate::{Did, Error, HandleResolver, ResolveError, Session};
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

macro_rules! request_impl {
    ($($f:ident),* $(,)*) => {
        $(
            #[inline]
            pub(crate) fn $f(&self, method: &str) -> RequestBuilder {
                tracing::info!(method, concat!("Client::", stringify!($f)));
                self.client.$f(format!("{}{}", self.base_url, method))
            }
        )*
    };
}

/// HTTP client.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) base_url: Cow<'static, str>,
    pub(crate) client: reqwest::Client,
}

impl Client {
    /// Creates a new `Client` with the default XRPC base URL, `https://bsky.social/xrpc/`. Use
    /// [`Client::with_base_url`] to talk to a different PDS.
    #[must_use]
    #[allow(clippy::missing_panics_doc)] // tested to not panic
    pub fn new() -> Client {
        const USER_AGENT: &str = concat!("skypost/", env!("CARGO_PKG_VERSION"));

        Client {
            base_url: Cow::Borrowed("https://bsky.social/xrpc/"),
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .unwrap(),
        }
    }

    /// Creates a new `Client` with a custom XRPC base URL.
    #[must_use]
    pub fn with_base_url(mut self, mut base_url: String) -> Client {
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = Cow::Owned(base_url);
        self
    }

    /// Logs in with a handle (or email) and password, returning a [`Session`].
    ///
    /// App passwords work here too. Securely storing the password is an exercise left to the
    /// caller.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(self, identifier: &str, password: &str) -> Result<Session, Error> {
        let response = self
            .post("com.atproto.server.createSession")
            .json(&CreateSessionRequest {
                identifier,
                password,
            })
            .send()
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "createSession request failed");
                Error::Authentication
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "createSession rejected");
            return Err(Error::Authentication);
        }

        let CreateSessionResponse {
            access_jwt,
            did,
            handle,
        } = response.json().await?;
        let access_jwt = access_jwt
            .filter(|jwt| !jwt.is_empty())
            .ok_or(Error::MissingAccessJwt)?;
        tracing::info!(%did, %handle, "logged in");

        Ok(Session {
            client: self,
            access_jwt,
            did,
            handle,
        })
    }

    /// Resolves a handle (without the leading `@`) to the DID of its account.
    ///
    /// A 400 response means the handle does not exist and is reported as
    /// [`ResolveError::NotFound`].
    #[tracing::instrument(skip(self))]
    pub async fn resolve_handle(&self, handle: &str) -> Result<Did, ResolveError> {
        let response = self
            .get("com.atproto.identity.resolveHandle")
            .query(&[("handle", handle)])
            .send()
            .await?;
        if response.status() == StatusCode::BAD_REQUEST {
            return Err(ResolveError::NotFound);
        }

        let ResolveHandleResponse { did } = response.error_for_status()?.json().await?;
        did.ok_or(ResolveError::MissingDid)
    }

    request_impl!(get, post);
}

impl Default for Client {
    fn default() -> Client {
        Client::new()
    }
}

impl HandleResolver for Client {
    async fn resolve_handle(&self, handle: &str) -> Result<Did, ResolveError> {
        Client::resolve_handle(self, handle).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    access_jwt: Option<String>,
    #[serde(default)]
    did: Did,
    #[serde(default)]
    handle: String,
}

#[derive(Deserialize)]
struct ResolveHandleResponse {
    did: Option<Did>,
}
