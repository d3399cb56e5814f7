//! Immutable request model and standard header injection.
//!
//! Every request carries, in order: `Accept: application/json`, the
//! User-Agent, `Accept-Language`, `Authorization` when a token is set, the body
//! `Content-Type`/`Content-Length` for POSTs, and finally the caller's own
//! headers. Caller headers are appended, never merged; resolving duplicate
//! names is left to the transport.

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderName, HeaderValue,
    USER_AGENT,
};
use url::Url;

use super::constants::JSON_MEDIA_TYPE;
use super::error::ClientError;
use crate::body::BodyData;

/// Serialized request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBody {
    content_type: String,
    bytes: Bytes,
}

impl PreparedBody {
    /// Serializes a body encoder.
    #[must_use]
    pub fn from_data(data: &dyn BodyData) -> Self {
        Self {
            content_type: data.content_type(),
            bytes: Bytes::from(data.body()),
        }
    }

    /// Declared `Content-Type`.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Payload bytes.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

/// A fully built request. Immutable once built.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    method: Method,
    url: Url,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Option<PreparedBody>,
}

impl PreparedRequest {
    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute target URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Headers in the order they will be sent.
    #[must_use]
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    /// All values sent for `name`, in order.
    pub fn header_values<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a HeaderValue> + use<'a, 'n> {
        self.headers
            .iter()
            .filter(move |(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// First value sent for `name`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .find(|(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Request body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&PreparedBody> {
        self.body.as_ref()
    }

    /// Converts into a transport request.
    pub(crate) fn into_transport(self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let mut builder = client.request(self.method, self.url);
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = self.body {
            builder = builder.body(body.bytes);
        }
        builder
    }
}

/// Headers fixed for the lifetime of a client.
#[derive(Debug, Clone)]
pub(crate) struct StandardHeaders {
    user_agent: HeaderValue,
    accept_language: HeaderValue,
}

impl StandardHeaders {
    pub(crate) fn new(user_agent: &str, ui_language: &str) -> Result<Self, ClientError> {
        Ok(Self {
            user_agent: HeaderValue::from_str(user_agent)
                .map_err(|_| ClientError::invalid_header(USER_AGENT.as_str()))?,
            accept_language: HeaderValue::from_str(ui_language)
                .map_err(|_| ClientError::invalid_header(ACCEPT_LANGUAGE.as_str()))?,
        })
    }
}

/// Builds a request against `url_prefix`.
///
/// `authorization` is the token value read once for this request.
pub(crate) fn build_request(
    method: Method,
    url_prefix: &str,
    path: &str,
    standard: &StandardHeaders,
    authorization: Option<&str>,
    extra_headers: &[(&str, &str)],
    body: Option<PreparedBody>,
) -> Result<PreparedRequest, ClientError> {
    let url = resolve_url(url_prefix, path)?;

    let mut headers = vec![
        (ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE)),
        (USER_AGENT, standard.user_agent.clone()),
        (ACCEPT_LANGUAGE, standard.accept_language.clone()),
    ];
    if let Some(token) = authorization.filter(|t| !t.is_empty()) {
        let mut value = HeaderValue::from_str(token)
            .map_err(|_| ClientError::invalid_header(AUTHORIZATION.as_str()))?;
        value.set_sensitive(true);
        headers.push((AUTHORIZATION, value));
    }
    if let Some(body) = &body {
        headers.push((
            CONTENT_TYPE,
            HeaderValue::from_str(body.content_type())
                .map_err(|_| ClientError::invalid_header(CONTENT_TYPE.as_str()))?,
        ));
        headers.push((CONTENT_LENGTH, HeaderValue::from(body.bytes().len())));
    }
    for (name, value) in extra_headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ClientError::invalid_header(*name))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| ClientError::invalid_header(*name))?;
        headers.push((header_name, header_value));
    }

    Ok(PreparedRequest {
        method,
        url,
        headers,
        body,
    })
}

/// Joins a URL prefix and a relative path with exactly one `/` between them.
///
/// # Errors
///
/// Returns [`ClientError::InvalidUrl`] when the result is not an absolute URL.
pub fn resolve_url(url_prefix: &str, path: &str) -> Result<Url, ClientError> {
    let joined = if path.is_empty() {
        url_prefix.to_string()
    } else if path.starts_with('?') {
        format!("{}{path}", url_prefix.trim_end_matches('/'))
    } else {
        format!(
            "{}/{}",
            url_prefix.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    };
    Url::parse(&joined).map_err(|_| ClientError::invalid_url(joined))
}
