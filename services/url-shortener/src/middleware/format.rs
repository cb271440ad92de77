//! URL format normalization.
//!
//! Strips a trailing `.json`, `.xml` or `.txt` from the last path segment
//! before routing and records it as a [`UrlFormat`] request extension, so
//! `GET /abc123.json` resolves the alias `abc123`.

use std::task::{Context, Poll};

use axum::http::uri::PathAndQuery;
use axum::http::{Request, Uri};
use tower::{Layer, Service};

/// Response format requested through the path extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlFormat {
    /// `.json`
    Json,
    /// `.xml`
    Xml,
    /// `.txt`
    Txt,
}

impl UrlFormat {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Extension without the dot.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Txt => "txt",
        }
    }
}

/// Splits a known format extension off the last segment of `path`.
pub fn split_format(path: &str) -> Option<(&str, UrlFormat)> {
    let last_segment_start = path.rfind('/').map_or(0, |i| i + 1);
    let dot = path[last_segment_start..].rfind('.')? + last_segment_start;
    // "/.json" has no name left to route on
    if dot == last_segment_start {
        return None;
    }
    let format = UrlFormat::from_extension(&path[dot + 1..])?;
    Some((&path[..dot], format))
}

fn strip_format(uri: &Uri) -> Option<(Uri, UrlFormat)> {
    let (path, format) = split_format(uri.path())?;

    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);

    Some((Uri::from_parts(parts).ok()?, format))
}

/// Layer applying format normalization in front of a router.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatLayer;

impl<S> Layer<S> for FormatLayer {
    type Service = FormatService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FormatService { inner }
    }
}

/// Format normalization service wrapper
#[derive(Debug, Clone)]
pub struct FormatService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for FormatService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        if let Some((uri, format)) = strip_format(req.uri()) {
            *req.uri_mut() = uri;
            req.extensions_mut().insert(format);
        }
        self.inner.call(req)
    }
}
