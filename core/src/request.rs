use std::borrow::Cow;
use std::mem;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderName, HOST};
use http::uri::{Authority, PathAndQuery, Scheme};
use http::{HeaderMap, HeaderValue, Method, Uri};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet};

use crate::{Body, Result};

/// Signing context for request.
///
/// Built by taking the parts of an `http::Request` out of it, and returned
/// back by [`SigningRequest::apply`] once the scheme is done with them.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Option<Scheme>,
    /// HTTP authority.
    pub authority: Option<Authority>,
    /// HTTP path, exactly as it appears in the uri.
    pub path: String,
    /// HTTP raw query, without the leading `?`.
    pub query: String,
    /// HTTP headers.
    pub headers: HeaderMap,
    /// HTTP body.
    pub body: Body,
}

impl SigningRequest {
    /// Build a signing context from http::Request.
    pub fn build(req: &mut http::Request<Body>) -> Result<Self> {
        let uri = mem::take(req.uri_mut()).into_parts();
        let (path, query) = match &uri.path_and_query {
            Some(paq) => (
                paq.path().to_string(),
                paq.query().unwrap_or_default().to_string(),
            ),
            None => (String::new(), String::new()),
        };

        Ok(SigningRequest {
            method: req.method().clone(),
            scheme: uri.scheme,
            authority: uri.authority,
            path,
            query,

            // Take the headers and body out of the request to avoid copy.
            // We will return them back when apply the context.
            headers: mem::take(req.headers_mut()),
            body: mem::take(req.body_mut()),
        })
    }

    /// Apply the signing context back to http::Request.
    pub fn apply(self, req: &mut http::Request<Body>) -> Result<()> {
        *req.method_mut() = self.method;
        *req.headers_mut() = self.headers;
        *req.body_mut() = self.body;
        *req.uri_mut() = {
            let mut uri_parts = mem::take(req.uri_mut()).into_parts();
            uri_parts.scheme = self.scheme;
            uri_parts.authority = self.authority;
            uri_parts.path_and_query = {
                let paq = if self.query.is_empty() {
                    self.path
                } else {
                    let mut s = self.path;
                    s.reserve(self.query.len() + 1);
                    s.push('?');
                    s.push_str(&self.query);
                    s
                };

                match (paq.is_empty(), uri_parts.scheme.is_some()) {
                    (true, false) => None,
                    // Absolute uri must carry a path.
                    (true, true) => Some(PathAndQuery::from_static("/")),
                    (false, _) => Some(PathAndQuery::from_str(&paq)?),
                }
            };
            Uri::from_parts(uri_parts)?
        };

        Ok(())
    }

    /// Get the host this request is sent to.
    ///
    /// The `Host` header wins over the uri authority. Returns an empty
    /// string if neither is available.
    pub fn host(&self) -> Result<&str> {
        if let Some(v) = self.headers.get(HOST) {
            return Ok(v.to_str()?);
        }

        Ok(self.authority.as_ref().map(|v| v.as_str()).unwrap_or_default())
    }

    /// Get the host name in lower case, without port or user info.
    pub fn hostname(&self) -> Result<String> {
        let host = self.host()?;
        let host = host.rsplit('@').next().unwrap_or(host);
        let host = match host.rsplit_once(':') {
            Some((h, port)) if port.bytes().all(|b| b.is_ascii_digit()) => h,
            _ => host,
        };

        Ok(host.to_lowercase())
    }

    /// Read the body fully and replace it with a re-readable one.
    #[inline]
    pub fn capture_body(&mut self) -> Result<Bytes> {
        self.body.capture()
    }

    /// Get the path percent decoded.
    pub fn path_percent_decoded(&self) -> Cow<str> {
        percent_decode_str(&self.path).decode_utf8_lossy()
    }

    /// Get the path with every segment percent encoded by given set.
    ///
    /// The path is decoded first so that already escaped characters are
    /// not escaped twice. `/` is kept as the segment separator.
    pub fn path_percent_encoded(&self, set: &'static AsciiSet) -> String {
        self.path_percent_decoded()
            .split('/')
            .map(|seg| utf8_percent_encode(seg, set).to_string())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Parse the raw query into decoded pairs.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        form_urlencoded::parse(self.query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Convert query pairs into a sorted query string, with both keys and
    /// values percent encoded by given set.
    ///
    /// ```shell
    /// [(b, "x y"), (a, "1")] => "a=1&b=x%20y"
    /// ```
    pub fn query_to_percent_encoded_string(
        mut query: Vec<(String, String)>,
        set: &'static AsciiSet,
    ) -> String {
        let mut s = String::with_capacity(16);

        // Sort via query name.
        query.sort();

        for (idx, (k, v)) in query.into_iter().enumerate() {
            if idx != 0 {
                s.push('&');
            }

            s.extend(utf8_percent_encode(&k, set));
            s.push('=');
            s.extend(utf8_percent_encode(&v, set));
        }

        s
    }

    /// Get header value by name.
    ///
    /// Returns empty string if header not found.
    #[inline]
    pub fn header_get_or_default(&self, key: &HeaderName) -> Result<&str> {
        match self.headers.get(key) {
            Some(v) => Ok(v.to_str()?),
            None => Ok(""),
        }
    }

    /// Insert header if the caller didn't set it.
    ///
    /// Headers set by the caller are never overwritten.
    pub fn header_insert_if_absent(
        &mut self,
        key: HeaderName,
        value: impl FnOnce() -> String,
    ) -> Result<()> {
        if !self.headers.contains_key(&key) {
            self.headers.insert(key, HeaderValue::from_str(&value())?);
        }

        Ok(())
    }

    /// Get headers whose lowercased, trimmed name starts with prefix.
    pub fn header_to_vec_with_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let mut hs = Vec::new();
        for (k, v) in self.headers.iter() {
            let name = k.as_str().trim().to_lowercase();
            if name.starts_with(prefix) {
                hs.push((name, v.to_str()?.to_string()));
            }
        }

        Ok(hs)
    }

    /// Convert sorted headers to string.
    ///
    /// ```shell
    /// [(a, b), (c, d)] => "a:b\nc:d"
    /// ```
    pub fn header_to_string(mut headers: Vec<(String, String)>, sep: &str, join: &str) -> String {
        let mut s = String::with_capacity(16);

        // Sort via header name.
        headers.sort();

        for (idx, (k, v)) in headers.into_iter().enumerate() {
            if idx != 0 {
                s.push_str(join);
            }

            s.push_str(&k);
            s.push_str(sep);
            s.push_str(&v);
        }

        s
    }
}

/// SigningMethod is the method that used in signing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SigningMethod {
    /// Signing with header.
    Header,
    /// Signing with query.
    Query(Duration),
}

impl From<Option<Duration>> for SigningMethod {
    fn from(expires_in: Option<Duration>) -> Self {
        match expires_in {
            Some(d) => SigningMethod::Query(d),
            None => SigningMethod::Header,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use percent_encoding::NON_ALPHANUMERIC;
    use pretty_assertions::assert_eq;

    static UNRESERVED: AsciiSet = NON_ALPHANUMERIC
        .remove(b'-')
        .remove(b'.')
        .remove(b'_')
        .remove(b'~');

    fn request(uri: &str) -> http::Request<Body> {
        http::Request::get(uri)
            .body(Body::from("hello"))
            .expect("request must be valid")
    }

    #[test]
    fn test_build_and_apply_keeps_request() -> anyhow::Result<()> {
        let mut req = request("https://example.com:8443/a%20b/c?x=1&y");
        req.headers_mut()
            .insert("x-amz-meta-test", HeaderValue::from_static("v"));

        let sr = SigningRequest::build(&mut req)?;
        assert_eq!(sr.path, "/a%20b/c");
        assert_eq!(sr.query, "x=1&y");
        assert_eq!(sr.host()?, "example.com:8443");
        assert_eq!(sr.hostname()?, "example.com");

        sr.apply(&mut req)?;
        assert_eq!(
            req.uri().to_string(),
            "https://example.com:8443/a%20b/c?x=1&y"
        );
        assert_eq!(req.headers()["x-amz-meta-test"], "v");
        assert_eq!(req.body().as_bytes().map(|v| &v[..]), Some(&b"hello"[..]));
        Ok(())
    }

    #[test]
    fn test_host_header_wins() -> anyhow::Result<()> {
        let mut req = request("https://127.0.0.1:9000/");
        req.headers_mut()
            .insert(HOST, HeaderValue::from_static("Bucket.S3.amazonaws.com"));

        let sr = SigningRequest::build(&mut req)?;
        assert_eq!(sr.host()?, "Bucket.S3.amazonaws.com");
        assert_eq!(sr.hostname()?, "bucket.s3.amazonaws.com");
        Ok(())
    }

    #[test]
    fn test_request_without_authority() -> anyhow::Result<()> {
        let mut req = request("/only/path");
        let sr = SigningRequest::build(&mut req)?;
        assert_eq!(sr.host()?, "");
        assert_eq!(sr.hostname()?, "");

        sr.apply(&mut req)?;
        assert_eq!(req.uri().to_string(), "/only/path");
        Ok(())
    }

    #[test]
    fn test_path_percent_encoded() -> anyhow::Result<()> {
        let mut req = request("https://example.com/photos/my%20puppy+1.jpg/a*b");
        let sr = SigningRequest::build(&mut req)?;
        assert_eq!(
            sr.path_percent_encoded(&UNRESERVED),
            "/photos/my%20puppy%2B1.jpg/a%2Ab"
        );
        Ok(())
    }

    #[test]
    fn test_query_to_percent_encoded_string() {
        let query = vec![
            ("Version".to_string(), "2009-03-31".to_string()),
            ("Timestamp".to_string(), "2011-10-03T15:19:30".to_string()),
            ("Name".to_string(), "hello world~".to_string()),
        ];
        assert_eq!(
            SigningRequest::query_to_percent_encoded_string(query, &UNRESERVED),
            "Name=hello%20world~&Timestamp=2011-10-03T15%3A19%3A30&Version=2009-03-31"
        );
    }

    #[test]
    fn test_query_pairs_decodes_plus_as_space() -> anyhow::Result<()> {
        let mut req = request("https://example.com/?a=x+y&b=%2F&c");
        let sr = SigningRequest::build(&mut req)?;
        assert_eq!(
            sr.query_pairs(),
            vec![
                ("a".to_string(), "x y".to_string()),
                ("b".to_string(), "/".to_string()),
                ("c".to_string(), "".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_header_helpers() -> anyhow::Result<()> {
        let mut req = request("https://example.com/");
        req.headers_mut()
            .insert("x-amz-meta-something", HeaderValue::from_static("more foobar"));
        req.headers_mut()
            .insert("x-amz-date", HeaderValue::from_static("foobar"));
        req.headers_mut()
            .insert("x-foobar", HeaderValue::from_static("nanoo-nanoo"));

        let mut sr = SigningRequest::build(&mut req)?;
        let hs = sr.header_to_vec_with_prefix("x-amz")?;
        assert_eq!(
            SigningRequest::header_to_string(hs, ":", "\n"),
            "x-amz-date:foobar\nx-amz-meta-something:more foobar"
        );

        sr.header_insert_if_absent(HeaderName::from_static("x-amz-date"), || {
            "other".to_string()
        })?;
        assert_eq!(
            sr.header_get_or_default(&HeaderName::from_static("x-amz-date"))?,
            "foobar"
        );
        assert_eq!(
            sr.header_get_or_default(&HeaderName::from_static("content-type"))?,
            ""
        );
        Ok(())
    }
}
