//! Stub definitions and request matching.

use crate::matcher::Matcher;
use crate::request::{insert_header, HttpRequest, Method};
use crate::response::StubResponse;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// How a stub selects request URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UrlCriterion {
    /// The request URL must equal this string
    Exact(String),
    /// The request URL must satisfy this matcher
    Matching(Matcher),
}

impl UrlCriterion {
    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlCriterion::Exact(expected) => expected == url,
            UrlCriterion::Matching(matcher) => matcher.matches_str(url),
        }
    }
}

impl fmt::Display for UrlCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlCriterion::Exact(url) => f.write_str(url),
            UrlCriterion::Matching(matcher) => write!(f, "{matcher}"),
        }
    }
}

/// A registered expectation: request criteria plus the response to return.
///
/// Two stubs are equal when they share method and URL criterion. Headers,
/// body matcher and response don't take part, so re-declaring a stub replaces
/// the earlier one in a [`StubRegistry`](crate::StubRegistry).
#[derive(Debug, Clone)]
pub struct Stub {
    method: Method,
    url: UrlCriterion,
    headers: HashMap<String, String>,
    body: Option<Matcher>,
    response: StubResponse,
}

impl Stub {
    /// Start building a stub for `method`.
    pub fn builder(method: Method) -> StubBuilder<NoUrl> {
        StubBuilder {
            method,
            url: NoUrl,
            headers: HashMap::new(),
            body: None,
            response: None,
        }
    }

    /// A stub for an exact URL answering with the default response.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self::builder(method).url(url).build()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &UrlCriterion {
        &self.url
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body_matcher(&self) -> Option<&Matcher> {
        self.body.as_ref()
    }

    pub fn response(&self) -> &StubResponse {
        &self.response
    }

    /// Check whether `request` satisfies this stub.
    ///
    /// Method, URL, headers and body are checked in that order. Required
    /// headers are a subset: the request may carry others. A stub without a
    /// body matcher accepts any body, including none.
    pub fn matches<R: HttpRequest + ?Sized>(&self, request: &R) -> bool {
        if request.method() != self.method {
            return false;
        }

        if !self.url.matches(request.url()) {
            return false;
        }

        for (name, value) in &self.headers {
            if request.header(name) != Some(value.as_str()) {
                return false;
            }
        }

        if let Some(body) = &self.body {
            if !body.matches_bytes(request.body().unwrap_or_default()) {
                return false;
            }
        }

        true
    }
}

impl PartialEq for Stub {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.url == other.url
    }
}

impl Eq for Stub {}

impl Hash for Stub {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.method.hash(state);
        self.url.hash(state);
    }
}

/// Builder state before a URL criterion has been chosen.
#[derive(Debug, Clone, Copy)]
pub struct NoUrl;

/// Fluent stub builder.
///
/// [`build`](StubBuilder::build) only exists once exactly one URL criterion
/// has been set, either [`url`](StubBuilder::url) or
/// [`url_matching`](StubBuilder::url_matching).
#[derive(Debug, Clone)]
pub struct StubBuilder<U> {
    method: Method,
    url: U,
    headers: HashMap<String, String>,
    body: Option<Matcher>,
    response: Option<StubResponse>,
}

impl StubBuilder<NoUrl> {
    /// Match the request URL exactly.
    pub fn url(self, url: impl Into<String>) -> StubBuilder<UrlCriterion> {
        self.with_url(UrlCriterion::Exact(url.into()))
    }

    /// Match the request URL with a matcher.
    pub fn url_matching(self, matcher: Matcher) -> StubBuilder<UrlCriterion> {
        self.with_url(UrlCriterion::Matching(matcher))
    }

    fn with_url(self, url: UrlCriterion) -> StubBuilder<UrlCriterion> {
        StubBuilder {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
            response: self.response,
        }
    }
}

impl<U> StubBuilder<U> {
    /// Require a request header with exactly this value.
    ///
    /// Names are case-insensitive; setting the same name again replaces it.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.headers, name.into(), value.into());
        self
    }

    /// Require the request body to satisfy `matcher`.
    pub fn body(mut self, matcher: Matcher) -> Self {
        self.body = Some(matcher);
        self
    }

    pub fn response(mut self, response: StubResponse) -> Self {
        self.response = Some(response);
        self
    }
}

impl StubBuilder<UrlCriterion> {
    /// Finish the stub. Without an explicit response it answers 200 with an
    /// empty body.
    pub fn build(self) -> Stub {
        Stub {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            response: self.response.unwrap_or_default(),
        }
    }
}
