//! Request classification.
//!
//! Maps an incoming request descriptor to one of five strategy classes.
//! Classification is pure and total: every request lands in exactly one
//! class, and the decision order is load-bearing — analytics URLs must win
//! over the navigation check, and navigations to same-origin URLs must not
//! be treated as same-origin assets.

use cachet_core::Error;
use regex::Regex;
use url::{Origin, Url};

/// What kind of resource a request is for, as reported by the interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Script,
    Style,
    Font,
    Image,
    Other,
}

/// Navigation semantics of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// A page navigation.
    Navigate,
    /// Subresource request with CORS semantics.
    Cors,
    /// Subresource request without CORS semantics.
    NoCors,
}

/// The classification inputs for one intercepted request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: Url,
    pub mode: RequestMode,
    pub destination: Destination,
}

impl RequestDescriptor {
    /// A page navigation.
    pub fn navigation(url: Url) -> Self {
        Self { url, mode: RequestMode::Navigate, destination: Destination::Document }
    }

    /// A subresource request (script, style, image, ...).
    pub fn subresource(url: Url, destination: Destination) -> Self {
        Self { url, mode: RequestMode::NoCors, destination }
    }
}

/// The strategy class a request is served with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Analytics endpoint: network passthrough, never cached.
    AnalyticsOnly,
    /// Page navigation or document resource: network-first.
    Document,
    /// Third-party renderable resource: stale-while-revalidate.
    ThirdPartyCacheable,
    /// Same-origin asset: cache-first.
    SameOriginCacheable,
    /// Everything else: network-first.
    Other,
}

/// The two ordered pattern sets driving classification.
///
/// Compiled once at startup; a bad pattern fails worker construction
/// rather than silently misclassifying at dispatch time.
#[derive(Debug)]
pub struct PatternTable {
    analytics: Vec<Regex>,
    cdn: Vec<Regex>,
}

impl PatternTable {
    /// Compile pattern lists into a table.
    pub fn compile(analytics: &[String], cdn: &[String]) -> Result<Self, Error> {
        Ok(Self { analytics: compile_all(analytics)?, cdn: compile_all(cdn)? })
    }

    /// Whether a URL matches an analytics pattern.
    pub fn is_analytics(&self, url: &str) -> bool {
        self.analytics.iter().any(|p| p.is_match(url))
    }

    /// Whether a URL matches a CDN/third-party pattern.
    pub fn is_cdn(&self, url: &str) -> bool {
        self.cdn.iter().any(|p| p.is_match(url))
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, Error> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(|e| Error::PatternInvalid(format!("{p}: {e}"))))
        .collect()
}

/// Classify a request. First match wins.
pub fn classify(request: &RequestDescriptor, patterns: &PatternTable, app_origin: &Origin) -> RequestClass {
    let url = request.url.as_str();

    if patterns.is_analytics(url) {
        return RequestClass::AnalyticsOnly;
    }

    if request.mode == RequestMode::Navigate || request.destination == Destination::Document {
        return RequestClass::Document;
    }

    if patterns.is_cdn(url) {
        return RequestClass::ThirdPartyCacheable;
    }

    if request.url.origin() == *app_origin {
        return RequestClass::SameOriginCacheable;
    }

    RequestClass::Other
}
