//! CSRF-protected transport
//!
//! Every state-changing call to the service's API must carry the
//! anti-CSRF token and the session credentials. [`SecureTransport`] wraps
//! the HTTP client so callers get that transparently: requests are
//! classified as in-scope when they target the configured API base's
//! origin and path prefix, and only those requests are touched. Everything
//! else passes through completely unmodified.
//!
//! The transport is an explicit, injected object. Constructing a second
//! one is harmless; there is no global installation step.

use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderName, HeaderValue};
use http::Method;
use log::{debug, trace};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Request, RequestBuilder, Response};
use url::Url;

use crate::common::{AdminError, Result};
use crate::config::AdminConfig;

/// Header carrying the anti-CSRF token
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Methods that never need CSRF protection
const SAFE_METHODS: [Method; 4] = [Method::GET, Method::HEAD, Method::OPTIONS, Method::TRACE];

/// CSRF-protecting wrapper around the HTTP client
///
/// Holds two clients over one connection setup: a session client carrying
/// the credential cookie jar, used for in-scope requests, and a bare
/// client for everything else, so no credential ever leaves the configured
/// origin.
pub struct SecureTransport {
    session: Client,
    direct: Client,
    jar: Arc<Jar>,
    api_base: Url,
    csrf_cookie: String,
}

impl SecureTransport {
    /// Build a transport from the admin configuration
    pub fn new(config: &AdminConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let timeout = Duration::from_secs(config.connection_timeout);

        let session = Client::builder()
            .timeout(timeout)
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        let direct = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            session,
            direct,
            jar,
            api_base: config.api_base.clone(),
            csrf_cookie: config.csrf_cookie.clone(),
        })
    }

    /// The configured API base
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Resolve a path relative to the API base
    pub fn api_url(&self, path: &str) -> Result<Url> {
        let mut base = self.api_base.clone();

        // Url::join would drop the base's last path segment without a
        // trailing slash, silently escaping the API scope.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        Ok(base.join(path.trim_start_matches('/'))?)
    }

    /// Seed a session cookie for the API origin
    ///
    /// `cookie` is a `name=value` cookie string. Normally cookies arrive
    /// via `Set-Cookie` on the login response and land in the jar on their
    /// own; this exists for session bootstrap and tests.
    pub fn add_session_cookie(&self, cookie: &str) {
        self.jar.add_cookie_str(cookie, &self.api_base);
    }

    /// Start a request through this transport
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.session.request(method, url)
    }

    /// Build, prepare, and execute a request
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let mut request = builder.build()?;
        self.prepare(&mut request);

        let client = if self.is_in_scope(request.url()) {
            &self.session
        } else {
            &self.direct
        };

        Ok(client.execute(request).await?)
    }

    /// Apply the CSRF contract to a request in place
    ///
    /// In-scope, non-safe-method requests without an explicit caller-set
    /// token get the cookie-derived `x-csrf-token` header. Everything else
    /// is left untouched.
    pub fn prepare(&self, request: &mut Request) {
        if !self.is_in_scope(request.url()) {
            trace!("request to {} is out of scope, passing through", request.url());
            return;
        }

        if SAFE_METHODS.contains(request.method()) {
            return;
        }

        let header = HeaderName::from_static(CSRF_HEADER);
        if request.headers().contains_key(&header) {
            debug!("caller already set {}, not overriding", CSRF_HEADER);
            return;
        }

        match self.csrf_token() {
            Some(token) => match HeaderValue::from_str(&token) {
                Ok(value) => {
                    request.headers_mut().insert(header, value);
                }
                Err(_) => {
                    debug!("CSRF cookie {} holds a non-header-safe value, skipping", self.csrf_cookie);
                }
            },
            None => {
                debug!("no {} cookie present, sending request without CSRF token", self.csrf_cookie);
            }
        }
    }

    /// Whether a URL belongs to the protected API surface
    ///
    /// In scope iff the URL's origin equals the API base's origin and its
    /// path equals or is nested under the base path.
    pub fn is_in_scope(&self, url: &Url) -> bool {
        if url.scheme() != self.api_base.scheme()
            || url.host_str() != self.api_base.host_str()
            || url.port_or_known_default() != self.api_base.port_or_known_default()
        {
            return false;
        }

        let base_path = self.api_base.path().trim_end_matches('/');
        if base_path.is_empty() {
            return true;
        }

        let path = url.path();
        path == base_path || path.strip_prefix(base_path).is_some_and(|rest| rest.starts_with('/'))
    }

    /// Current CSRF token from the configured cookie, if present
    fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.api_base)?;
        let cookies = header.to_str().ok()?;

        cookies.split(';').map(str::trim).find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name == self.csrf_cookie).then(|| value.to_string())
        })
    }
}
