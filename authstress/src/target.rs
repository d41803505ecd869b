use crate::error::TargetError;
use authstress_core::DEFAULT_REQUEST_TIMEOUT;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// The authentication service under test.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct Target {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl Target {
    pub fn new(base_url: &str) -> Result<Self, TargetError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Every request issued against this target fails with a transport error once `timeout`
    /// elapses without a response.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, TargetError> {
        let base_url = Url::parse(base_url)?;
        match base_url.scheme() {
            "http" | "https" => {}
            scheme => return Err(TargetError::Scheme(scheme.to_string())),
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// The service root: the base URL with its path, query and fragment removed.
    pub fn root(&self) -> String {
        let mut root = self.base_url.clone();
        root.set_path("");
        root.set_query(None);
        root.set_fragment(None);
        root.as_str().trim_end_matches('/').to_string()
    }

    /// Joins `path` onto the base URL, keeping the base URL's own path.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path() {
        let target = Target::new("http://localhost:3001/auth").unwrap();
        assert_eq!(
            target.endpoint("/register"),
            "http://localhost:3001/auth/register"
        );
        assert_eq!(target.endpoint("login"), "http://localhost:3001/auth/login");
        assert_eq!(target.endpoint(""), "http://localhost:3001/auth");

        let target = Target::new("http://localhost:3001/auth/").unwrap();
        assert_eq!(
            target.endpoint("/login"),
            "http://localhost:3001/auth/login"
        );
    }

    #[test]
    fn root_strips_path() {
        let target = Target::new("http://localhost:3001/auth").unwrap();
        assert_eq!(target.root(), "http://localhost:3001");
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(matches!(
            Target::new("not a url"),
            Err(TargetError::Url(_))
        ));
        assert!(matches!(
            Target::new("ftp://localhost/auth"),
            Err(TargetError::Scheme(_))
        ));
    }

    #[test]
    fn default_timeout() {
        let target = Target::new("http://localhost:3001/auth").unwrap();
        assert_eq!(target.timeout(), DEFAULT_REQUEST_TIMEOUT);
    }
}
