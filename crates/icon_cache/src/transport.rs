//! How remote files are fetched.
//!
//! [`CacheDownloader`](crate::CacheDownloader) never talks to the network directly;
//! it goes through a [`Transport`]. Production code uses [`HttpTransport`]; with the
//! `test-utils` feature, `MemoryTransport` serves files from memory.

use crate::error::Result;
use std::time::Duration;

/// Fetches the full body of a URL.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Create a transport with the given user agent.
    ///
    /// `timeout` bounds each request end to end. A timed out request surfaces as
    /// [`Error::Http`](crate::Error::Http), which callers treat like any other fetch failure.
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        (**self).get(url)
    }
}
