use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::Result;

#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl HttpClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();

        Self {
            agent: config.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a JSON endpoint with the API key attached.
    ///
    /// A 404 or an undecodable body is `Ok(None)`; transport faults are errors.
    pub fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut request = self.agent.get(&url).query("k", &self.api_key);
        for (key, value) in query {
            request = request.query(*key, value);
        }

        let mut response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(404)) => {
                debug!("{} returned 404", endpoint);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match response.body_mut().read_json::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(ureq::Error::Json(e)) => {
                warn!("Malformed response from {}: {}", endpoint, e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// GET raw bytes from a path under the base URL. Empty bodies are `Ok(None)`.
    pub fn get_bytes(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let url = format!("{}/{}", self.base_url, path);

        let mut response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(404)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let bytes = response.body_mut().read_to_vec()?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(bytes))
    }
}
