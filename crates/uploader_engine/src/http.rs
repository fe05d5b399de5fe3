use std::time::Duration;

use url::Url;

use crate::{RequestError, UploadConfig};

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    /// Whole-exchange deadline for small requests.
    pub request_timeout: Duration,
    /// Longest an upload may go without moving body bytes or answering.
    pub idle_timeout: Duration,
}

impl HttpSettings {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            base_url: config.upload_base_url.clone(),
            connect_timeout: config.connect_timeout,
            request_timeout: config.request_timeout,
            idle_timeout: config.upload_idle_timeout,
        }
    }
}

pub(crate) fn build_client(settings: &HttpSettings) -> Result<reqwest::Client, RequestError> {
    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .build()
        .map_err(|err| RequestError::Network(err.to_string()))
}

/// Client without a total deadline; long uploads are bounded by
/// [`HttpSettings::idle_timeout`] instead.
pub(crate) fn build_streaming_client(
    settings: &HttpSettings,
) -> Result<reqwest::Client, RequestError> {
    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .build()
        .map_err(|err| RequestError::Network(err.to_string()))
}

/// Appends `segments` to the base path and sets `params` as query pairs.
///
/// Segments are percent-encoded, so job ids cannot escape their path slot.
pub(crate) fn endpoint(
    base: &Url,
    segments: &[&str],
    params: &[(&str, &str)],
) -> Result<Url, RequestError> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| RequestError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    if !params.is_empty() {
        let mut query = url.query_pairs_mut();
        for (key, value) in params {
            query.append_pair(key, value);
        }
    }
    Ok(url)
}
