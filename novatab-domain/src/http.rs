//! Outbound HTTP shared by image search, image preload and favicon probing.

use novatab_core::config::NetworkConfig;

use crate::error::NetworkError;

/// Builds a client with the configured timeout and user agent.
pub fn build_client(network: &NetworkConfig) -> Result<reqwest::Client, NetworkError> {
    reqwest::Client::builder()
        .user_agent(network.user_agent.clone())
        .timeout(network.request_timeout())
        .build()
        .map_err(NetworkError::from)
}

/// Maps a non-success status to [`NetworkError::Status`].
pub(crate) fn check_status(response: reqwest::Response) -> Result<reqwest::Response, NetworkError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(NetworkError::Status { status: status.as_u16(), url: response.url().to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_from_default_config() {
        assert!(build_client(&NetworkConfig::default()).is_ok());
    }
}
