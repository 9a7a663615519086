//! Retry decisions for forwarded link requests.
//!
//! Linking is a POST and not idempotent: once the owner has seen the
//! request, replaying it could turn a success into a 409. Only failures
//! where no connection was established are retried.

use crate::config::LinkConfig;

/// Whether a failed forward may be attempted again.
pub fn is_retryable(error: &reqwest::Error) -> bool {
    error.is_connect() && !error.is_timeout()
}

/// Total attempts allowed for one forwarded link (first try plus retries).
pub fn max_attempts(config: &LinkConfig) -> u32 {
    1 + config.forward_retries.min(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_most_one_retry() {
        let mut config = LinkConfig::default();
        assert_eq!(max_attempts(&config), 2);

        config.forward_retries = 0;
        assert_eq!(max_attempts(&config), 1);

        config.forward_retries = 5;
        assert_eq!(max_attempts(&config), 2);
    }

    #[tokio::test]
    async fn refused_connection_is_retryable() {
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}/internal/link"))
            .send()
            .await
            .unwrap_err();
        assert!(is_retryable(&err));
    }
}
