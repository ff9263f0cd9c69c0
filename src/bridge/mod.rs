//! Network bridge exposing the crew to remote callers.
//!
//! A [`Bridge`] owns networking; a [`MessageHandler`] turns one inbound
//! message into one reply. [`resolve_or_exit`] checks the credentials before
//! anything else is built.
//!
//! # Environment Variables
//!
//! - `ANTHROPIC_API_KEY`: key used by the bridge for enrollment
//! - `DOMAIN_NAME`: public domain pointing at this host
//!
//! Both are required. TLS material (`fullchain.pem`, `privkey.pem`) is
//! expected in the working directory.

pub mod handler;
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{StudioError, MISSING_ENV_EXIT_CODE};

pub use handler::StudioHandler;
pub use http::{bridge_router, HttpBridge};

pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const DOMAIN_VAR: &str = "DOMAIN_NAME";

/// Certificate chain the bridge expects in the working directory.
pub const CERT_CHAIN_FILE: &str = "fullchain.pem";
/// Private key the bridge expects in the working directory.
pub const PRIVATE_KEY_FILE: &str = "privkey.pem";

/// Printed to stderr when the bridge environment is incomplete.
pub const MISSING_ENV_DIAGNOSTIC: &str = "ERROR: Missing ANTHROPIC_API_KEY or DOMAIN_NAME. \
Export them and ensure SSL certs (fullchain.pem/privkey.pem) are in CWD.";

/// Answers one inbound message.
///
/// Implementations are shared across concurrent requests.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &str) -> Result<String, StudioError>;
}

/// Credentials handed to the bridge.
#[derive(Clone, PartialEq, Eq)]
pub struct BridgeCredentials {
    pub api_key: String,
    pub domain: String,
}

impl std::fmt::Debug for BridgeCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeCredentials")
            .field("api_key", &"<redacted>")
            .field("domain", &self.domain)
            .finish()
    }
}

impl BridgeCredentials {
    pub fn from_env() -> Result<Self, StudioError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve both variables; empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StudioError> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let api_key = get(API_KEY_VAR);
        let domain = get(DOMAIN_VAR);

        match (api_key, domain) {
            (Some(api_key), Some(domain)) => Ok(Self { api_key, domain }),
            (api_key, domain) => {
                let mut names = Vec::new();
                if api_key.is_none() {
                    names.push(API_KEY_VAR);
                }
                if domain.is_none() {
                    names.push(DOMAIN_VAR);
                }
                Err(StudioError::MissingEnv { names })
            }
        }
    }
}

/// Serves a handler until shutdown.
#[async_trait]
pub trait Bridge: Send + Sync {
    async fn serve(
        &self,
        handler: Arc<dyn MessageHandler>,
        credentials: BridgeCredentials,
    ) -> Result<(), StudioError>;
}

/// Resolve the bridge credentials or report the exit code to terminate with.
///
/// On a missing variable the diagnostic is written to stderr and
/// [`MISSING_ENV_EXIT_CODE`] is returned. Call this before building anything
/// else.
pub fn resolve_or_exit(lookup: impl Fn(&str) -> Option<String>) -> Result<BridgeCredentials, u8> {
    BridgeCredentials::from_lookup(lookup).map_err(|e| {
        tracing::error!(error = %e, "bridge environment incomplete");
        eprintln!("{}", MISSING_ENV_DIAGNOSTIC);
        MISSING_ENV_EXIT_CODE as u8
    })
}

/// Serve `handler` on `bridge` with already resolved credentials.
pub async fn start_bridge(
    bridge: &dyn Bridge,
    handler: Arc<dyn MessageHandler>,
    credentials: BridgeCredentials,
) -> Result<(), StudioError> {
    tracing::info!(domain = %credentials.domain, "starting bridge");
    bridge.serve(handler, credentials).await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    struct EchoHandler;

    #[async_trait]
    impl MessageHandler for EchoHandler {
        async fn handle(&self, message: &str) -> Result<String, StudioError> {
            Ok(message.to_string())
        }
    }

    #[derive(Default)]
    struct RecordingBridge {
        served: Mutex<Vec<BridgeCredentials>>,
    }

    #[async_trait]
    impl Bridge for RecordingBridge {
        async fn serve(
            &self,
            _handler: Arc<dyn MessageHandler>,
            credentials: BridgeCredentials,
        ) -> Result<(), StudioError> {
            self.served.lock().unwrap().push(credentials);
            Ok(())
        }
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_credentials_require_both_vars() {
        let creds = BridgeCredentials::from_lookup(env(&[
            (API_KEY_VAR, "sk-ant"),
            (DOMAIN_VAR, "studio.example.com"),
        ]))
        .unwrap();
        assert_eq!(creds.domain, "studio.example.com");
        assert!(!format!("{:?}", creds).contains("sk-ant"));

        match BridgeCredentials::from_lookup(env(&[(API_KEY_VAR, "sk-ant"), (DOMAIN_VAR, "")])) {
            Err(StudioError::MissingEnv { names }) => assert_eq!(names, vec![DOMAIN_VAR]),
            other => panic!("unexpected {other:?}"),
        }
        match BridgeCredentials::from_lookup(env(&[])) {
            Err(StudioError::MissingEnv { names }) => {
                assert_eq!(names, vec![API_KEY_VAR, DOMAIN_VAR])
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_env_resolves_to_reserved_exit_code() {
        assert_eq!(
            resolve_or_exit(env(&[(API_KEY_VAR, "sk-ant")])).unwrap_err(),
            MISSING_ENV_EXIT_CODE as u8
        );
        assert_eq!(resolve_or_exit(env(&[])).unwrap_err(), 2);

        let creds = resolve_or_exit(env(&[
            (API_KEY_VAR, "sk-ant"),
            (DOMAIN_VAR, "studio.example.com"),
        ]))
        .unwrap();
        assert_eq!(creds.domain, "studio.example.com");
    }

    #[tokio::test]
    async fn test_start_bridge_serves_with_credentials() {
        let bridge = RecordingBridge::default();
        let creds = BridgeCredentials {
            api_key: "sk-ant".to_string(),
            domain: "studio.example.com".to_string(),
        };
        start_bridge(&bridge, Arc::new(EchoHandler), creds).await.unwrap();

        let served = bridge.served.lock().unwrap();
        assert_eq!(served.len(), 1);
        assert_eq!(served[0].api_key, "sk-ant");
    }
}
