//! High-level client API.

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::ClientError;
use exmdb_protocol::request::ConnectRequest;
use exmdb_protocol::Request;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::future::Future;
use std::pin::Pin;

/// Length of generated session IDs.
pub const SESSION_ID_LENGTH: usize = 42;

/// Generates a random session ID from `[A-Za-z0-9]`.
pub fn generate_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LENGTH)
        .map(char::from)
        .collect()
}

enum SessionState {
    Disconnected,
    Connected {
        connection: Connection,
        session_id: String,
        prefix: String,
        private: bool,
    },
}

/// Client session for an exmdb server.
///
/// A session is opened by [`Client::connect`], which performs the connect
/// handshake, and ends with [`Client::disconnect`]. Reconnecting always
/// performs a fresh handshake with a new session ID.
pub struct Client {
    config: ClientConfig,
    state: SessionState,
}

impl Client {
    /// Creates a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            state: SessionState::Disconnected,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Opens a connection and performs the connect handshake.
    ///
    /// `prefix` and `private` override the configured defaults. Both must be
    /// resolved, else [`ClientError::Configuration`] is returned before any
    /// connection attempt. An existing session is closed first.
    pub async fn connect(
        &mut self,
        prefix: Option<&str>,
        private: Option<bool>,
    ) -> Result<(), ClientError> {
        let prefix = prefix
            .map(str::to_string)
            .or_else(|| self.config.prefix.clone())
            .ok_or_else(|| ClientError::Configuration("prefix not set".into()))?;
        let private = private
            .or(self.config.private)
            .ok_or_else(|| ClientError::Configuration("private not set".into()))?;

        self.disconnect().await;

        let mut connection = Connection::open(&self.config).await?;
        let session_id = generate_session_id();
        tracing::debug!(
            "Starting session on {} (prefix={}, private={})",
            connection.addr(),
            prefix,
            private
        );
        connection
            .send(&ConnectRequest::new(&prefix, &session_id, private))
            .await?;
        tracing::debug!("Session established");

        self.state = SessionState::Connected {
            connection,
            session_id,
            prefix,
            private,
        };
        Ok(())
    }

    /// Sends a request over the session and returns its decoded response.
    pub async fn send<R: Request>(&mut self, request: &R) -> Result<R::Response, ClientError> {
        match &mut self.state {
            SessionState::Connected { connection, .. } => connection.send(request).await,
            SessionState::Disconnected => Err(ClientError::NotConnected),
        }
    }

    /// Closes the session if one is open.
    pub async fn disconnect(&mut self) {
        let state = std::mem::replace(&mut self.state, SessionState::Disconnected);
        if let SessionState::Connected { mut connection, .. } = state {
            connection.close().await;
        }
    }

    /// Returns whether a session is open.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected { .. })
    }

    /// Returns the session ID; only available while connected.
    pub fn session_id(&self) -> Option<&str> {
        match &self.state {
            SessionState::Connected { session_id, .. } => Some(session_id),
            SessionState::Disconnected => None,
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        match &self.state {
            SessionState::Connected { prefix, .. } => Some(prefix),
            SessionState::Disconnected => None,
        }
    }

    pub fn private(&self) -> Option<bool> {
        match &self.state {
            SessionState::Connected { private, .. } => Some(*private),
            SessionState::Disconnected => None,
        }
    }

    /// Returns whether the underlying connection has become unusable.
    pub fn is_poisoned(&self) -> bool {
        match &self.state {
            SessionState::Connected { connection, .. } => connection.is_poisoned(),
            SessionState::Disconnected => false,
        }
    }
}

/// Runs `f` inside a session opened with the configured defaults.
///
/// The session is closed when `f` completes, whether it succeeded or not. If
/// the returned future is dropped, the socket is released with the client.
///
/// ```no_run
/// # async fn example() -> Result<(), exmdb_client::ClientError> {
/// use exmdb_client::{with_session, ClientConfig};
/// use exmdb_protocol::request::AllocateCnRequest;
///
/// let config = ClientConfig::default().with_prefix("/d-data/").with_private(false);
/// let cn = with_session(config, |client| {
///     Box::pin(async move { client.send(&AllocateCnRequest::new("/d-data/")).await })
/// })
/// .await?;
/// # let _ = cn;
/// # Ok(())
/// # }
/// ```
pub async fn with_session<T, F>(config: ClientConfig, f: F) -> Result<T, ClientError>
where
    F: for<'a> FnOnce(
        &'a mut Client,
    ) -> Pin<Box<dyn Future<Output = Result<T, ClientError>> + Send + 'a>>,
{
    let mut client = Client::new(config);
    client.connect(None, None).await?;
    let result = f(&mut client).await;
    client.disconnect().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{spawn_stub, success};
    use exmdb_protocol::request::AllocateCnRequest;
    use proptest::prelude::*;

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        assert_eq!(id.len(), SESSION_ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_new_client_is_disconnected() {
        let client = Client::new(ClientConfig::default());
        assert!(!client.is_connected());
        assert_eq!(client.session_id(), None);
        assert_eq!(client.prefix(), None);
        assert!(!client.is_poisoned());
    }

    #[tokio::test]
    async fn test_connect_requires_prefix_and_mode() {
        let mut client = Client::new(ClientConfig::new("127.0.0.1", 1));
        let err = client.connect(None, Some(false)).await.unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));

        let err = client.connect(Some("/d-data/"), None).await.unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_send_without_session() {
        let mut client = Client::new(ClientConfig::default());
        let err = client
            .send(&AllocateCnRequest::new("/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));
        // Idempotent
        client.disconnect().await;
        client.disconnect().await;
    }

    #[tokio::test]
    async fn test_client_session_retains_id() {
        let (config, stub) = spawn_stub(vec![success(&[])]).await;
        let mut client = Client::new(config.with_prefix("/d-data/").with_private(false));

        client.connect(None, None).await.unwrap();
        assert!(client.is_connected());
        assert_eq!(client.prefix(), Some("/d-data/"));
        assert_eq!(client.private(), Some(false));

        let session_id = client.session_id().unwrap().to_string();
        assert_eq!(session_id.len(), 42);
        assert!(session_id.chars().all(|c| c.is_ascii_alphanumeric()));

        client.disconnect().await;
        assert_eq!(client.session_id(), None);

        let frames = stub.await.unwrap();
        let frame = &frames[0];
        assert_eq!(frame[0], 0x00);
        let session_start = 1 + b"/d-data/\0".len();
        assert_eq!(
            &frame[session_start..session_start + 42],
            session_id.as_bytes()
        );
    }

    #[tokio::test]
    async fn test_connect_overrides_defaults() {
        let (config, stub) = spawn_stub(vec![success(&[])]).await;
        let mut client = Client::new(config.with_prefix("/d-data/").with_private(false));

        client.connect(Some("/u-data/"), Some(true)).await.unwrap();
        assert_eq!(client.prefix(), Some("/u-data/"));
        assert_eq!(client.private(), Some(true));
        client.disconnect().await;

        let frames = stub.await.unwrap();
        assert!(frames[0].starts_with(b"\x00/u-data/\0"));
        assert_eq!(frames[0].last(), Some(&1));
    }

    #[tokio::test]
    async fn test_connect_rejected() {
        let (config, _stub) = spawn_stub(vec![vec![0x04, 0, 0, 0, 0]]).await;
        let mut client = Client::new(config);

        let err = client.connect(Some("/d-data/"), Some(false)).await.unwrap_err();
        match err {
            ClientError::Mapi { code, name } => {
                assert_eq!(code, 4);
                assert_eq!(name, "MISCONFIG_PREFIX");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!client.is_connected());
        assert_eq!(client.session_id(), None);
    }

    #[tokio::test]
    async fn test_with_session_disconnects() {
        let (config, stub) =
            spawn_stub(vec![success(&[]), success(&0x10u64.to_le_bytes())]).await;
        let config = config.with_prefix("/d-data/").with_private(false);

        let cn = with_session(config, |client| {
            Box::pin(async move {
                assert!(client.is_connected());
                client.send(&AllocateCnRequest::new("/d-data/")).await
            })
        })
        .await
        .unwrap();
        assert_eq!(cn, 0x10);

        let frames = stub.await.unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1], b"\x5c/d-data/\0");
    }

    #[tokio::test]
    async fn test_with_session_propagates_errors() {
        let (config, _stub) = spawn_stub(vec![success(&[]), vec![0x01]]).await;
        let config = config.with_prefix("/d-data/").with_private(false);

        let err = with_session(config, |client| {
            Box::pin(async move { client.send(&AllocateCnRequest::new("/d-data/")).await })
        })
        .await
        .unwrap_err();
        assert_eq!(err.response_code(), Some(0x01));
    }

    #[tokio::test]
    async fn test_with_session_requires_configuration() {
        let config = ClientConfig::new("127.0.0.1", 1);
        let err = with_session(config, |client| {
            Box::pin(async move { client.send(&AllocateCnRequest::new("/x")).await })
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    proptest! {
        #[test]
        fn prop_session_ids_are_alphanumeric(_seed in any::<u8>()) {
            let id = generate_session_id();
            prop_assert_eq!(id.len(), 42);
            prop_assert!(id.bytes().all(|b| b.is_ascii_alphanumeric()));
        }
    }
}
