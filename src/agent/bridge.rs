//! SSH agent session backed by the token

use ssh_agent_lib::agent::Session;
use ssh_agent_lib::error::AgentError;
use ssh_agent_lib::proto::{
    AddIdentity, AddIdentityConstrained, Identity, RemoveIdentity, SignRequest,
};
use ssh_key::{Algorithm, Signature};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::client::DeviceClient;
use crate::error::{TokensshError, TokensshResult, TransportError};
use crate::model::UsageLabel;
use crate::ports::Transport;

/// Agent protocol front of the token.
///
/// Cloned by the listener for every incoming connection; clones share the
/// device session. The token exposes exactly one identity, so sign
/// requests always use it whatever key the client asked for.
pub struct TokenAgent<T> {
    client: DeviceClient<T>,
    fatal: UnboundedSender<TransportError>,
}

impl<T> Clone for TokenAgent<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            fatal: self.fatal.clone(),
        }
    }
}

impl<T: Transport + 'static> TokenAgent<T> {
    /// Transport faults are reported on `fatal` as well as to the caller.
    pub fn new(client: DeviceClient<T>, fatal: UnboundedSender<TransportError>) -> Self {
        Self { client, fatal }
    }

    /// Run a device operation on the blocking pool.
    async fn with_device<R, F>(&self, operation: &'static str, f: F) -> Result<R, AgentError>
    where
        F: FnOnce(&DeviceClient<T>) -> TokensshResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let client = self.client.clone();
        let result = tokio::task::spawn_blocking(move || f(&client))
            .await
            .map_err(AgentError::other)?;

        result.map_err(|err| {
            if let TokensshError::Transport(fault) = &err {
                // The server may already be gone during shutdown.
                let _ = self.fatal.send(fault.clone());
            }
            warn!(operation, error = %err, "agent request failed");
            AgentError::other(err)
        })
    }
}

fn unsupported(operation: &'static str) -> AgentError {
    debug!(operation, "rejecting unsupported agent request");
    AgentError::other(TokensshError::Unsupported { operation })
}

#[ssh_agent_lib::async_trait]
impl<T: Transport + 'static> Session for TokenAgent<T> {
    async fn request_identities(&mut self) -> Result<Vec<Identity>, AgentError> {
        debug!("request_identities");
        let public_key = self
            .with_device("request_identities", |client| {
                client.get_public_key(&UsageLabel::ssh_identity())
            })
            .await?;

        Ok(vec![Identity {
            pubkey: public_key.to_key_data(),
            comment: UsageLabel::SSH_IDENTITY.to_string(),
        }])
    }

    async fn sign(&mut self, request: SignRequest) -> Result<Signature, AgentError> {
        debug!(
            data_len = request.data.len(),
            flags = request.flags,
            "sign"
        );
        let data = request.data;
        let signature = self
            .with_device("sign", move |client| {
                client.sign(&UsageLabel::ssh_identity(), &data)
            })
            .await?;

        Signature::new(Algorithm::Ed25519, signature.as_bytes().to_vec()).map_err(AgentError::other)
    }

    async fn add_identity(&mut self, _identity: AddIdentity) -> Result<(), AgentError> {
        Err(unsupported("add_identity"))
    }

    async fn add_identity_constrained(
        &mut self,
        _identity: AddIdentityConstrained,
    ) -> Result<(), AgentError> {
        Err(unsupported("add_identity_constrained"))
    }

    async fn remove_identity(&mut self, _identity: RemoveIdentity) -> Result<(), AgentError> {
        Err(unsupported("remove_identity"))
    }

    async fn remove_all_identities(&mut self) -> Result<(), AgentError> {
        Err(unsupported("remove_all_identities"))
    }

    async fn lock(&mut self, _key: String) -> Result<(), AgentError> {
        Err(unsupported("lock"))
    }

    async fn unlock(&mut self, _key: String) -> Result<(), AgentError> {
        Err(unsupported("unlock"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fake_token::FakeToken;
    use crate::adapters::mock_device::MockDevice;
    use crate::adapters::RecordingPrompt;
    use crate::model::Timing;
    use ed25519_dalek::Verifier;
    use ssh_key::public::KeyData;
    use std::sync::Arc;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn agent<T: Transport + 'static>(
        transport: T,
    ) -> (TokenAgent<T>, UnboundedReceiver<TransportError>) {
        let client = DeviceClient::open(
            transport,
            Timing::default(),
            Arc::new(RecordingPrompt::default()),
        )
        .unwrap();
        let (tx, rx) = unbounded_channel();
        (TokenAgent::new(client, tx), rx)
    }

    #[tokio::test]
    async fn test_single_identity_listed() {
        let token = FakeToken::provisioned();
        let (mut agent, _rx) = agent(token.clone());

        let identities = agent.request_identities().await.unwrap();

        assert_eq!(identities.len(), 1);
        assert_eq!(identities[0].comment, "ssh-0");
        let expected = token.signing_key("ssh-0").verifying_key();
        match &identities[0].pubkey {
            KeyData::Ed25519(key) => assert_eq!(key.0, expected.to_bytes()),
            other => panic!("unexpected key type: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sign_ignores_requested_identity() {
        let token = FakeToken::provisioned();
        let (mut agent, _rx) = agent(token.clone());
        let other_key = KeyData::Ed25519(ssh_key::public::Ed25519PublicKey([9; 32]));

        let signature = agent
            .sign(SignRequest {
                pubkey: other_key,
                data: b"userauth".to_vec(),
                flags: 0,
            })
            .await
            .unwrap();

        assert_eq!(signature.algorithm(), Algorithm::Ed25519);
        let dalek = ed25519_dalek::Signature::from_slice(signature.as_bytes()).unwrap();
        token
            .signing_key("ssh-0")
            .verifying_key()
            .verify(b"userauth", &dalek)
            .unwrap();
        assert!(token.commands()[0].starts_with("+SIGN,ed25519-ssh-0,"));
    }

    #[tokio::test]
    async fn test_mutating_requests_rejected_without_device_io() {
        let device = MockDevice::new();
        let (mut agent, _rx) = agent(device.clone());

        assert!(agent.remove_all_identities().await.is_err());
        assert!(agent.lock("secret".to_string()).await.is_err());
        assert!(agent.unlock("secret".to_string()).await.is_err());
        assert_eq!(device.writes(), 1);
    }

    #[tokio::test]
    async fn test_protocol_error_is_not_reported_as_fatal() {
        let device = MockDevice::new().respond_with(&["+ERR,busy\n"]);
        let (mut agent, mut rx) = agent(device);

        assert!(agent.request_identities().await.is_err());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_transport_fault_reported_on_fatal_channel() {
        let device = MockDevice::new();
        let (mut agent, mut rx) = agent(device.clone());
        device.fail_reads();

        assert!(agent.request_identities().await.is_err());
        let fault = rx.try_recv().unwrap();
        assert!(matches!(fault, TransportError::Io { operation: "read", .. }));
    }
}
