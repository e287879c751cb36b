//! Agent listener
//!
//! Serves [`TokenAgent`] on a Unix socket or, on Windows, on the OpenSSH
//! agent named pipe. `ssh-agent-lib` accepts connections and runs one task
//! per client; an accept failure ends the listener.

use std::fmt;
use std::path::PathBuf;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::error;

use crate::client::DeviceClient;
use crate::error::{ServerError, TokensshResult, TransportError};
use crate::ports::Transport;

use super::bridge::TokenAgent;

/// Where the agent listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Socket file, created with mode 0600
    UnixSocket(PathBuf),
    /// Windows named pipe
    NamedPipe(String),
}

impl Endpoint {
    pub const DEFAULT_UNIX_SOCKET: &'static str = "/tmp/44ssh";
    pub const DEFAULT_NAMED_PIPE: &'static str = r"\\.\pipe\openssh-ssh-agent";

    /// The endpoint OpenSSH clients find by default on this platform.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Endpoint::NamedPipe(Self::DEFAULT_NAMED_PIPE.to_string())
        } else {
            Endpoint::UnixSocket(PathBuf::from(Self::DEFAULT_UNIX_SOCKET))
        }
    }

    /// Shell line that points `ssh` at this endpoint, if one is needed.
    pub fn client_hint(&self) -> Option<String> {
        match self {
            Endpoint::UnixSocket(path) => Some(format!("export SSH_AUTH_SOCK={}", path.display())),
            Endpoint::NamedPipe(_) => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::UnixSocket(path) => write!(f, "unix:{}", path.display()),
            Endpoint::NamedPipe(name) => write!(f, "pipe:{name}"),
        }
    }
}

/// The agent server: listener plus the device fault watch.
pub struct AgentServer<T> {
    agent: TokenAgent<T>,
    fatal: UnboundedReceiver<TransportError>,
    endpoint: Endpoint,
}

impl<T: Transport + 'static> AgentServer<T> {
    pub fn new(client: DeviceClient<T>, endpoint: Endpoint) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            agent: TokenAgent::new(client, tx),
            fatal: rx,
            endpoint,
        }
    }

    /// Serve until the listener fails or the device reports a transport fault.
    pub async fn run(self) -> TokensshResult<()> {
        let Self {
            agent,
            mut fatal,
            endpoint,
        } = self;

        tokio::select! {
            result = serve(&endpoint, agent) => result,
            Some(fault) = fatal.recv() => {
                error!(%fault, %endpoint, "device fault, stopping agent");
                Err(fault.into())
            }
        }
    }
}

async fn serve<T: Transport + 'static>(
    endpoint: &Endpoint,
    agent: TokenAgent<T>,
) -> TokensshResult<()> {
    match endpoint {
        #[cfg(unix)]
        Endpoint::UnixSocket(path) => unix::serve(path, endpoint, agent).await,
        #[cfg(windows)]
        Endpoint::NamedPipe(name) => pipe::serve(name, endpoint, agent).await,
        #[allow(unreachable_patterns)]
        _ => Err(ServerError::UnsupportedEndpoint {
            endpoint: endpoint.to_string(),
        }
        .into()),
    }
}

fn accept_failed(endpoint: &Endpoint, err: ssh_agent_lib::error::AgentError) -> ServerError {
    ServerError::Accept {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    }
}

#[cfg(unix)]
mod unix {
    use std::fs::{self, Permissions};
    use std::io;
    use std::os::unix::fs::PermissionsExt as _;
    use std::path::{Path, PathBuf};

    use ssh_agent_lib::agent::listen;
    use tokio::net::UnixListener;
    use tracing::{debug, info, warn};

    use super::{accept_failed, Endpoint, TokenAgent};
    use crate::error::{ServerError, TokensshResult};
    use crate::ports::Transport;

    /// Removes the socket file when the listener goes away.
    struct SocketFile(PathBuf);

    impl Drop for SocketFile {
        fn drop(&mut self) {
            if let Err(err) = fs::remove_file(&self.0) {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!(socket = %self.0.display(), error = %err, "failed to remove agent socket");
                }
            }
        }
    }

    pub(super) async fn serve<T: Transport + 'static>(
        path: &Path,
        endpoint: &Endpoint,
        agent: TokenAgent<T>,
    ) -> TokensshResult<()> {
        let bind_failed = |source: io::Error| ServerError::Bind {
            endpoint: endpoint.to_string(),
            source,
        };

        match fs::remove_file(path) {
            Ok(()) => debug!(socket = %path.display(), "removed stale agent socket"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(bind_failed(err).into()),
        }

        let listener = UnixListener::bind(path).map_err(bind_failed)?;
        let _socket = SocketFile(path.to_path_buf());
        fs::set_permissions(path, Permissions::from_mode(0o600)).map_err(bind_failed)?;

        info!(socket = %path.display(), "agent listening");
        listen(listener, agent)
            .await
            .map_err(|err| accept_failed(endpoint, err))?;
        Ok(())
    }
}

#[cfg(windows)]
mod pipe {
    use ssh_agent_lib::agent::{listen, NamedPipeListener};
    use tracing::info;

    use super::{accept_failed, Endpoint, TokenAgent};
    use crate::error::{ServerError, TokensshResult};
    use crate::ports::Transport;

    pub(super) async fn serve<T: Transport + 'static>(
        name: &str,
        endpoint: &Endpoint,
        agent: TokenAgent<T>,
    ) -> TokensshResult<()> {
        let listener = NamedPipeListener::bind(name).map_err(|source| ServerError::Bind {
            endpoint: endpoint.to_string(),
            source,
        })?;

        info!(pipe = name, "agent listening");
        listen(listener, agent)
            .await
            .map_err(|err| accept_failed(endpoint, err))?;
        Ok(())
    }
}
