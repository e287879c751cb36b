//! Simulated token speaking the line protocol
//!
//! Parses the commands it receives, keeps its own device secret and user
//! seed, and signs with real ed25519 keys so callers can verify results.
//! It also records protocol misuse: a command written while the previous
//! answer is still unread counts as an interleaving violation.

#[cfg(test)]
use crate::error::TransportError;
#[cfg(test)]
use crate::model::Verb;
#[cfg(test)]
use crate::ports::Transport;
#[cfg(test)]
use ed25519_dalek::{Signer, SigningKey};
#[cfg(test)]
use sha2::{Digest, Sha256};
#[cfg(test)]
use std::collections::VecDeque;
#[cfg(test)]
use std::sync::{Arc, Mutex};

#[cfg(test)]
#[derive(Debug)]
struct FakeTokenState {
    device_secret: [u8; 32],
    user_seed: Option<[u8; 32]>,
    input: Vec<u8>,
    output: VecDeque<u8>,
    chunk_size: usize,
    noise_lines: usize,
    deny_confirmation: bool,
    commands: Vec<String>,
    violations: usize,
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub struct FakeToken {
    state: Arc<Mutex<FakeTokenState>>,
}

#[cfg(test)]
impl FakeToken {
    /// Token straight out of formatting: no user seed yet.
    pub fn unprovisioned() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeTokenState {
                device_secret: [0x44; 32],
                user_seed: None,
                input: Vec::new(),
                output: VecDeque::new(),
                chunk_size: 7,
                noise_lines: 2,
                deny_confirmation: false,
                commands: Vec::new(),
                violations: 0,
            })),
        }
    }

    pub fn provisioned() -> Self {
        let token = Self::unprovisioned();
        token.lock().user_seed = Some([0x11; 32]);
        token
    }

    /// Number of diagnostic lines printed before every answer.
    pub fn with_noise_lines(self, noise_lines: usize) -> Self {
        self.lock().noise_lines = noise_lines;
        self
    }

    /// Largest number of bytes a single read hands out.
    pub fn with_chunk_size(self, chunk_size: usize) -> Self {
        self.lock().chunk_size = chunk_size.max(1);
        self
    }

    /// Simulate the user not pressing the button.
    pub fn denying_confirmation(self) -> Self {
        self.lock().deny_confirmation = true;
        self
    }

    /// Key the token derives for `usage`.
    pub fn signing_key(&self, usage: &str) -> SigningKey {
        let state = self.lock();
        Self::derive_key(&state, usage)
    }

    pub fn user_seed(&self) -> Option<[u8; 32]> {
        self.lock().user_seed
    }

    pub fn device_secret(&self) -> [u8; 32] {
        self.lock().device_secret
    }

    /// Command lines received so far, in arrival order.
    pub fn commands(&self) -> Vec<String> {
        self.lock().commands.clone()
    }

    pub fn violations(&self) -> usize {
        self.lock().violations
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeTokenState> {
        self.state.lock().expect("fake token lock poisoned")
    }

    fn derive_key(state: &FakeTokenState, usage: &str) -> SigningKey {
        let mut hasher = Sha256::new();
        hasher.update(state.device_secret);
        hasher.update(state.user_seed.unwrap_or_default());
        hasher.update(usage.as_bytes());
        let secret: [u8; 32] = hasher.finalize().into();
        SigningKey::from_bytes(&secret)
    }

    fn execute(state: &mut FakeTokenState, line: &str) -> Option<String> {
        if line.is_empty() {
            return None;
        }
        state.commands.push(line.to_string());

        let fields: Vec<&str> = line.split(',').collect();
        let needs_confirmation = fields[0]
            .strip_prefix('+')
            .and_then(Verb::from_wire)
            .is_some_and(|verb| verb.policy().requires_confirmation);
        if needs_confirmation && state.deny_confirmation {
            return Some("+ERR,user cancelled".to_string());
        }

        let answer = match (fields[0], &fields[1..]) {
            ("+PUBKEY", [identity]) => match (state.user_seed, identity.strip_prefix("ed25519-")) {
                (None, _) => "+ERR,user seed not set".to_string(),
                (Some(_), Some(usage)) => {
                    let key = Self::derive_key(state, usage);
                    format!("+OK,{}", hex::encode(key.verifying_key().as_bytes()))
                }
                (Some(_), None) => "+ERR,unknown key type".to_string(),
            },
            ("+SIGN", [identity, data]) => {
                match (state.user_seed, identity.strip_prefix("ed25519-"), hex::decode(data)) {
                    (Some(_), Some(usage), Ok(data)) => {
                        let key = Self::derive_key(state, usage);
                        format!("+OK,{}", hex::encode(key.sign(&data).to_bytes()))
                    }
                    (None, _, _) => "+ERR,user seed not set".to_string(),
                    _ => "+ERR,bad request".to_string(),
                }
            }
            ("+FORMAT", [entropy]) => match hex::decode(entropy) {
                Ok(bytes) if bytes.len() == 32 => {
                    state.device_secret.copy_from_slice(&bytes);
                    state.user_seed = None;
                    "+OK".to_string()
                }
                _ => "+ERR,bad entropy".to_string(),
            },
            ("+USERSEED", [hash]) => match hex::decode(hash) {
                Ok(bytes) if bytes.len() == 32 => {
                    let mut seed = [0u8; 32];
                    seed.copy_from_slice(&bytes);
                    state.user_seed = Some(seed);
                    "+OK".to_string()
                }
                _ => "+ERR,bad seed".to_string(),
            },
            ("+WEBPWD", [label]) => match state.user_seed {
                Some(_) => {
                    let mut hasher = Sha256::new();
                    hasher.update(Self::derive_key(state, "webpwd").as_bytes());
                    hasher.update(label.as_bytes());
                    format!("+OK,{}", hex::encode(hasher.finalize()))
                }
                None => "+ERR,user seed not set".to_string(),
            },
            _ => "+ERR,unknown command".to_string(),
        };
        Some(answer)
    }
}

#[cfg(test)]
impl Transport for FakeToken {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut state = self.lock();
        if !state.output.is_empty() {
            state.violations += 1;
        }
        state.input.extend_from_slice(bytes);

        while let Some(pos) = state.input.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = state.input.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..pos]).into_owned();
            if let Some(answer) = Self::execute(&mut state, &line) {
                let verb = line.split(',').next().unwrap_or_default().to_string();
                for i in 0..state.noise_lines {
                    let noise = format!("dev: {verb} step {i}\r\n");
                    state.output.extend(noise.as_bytes());
                }
                state.output.extend(answer.as_bytes());
                state.output.extend(b"\r\n");
            }
        }
        Ok(())
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut state = self.lock();
        let n = state.output.len().min(state.chunk_size).min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(state.output.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract_tests_for;
    use crate::ports::contract_tests::transport_contract;

    fn read_all(token: &mut FakeToken) -> String {
        let mut out = Vec::new();
        let mut buf = [0u8; 64];
        loop {
            let n = token.read_chunk(&mut buf).unwrap();
            if n == 0 {
                return String::from_utf8(out).unwrap();
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    #[test]
    fn test_unprovisioned_token_reports_missing_seed() {
        let mut token = FakeToken::unprovisioned().with_noise_lines(0);
        token.write_all(b"+PUBKEY,ed25519-ssh-0\n").unwrap();
        assert_eq!(read_all(&mut token), "+ERR,user seed not set\r\n");
    }

    #[test]
    fn test_reset_line_produces_no_output() {
        let mut token = FakeToken::provisioned();
        token.write_all(b"\n").unwrap();
        assert_eq!(read_all(&mut token), "");
        assert!(token.commands().is_empty());
    }

    #[test]
    fn test_write_before_reading_answer_is_a_violation() {
        let mut token = FakeToken::provisioned();
        token.write_all(b"+PUBKEY,ed25519-ssh-0\n").unwrap();
        token.write_all(b"+PUBKEY,ed25519-ssh-0\n").unwrap();
        assert_eq!(token.violations(), 1);
    }

    contract_tests_for!(
        fake_token_contract,
        make = FakeToken::provisioned,
        tests = {
            test_idle_read_returns_zero => transport_contract::test_idle_read_returns_zero,
            test_command_produces_sentinel_line => transport_contract::test_command_produces_sentinel_line,
            test_drain_discards_pending_output => transport_contract::test_drain_discards_pending_output,
        }
    );
}
