//! Outbound device commands
//!
//! A command serializes to one ASCII line: `+VERB[,identity][,payload]`.
//! The leading `+` is part of the firmware's command syntax.

use std::fmt;

use super::key_material::{Entropy, PasswordHash};
use super::timing::CallPolicy;
use super::usage::UsageLabel;

/// Key family prefix the firmware expects in front of key usages.
const ED25519_PREFIX: &str = "ed25519-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    PubKey,
    Sign,
    Format,
    UserSeed,
    WebPwd,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::PubKey => "PUBKEY",
            Verb::Sign => "SIGN",
            Verb::Format => "FORMAT",
            Verb::UserSeed => "USERSEED",
            Verb::WebPwd => "WEBPWD",
        }
    }

    pub fn from_wire(verb: &str) -> Option<Self> {
        match verb {
            "PUBKEY" => Some(Verb::PubKey),
            "SIGN" => Some(Verb::Sign),
            "FORMAT" => Some(Verb::Format),
            "USERSEED" => Some(Verb::UserSeed),
            "WEBPWD" => Some(Verb::WebPwd),
            _ => None,
        }
    }

    /// Base timeout and whether the user has to press the device button.
    pub fn policy(self) -> CallPolicy {
        match self {
            Verb::PubKey => CallPolicy::plain(10),
            Verb::Sign => CallPolicy::confirmed(80),
            Verb::Format | Verb::UserSeed | Verb::WebPwd => CallPolicy::confirmed(120),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Command {
    verb: Verb,
    identity: Option<String>,
    payload: Option<String>,
}

impl Command {
    pub fn public_key(usage: &UsageLabel) -> Self {
        Self {
            verb: Verb::PubKey,
            identity: Some(format!("{ED25519_PREFIX}{usage}")),
            payload: None,
        }
    }

    pub fn sign(usage: &UsageLabel, data: &[u8]) -> Self {
        Self {
            verb: Verb::Sign,
            identity: Some(format!("{ED25519_PREFIX}{usage}")),
            payload: Some(hex::encode(data)),
        }
    }

    pub fn format(entropy: &Entropy) -> Self {
        Self {
            verb: Verb::Format,
            identity: None,
            payload: Some(hex::encode(entropy.as_bytes())),
        }
    }

    pub fn user_seed(hash: &PasswordHash) -> Self {
        Self {
            verb: Verb::UserSeed,
            identity: None,
            payload: Some(hex::encode(hash.as_bytes())),
        }
    }

    pub fn site_password(label: &UsageLabel) -> Self {
        Self {
            verb: Verb::WebPwd,
            identity: Some(label.to_string()),
            payload: None,
        }
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn policy(&self) -> CallPolicy {
        self.verb.policy()
    }

    /// Wire line including the terminating newline.
    pub fn to_line(&self) -> String {
        let mut line = format!("+{}", self.verb);
        for field in [&self.identity, &self.payload].into_iter().flatten() {
            line.push(',');
            line.push_str(field);
        }
        line.push('\n');
        line
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("verb", &self.verb)
            .field("identity", &self.identity)
            .field("payload_hex_len", &self.payload.as_ref().map(String::len))
            .finish()
    }
}
