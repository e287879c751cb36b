mod command;
mod key_material;
mod response;
mod timing;
mod usage;

pub use command::{Command, Verb};
pub use key_material::{
    Ed25519PublicKey, Ed25519Signature, Entropy, KeyMaterialError, PasswordHash,
};
pub use response::{DeviceLine, SentinelLine, SENTINEL};
pub use timing::{CallPolicy, PollBudget, Timing};
pub use usage::UsageLabel;
