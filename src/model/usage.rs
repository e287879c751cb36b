use std::fmt;

use crate::error::ValidationError;

/// Label selecting which derived key or secret the token uses.
///
/// The token treats the label as opaque. It travels inside a comma separated
/// command line, so it may not contain a field separator or a line break.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct UsageLabel(String);

impl UsageLabel {
    pub const MAX_LENGTH: usize = 128;

    /// Label of the single SSH identity the agent exposes
    pub const SSH_IDENTITY: &'static str = "ssh-0";

    const SITE_PREFIX: &'static str = "webpwd-";

    pub fn new(label: impl Into<String>) -> Result<Self, ValidationError> {
        let label = label.into();
        if label.is_empty() {
            return Err(ValidationError::LabelEmpty);
        }
        if label.len() > Self::MAX_LENGTH {
            return Err(ValidationError::LabelTooLong {
                len: label.len(),
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(ch) = label.chars().find(|c| matches!(c, ',' | '\n' | '\r')) {
            return Err(ValidationError::LabelForbiddenChar { ch });
        }
        Ok(Self(label))
    }

    pub fn ssh_identity() -> Self {
        Self(Self::SSH_IDENTITY.to_string())
    }

    /// Build `webpwd-<index>-<domain>`, replacing field separators with `-`.
    pub fn site_password(index: &str, domain: &str) -> Result<Self, ValidationError> {
        let label = format!("{}{}-{}", Self::SITE_PREFIX, index, domain).replace(',', "-");
        Self::new(label)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UsageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UsageLabel({})", self.0)
    }
}

impl fmt::Display for UsageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
