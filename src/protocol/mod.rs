//! Request/response correlation with the token
//!
//! [`DeviceProtocol`] runs one command at a time over a
//! [`Transport`](crate::ports::Transport). [`DeviceSession`] owns the
//! protocol behind a fair mutex and is the only way concurrent callers
//! reach the device.

mod line_buffer;
mod machine;
mod session;

pub use line_buffer::LineBuffer;
pub use machine::{CallState, DeviceProtocol};
pub use session::DeviceSession;
