//! CLI commands.

mod enroll;
mod info;
mod revoke;
mod util;
mod verify;

pub use enroll::EnrollCommand;
pub use info::InfoCommand;
pub use revoke::RevokeCommand;
pub use verify::VerifyCommand;

pub(crate) use util::*;
