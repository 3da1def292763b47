mod base36;
mod suid;

pub use base36::*;
pub use suid::*;
