mod access;
pub mod legacy;
mod target;

pub use access::{AccessLevel, CommitRights};
pub use target::*;
