#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod client;
mod config;
mod dispenser;
mod error;
mod id;
mod pool;
mod scheduler;
pub mod serde;
mod state;
mod store;

pub use crate::client::*;
pub use crate::config::*;
pub use crate::dispenser::*;
pub use crate::error::*;
pub use crate::id::*;
pub use crate::pool::*;
pub use crate::state::DispenserState;
pub use crate::store::*;
