//! rosey-sync
//!
//! Keeps Rosey translation data files and the inline translations of
//! visually edited content pages in agreement.

pub mod config;
pub mod content;
pub mod discovery;
pub mod error;
pub mod locale_store;
pub mod markup;
pub mod registry;
pub mod runner;
pub mod storage;
pub mod sync;
pub mod types;
pub mod walker;

mod test_utils;

pub use runner::{
    RunError,
    RunOptions,
    run,
};
pub use sync::{
    PageSynchronizer,
    RunReport,
};
