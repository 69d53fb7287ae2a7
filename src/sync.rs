//! Per-page synchronization between locale data files and content blocks.
/// Data page → content page path mapping
mod resolver;
/// Page state machine
mod synchronizer;
/// Outcomes, states and errors
mod types;

pub use resolver::PageResolver;
pub use synchronizer::{
    PageSynchronizer,
    SyncContext,
};
pub use types::{
    PageError,
    PageOutcome,
    PageState,
    PageSummary,
    RunReport,
    SkipReason,
};
