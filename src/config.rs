//! Settings loaded from `.rosey-sync.json` at the workspace root.
/// Config file loader
mod loader;
/// Configuration manager
mod manager;
/// Configuration types and settings
mod types;

pub use manager::ConfigManager;
pub use types::{
    BlocksConfig,
    ConfigError,
    PagesConfig,
    SyncSettings,
    TranslationFilesConfig,
    ValidationError,
};
