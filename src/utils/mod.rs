//! Utility modules: query log sink and logger setup.
pub mod devlog;
pub mod logger;
