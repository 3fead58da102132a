//! Global config handle.
//!
//! Uses `arc-swap` for lock-free reads from request handler threads.

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;

use crate::config::ToolConfig;

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<ToolConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(ToolConfig::default()));

#[inline]
pub fn cfg() -> Arc<ToolConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: ToolConfig) -> Arc<ToolConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
