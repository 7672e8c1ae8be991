// SPDX-License-Identifier: GPL-3.0-only

//! Per-session pipeline state
//!
//! Everything a tick reads and the UI mutates lives in one
//! [`PipelineContext`] owned by the capture session: the kill switch, the
//! processor registry and the loaded/active chains. There is no global state,
//! so two sessions (or two tests) never observe each other.

use crate::chain::{ChainKind, ProcessorChain};
use crate::errors::{VelvetError, VelvetResult};
use crate::processors::ProcessorRegistry;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// One-way kill switch
///
/// Starts enabled. Once tripped it stays tripped for the lifetime of the
/// session; a new session is needed to process frames again. Clones share the
/// same flag so signal and focus handlers on other threads can trip it.
#[derive(Debug, Clone)]
pub struct KillSwitch {
    enabled: Arc<AtomicBool>,
}

impl KillSwitch {
    pub fn new() -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Fail with [`VelvetError::Disabled`] once the switch has been tripped
    pub fn ensure_enabled(&self) -> VelvetResult<()> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(VelvetError::Disabled)
        }
    }

    /// Permanently disable processing for this session
    pub fn trip(&self) {
        if self.enabled.swap(false, Ordering::SeqCst) {
            warn!("Kill switch tripped, processing disabled");
        }
    }
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared by every tick of one capture session
pub struct PipelineContext {
    switch: KillSwitch,
    registry: ProcessorRegistry,
    loaded: ProcessorChain,
    active: ProcessorChain,
}

impl PipelineContext {
    /// Context with the built-in processors registered and empty chains
    pub fn new() -> Self {
        Self::with_registry(ProcessorRegistry::with_builtins())
    }

    pub fn with_registry(registry: ProcessorRegistry) -> Self {
        Self {
            switch: KillSwitch::new(),
            registry,
            loaded: ProcessorChain::new(ChainKind::Loaded),
            active: ProcessorChain::new(ChainKind::Active),
        }
    }

    pub fn kill_switch(&self) -> &KillSwitch {
        &self.switch
    }

    pub fn is_enabled(&self) -> bool {
        self.switch.is_enabled()
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ProcessorRegistry {
        &mut self.registry
    }

    /// Names applied to every pixel, in execution order
    pub fn active_processors(&self) -> &[String] {
        self.active.list()
    }

    pub fn loaded_processors(&self) -> &[String] {
        self.loaded.list()
    }

    pub fn load_processor(&mut self, name: &str) -> VelvetResult<&[String]> {
        self.loaded.add(&self.switch, name)
    }

    pub fn unload_processor(&mut self, name: &str) -> VelvetResult<&[String]> {
        self.loaded.remove(&self.switch, name)
    }

    /// Append `name` to the active chain
    ///
    /// The name does not have to be loaded or even registered; unknown names
    /// are skipped when frames are processed.
    pub fn enable_processor(&mut self, name: &str) -> VelvetResult<&[String]> {
        if !self.registry.contains(name) {
            debug!(name, "Enabling processor that is not registered yet");
        }
        self.active.add(&self.switch, name)
    }

    pub fn disable_processor(&mut self, name: &str) -> VelvetResult<&[String]> {
        self.active.remove(&self.switch, name)
    }

    /// Load then enable, tolerating a name that is already loaded
    pub fn use_processor(&mut self, name: &str) -> VelvetResult<()> {
        match self.load_processor(name) {
            Ok(_) | Err(VelvetError::Duplicate(_)) => {}
            Err(e) => return Err(e),
        }
        self.enable_processor(name)?;
        Ok(())
    }

    /// Enable `name` when inactive, disable it when active
    pub fn toggle_processor(&mut self, name: &str) -> VelvetResult<bool> {
        if self.active.contains(name) {
            self.disable_processor(name)?;
            Ok(false)
        } else {
            self.enable_processor(name)?;
            Ok(true)
        }
    }

    /// Disable and unload every processor, leaving both chains empty
    pub fn reset_chains(&mut self) -> VelvetResult<()> {
        let active: Vec<String> = self.active.list().to_vec();
        for name in &active {
            self.active.remove(&self.switch, name)?;
        }
        let loaded: Vec<String> = self.loaded.list().to_vec();
        for name in &loaded {
            self.loaded.remove(&self.switch, name)?;
        }
        Ok(())
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("enabled", &self.switch.is_enabled())
            .field("loaded", &self.loaded.list())
            .field("active", &self.active.list())
            .field("registered", &self.registry.names())
            .finish()
    }
}
