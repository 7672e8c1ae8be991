// SPDX-License-Identifier: GPL-3.0-only

//! Processor registry, by-name lookup of per-pixel transforms
//!
//! A processor is a pure function from one [`Pixel`] to another. Looking up a
//! name that is not registered is not an error: [`ProcessorRegistry::apply`]
//! hands the pixel back untouched, so a chain may reference processors that
//! are not available yet without stopping the stream.

pub mod grayscale;
pub mod modulus;

use crate::constants::processors::{GRAYSCALE, MODULUS};
use crate::context::KillSwitch;
use crate::errors::VelvetResult;
use crate::frame::Pixel;
use std::collections::HashMap;
use tracing::{info, trace};

/// A registered per-pixel transform
///
/// Transforms receive the session kill switch and must refuse to run once it
/// has been tripped.
pub type TransformFn = Box<dyn Fn(&KillSwitch, Pixel) -> VelvetResult<Pixel> + Send + Sync>;

/// Name to transform mapping, populated at startup
pub struct ProcessorRegistry {
    processors: HashMap<String, TransformFn>,
}

impl ProcessorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }

    /// Create a registry with the built-in processors registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(GRAYSCALE, grayscale::compute);
        registry.register(MODULUS, modulus::compute);

        info!(
            count = registry.processors.len(),
            "Registered built-in processors"
        );
        registry
    }

    /// Register a transform. Overwrites any previous transform with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, transform: F)
    where
        F: Fn(&KillSwitch, Pixel) -> VelvetResult<Pixel> + Send + Sync + 'static,
    {
        let name = name.into();
        if self
            .processors
            .insert(name.clone(), Box::new(transform))
            .is_some()
        {
            info!(name = %name, "Replaced registered processor");
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&TransformFn> {
        self.processors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.processors.contains_key(name)
    }

    /// Run the transform registered under `name`, or return `pixel` unchanged
    /// when there is none.
    #[inline]
    pub fn apply(&self, name: &str, switch: &KillSwitch, pixel: Pixel) -> VelvetResult<Pixel> {
        match self.processors.get(name) {
            Some(transform) => transform(switch, pixel),
            None => {
                trace!(name, index = pixel.index, "Skipping unknown processor");
                Ok(pixel)
            }
        }
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.processors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::VelvetError;

    fn set_red(_: &KillSwitch, pixel: Pixel) -> VelvetResult<Pixel> {
        Ok(Pixel { red: 1, ..pixel })
    }

    #[test]
    fn test_builtins_registered() {
        let registry = ProcessorRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["grayscale", "modulus"]);
        assert!(registry.lookup("grayscale").is_some());
    }

    #[test]
    fn test_unknown_name_returns_pixel_unchanged() {
        let registry = ProcessorRegistry::new();
        let pixel = Pixel::new(3, 10, 20, 30, 40);
        let out = registry
            .apply("does-not-exist", &KillSwitch::new(), pixel)
            .unwrap();
        assert_eq!(out, pixel);
    }

    #[test]
    fn test_unknown_name_skipped_even_when_disabled() {
        let registry = ProcessorRegistry::new();
        let switch = KillSwitch::new();
        switch.trip();
        let pixel = Pixel::new(0, 1, 2, 3, 4);
        assert_eq!(registry.apply("missing", &switch, pixel), Ok(pixel));
    }

    #[test]
    fn test_register_overwrites() {
        let mut registry = ProcessorRegistry::new();
        registry.register("red", set_red);
        registry.register("red", |_: &KillSwitch, pixel: Pixel| {
            Ok(Pixel { red: 2, ..pixel })
        });
        assert_eq!(registry.len(), 1);
        let out = registry
            .apply("red", &KillSwitch::new(), Pixel::default())
            .unwrap();
        assert_eq!(out.red, 2);
    }

    #[test]
    fn test_builtin_refuses_when_disabled() {
        let registry = ProcessorRegistry::with_builtins();
        let switch = KillSwitch::new();
        switch.trip();
        for name in ["grayscale", "modulus"] {
            assert_eq!(
                registry.apply(name, &switch, Pixel::default()),
                Err(VelvetError::Disabled)
            );
        }
    }
}
