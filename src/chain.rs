// SPDX-License-Identifier: GPL-3.0-only

//! Ordered, duplicate-free processor chains
//!
//! The same structure backs the *loaded* chain (processors known and
//! orderable) and the *active* chain (processors applied to every pixel of
//! every frame). Append order is execution order.

use crate::constants::PROCESSOR_MAX_COUNT;
use crate::context::KillSwitch;
use crate::errors::{VelvetError, VelvetResult};
use tracing::info;

/// Which of the two chains an instance represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    Loaded,
    Active,
}

impl ChainKind {
    fn added_verb(&self) -> &'static str {
        match self {
            ChainKind::Loaded => "loaded",
            ChainKind::Active => "enabled",
        }
    }

    fn removed_verb(&self) -> &'static str {
        match self {
            ChainKind::Loaded => "unloaded",
            ChainKind::Active => "disabled",
        }
    }
}

impl std::fmt::Display for ChainKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainKind::Loaded => write!(f, "loaded"),
            ChainKind::Active => write!(f, "active"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessorChain {
    kind: ChainKind,
    names: Vec<String>,
    max: usize,
}

impl ProcessorChain {
    pub fn new(kind: ChainKind) -> Self {
        Self::with_max(kind, PROCESSOR_MAX_COUNT)
    }

    pub fn with_max(kind: ChainKind, max: usize) -> Self {
        Self {
            kind,
            names: Vec::new(),
            max,
        }
    }

    /// Append `name` to the end of the chain
    ///
    /// Refused once the chain already holds *more* than `max` entries, so the
    /// chain can grow to `max + 1` names before this guard trips.
    pub fn add(&mut self, switch: &KillSwitch, name: &str) -> VelvetResult<&[String]> {
        switch.ensure_enabled()?;

        if self.names.len() > self.max {
            return Err(VelvetError::Overflow { max: self.max });
        }

        if self.contains(name) {
            return Err(VelvetError::Duplicate(name.to_string()));
        }

        self.names.push(name.to_string());
        info!(
            chain = %self.kind,
            len = self.names.len(),
            "{} processor {}.",
            name,
            self.kind.added_verb()
        );
        Ok(&self.names)
    }

    /// Remove the single entry equal to `name`
    pub fn remove(&mut self, switch: &KillSwitch, name: &str) -> VelvetResult<&[String]> {
        switch.ensure_enabled()?;

        if self.names.is_empty() {
            return Err(VelvetError::Underflow);
        }

        let index = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| VelvetError::NotFound(name.to_string()))?;

        self.names.remove(index);
        info!(
            chain = %self.kind,
            len = self.names.len(),
            "{} processor {}.",
            name,
            self.kind.removed_verb()
        );
        Ok(&self.names)
    }

    /// Names in execution order
    pub fn list(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn kind(&self) -> ChainKind {
        self.kind
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(chain: &ProcessorChain) -> Vec<&str> {
        chain.list().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_add_appends_in_order() {
        let switch = KillSwitch::new();
        let mut chain = ProcessorChain::new(ChainKind::Active);
        chain.add(&switch, "grayscale").unwrap();
        chain.add(&switch, "modulus").unwrap();
        assert_eq!(names(&chain), vec!["grayscale", "modulus"]);
    }

    #[test]
    fn test_duplicate_add_fails_without_mutation() {
        let switch = KillSwitch::new();
        let mut chain = ProcessorChain::new(ChainKind::Loaded);
        chain.add(&switch, "grayscale").unwrap();
        let err = chain.add(&switch, "grayscale").unwrap_err();
        assert_eq!(err, VelvetError::Duplicate("grayscale".into()));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_overflow_boundary_allows_max_plus_one() {
        let switch = KillSwitch::new();
        let mut chain = ProcessorChain::new(ChainKind::Active);
        for i in 0..=PROCESSOR_MAX_COUNT {
            chain.add(&switch, &format!("p{}", i)).unwrap();
        }
        assert_eq!(chain.len(), PROCESSOR_MAX_COUNT + 1);

        let err = chain.add(&switch, "one-too-many").unwrap_err();
        assert_eq!(
            err,
            VelvetError::Overflow {
                max: PROCESSOR_MAX_COUNT
            }
        );
        assert_eq!(chain.len(), PROCESSOR_MAX_COUNT + 1);
    }

    #[test]
    fn test_overflow_checked_before_duplicate() {
        let switch = KillSwitch::new();
        let mut chain = ProcessorChain::with_max(ChainKind::Active, 1);
        chain.add(&switch, "a").unwrap();
        chain.add(&switch, "b").unwrap();
        assert!(matches!(
            chain.add(&switch, "a"),
            Err(VelvetError::Overflow { max: 1 })
        ));
    }

    #[test]
    fn test_remove_from_empty_underflows() {
        let switch = KillSwitch::new();
        let mut chain = ProcessorChain::new(ChainKind::Loaded);
        assert_eq!(
            chain.remove(&switch, "grayscale").unwrap_err(),
            VelvetError::Underflow
        );
    }

    #[test]
    fn test_remove_missing_name() {
        let switch = KillSwitch::new();
        let mut chain = ProcessorChain::new(ChainKind::Loaded);
        chain.add(&switch, "grayscale").unwrap();
        assert_eq!(
            chain.remove(&switch, "modulus").unwrap_err(),
            VelvetError::NotFound("modulus".into())
        );
        assert_eq!(names(&chain), vec!["grayscale"]);
    }

    #[test]
    fn test_remove_keeps_remaining_order() {
        let switch = KillSwitch::new();
        let mut chain = ProcessorChain::new(ChainKind::Active);
        for name in ["a", "b", "c"] {
            chain.add(&switch, name).unwrap();
        }
        let remaining = chain.remove(&switch, "b").unwrap();
        assert_eq!(remaining, ["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_mutations_refused_when_disabled() {
        let switch = KillSwitch::new();
        let mut chain = ProcessorChain::new(ChainKind::Active);
        chain.add(&switch, "grayscale").unwrap();
        switch.trip();

        assert_eq!(
            chain.add(&switch, "modulus").unwrap_err(),
            VelvetError::Disabled
        );
        assert_eq!(
            chain.remove(&switch, "grayscale").unwrap_err(),
            VelvetError::Disabled
        );
        assert_eq!(names(&chain), vec!["grayscale"]);
    }
}
