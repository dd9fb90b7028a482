// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Name to kernel mapping

use super::{BooleanEngine, BooleanKernel};
use crate::error::{EngineError, EngineResult};
use ahash::AHashMap;
use tracing::debug;

/// Builds a fresh kernel instance
pub type KernelConstructor = fn() -> Box<dyn BooleanKernel>;

/// Maps backend names to kernel constructors
#[derive(Debug, Clone, Default)]
pub struct EngineRegistry {
    constructors: AHashMap<String, KernelConstructor>,
}

impl EngineRegistry {
    /// Registry with no kernels
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every kernel compiled into this build
    pub fn builtin() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "bsp")]
        registry.register(super::BspKernel::NAME, || Box::new(super::BspKernel::new()));

        #[cfg(feature = "raycast")]
        registry.register(super::RaycastKernel::NAME, || {
            Box::new(super::RaycastKernel::new())
        });

        registry
    }

    /// Add or replace a kernel under `name`
    pub fn register(&mut self, name: impl Into<String>, constructor: KernelConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Construct a fresh engine for `name`
    pub fn create(&self, name: &str) -> EngineResult<BooleanEngine> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| EngineError::NotImplemented(name.to_string()))?;

        debug!(engine = name, "Creating boolean engine");
        Ok(BooleanEngine::new(constructor()))
    }
}

/// Construct a built-in engine by name
pub fn create(name: &str) -> EngineResult<BooleanEngine> {
    EngineRegistry::builtin().create(name)
}

/// Names of the kernels compiled into this build
pub fn available_engines() -> Vec<String> {
    EngineRegistry::builtin().names()
}
