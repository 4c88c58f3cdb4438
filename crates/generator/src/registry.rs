//! Lookup table from generator kind to generator

use crate::{CodeGenerator, DescriptorSetGenerator, PluginProcess};
use protoc_wrapper_common::{GeneratorKind, Result, WrapperConfig, WrapperError};
use std::collections::BTreeMap;

/// Generators keyed by the kind they implement
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: BTreeMap<GeneratorKind, Box<dyn CodeGenerator>>,
}

impl GeneratorRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in generator, configured from `config`
    pub fn from_config(config: &WrapperConfig) -> Self {
        let mut registry = Self::new();
        for kind in GeneratorKind::ALL {
            match config.plugin_program(kind) {
                Some(program) => registry.register(Box::new(PluginProcess::new(kind, program))),
                None => registry.register(Box::new(DescriptorSetGenerator::new(
                    config.descriptor_set.name.clone(),
                ))),
            }
        }
        registry
    }

    /// Add a generator, replacing any previous one of the same kind
    pub fn register(&mut self, generator: Box<dyn CodeGenerator>) {
        self.generators.insert(generator.kind(), generator);
    }

    pub fn get(&self, kind: GeneratorKind) -> Result<&dyn CodeGenerator> {
        self.generators
            .get(&kind)
            .map(|g| g.as_ref())
            .ok_or_else(|| WrapperError::Input(format!("No generator registered for '{}'", kind)))
    }

    /// Registered kinds, in declaration order
    pub fn kinds(&self) -> impl Iterator<Item = GeneratorKind> + '_ {
        self.generators.keys().copied()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.generators.keys()).finish()
    }
}
