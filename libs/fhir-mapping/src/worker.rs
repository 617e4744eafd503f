//! What a transformation engine may use while it runs

use ferrum_context::{CanonicalRegistry, ResolverChain};
use ferrum_element::{TypedElement, TypedElementBuilder};
use ferrum_models::StructureDefinition;
use std::sync::Arc;

/// Definitions and element factory shared by one step of the harness
#[derive(Debug, Clone)]
pub struct WorkerContext {
    builder: TypedElementBuilder,
}

impl WorkerContext {
    pub fn new(builder: TypedElementBuilder) -> Self {
        Self { builder }
    }

    pub fn builder(&self) -> &TypedElementBuilder {
        &self.builder
    }

    pub fn registry(&self) -> &CanonicalRegistry {
        self.builder.registry()
    }

    pub fn chain(&self) -> &ResolverChain {
        self.builder.chain()
    }

    /// Definition for a short type name or canonical URL
    pub fn structure_definition(&self, name_or_url: &str) -> Option<Arc<StructureDefinition>> {
        self.chain()
            .structure_definition_by_name(name_or_url, self.registry())
    }

    /// Create child `name` under `parent` and return a mutable reference to it
    pub fn add_child<'a>(
        &self,
        parent: &'a mut TypedElement,
        name: &str,
    ) -> ferrum_element::Result<&'a mut TypedElement> {
        let child = self.builder.new_child(parent, name)?;
        parent.push_child(child);
        let last = parent.children.len() - 1;
        Ok(&mut parent.children[last])
    }
}
