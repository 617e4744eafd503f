//! Element trees annotated with their definitions

use ferrum_models::{ElementDefinition, StructureDefinition};
use std::sync::Arc;

/// A node of an instance, bound to the element definition that describes it.
///
/// `definition` and `path` locate the element: `path` is relative to the
/// definition (`TLeft.name`, or `string` for the root of a primitive type).
/// Opaque elements have no definition; their subtree is carried untyped.
#[derive(Debug, Clone)]
pub struct TypedElement {
    pub name: String,
    pub instance_type: Option<String>,
    pub definition: Option<Arc<StructureDefinition>>,
    pub path: String,
    pub value: Option<String>,
    /// Declared with max cardinality above one
    pub collection: bool,
    pub children: Vec<TypedElement>,
}

impl TypedElement {
    /// An untyped element
    pub fn opaque(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance_type: None,
            definition: None,
            path: path.into(),
            value: None,
            collection: false,
            children: Vec::new(),
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.definition.is_none()
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn push_child(&mut self, child: TypedElement) {
        self.children.push(child);
    }

    pub fn child(&self, name: &str) -> Option<&TypedElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TypedElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Value of the first child with the given name
    pub fn child_value(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|c| c.value.as_deref())
    }

    /// The snapshot element this node was matched against
    pub fn element_definition(&self) -> Option<&ElementDefinition> {
        self.definition
            .as_ref()?
            .snapshot
            .as_ref()?
            .get_element(&self.path)
    }

    /// Canonical URL of the bound definition
    pub fn definition_url(&self) -> Option<&str> {
        self.definition.as_ref().map(|sd| sd.url.as_str())
    }
}

/// Two trees are equal when they carry the same data bound to the same
/// definitions (compared by canonical URL).
impl PartialEq for TypedElement {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.instance_type == other.instance_type
            && self.definition_url() == other.definition_url()
            && self.path == other.path
            && self.value == other.value
            && self.collection == other.collection
            && self.children == other.children
    }
}
