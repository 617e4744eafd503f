//! Typed element construction from generic node trees

use crate::error::{Error, Result};
use crate::typed::TypedElement;
use ferrum_context::{CanonicalRegistry, Diagnostic, ResolverChain};
use ferrum_format::ElementNode;
use ferrum_models::{ElementDefinition, NameMatch, StructureDefinition};
use std::sync::Arc;
use tracing::debug;

/// What to do with an instance element that no definition declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Fail the build
    Strict,
    /// Keep it as an opaque element and record a diagnostic
    #[default]
    Permissive,
}

/// Result of a successful build
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub root: TypedElement,
    pub diagnostics: Vec<Diagnostic>,
}

/// How a named child of a typed element is bound
struct ChildShape {
    definition: Option<Arc<StructureDefinition>>,
    path: String,
    instance_type: Option<String>,
    collection: bool,
}

/// Members every FHIR element has even when a logical model does not declare them
const IMPLICIT_MEMBERS: [(&str, &str, bool); 3] = [
    ("id", "string", false),
    ("extension", "Extension", true),
    ("modifierExtension", "Extension", true),
];

/// Binds generic nodes to definitions found through the registry and the
/// resolver chain.
#[derive(Debug, Clone)]
pub struct TypedElementBuilder {
    registry: Arc<CanonicalRegistry>,
    chain: Arc<ResolverChain>,
    mode: BuildMode,
}

impl TypedElementBuilder {
    pub fn new(registry: Arc<CanonicalRegistry>, chain: Arc<ResolverChain>) -> Self {
        Self {
            registry,
            chain,
            mode: BuildMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn registry(&self) -> &CanonicalRegistry {
        &self.registry
    }

    pub fn chain(&self) -> &ResolverChain {
        &self.chain
    }

    /// Build a typed tree for `node`, whose type is the short name `root_type`.
    pub fn build(&self, node: &ElementNode, root_type: &str) -> Result<BuildOutcome> {
        let sd = self
            .chain
            .structure_definition_by_name(root_type, &self.registry)
            .ok_or_else(|| Error::UnknownRootType(root_type.to_string()))?;
        self.build_with_definition(node, sd)
    }

    /// Build a typed tree for `node` against the definition at `url`.
    pub fn build_with_canonical(&self, node: &ElementNode, url: &str) -> Result<BuildOutcome> {
        let sd = self
            .chain
            .structure_definition(url)
            .ok_or_else(|| Error::UnknownRootType(url.to_string()))?;
        self.build_with_definition(node, sd)
    }

    fn build_with_definition(
        &self,
        node: &ElementNode,
        sd: Arc<StructureDefinition>,
    ) -> Result<BuildOutcome> {
        let mut diagnostics = Vec::new();
        let mut root = root_element(node.name.clone(), sd);
        root.value = node.value.clone();
        root.children = self.build_children(node, &root, &mut diagnostics)?;
        debug!(
            root = %root.name,
            definition = root.definition_url().unwrap_or_default(),
            diagnostics = diagnostics.len(),
            "Built typed element tree"
        );
        Ok(BuildOutcome { root, diagnostics })
    }

    /// An empty instance of `type_name`, used as a transform target
    pub fn empty_root(&self, type_name: &str) -> Result<TypedElement> {
        let sd = self
            .chain
            .structure_definition_by_name(type_name, &self.registry)
            .ok_or_else(|| Error::UnknownRootType(type_name.to_string()))?;
        Ok(root_element(sd.type_name().to_string(), sd))
    }

    /// A new, empty child `name` of `parent`, bound like the builder would bind it.
    ///
    /// The child is returned, not attached.
    pub fn new_child(&self, parent: &TypedElement, name: &str) -> Result<TypedElement> {
        let sd = parent.definition.as_ref().ok_or_else(|| Error::OpaqueParent {
            path: parent.path.clone(),
        })?;
        let shape = self
            .resolve_child(sd, &parent.path, name)
            .ok_or_else(|| Error::UnmatchedElement {
                path: format!("{}.{}", parent.path, name),
            })?;
        Ok(shaped_element(name, shape))
    }

    fn build_children(
        &self,
        node: &ElementNode,
        parent: &TypedElement,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<TypedElement>> {
        let Some(sd) = parent.definition.as_ref() else {
            return Ok(node
                .children
                .iter()
                .map(|c| opaque_tree(c, &parent.path))
                .collect());
        };

        let mut children = Vec::with_capacity(node.children.len());
        for child in &node.children {
            match self.resolve_child(sd, &parent.path, &child.name) {
                Some(shape) => {
                    let mut element = shaped_element(&child.name, shape);
                    element.value = child.value.clone();
                    element.children = self.build_children(child, &element, diagnostics)?;
                    children.push(element);
                }
                None => {
                    let path = format!("{}.{}", parent.path, child.name);
                    match self.mode {
                        BuildMode::Strict => return Err(Error::UnmatchedElement { path }),
                        BuildMode::Permissive => {
                            diagnostics.push(Diagnostic::build(
                                path.clone(),
                                "no element definition matches; kept untyped",
                            ));
                            children.push(opaque_tree(child, &parent.path));
                        }
                    }
                }
            }
        }
        Ok(children)
    }

    /// Bind child `name` of the element at `parent_path` in `sd`
    fn resolve_child(
        &self,
        sd: &Arc<StructureDefinition>,
        parent_path: &str,
        name: &str,
    ) -> Option<ChildShape> {
        let snapshot = sd.snapshot.as_ref()?;
        let matched = snapshot
            .get_children(parent_path)
            .into_iter()
            .find_map(|ed| ed.match_name(name).map(|m| (ed, m)));

        let Some((ed, name_match)) = matched else {
            return IMPLICIT_MEMBERS
                .iter()
                .find(|(member, _, _)| *member == name)
                .map(|&(_, code, collection)| {
                    self.typed_shape(code, collection, format!("{parent_path}.{name}"))
                });
        };

        let collection = ed.is_array();
        if let NameMatch::Choice(code) = name_match {
            return Some(self.typed_shape(&code, collection, ed.path.clone()));
        }

        if snapshot.has_children(&ed.path) {
            return Some(ChildShape {
                definition: Some(sd.clone()),
                path: ed.path.clone(),
                instance_type: Some(first_code(ed).unwrap_or("BackboneElement").to_string()),
                collection,
            });
        }

        if let Some(reference) = &ed.content_reference {
            let target = reference
                .split_once('#')
                .map_or(reference.as_str(), |(_, path)| path);
            let instance_type = snapshot
                .get_element(target)
                .and_then(first_code)
                .unwrap_or("BackboneElement");
            return Some(ChildShape {
                definition: Some(sd.clone()),
                path: target.to_string(),
                instance_type: Some(instance_type.to_string()),
                collection,
            });
        }

        match first_code(ed) {
            Some(code) => Some(self.typed_shape(code, collection, ed.path.clone())),
            None => Some(ChildShape {
                definition: None,
                path: ed.path.clone(),
                instance_type: None,
                collection,
            }),
        }
    }

    /// Bind to the definition of type `code`; unresolved types stay opaque
    fn typed_shape(&self, code: &str, collection: bool, opaque_path: String) -> ChildShape {
        match self.chain.structure_definition_by_name(code, &self.registry) {
            Some(type_sd) => ChildShape {
                path: type_sd.root_path().to_string(),
                instance_type: Some(type_sd.type_name().to_string()),
                definition: Some(type_sd),
                collection,
            },
            None => {
                debug!(type_code = code, path = %opaque_path, "Type not resolvable; element kept untyped");
                ChildShape {
                    definition: None,
                    path: opaque_path,
                    instance_type: Some(code.to_string()),
                    collection,
                }
            }
        }
    }
}

fn first_code(ed: &ElementDefinition) -> Option<&str> {
    ed.types.as_ref()?.first().map(|t| t.code.as_str())
}

fn root_element(name: String, sd: Arc<StructureDefinition>) -> TypedElement {
    TypedElement {
        name,
        instance_type: Some(sd.type_name().to_string()),
        path: sd.root_path().to_string(),
        definition: Some(sd),
        value: None,
        collection: false,
        children: Vec::new(),
    }
}

fn shaped_element(name: &str, shape: ChildShape) -> TypedElement {
    TypedElement {
        name: name.to_string(),
        instance_type: shape.instance_type,
        definition: shape.definition,
        path: shape.path,
        value: None,
        collection: shape.collection,
        children: Vec::new(),
    }
}

/// Carry a node and its subtree without type information
fn opaque_tree(node: &ElementNode, parent_path: &str) -> TypedElement {
    let path = format!("{parent_path}.{}", node.name);
    let mut element = TypedElement::opaque(node.name.clone(), path.clone());
    element.value = node.value.clone();
    element.collection = node.collection;
    element.children = node
        .children
        .iter()
        .map(|c| opaque_tree(c, &path))
        .collect();
    element
}
