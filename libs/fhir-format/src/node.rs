/// How a primitive value is rendered in JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueKind {
    #[default]
    String,
    Boolean,
    Number,
    /// Narrative XHTML kept verbatim
    Xhtml,
}

/// A node of an untyped FHIR document
///
/// Children are kept in document order; repeated elements are siblings with
/// the same name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementNode {
    pub name: String,
    pub value: Option<String>,
    pub kind: ValueKind,
    /// Element should be rendered as a JSON array even when it occurs once
    pub collection: bool,
    pub children: Vec<ElementNode>,
}

impl ElementNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A primitive node holding a string value
    pub fn primitive(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&ElementNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ElementNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Value of the first child with the given name
    pub fn child_value(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|c| c.value.as_deref())
    }

    /// A nested resource (`contained`, `resource`) is an element wrapping exactly
    /// one value-less child whose name starts with an upper-case letter.
    pub(crate) fn wrapped_resource(&self) -> Option<&ElementNode> {
        match self.children.as_slice() {
            [only]
                if self.value.is_none()
                    && only.value.is_none()
                    && only.name.starts_with(|c: char| c.is_ascii_uppercase()) =>
            {
                Some(only)
            }
            _ => None,
        }
    }

    /// Guess JSON kinds for untyped primitives: `true`/`false` become booleans,
    /// integers become numbers. Used for schema-less conversion only.
    pub fn infer_kinds(&mut self) {
        if let (Some(value), ValueKind::String) = (&self.value, self.kind) {
            self.kind = match value.as_str() {
                "true" | "false" => ValueKind::Boolean,
                v if v.parse::<i64>().is_ok() => ValueKind::Number,
                _ => ValueKind::String,
            };
        }
        for child in &mut self.children {
            child.infer_kinds();
        }
    }
}
