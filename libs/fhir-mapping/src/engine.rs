//! The transformation engine boundary and a minimal engine

use crate::worker::WorkerContext;
use ferrum_context::Diagnostic;
use ferrum_element::TypedElement;
use ferrum_models::{
    ParameterValue, StructureMap, StructureMapGroup, StructureMapInputMode, StructureMapRule,
};
use thiserror::Error;

/// A rule that could not be executed. The transform carries on with the
/// next rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("rule {rule}: unsupported {reason}")]
    UnsupportedRule { rule: String, reason: String },

    #[error("rule {rule}: {message}")]
    Rule { rule: String, message: String },

    #[error("map {map}: {message}")]
    Map { map: String, message: String },
}

impl TransformError {
    fn unsupported(rule: &StructureMapRule, reason: impl Into<String>) -> Self {
        TransformError::UnsupportedRule {
            rule: rule.display_name().to_string(),
            reason: reason.into(),
        }
    }

    fn rule(rule: &StructureMapRule, message: impl Into<String>) -> Self {
        TransformError::Rule {
            rule: rule.display_name().to_string(),
            message: message.into(),
        }
    }

    /// Rule or map the error is about
    pub fn location(&self) -> &str {
        match self {
            TransformError::UnsupportedRule { rule, .. } | TransformError::Rule { rule, .. } => {
                rule
            }
            TransformError::Map { map, .. } => map,
        }
    }

    pub fn to_diagnostic(&self, map_name: &str) -> Diagnostic {
        Diagnostic::transform(format!("{map_name}#{}", self.location()), self.to_string())
    }
}

/// Executes a StructureMap on a typed source, filling in `target`.
///
/// Errors are per rule; whatever was produced before and after a failing rule
/// stays in `target`.
pub trait TransformationEngine: Send + Sync {
    fn transform(
        &self,
        worker: &WorkerContext,
        source: &TypedElement,
        map: &StructureMap,
        target: &mut TypedElement,
    ) -> Vec<TransformError>;
}

/// Runs the rules of the first group that copy a source element, or set a
/// literal, into a target element:
///
/// ```text
/// src.name as n -> tgt.name = n;
/// src.name -> tgt.kind = 'person';
/// ```
///
/// Anything else (nested or dependent rules, conditions, other transforms)
/// is reported as [`TransformError::UnsupportedRule`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleCopyEngine;

struct Inputs<'a> {
    source: &'a str,
    target: &'a str,
}

impl SimpleCopyEngine {
    pub fn new() -> Self {
        Self
    }

    fn inputs<'a>(group: &'a StructureMapGroup) -> Option<Inputs<'a>> {
        let named = |mode: StructureMapInputMode| {
            group
                .input
                .iter()
                .find(|i| i.mode == mode)
                .map(|i| i.name.as_str())
        };
        Some(Inputs {
            source: named(StructureMapInputMode::Source)?,
            target: named(StructureMapInputMode::Target)?,
        })
    }

    fn apply_rule(
        &self,
        worker: &WorkerContext,
        inputs: &Inputs<'_>,
        rule: &StructureMapRule,
        source: &TypedElement,
        target: &mut TypedElement,
    ) -> Result<(), TransformError> {
        if !rule.rule.is_empty() {
            return Err(TransformError::unsupported(rule, "nested rules"));
        }
        if !rule.dependent.is_empty() {
            return Err(TransformError::unsupported(rule, "dependent rules"));
        }
        let [src] = rule.source.as_slice() else {
            return Err(TransformError::unsupported(rule, "number of sources"));
        };
        let [tgt] = rule.target.as_slice() else {
            return Err(TransformError::unsupported(rule, "number of targets"));
        };

        if src.context != inputs.source {
            return Err(TransformError::unsupported(
                rule,
                format!("source context {}", src.context),
            ));
        }
        if src.condition.is_some() || src.check.is_some() {
            return Err(TransformError::unsupported(rule, "source condition"));
        }
        let Some(element) = src.element.as_deref() else {
            return Err(TransformError::unsupported(rule, "source without element"));
        };

        if tgt.context.as_deref() != Some(inputs.target) {
            return Err(TransformError::unsupported(
                rule,
                format!("target context {}", tgt.context.as_deref().unwrap_or("(none)")),
            ));
        }
        let Some(target_element) = tgt.element.as_deref() else {
            return Err(TransformError::unsupported(rule, "target without element"));
        };
        if let Some(transform) = tgt.transform.as_deref().filter(|t| *t != "copy") {
            return Err(TransformError::unsupported(
                rule,
                format!("transform {transform}"),
            ));
        }
        let [param] = tgt.parameter.as_slice() else {
            return Err(TransformError::unsupported(rule, "number of parameters"));
        };

        let mut matches: Vec<&TypedElement> = source.children_named(element).collect();
        match src.list_mode.as_deref() {
            None => {}
            Some("first") => matches.truncate(1),
            Some(other) => {
                return Err(TransformError::unsupported(rule, format!("list mode {other}")))
            }
        }

        let param = param
            .value()
            .ok_or_else(|| TransformError::rule(rule, "parameter has no value"))?;
        if let ParameterValue::Variable(name) = &param {
            if src.variable.as_deref() != Some(*name) {
                return Err(TransformError::rule(rule, format!("unknown variable {name}")));
            }
        }

        for item in matches {
            let value = match &param {
                ParameterValue::Literal(literal) => literal.clone(),
                ParameterValue::Variable(_) => match (&item.value, item.children.is_empty()) {
                    (Some(value), true) => value.clone(),
                    _ => {
                        return Err(TransformError::unsupported(
                            rule,
                            format!("copy of complex element {}", item.path),
                        ))
                    }
                },
            };
            let child = worker
                .add_child(target, target_element)
                .map_err(|e| TransformError::rule(rule, e.to_string()))?;
            child.value = Some(value);
        }
        Ok(())
    }
}

impl TransformationEngine for SimpleCopyEngine {
    fn transform(
        &self,
        worker: &WorkerContext,
        source: &TypedElement,
        map: &StructureMap,
        target: &mut TypedElement,
    ) -> Vec<TransformError> {
        let map_name = map.name.clone().unwrap_or_else(|| "(unnamed)".to_string());
        let Some(group) = map.group.first() else {
            return vec![TransformError::Map {
                map: map_name,
                message: "no groups".to_string(),
            }];
        };
        let Some(inputs) = Self::inputs(group) else {
            return vec![TransformError::Map {
                map: map_name,
                message: format!("group {} needs a source and a target input", group.name),
            }];
        };

        let mut errors = Vec::new();
        for rule in &group.rule {
            if let Err(e) = self.apply_rule(worker, &inputs, rule, source, target) {
                errors.push(e);
            }
        }
        errors
    }
}
