//! Attribute plan modifiers
//!
//! Provides the [`PlanModifier`] contract plus the built-in
//! [`RequiresReplace`], [`RequiresReplaceIf`] and [`UseStateForUnknown`]
//! modifiers.
//!
//! Modifiers run in declaration order. Each receives a response seeded
//! with the current plan value and the replacement flag left by the
//! previous modifier; leaving the flag untouched carries it forward.

use std::sync::Arc;

use planform_value::{DiagnosticKind, Diagnostics, DynamicValue, Path};

use crate::error::SchemaError;
use crate::schema::Schema;

/// Inputs handed to a [`PlanModifier`]
#[derive(Debug, Clone, Copy)]
pub struct ModifyPlanRequest<'a> {
    /// Path of the attribute being modified
    pub path: &'a Path,

    /// Config value at `path`
    pub config_value: &'a DynamicValue,

    /// Prior state value at `path`
    pub state_value: &'a DynamicValue,

    /// Plan value at `path` as left by the previous modifier
    pub plan_value: &'a DynamicValue,

    /// Whole config root
    pub config: &'a DynamicValue,

    /// Whole prior state root
    pub state: &'a DynamicValue,

    /// Whole plan root
    pub plan: &'a DynamicValue,

    /// Schema shared by all three roots
    pub schema: &'a Schema,
}

/// Mutable outputs of a [`PlanModifier`]
#[derive(Debug, Clone, PartialEq)]
pub struct ModifyPlanResponse {
    /// Planned value for the attribute
    pub plan_value: DynamicValue,

    /// Whether changing this attribute forces resource replacement
    pub requires_replace: bool,

    /// Diagnostics emitted by the modifier
    pub diagnostics: Diagnostics,
}

impl ModifyPlanResponse {
    /// Seed a response with the current plan value and replacement flag
    #[inline]
    #[must_use]
    pub fn new(plan_value: DynamicValue, requires_replace: bool) -> Self {
        Self {
            plan_value,
            requires_replace,
            diagnostics: Diagnostics::new(),
        }
    }
}

/// Rewrites a single attribute's planned value
pub trait PlanModifier: Send + Sync {
    /// Plain text description
    fn description(&self) -> String;

    /// Markdown description
    fn markdown_description(&self) -> String {
        self.description()
    }

    /// Modify the plan for one attribute
    fn modify(&self, request: &ModifyPlanRequest<'_>, response: &mut ModifyPlanResponse);
}

/// Modifier backed by a closure
pub struct FnPlanModifier<F> {
    description: String,
    modify: F,
}

impl<F> PlanModifier for FnPlanModifier<F>
where
    F: Fn(&ModifyPlanRequest<'_>, &mut ModifyPlanResponse) + Send + Sync,
{
    fn description(&self) -> String {
        self.description.clone()
    }

    fn modify(&self, request: &ModifyPlanRequest<'_>, response: &mut ModifyPlanResponse) {
        (self.modify)(request, response);
    }
}

/// Wrap a closure as a shared plan modifier
pub fn plan_modifier_fn<F>(description: impl Into<String>, modify: F) -> Arc<dyn PlanModifier>
where
    F: Fn(&ModifyPlanRequest<'_>, &mut ModifyPlanResponse) + Send + Sync + 'static,
{
    Arc::new(FnPlanModifier {
        description: description.into(),
        modify,
    })
}

/// Checks shared by the replacement modifiers
///
/// Returns `true` when a change to this attribute can force replacement:
/// the resource is neither being created nor destroyed, the attribute is
/// not a computed attribute left out of config, and plan differs from state.
fn replacement_applies(request: &ModifyPlanRequest<'_>, response: &mut ModifyPlanResponse) -> bool {
    if request.state.is_null() || request.plan.is_null() {
        return false;
    }

    let computed = match request.schema.attribute_at(request.path) {
        Ok(attribute) => attribute.is_computed(),
        // blocks are never computed
        Err(SchemaError::PathIsBlock { .. }) => false,
        Err(err) => {
            response.diagnostics.add_attribute_error(
                request.path,
                DiagnosticKind::SchemaMismatch,
                "Error finding attribute schema",
                format!(
                    "An unexpected error was encountered retrieving the schema for this \
                     attribute. This is always a bug in the provider.\n\nError: {err}"
                ),
            );
            return false;
        }
    };

    if request.config_value.is_null() && computed {
        return false;
    }

    request.plan_value != request.state_value
}

/// Marks the resource for replacement when this attribute changes
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiresReplace;

impl PlanModifier for RequiresReplace {
    fn description(&self) -> String {
        "If the value of this attribute changes, the resource will be destroyed and recreated."
            .to_string()
    }

    fn modify(&self, request: &ModifyPlanRequest<'_>, response: &mut ModifyPlanResponse) {
        if replacement_applies(request, response) {
            response.requires_replace = true;
        }
    }
}

/// Condition evaluated by [`RequiresReplaceIf`]
pub type RequiresReplaceIfFn =
    dyn Fn(&ModifyPlanRequest<'_>) -> (bool, Diagnostics) + Send + Sync + 'static;

/// Marks the resource for replacement when this attribute changes and a
/// condition holds
///
/// A false condition never clears a flag set by an earlier modifier.
pub struct RequiresReplaceIf {
    condition: Arc<RequiresReplaceIfFn>,
    description: String,
}

impl RequiresReplaceIf {
    /// Create conditional replacement modifier
    pub fn new<F>(description: impl Into<String>, condition: F) -> Self
    where
        F: Fn(&ModifyPlanRequest<'_>) -> (bool, Diagnostics) + Send + Sync + 'static,
    {
        Self {
            condition: Arc::new(condition),
            description: description.into(),
        }
    }
}

impl PlanModifier for RequiresReplaceIf {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn modify(&self, request: &ModifyPlanRequest<'_>, response: &mut ModifyPlanResponse) {
        if !replacement_applies(request, response) {
            return;
        }

        let (replace, diagnostics) = (self.condition)(request);
        response.diagnostics.append(diagnostics);

        if replace {
            response.requires_replace = true;
        } else if response.requires_replace {
            tracing::debug!(
                path = %request.path,
                "keeping previous attribute replacement requirement"
            );
        }
    }
}

/// Copies the prior state value into an unknown plan value
///
/// Applies only when state is non-null, the plan is unknown, and config is
/// not itself unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct UseStateForUnknown;

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "Once set, the value of this attribute in state will not change.".to_string()
    }

    fn modify(&self, request: &ModifyPlanRequest<'_>, response: &mut ModifyPlanResponse) {
        if request.state_value.is_null() {
            return;
        }
        if !response.plan_value.is_unknown() {
            return;
        }
        if request.config_value.is_unknown() {
            return;
        }
        response.plan_value = request.state_value.clone();
    }
}
