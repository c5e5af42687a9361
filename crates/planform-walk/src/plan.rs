//! Plan-modification walker
//!
//! Runs each item's modifier chain top-down. Per item:
//!
//! 1. resolve config, state and plan values (a failed read skips the item)
//! 2. run modifiers in order, each seeded with the previous modifier's plan
//!    value and replacement flag; an error diagnostic stops the chain and
//!    skips the item's subtree, but the failing modifier's output is kept
//! 3. record the item's path if replacement is required
//! 4. write the final plan value into the result plan
//! 5. recurse into nested objects of the updated plan value
//!
//! Later items see the writes of earlier ones.

use planform_marshal::{Config, Plan, State};
use planform_schema::{ModifyPlanRequest, ModifyPlanResponse, SchemaItem};
use planform_value::{Diagnostics, DynamicValue, Path};

use crate::expand::{child_objects, Member};

/// Output of [`modify_plan`]
#[derive(Debug, Clone)]
pub struct PlanModificationResponse {
    /// Plan after every modifier ran
    pub plan: Plan,

    /// Paths whose change forces replacement, in walk order
    pub requires_replace: Vec<Path>,

    /// Diagnostics from reads, modifiers and writes
    pub diagnostics: Diagnostics,
}

/// Run every plan modifier declared in the schema
///
/// A null plan (resource destruction) is returned unchanged.
#[must_use]
pub fn modify_plan(config: &Config, state: &State, plan: &Plan) -> PlanModificationResponse {
    let mut walker = PlanWalker {
        config,
        state,
        result: plan.clone(),
        requires_replace: Vec::new(),
        diagnostics: Diagnostics::new(),
    };

    if plan.raw().is_null() {
        tracing::debug!("plan is null, skipping plan modification");
    } else {
        tracing::debug!("modifying plan");
        let schema = plan.schema();
        for (name, item) in schema.items() {
            walker.walk(item, Path::attr_root(name.clone()), None);
        }
        tracing::debug!(
            replacements = walker.requires_replace.len(),
            diagnostics = walker.diagnostics.len(),
            "modified plan"
        );
    }

    PlanModificationResponse {
        plan: walker.result,
        requires_replace: walker.requires_replace,
        diagnostics: walker.diagnostics,
    }
}

/// Parent values of a nested item in the config and state trees
#[derive(Clone, Copy)]
struct Parents<'v> {
    config: Member<'v>,
    state: Member<'v>,
}

/// Final plan value and replacement flag of one modifier chain
struct ChainOutcome {
    plan_value: DynamicValue,
    requires_replace: bool,
    /// A modifier reported an error; the item's subtree is skipped
    failed: bool,
}

struct PlanWalker<'a> {
    config: &'a Config,
    state: &'a State,
    result: Plan,
    requires_replace: Vec<Path>,
    diagnostics: Diagnostics,
}

impl PlanWalker<'_> {
    /// Walk one item, returning its path in the result plan
    ///
    /// The returned path differs from `path` when the write replaced a set
    /// member. `None` means the item was skipped.
    fn walk(
        &mut self,
        item: SchemaItem<'_>,
        path: Path,
        parents: Option<Parents<'_>>,
    ) -> Option<Path> {
        let (config_value, state_value) = match parents {
            None => (
                self.config.get_attribute(&path, &mut self.diagnostics),
                self.state.get_attribute(&path, &mut self.diagnostics),
            ),
            Some(parents) => (
                parents.config.resolve(item, &path, &mut self.diagnostics),
                parents.state.resolve(item, &path, &mut self.diagnostics),
            ),
        };
        let (Some(config_value), Some(state_value)) = (config_value, state_value) else {
            return None;
        };
        let original = self.result.get_attribute(&path, &mut self.diagnostics)?;

        let ChainOutcome {
            plan_value,
            requires_replace,
            failed,
        } = self.run_modifiers(item, &path, &config_value, &state_value, original.clone());

        if requires_replace {
            tracing::debug!(path = %path, "attribute requires replacement");
            self.requires_replace.push(path.clone());
        }

        let mut path = if plan_value == original {
            path
        } else {
            match self.result.set_attribute_value(&path, plan_value) {
                Ok(written) => written,
                Err(diag) => {
                    self.diagnostics.push(diag);
                    return None;
                }
            }
        };

        if failed {
            return Some(path);
        }

        if let Some(mode) = item.nesting() {
            let value = self.result.get_attribute(&path, &mut self.diagnostics)?;
            let objects = match child_objects(mode, &value, &path) {
                Ok(objects) => objects,
                Err(err) => {
                    self.diagnostics
                        .push(err.to_diagnostic(&path, "Invalid Attribute Definition"));
                    return Some(path);
                }
            };

            // Writes below a set member change the member, and with it the
            // paths of everything under it.
            let children = item.children();
            for object in &objects {
                let mut object_path = object.under(&path);
                for (name, child) in &children {
                    let parents = Parents {
                        config: Member {
                            parent: &config_value,
                            position: &object.position,
                            name: name.as_str(),
                        },
                        state: Member {
                            parent: &state_value,
                            position: &object.position,
                            name: name.as_str(),
                        },
                    };
                    let child_path = object_path.attr(name.as_str());
                    if let Some(parent) = self
                        .walk(*child, child_path, Some(parents))
                        .and_then(|written| written.parent())
                    {
                        object_path = parent;
                    }
                }
                path = object_path.iter().take(path.len()).cloned().collect();
            }
        }

        Some(path)
    }

    /// Run the modifier chain, stopping after the first modifier that
    /// reports an error
    fn run_modifiers(
        &mut self,
        item: SchemaItem<'_>,
        path: &Path,
        config_value: &DynamicValue,
        state_value: &DynamicValue,
        mut plan_value: DynamicValue,
    ) -> ChainOutcome {
        let mut requires_replace = false;

        for modifier in item.plan_modifiers() {
            tracing::debug!(
                path = %path,
                description = %modifier.description(),
                "calling plan modifier"
            );
            let mut response = ModifyPlanResponse::new(plan_value.clone(), requires_replace);
            let request = ModifyPlanRequest {
                path,
                config_value,
                state_value,
                plan_value: &plan_value,
                config: self.config.raw(),
                state: self.state.raw(),
                plan: self.result.raw(),
                schema: self.result.schema(),
            };
            modifier.modify(&request, &mut response);

            let failed = response.diagnostics.has_error();
            self.diagnostics.append(response.diagnostics.with_path(path));
            plan_value = response.plan_value;
            requires_replace = response.requires_replace;
            if failed {
                tracing::debug!(path = %path, "plan modifier reported an error, stopping chain");
                return ChainOutcome {
                    plan_value,
                    requires_replace,
                    failed: true,
                };
            }
        }

        ChainOutcome {
            plan_value,
            requires_replace,
            failed: false,
        }
    }
}
