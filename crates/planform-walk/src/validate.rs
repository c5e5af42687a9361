//! Validation walker
//!
//! Descends the attribute tree in schema order, attributes before blocks,
//! and for each item:
//!
//! 1. checks the item's own definition (an invalid definition skips the
//!    item's subtree)
//! 2. resolves its config value
//! 3. runs every validator in order, without short-circuiting
//! 4. recurses into nested objects per nesting mode
//! 5. checks block item limits
//! 6. warns when a deprecated item is set

use planform_marshal::Config;
use planform_schema::{Block, NestingMode, SchemaItem, ValidateAttributeRequest};
use planform_value::{DiagnosticKind, Diagnostics, DynamicValue, Path};

use crate::expand::{child_objects, Member};
use crate::options::WalkOptions;

/// Validate `config` against its schema
///
/// Returns every diagnostic produced; errors in one attribute never stop
/// its siblings from being validated.
#[must_use]
pub fn validate_config(config: &Config, options: &WalkOptions) -> Diagnostics {
    tracing::debug!("validating config");

    let mut walker = ConfigWalker {
        config,
        options,
        diagnostics: Diagnostics::new(),
    };

    let schema = config.schema();
    if let Some(message) = schema.deprecation_message() {
        if !config.raw().is_null() {
            walker.diagnostics.add_attribute_warning(
                &Path::root(),
                DiagnosticKind::Deprecated,
                "Deprecated",
                message,
            );
        }
    }

    for (name, item) in schema.items() {
        walker.walk(item, &Path::attr_root(name.clone()), None);
    }

    tracing::debug!(
        diagnostics = walker.diagnostics.len(),
        "validated config"
    );
    walker.diagnostics
}

struct ConfigWalker<'a> {
    config: &'a Config,
    options: &'a WalkOptions,
    diagnostics: Diagnostics,
}

impl ConfigWalker<'_> {
    /// Walk one item; `member` is `None` for top-level items, which are read
    /// from the container
    fn walk(&mut self, item: SchemaItem<'_>, path: &Path, member: Option<Member<'_>>) {
        if let Err(err) = item.validate_definition(path) {
            self.diagnostics
                .push(err.to_diagnostic(path, "Invalid Attribute Definition"));
            return;
        }

        let value = match member {
            None => self.config.get_attribute(path, &mut self.diagnostics),
            Some(member) => member.resolve(item, path, &mut self.diagnostics),
        };
        let Some(value) = value else {
            return;
        };

        tracing::trace!(path = %path, "validating attribute");
        for validator in item.validators() {
            tracing::debug!(
                path = %path,
                description = %validator.description(),
                "calling validator"
            );
            let request = ValidateAttributeRequest {
                path,
                config_value: &value,
                config: self.config.raw(),
                schema: self.config.schema(),
            };
            let diagnostics = validator.validate(&request);
            self.diagnostics.append(diagnostics.with_path(path));
        }

        if let Some(mode) = item.nesting() {
            match child_objects(mode, &value, path) {
                Ok(objects) => {
                    let children = item.children();
                    for object in &objects {
                        for (name, child) in &children {
                            let member = Member {
                                parent: &value,
                                position: &object.position,
                                name: name.as_str(),
                            };
                            self.walk(*child, &object.path.attr(name.as_str()), Some(member));
                        }
                    }
                }
                Err(err) => {
                    self.diagnostics
                        .push(err.to_diagnostic(path, "Invalid Attribute Definition"));
                    return;
                }
            }
        }

        if let SchemaItem::Block(block) = item {
            if self.options.enforce_block_item_limits {
                self.check_item_limits(block, &value, path);
            }
        }

        if let Some(message) = item.deprecation_message() {
            if !value.is_null() {
                let summary = if item.is_block() {
                    "Block Deprecated"
                } else {
                    "Attribute Deprecated"
                };
                self.diagnostics.add_attribute_warning(
                    path,
                    DiagnosticKind::Deprecated,
                    summary,
                    message,
                );
            }
        }
    }

    /// Counts are only checked once the collection is known; set members
    /// must be fully known since unknown members may later merge
    fn check_item_limits(&mut self, block: &Block, value: &DynamicValue, path: &Path) {
        if value.is_unknown() || (block.mode() == NestingMode::Set && !value.is_fully_known()) {
            return;
        }
        let count = match block.mode() {
            NestingMode::Single => u64::from(value.is_known()),
            _ => value
                .len()
                .map_or(0, |n| u64::try_from(n).unwrap_or(u64::MAX)),
        };
        let (min, max) = (block.min_item_count(), block.max_item_count());

        if min > 0 && count < min {
            self.diagnostics.add_attribute_error(
                path,
                DiagnosticKind::Validation,
                "Insufficient Blocks",
                format!("at least {min} block(s) required, {count} given"),
            );
        }
        if max > 0 && count > max {
            self.diagnostics.add_attribute_error(
                path,
                DiagnosticKind::Validation,
                "Too Many Blocks",
                format!("at most {max} block(s) allowed, {count} given"),
            );
        }
    }
}
