//! Testing utilities for Planform workspace
//!
//! Shared fixtures: the compute-instance schema, its native shapes, and
//! value builders.

#![allow(missing_docs)]

use std::sync::Arc;

use planform_marshal::{object_shape, Config, Plan, State};
use planform_schema::{Attribute, NestedAttributes, Schema};
use planform_value::{DynamicValue, ValueType};

object_shape! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Disk {
        #[attr("id")]
        pub id: String,
        #[attr("delete_with_instance")]
        pub delete_with_instance: Option<bool>,
    }
}

object_shape! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Instance {
        #[attr("name")]
        pub name: String,
        #[attr("disks")]
        pub disks: Option<Vec<Disk>>,
    }
}

impl Disk {
    pub fn new(id: &str, delete_with_instance: bool) -> Self {
        Self {
            id: id.to_string(),
            delete_with_instance: Some(delete_with_instance),
        }
    }
}

/// `{name: Required<string>, disks: Optional+Computed<List<{id, delete_with_instance}>>}`
pub fn compute_instance_schema() -> Arc<Schema> {
    Arc::new(Schema::new([
        ("name", Attribute::leaf(ValueType::String).required()),
        (
            "disks",
            Attribute::nested(NestedAttributes::list([
                ("id", Attribute::leaf(ValueType::String).required()),
                (
                    "delete_with_instance",
                    Attribute::leaf(ValueType::Bool).optional(),
                ),
            ]))
            .optional()
            .computed(),
        ),
    ]))
}

pub fn disk_type() -> ValueType {
    ValueType::object([
        ("id", ValueType::String),
        ("delete_with_instance", ValueType::Bool),
    ])
}

pub fn disk_value(id: &str, delete_with_instance: bool) -> DynamicValue {
    DynamicValue::object([
        ("id", DynamicValue::string(id)),
        ("delete_with_instance", DynamicValue::bool(delete_with_instance)),
    ])
}

pub fn instance_value(name: &str, disks: &[(&str, bool)]) -> DynamicValue {
    let disks = DynamicValue::list(
        disk_type(),
        disks.iter().map(|(id, delete)| disk_value(id, *delete)),
    )
    .unwrap();
    DynamicValue::object([("name", DynamicValue::string(name)), ("disks", disks)])
}

pub fn instance_config(name: &str, disks: &[(&str, bool)]) -> Config {
    Config::new(compute_instance_schema(), instance_value(name, disks)).unwrap()
}

pub fn instance_plan(name: &str, disks: &[(&str, bool)]) -> Plan {
    Plan::new(compute_instance_schema(), instance_value(name, disks)).unwrap()
}

pub fn instance_state(name: &str, disks: &[(&str, bool)]) -> State {
    State::new(compute_instance_schema(), instance_value(name, disks)).unwrap()
}

/// Install a test subscriber honoring `RUST_LOG`; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
