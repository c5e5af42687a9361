use std::sync::{Arc, Mutex};

use planform_marshal::{Config, Plan, State};
use planform_schema::{
    plan_modifier_fn, Attribute, NestedAttributes, PlanModifier, RequiresReplace, Schema,
    UseStateForUnknown,
};
use planform_test_utils::{
    compute_instance_schema, init_tracing, instance_config, instance_plan, instance_state, Disk,
};
use planform_value::{DiagnosticKind, Diagnostics, DynamicValue, Path, ValueType};
use planform_walk::modify_plan;
use pretty_assertions::assert_eq;

fn name_schema(modifiers: Vec<Arc<dyn PlanModifier>>) -> Arc<Schema> {
    let mut name = Attribute::leaf(ValueType::String).required();
    for modifier in modifiers {
        name = name.plan_modifier(modifier);
    }
    Arc::new(Schema::new([
        ("name", name),
        (
            "zone",
            Attribute::leaf(ValueType::String)
                .optional()
                .computed()
                .plan_modifier(Arc::new(UseStateForUnknown)),
        ),
    ]))
}

fn root(name: &str, zone: DynamicValue) -> DynamicValue {
    DynamicValue::object([("name", DynamicValue::string(name)), ("zone", zone)])
}

struct Trees {
    config: Config,
    state: State,
    plan: Plan,
}

impl Trees {
    fn new(
        schema: &Arc<Schema>,
        config: DynamicValue,
        state: DynamicValue,
        plan: DynamicValue,
    ) -> Self {
        Self {
            config: Config::new(Arc::clone(schema), config).unwrap(),
            state: State::new(Arc::clone(schema), state).unwrap(),
            plan: Plan::new(Arc::clone(schema), plan).unwrap(),
        }
    }

    fn unchanged(schema: &Arc<Schema>) -> Self {
        let value = root("web", DynamicValue::string("eu"));
        Self::new(schema, value.clone(), value.clone(), value)
    }
}

fn set_replace() -> Arc<dyn PlanModifier> {
    plan_modifier_fn("always replace", |_req, resp| resp.requires_replace = true)
}

fn rewrite(to: &'static str) -> Arc<dyn PlanModifier> {
    plan_modifier_fn("rewrite", move |_req, resp| {
        resp.plan_value = DynamicValue::string(to);
    })
}

/// Rewrites the plan value and flags replacement, then reports an error
fn rewrite_then_fail(to: &'static str) -> Arc<dyn PlanModifier> {
    plan_modifier_fn("rewrite then fail", move |req, resp| {
        resp.plan_value = DynamicValue::string(to);
        resp.requires_replace = true;
        resp.diagnostics.add_attribute_error(
            req.path,
            DiagnosticKind::PlanModification,
            "Modifier Failed",
            "cannot plan",
        );
    })
}

fn fail() -> Arc<dyn PlanModifier> {
    plan_modifier_fn("fail", |req, resp| {
        resp.diagnostics.add_attribute_error(
            req.path,
            DiagnosticKind::PlanModification,
            "Modifier Failed",
            "cannot plan",
        );
    })
}

#[test]
fn test_replacement_flag_carries_to_later_modifiers() {
    init_tracing();
    let schema = name_schema(vec![set_replace(), rewrite("other")]);
    let trees = Trees::unchanged(&schema);

    let response = modify_plan(&trees.config, &trees.state, &trees.plan);
    assert!(response.diagnostics.is_empty());
    assert_eq!(response.requires_replace, vec![Path::attr_root("name")]);

    let mut diags = Diagnostics::new();
    let name: String = response
        .plan
        .get_at(&Path::attr_root("name"), &mut diags)
        .unwrap();
    assert_eq!(name, "other");
}

#[test]
fn test_modifier_sees_previous_plan_value() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = {
        let seen = Arc::clone(&seen);
        plan_modifier_fn("record", move |req, resp| {
            seen.lock()
                .unwrap()
                .push((req.plan_value.clone(), resp.requires_replace));
        })
    };
    let schema = name_schema(vec![rewrite("second"), set_replace(), record]);
    let trees = Trees::unchanged(&schema);

    let response = modify_plan(&trees.config, &trees.state, &trees.plan);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(DynamicValue::string("second"), true)]
    );
    assert_eq!(response.requires_replace.len(), 1);
}

#[test]
fn test_error_stops_chain_but_not_siblings() {
    let schema = name_schema(vec![rewrite("first"), fail(), set_replace()]);
    let state = root("web", DynamicValue::string("eu"));
    let plan = root("web", DynamicValue::unknown(ValueType::String));
    let config = root("web", DynamicValue::null(ValueType::String));
    let trees = Trees::new(&schema, config, state, plan);

    let response = modify_plan(&trees.config, &trees.state, &trees.plan);

    let errors: Vec<_> = response.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].summary(), "Modifier Failed");
    assert!(response.requires_replace.is_empty());

    let raw = response.plan.raw();
    assert_eq!(
        raw.resolve(&Path::attr_root("name")),
        Some(&DynamicValue::string("first"))
    );
    assert_eq!(
        raw.resolve(&Path::attr_root("zone")),
        Some(&DynamicValue::string("eu"))
    );
}

#[test]
fn test_failing_modifier_output_is_recorded_and_written() {
    let schema = name_schema(vec![rewrite_then_fail("rewritten"), rewrite("never")]);
    let trees = Trees::unchanged(&schema);

    let response = modify_plan(&trees.config, &trees.state, &trees.plan);
    assert!(response.diagnostics.has_error());
    assert_eq!(response.requires_replace, vec![Path::attr_root("name")]);
    assert_eq!(
        response.plan.raw().resolve(&Path::attr_root("name")),
        Some(&DynamicValue::string("rewritten"))
    );
}

#[test]
fn test_failing_modifier_skips_nested_children() {
    let calls = Arc::new(Mutex::new(0_usize));
    let count = {
        let calls = Arc::clone(&calls);
        plan_modifier_fn("count", move |_req, _resp| *calls.lock().unwrap() += 1)
    };
    let schema = Arc::new(Schema::new([
        ("name", Attribute::leaf(ValueType::String).required()),
        (
            "disks",
            Attribute::nested(NestedAttributes::list([
                (
                    "id",
                    Attribute::leaf(ValueType::String)
                        .required()
                        .plan_modifier(count),
                ),
                (
                    "delete_with_instance",
                    Attribute::leaf(ValueType::Bool).optional(),
                ),
            ]))
            .optional()
            .computed()
            .plan_modifier(fail()),
        ),
    ]));
    let raw = instance_plan("web", &[("disk0", true)]).into_raw();
    let trees = Trees::new(&schema, raw.clone(), raw.clone(), raw);

    let response = modify_plan(&trees.config, &trees.state, &trees.plan);
    assert_eq!(response.diagnostics.errors().count(), 1);
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[test]
fn test_set_members_pair_with_state_by_value() {
    let schema = Arc::new(Schema::new([(
        "rules",
        Attribute::nested(NestedAttributes::set([
            ("port", Attribute::leaf(ValueType::Number).required()),
            (
                "cidr",
                Attribute::leaf(ValueType::String)
                    .required()
                    .plan_modifier(Arc::new(RequiresReplace)),
            ),
        ]))
        .optional(),
    )]));
    let rule_type = ValueType::object([("cidr", ValueType::String), ("port", ValueType::Number)]);
    let rule = |port: i64, cidr: &str| {
        DynamicValue::object([
            ("cidr", DynamicValue::string(cidr)),
            ("port", DynamicValue::int(port)),
        ])
    };
    let rules = |members: [DynamicValue; 2]| {
        DynamicValue::object([(
            "rules",
            DynamicValue::set(rule_type.clone(), members).unwrap(),
        )])
    };
    let ssh = rule(22, "10.0.0.0/8");
    let web = rule(80, "0.0.0.0/0");
    let state = rules([ssh.clone(), web.clone()]);
    let plan = rules([web, ssh]);
    assert_eq!(state, plan);

    let trees = Trees::new(&schema, plan.clone(), state, plan);
    let response = modify_plan(&trees.config, &trees.state, &trees.plan);
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert!(response.requires_replace.is_empty(), "{:?}", response.requires_replace);
}

#[test]
fn test_changed_set_member_reads_null_state() {
    let schema = Arc::new(Schema::new([(
        "rules",
        Attribute::nested(NestedAttributes::set([(
            "cidr",
            Attribute::leaf(ValueType::String)
                .required()
                .plan_modifier(Arc::new(RequiresReplace)),
        )]))
        .optional(),
    )]));
    let rule_type = ValueType::object([("cidr", ValueType::String)]);
    let rules = |cidr: &str| {
        DynamicValue::object([(
            "rules",
            DynamicValue::set(
                rule_type.clone(),
                [DynamicValue::object([("cidr", DynamicValue::string(cidr))])],
            )
            .unwrap(),
        )])
    };
    let trees = Trees::new(
        &schema,
        rules("10.1.0.0/16"),
        rules("10.0.0.0/8"),
        rules("10.1.0.0/16"),
    );

    let response = modify_plan(&trees.config, &trees.state, &trees.plan);
    let changed = DynamicValue::object([("cidr", DynamicValue::string("10.1.0.0/16"))]);
    assert_eq!(
        response.requires_replace,
        vec![Path::attr_root("rules").at_value(changed).attr("cidr")]
    );
}

#[test]
fn test_null_plan_is_left_alone() {
    let schema = name_schema(vec![rewrite("other")]);
    let value = root("web", DynamicValue::string("eu"));
    let config = Config::new(Arc::clone(&schema), value.clone()).unwrap();
    let state = State::new(Arc::clone(&schema), value).unwrap();
    let plan = Plan::null(Arc::clone(&schema)).unwrap();

    let response = modify_plan(&config, &state, &plan);
    assert!(response.plan.raw().is_null());
    assert!(response.requires_replace.is_empty());
    assert!(response.diagnostics.is_empty());
}

#[test]
fn test_requires_replace_on_nested_list_attribute() {
    let schema = Arc::new(Schema::new([
        ("name", Attribute::leaf(ValueType::String).required()),
        (
            "disks",
            Attribute::nested(NestedAttributes::list([
                (
                    "id",
                    Attribute::leaf(ValueType::String)
                        .required()
                        .plan_modifier(Arc::new(RequiresReplace)),
                ),
                (
                    "delete_with_instance",
                    Attribute::leaf(ValueType::Bool).optional(),
                ),
            ]))
            .optional()
            .computed(),
        ),
    ]));
    let trees = Trees::new(
        &schema,
        instance_config("web", &[("disk0", true), ("disk9", true)]).into_raw(),
        instance_state("web", &[("disk0", true), ("disk1", true)]).into_raw(),
        instance_plan("web", &[("disk0", true), ("disk9", true)]).into_raw(),
    );

    let response = modify_plan(&trees.config, &trees.state, &trees.plan);
    assert!(response.diagnostics.is_empty());
    assert_eq!(
        response.requires_replace,
        vec![Path::attr_root("disks").at_index(1).attr("id")]
    );
}

#[test]
fn test_nested_writes_are_visible_to_later_items() {
    let fill_default = plan_modifier_fn("default delete_with_instance", |_req, resp| {
        if resp.plan_value.is_null() {
            resp.plan_value = DynamicValue::bool(true);
        }
    });
    let observed = Arc::new(Mutex::new(None));
    let observe = {
        let observed = Arc::clone(&observed);
        plan_modifier_fn("observe plan", move |req, _resp| {
            let flag = req
                .plan
                .resolve(&Path::attr_root("disks").at_index(0).attr("delete_with_instance"))
                .cloned();
            *observed.lock().unwrap() = flag;
        })
    };
    let schema = Arc::new(Schema::new([
        (
            "name",
            Attribute::leaf(ValueType::String)
                .required()
                .plan_modifier(observe),
        ),
        (
            "disks",
            Attribute::nested(NestedAttributes::list([
                ("id", Attribute::leaf(ValueType::String).required()),
                (
                    "delete_with_instance",
                    Attribute::leaf(ValueType::Bool)
                        .optional()
                        .computed()
                        .plan_modifier(fill_default),
                ),
            ]))
            .optional(),
        ),
    ]));
    let disk_type = ValueType::object([
        ("id", ValueType::String),
        ("delete_with_instance", ValueType::Bool),
    ]);
    let raw = DynamicValue::object([
        ("name", DynamicValue::string("web")),
        (
            "disks",
            DynamicValue::list(
                disk_type,
                [DynamicValue::object([
                    ("id", DynamicValue::string("disk0")),
                    ("delete_with_instance", DynamicValue::null(ValueType::Bool)),
                ])],
            )
            .unwrap(),
        ),
    ]);
    let trees = Trees::new(&schema, raw.clone(), raw.clone(), raw);

    let response = modify_plan(&trees.config, &trees.state, &trees.plan);
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(*observed.lock().unwrap(), Some(DynamicValue::bool(true)));

    let mut diags = Diagnostics::new();
    let disks: Vec<Disk> = response
        .plan
        .get_at(&Path::attr_root("disks"), &mut diags)
        .unwrap();
    assert_eq!(disks, vec![Disk::new("disk0", true)]);
}

#[test]
fn test_set_member_rewrites_keep_later_siblings_addressable() {
    let fill = |value: &'static str| {
        plan_modifier_fn("fill unknown", move |_req, resp| {
            if resp.plan_value.is_unknown() {
                resp.plan_value = DynamicValue::string(value);
            }
        })
    };
    let schema = Arc::new(Schema::new([(
        "rules",
        Attribute::nested(NestedAttributes::set([
            ("port", Attribute::leaf(ValueType::Number).required()),
            (
                "proto",
                Attribute::leaf(ValueType::String)
                    .optional()
                    .computed()
                    .plan_modifier(fill("tcp")),
            ),
            (
                "zone",
                Attribute::leaf(ValueType::String)
                    .optional()
                    .computed()
                    .plan_modifier(fill("z1")),
            ),
        ]))
        .optional(),
    )]));
    let rule_type = ValueType::object([
        ("port", ValueType::Number),
        ("proto", ValueType::String),
        ("zone", ValueType::String),
    ]);
    let rule = |proto: DynamicValue, zone: DynamicValue| {
        DynamicValue::object([("port", DynamicValue::int(22)), ("proto", proto), ("zone", zone)])
    };
    let rules = |member: DynamicValue| {
        DynamicValue::object([(
            "rules",
            DynamicValue::set(rule_type.clone(), [member]).unwrap(),
        )])
    };

    let config = Config::new(
        Arc::clone(&schema),
        rules(rule(
            DynamicValue::null(ValueType::String),
            DynamicValue::null(ValueType::String),
        )),
    )
    .unwrap();
    let state = State::null(Arc::clone(&schema)).unwrap();
    let plan = Plan::new(
        Arc::clone(&schema),
        rules(rule(
            DynamicValue::unknown(ValueType::String),
            DynamicValue::unknown(ValueType::String),
        )),
    )
    .unwrap();

    let response = modify_plan(&config, &state, &plan);
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(
        response.plan.raw(),
        &rules(rule(DynamicValue::string("tcp"), DynamicValue::string("z1")))
    );
}

#[test]
fn test_walk_order_is_attributes_then_blocks_by_name() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let record = |name: &'static str| {
        let order = Arc::clone(&order);
        plan_modifier_fn(name, move |_req, _resp| order.lock().unwrap().push(name))
    };
    let schema = Arc::new(
        Schema::new([
            ("b", Attribute::leaf(ValueType::String).optional().plan_modifier(record("b"))),
            ("a", Attribute::leaf(ValueType::String).optional().plan_modifier(record("a"))),
        ])
        .block(
            "0block",
            planform_schema::Block::single()
                .attribute("x", Attribute::leaf(ValueType::String).optional())
                .plan_modifier(record("block")),
        ),
    );
    let raw = DynamicValue::object([
        ("a", DynamicValue::null(ValueType::String)),
        ("b", DynamicValue::null(ValueType::String)),
        (
            "0block",
            DynamicValue::null(ValueType::object([("x", ValueType::String)])),
        ),
    ]);
    let trees = Trees::new(&schema, raw.clone(), raw.clone(), raw);
    modify_plan(&trees.config, &trees.state, &trees.plan);
    assert_eq!(*order.lock().unwrap(), vec!["a", "b", "block"]);
}

#[test]
fn test_compute_instance_plan_unchanged_without_modifiers() {
    let schema = compute_instance_schema();
    let raw = instance_plan("web", &[("disk0", true)]).into_raw();
    let trees = Trees::new(&schema, raw.clone(), raw.clone(), raw.clone());
    let response = modify_plan(&trees.config, &trees.state, &trees.plan);
    assert!(response.diagnostics.is_empty());
    assert!(response.requires_replace.is_empty());
    assert_eq!(response.plan.raw(), &raw);
}

mod props {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn prop_plan_without_modifiers_is_untouched(
            name in "[a-z]{1,8}",
            disks in proptest::collection::vec(("[a-z0-9]{1,6}", any::<bool>()), 0..4),
        ) {
            let disks: Vec<(&str, bool)> = disks.iter().map(|(id, d)| (id.as_str(), *d)).collect();
            let schema = compute_instance_schema();
            let raw = instance_plan(&name, &disks).into_raw();
            let trees = Trees::new(&schema, raw.clone(), raw.clone(), raw.clone());
            let response = modify_plan(&trees.config, &trees.state, &trees.plan);
            prop_assert!(response.diagnostics.is_empty());
            prop_assert!(response.requires_replace.is_empty());
            prop_assert_eq!(response.plan.raw(), &raw);
        }
    }
}
