use std::sync::{Arc, Mutex};

use planform_marshal::Config;
use planform_schema::{validator_fn, Attribute, Block, NestedAttributes, Schema};
use planform_test_utils::{init_tracing, instance_config};
use planform_value::{DiagnosticKind, Diagnostics, DynamicValue, Path, ValueType};
use planform_walk::{validate_config, WalkOptions};
use pretty_assertions::assert_eq;

type Seen = Arc<Mutex<Vec<(Path, DynamicValue)>>>;

fn recorder(seen: &Seen) -> Arc<dyn planform_schema::AttributeValidator> {
    let seen = Arc::clone(seen);
    validator_fn("records calls", move |req| {
        seen.lock()
            .unwrap()
            .push((req.path.clone(), req.config_value.clone()));
        Diagnostics::new()
    })
}

fn failing(summary: &'static str) -> Arc<dyn planform_schema::AttributeValidator> {
    validator_fn(summary, move |req| {
        let mut diags = Diagnostics::new();
        diags.add_attribute_error(req.path, DiagnosticKind::Validation, summary, "always fails");
        diags
    })
}

#[test]
fn test_map_nested_null_child_validates_cleanly() {
    init_tracing();
    let seen = Seen::default();
    let schema = Arc::new(Schema::new([(
        "labels",
        Attribute::nested(NestedAttributes::map([(
            "value",
            Attribute::leaf(ValueType::String)
                .optional()
                .validator(recorder(&seen)),
        )]))
        .optional(),
    )]));
    let label_type = ValueType::object([("value", ValueType::String)]);
    let raw = DynamicValue::object([(
        "labels",
        DynamicValue::map(
            label_type,
            [(
                "empty",
                DynamicValue::object([("value", DynamicValue::null(ValueType::String))]),
            )],
        )
        .unwrap(),
    )]);
    let config = Config::new(schema, raw).unwrap();

    let diags = validate_config(&config, &WalkOptions::default());
    assert!(diags.is_empty(), "{diags:?}");

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![(
            Path::attr_root("labels").at_key("empty").attr("value"),
            DynamicValue::null(ValueType::String)
        )]
    );
}

#[test]
fn test_list_nested_children_visited_per_index() {
    let seen = Seen::default();
    let schema = Arc::new(Schema::new([
        ("name", Attribute::leaf(ValueType::String).required()),
        (
            "disks",
            Attribute::nested(NestedAttributes::list([
                (
                    "id",
                    Attribute::leaf(ValueType::String)
                        .required()
                        .validator(recorder(&seen)),
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
    let raw = instance_config("web", &[("a", true), ("b", false)]).into_raw();
    let config = Config::new(schema, raw).unwrap();

    let diags = validate_config(&config, &WalkOptions::default());
    assert!(diags.is_empty());

    let paths: Vec<Path> = seen.lock().unwrap().iter().map(|(p, _)| p.clone()).collect();
    assert_eq!(
        paths,
        vec![
            Path::attr_root("disks").at_index(0).attr("id"),
            Path::attr_root("disks").at_index(1).attr("id"),
        ]
    );
}

#[test]
fn test_all_validators_run() {
    let seen = Seen::default();
    let schema = Arc::new(Schema::new([(
        "name",
        Attribute::leaf(ValueType::String)
            .required()
            .validator(failing("first"))
            .validator(failing("second"))
            .validator(recorder(&seen)),
    )]));
    let config = Config::new(
        schema,
        DynamicValue::object([("name", DynamicValue::string("web"))]),
    )
    .unwrap();

    let diags = validate_config(&config, &WalkOptions::default());
    let summaries: Vec<&str> = diags.errors().map(|d| d.summary()).collect();
    assert_eq!(summaries, vec!["first", "second"]);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_invalid_definition_skips_only_its_subtree() {
    let seen = Seen::default();
    let schema = Arc::new(Schema::new([
        (
            "broken",
            Attribute::leaf(ValueType::String)
                .required()
                .computed()
                .validator(recorder(&seen)),
        ),
        (
            "fine",
            Attribute::leaf(ValueType::String)
                .optional()
                .validator(recorder(&seen)),
        ),
    ]));
    let config = Config::new(
        schema,
        DynamicValue::object([
            ("broken", DynamicValue::string("x")),
            ("fine", DynamicValue::string("y")),
        ]),
    )
    .unwrap();

    let diags = validate_config(&config, &WalkOptions::default());
    let errors: Vec<_> = diags.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), DiagnosticKind::InvalidDefinition);
    assert_eq!(errors[0].path(), Some(&Path::attr_root("broken")));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, Path::attr_root("fine"));
}

#[test]
fn test_deprecated_attribute_warns_only_when_set() {
    let schema = Arc::new(
        Schema::new([
            (
                "old",
                Attribute::leaf(ValueType::String)
                    .optional()
                    .deprecated("use new"),
            ),
            (
                "older",
                Attribute::leaf(ValueType::String)
                    .optional()
                    .deprecated("use new"),
            ),
        ])
        .deprecated("resource is retiring"),
    );
    let config = Config::new(
        schema,
        DynamicValue::object([
            ("old", DynamicValue::string("x")),
            ("older", DynamicValue::null(ValueType::String)),
        ]),
    )
    .unwrap();

    let diags = validate_config(&config, &WalkOptions::default());
    assert!(!diags.has_error());
    let warnings: Vec<_> = diags.warnings().collect();
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].path(), Some(&Path::root()));
    assert_eq!(warnings[0].detail(), "resource is retiring");
    assert_eq!(warnings[1].path(), Some(&Path::attr_root("old")));
    assert_eq!(warnings[1].kind(), DiagnosticKind::Deprecated);
}

fn rule_schema() -> Arc<Schema> {
    Arc::new(Schema::new([("name", Attribute::leaf(ValueType::String).required())]).block(
        "rule",
        Block::list()
            .attribute("port", Attribute::leaf(ValueType::Number).required())
            .min_items(1)
            .max_items(2),
    ))
}

fn rules(ports: &[i64]) -> DynamicValue {
    let rule_type = ValueType::object([("port", ValueType::Number)]);
    DynamicValue::object([
        ("name", DynamicValue::string("fw")),
        (
            "rule",
            DynamicValue::list(
                rule_type,
                ports
                    .iter()
                    .map(|p| DynamicValue::object([("port", DynamicValue::int(*p))])),
            )
            .unwrap(),
        ),
    ])
}

#[test]
fn test_block_item_limits() {
    let too_many = Config::new(rule_schema(), rules(&[22, 80, 443])).unwrap();
    let diags = validate_config(&too_many, &WalkOptions::default());
    let errors: Vec<_> = diags.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].summary(), "Too Many Blocks");
    assert_eq!(errors[0].path(), Some(&Path::attr_root("rule")));

    let too_few = Config::new(rule_schema(), rules(&[])).unwrap();
    let diags = validate_config(&too_few, &WalkOptions::default());
    assert_eq!(diags.errors().next().unwrap().summary(), "Insufficient Blocks");

    let unchecked = WalkOptions {
        enforce_block_item_limits: false,
    };
    assert!(validate_config(&too_many, &unchecked).is_empty());
}

#[test]
fn test_block_limits_skip_unknown_collection() {
    let rule_type = ValueType::object([("port", ValueType::Number)]);
    let raw = DynamicValue::object([
        ("name", DynamicValue::string("fw")),
        ("rule", DynamicValue::unknown(ValueType::list(rule_type))),
    ]);
    let config = Config::new(rule_schema(), raw).unwrap();
    assert!(validate_config(&config, &WalkOptions::default()).is_empty());
}

#[test]
fn test_block_children_are_walked() {
    let seen = Seen::default();
    let rule = Block::list().attribute(
        "port",
        Attribute::leaf(ValueType::Number)
            .required()
            .validator(recorder(&seen)),
    );
    let schema = Arc::new(
        Schema::new([("name", Attribute::leaf(ValueType::String).required())]).block("rule", rule),
    );
    let config = Config::new(schema, rules(&[22, 80])).unwrap();
    assert!(validate_config(&config, &WalkOptions::default()).is_empty());
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].0, Path::attr_root("rule").at_index(1).attr("port"));
    assert_eq!(seen[1].1, DynamicValue::int(80));
}

#[test]
fn test_set_nested_children_visited_per_member() {
    let seen = Seen::default();
    let schema = Arc::new(Schema::new([(
        "rules",
        Attribute::nested(NestedAttributes::set([(
            "port",
            Attribute::leaf(ValueType::Number)
                .required()
                .validator(recorder(&seen)),
        )]))
        .optional(),
    )]));
    let rule_type = ValueType::object([("port", ValueType::Number)]);
    let ssh = DynamicValue::object([("port", DynamicValue::int(22))]);
    let web = DynamicValue::object([("port", DynamicValue::int(80))]);
    let raw = DynamicValue::object([(
        "rules",
        DynamicValue::set(rule_type, [ssh.clone(), web.clone()]).unwrap(),
    )]);
    let config = Config::new(schema, raw).unwrap();

    assert!(validate_config(&config, &WalkOptions::default()).is_empty());
    let rules = Path::attr_root("rules");
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (rules.at_value(ssh).attr("port"), DynamicValue::int(22)),
            (rules.at_value(web).attr("port"), DynamicValue::int(80)),
        ]
    );
}

#[test]
fn test_single_nested_skips_null_and_unknown_objects() {
    let seen = Seen::default();
    let schema = Arc::new(Schema::new([(
        "boot",
        Attribute::nested(NestedAttributes::single([(
            "image",
            Attribute::leaf(ValueType::String)
                .optional()
                .validator(recorder(&seen)),
        )]))
        .optional(),
    )]));
    let boot_type = ValueType::object([("image", ValueType::String)]);
    let config = |boot: DynamicValue| {
        Config::new(Arc::clone(&schema), DynamicValue::object([("boot", boot)])).unwrap()
    };

    for boot in [
        DynamicValue::null(boot_type.clone()),
        DynamicValue::unknown(boot_type.clone()),
    ] {
        assert!(validate_config(&config(boot), &WalkOptions::default()).is_empty());
    }
    assert!(seen.lock().unwrap().is_empty());

    let known = DynamicValue::object([("image", DynamicValue::string("debian"))]);
    assert!(validate_config(&config(known), &WalkOptions::default()).is_empty());
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(
            Path::attr_root("boot").attr("image"),
            DynamicValue::string("debian")
        )]
    );
}
