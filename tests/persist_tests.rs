use serde_json::json;

use tidyblocks::convert::{ConvertError, json_to_scalar, table_from_str, table_to_json};
use tidyblocks::output::report;
use tidyblocks::persist::{
    pipeline_from_json, program_from_str, program_to_json, program_to_string, step_from_json,
    step_to_json, value_from_json, value_to_json,
};
use tidyblocks::{
    Datetime, Environment, PersistError, Program, Scalar, Severity, Step, StepPipeline, ValueError,
    ValueExpr, ValueKind,
};

fn sample_program() -> Program {
    Program::with_pipelines(vec![
        StepPipeline::new(vec![
            Step::Read {
                label: "numbers".into(),
            },
            Step::Filter {
                value: ValueExpr::column("keep").unwrap(),
            },
            Step::Select {
                columns: vec!["n".into(), "noise".into()],
            },
            Step::SaveAs {
                label: "kept".into(),
            },
        ]),
        StepPipeline::new(vec![
            Step::Sequence {
                column: "n".into(),
                count: 10,
            },
            Step::Create {
                column: "noise".into(),
                value: ValueExpr::normal(0.0, 2.5).unwrap(),
            },
            Step::Create {
                column: "keep".into(),
                value: ValueExpr::logical(true),
            },
            Step::Create {
                column: "when".into(),
                value: ValueExpr::datetime(Datetime::from_millis(86_400_000).unwrap()),
            },
            Step::Create {
                column: "label".into(),
                value: ValueExpr::missing(ValueKind::Text).unwrap(),
            },
            Step::SaveAs {
                label: "numbers".into(),
            },
        ]),
    ])
}

// ============================================================================
// Saving
// ============================================================================

#[test]
fn test_value_layout() {
    assert_eq!(
        value_to_json(&ValueExpr::uniform(0.0, 1.0).unwrap()),
        json!(["@value", "uniform", 0.0, 1.0])
    );
    assert_eq!(value_to_json(&ValueExpr::rownum()), json!(["@value", "rownum"]));
    assert_eq!(
        value_to_json(&ValueExpr::column("x").unwrap()),
        json!(["@value", "column", "x"])
    );
    assert_eq!(
        value_to_json(&ValueExpr::missing(ValueKind::Number).unwrap()),
        json!(["@value", "number", null])
    );
}

#[test]
fn test_step_layout() {
    let step = Step::Create {
        column: "r".into(),
        value: ValueExpr::rownum(),
    };
    assert_eq!(
        step_to_json(&step),
        json!(["@transform", "create", "r", ["@value", "rownum"]])
    );
    assert_eq!(
        step_to_json(&Step::Select {
            columns: vec!["a".into(), "b".into()]
        }),
        json!(["@transform", "select", ["a", "b"]])
    );
}

#[test]
fn test_program_layout_starts_with_family() {
    let json = program_to_json(&sample_program());
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0], json!("@program"));
    assert_eq!(items[1][0], json!("@pipeline"));
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_program_round_trip() {
    let program = sample_program();
    let text = program_to_string(&program, false);
    let loaded = program_from_str(&text).unwrap();
    assert_eq!(loaded, program);

    let pretty = program_to_string(&program, true);
    assert!(pretty.contains('\n'));
    assert_eq!(program_from_str(&pretty).unwrap(), program);
}

#[test]
fn test_loaded_program_is_ready_to_run() {
    let text = program_to_string(&sample_program(), false);
    let mut program = program_from_str(&text).unwrap();
    assert_eq!(program.queued(), vec![1]);

    let summary = program.run(Environment::new());
    assert_eq!(summary.ran, vec![1, 0]);
    let env = program.environment().unwrap();
    assert_eq!(env.result("kept").unwrap().row_count(), 10);
    assert!(env.log().is_empty());
}

#[test]
fn test_integer_payloads_load_as_numbers() {
    let value = value_from_json(&json!(["@value", "uniform", 0, 1])).unwrap();
    assert_eq!(value, ValueExpr::uniform(0.0, 1.0).unwrap());
}

#[test]
fn test_datetime_value_round_trip() {
    let value = ValueExpr::datetime_text("2021-03-04T05:06:07.089Z").unwrap();
    let json = value_to_json(&value);
    assert_eq!(
        json,
        json!(["@value", "datetime", "2021-03-04T05:06:07.089Z"])
    );
    assert_eq!(value_from_json(&json).unwrap(), value);
}

#[test]
fn test_null_payload_loads_as_missing_constant() {
    assert_eq!(
        value_from_json(&json!(["@value", "logical", null])).unwrap(),
        ValueExpr::missing(ValueKind::Logical).unwrap()
    );
    assert_eq!(
        value_from_json(&json!(["@value", "datetime", null])).unwrap(),
        ValueExpr::missing(ValueKind::Datetime).unwrap()
    );
}

#[test]
fn test_every_kind_round_trips() {
    let values = vec![
        ValueExpr::absent(),
        ValueExpr::rownum(),
        ValueExpr::column("x").unwrap(),
        ValueExpr::datetime_text("2020-01-02").unwrap(),
        ValueExpr::missing(ValueKind::Datetime).unwrap(),
        ValueExpr::logical(false),
        ValueExpr::missing(ValueKind::Logical).unwrap(),
        ValueExpr::number(-0.25).unwrap(),
        ValueExpr::missing(ValueKind::Number).unwrap(),
        ValueExpr::text(""),
        ValueExpr::missing(ValueKind::Text).unwrap(),
        ValueExpr::exponential(0.5).unwrap(),
        ValueExpr::normal(1.0, 0.0).unwrap(),
        ValueExpr::uniform(-3.0, 3.0).unwrap(),
    ];
    for kind in ValueKind::ALL {
        assert!(values.iter().any(|v| v.kind() == kind), "no {} value", kind);
    }
    for value in values {
        let json = value_to_json(&value);
        assert_eq!(value_from_json(&json).unwrap(), value, "{}", json);
    }
}

#[test]
fn test_datetimes_outside_four_digit_years_round_trip() {
    for millis in [253_402_300_800_000, -62_198_755_200_000] {
        let dt = Datetime::from_millis(millis).unwrap();
        let program = Program::with_pipelines(vec![StepPipeline::new(vec![
            Step::Sequence {
                column: "n".into(),
                count: 1,
            },
            Step::Create {
                column: "when".into(),
                value: ValueExpr::datetime(dt),
            },
        ])]);
        let text = program_to_string(&program, false);
        assert_eq!(program_from_str(&text).unwrap(), program, "{}", text);
    }
}

// ============================================================================
// Malformed input
// ============================================================================

#[test]
fn test_invalid_parameters_rejected_on_load() {
    let err = value_from_json(&json!(["@value", "uniform", 5, 1])).unwrap_err();
    assert!(matches!(
        err,
        PersistError::Value(ValueError::InvertedRange { .. })
    ));

    let err = value_from_json(&json!(["@value", "exponential", 0])).unwrap_err();
    assert!(matches!(err, PersistError::Value(ValueError::BadRate(_))));

    let err = value_from_json(&json!(["@value", "column", ""])).unwrap_err();
    assert!(matches!(err, PersistError::Value(ValueError::EmptyColumnName)));
}

#[test]
fn test_wrong_family_rejected() {
    let err = value_from_json(&json!(["@transform", "rownum"])).unwrap_err();
    assert!(matches!(
        err,
        PersistError::WrongFamily {
            expected: "@value",
            ..
        }
    ));

    let err = pipeline_from_json(&json!({"steps": []})).unwrap_err();
    assert!(matches!(err, PersistError::WrongFamily { .. }));
}

#[test]
fn test_unknown_kind_rejected() {
    let err = value_from_json(&json!(["@value", "poisson", 1])).unwrap_err();
    assert!(matches!(err, PersistError::UnknownKind { .. }));
    assert!(err.to_string().contains("poisson"));

    let err = step_from_json(&json!(["@transform", "sort", "x"])).unwrap_err();
    assert!(matches!(err, PersistError::UnknownKind { .. }));
}

#[test]
fn test_wrong_arity_and_types_rejected() {
    for bad in [
        json!(["@value", "normal", 0]),
        json!(["@value", "number", "three"]),
        json!(["@value", "rownum", 1]),
        json!(["@value"]),
    ] {
        assert!(
            matches!(value_from_json(&bad), Err(PersistError::Malformed(_))),
            "accepted {}",
            bad
        );
    }

    for bad in [
        json!(["@transform", "sequence", "n", -1]),
        json!(["@transform", "sequence", "n", 1.5]),
        json!(["@transform", "select", "n"]),
        json!(["@transform", "saveAs"]),
    ] {
        assert!(
            matches!(step_from_json(&bad), Err(PersistError::Malformed(_))),
            "accepted {}",
            bad
        );
    }
}

#[test]
fn test_invalid_json_text() {
    let err = program_from_str("[\"@program\",").unwrap_err();
    assert!(matches!(err, PersistError::Json(_)));
}

#[test]
fn test_nested_error_reaches_program_load() {
    let text = r#"["@program", ["@pipeline",
        ["@transform", "create", "x", ["@value", "normal", 0, -1]]]]"#;
    let err = program_from_str(text).unwrap_err();
    assert!(matches!(err, PersistError::Value(ValueError::BadStdDev(_))));
}

#[test]
fn test_empty_program_loads() {
    let program = program_from_str(r#"["@program"]"#).unwrap();
    assert!(program.is_empty());
}

// ============================================================================
// Tables and reports
// ============================================================================

#[test]
fn test_table_from_records() {
    let table = table_from_str(r#"[{"a": 1, "b": "x"}, {"a": 2.5, "c": null}]"#).unwrap();
    assert_eq!(table.columns, vec!["a", "b", "c"]);
    assert_eq!(table.get(0, "a"), Scalar::Integer(1));
    assert_eq!(table.get(1, "a"), Scalar::Number(2.5));
    assert_eq!(table.get(1, "b"), Scalar::Missing);
    assert_eq!(table.get(1, "c"), Scalar::Missing);
}

#[test]
fn test_table_rejects_bad_shapes() {
    assert!(matches!(
        table_from_str(r#"{"a": 1}"#),
        Err(ConvertError::NotArray)
    ));
    assert!(matches!(
        table_from_str(r#"[{"a": 1}, 3]"#),
        Err(ConvertError::RowNotObject { row: 1 })
    ));
    assert!(matches!(
        table_from_str(r#"[{"a": [1]}]"#),
        Err(ConvertError::NotScalar { row: 0, .. })
    ));
}

#[test]
fn test_text_is_not_guessed_as_datetime() {
    assert_eq!(
        json_to_scalar(json!("2020-01-01")),
        Some(Scalar::Text("2020-01-01".into()))
    );
}

#[test]
fn test_table_to_json_fills_missing_cells() {
    let table = table_from_str(r#"[{"a": 1}, {"b": true}]"#).unwrap();
    assert_eq!(
        table_to_json(&table),
        json!([{"a": 1, "b": null}, {"a": null, "b": true}])
    );
}

#[test]
fn test_report_lists_results_and_log() {
    let mut env = Environment::new();
    env.set_result("t", table_from_str(r#"[{"x": 1}]"#).unwrap());
    env.append_log(Severity::Warning, "careful");

    assert_eq!(
        report(&env),
        json!({
            "results": {"t": [{"x": 1}]},
            "log": [{"severity": "warning", "message": "careful"}]
        })
    );
}
