use std::collections::HashMap;

use tidyblocks::pipeline::derive_seed;
use tidyblocks::{
    Environment, EvalError, Pipeline, PipelineError, Row, Scalar, Step, StepPipeline, Table,
    ValueExpr,
};

fn row(pairs: Vec<(&str, Scalar)>) -> Row {
    let mut map = HashMap::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v);
    }
    map
}

fn people() -> Table {
    Table::from_rows(vec![
        row(vec![
            ("name", Scalar::Text("ada".into())),
            ("keep", Scalar::Logical(true)),
        ]),
        row(vec![
            ("name", Scalar::Text("bob".into())),
            ("keep", Scalar::Logical(false)),
        ]),
        row(vec![
            ("name", Scalar::Text("cy".into())),
            ("keep", Scalar::Missing),
        ]),
    ])
}

fn run_steps(steps: Vec<Step>, env: &mut Environment) -> Result<(), PipelineError> {
    StepPipeline::new(steps).run(env)
}

fn save(label: &str) -> Step {
    Step::SaveAs {
        label: label.into(),
    }
}

fn sequence(column: &str, count: usize) -> Step {
    Step::Sequence {
        column: column.into(),
        count,
    }
}

// ============================================================================
// Source steps
// ============================================================================

#[test]
fn test_sequence_counts_from_one() {
    let mut env = Environment::new();
    run_steps(vec![sequence("n", 3), save("out")], &mut env).unwrap();

    let table = env.result("out").unwrap();
    assert_eq!(table.columns, vec!["n".to_string()]);
    assert_eq!(table.get(0, "n"), Scalar::Integer(1));
    assert_eq!(table.get(2, "n"), Scalar::Integer(3));
}

#[test]
fn test_data_reads_user_dataset() {
    let mut env = Environment::new().with_user_data("people", people());
    run_steps(
        vec![
            Step::Data {
                name: "people".into(),
            },
            save("out"),
        ],
        &mut env,
    )
    .unwrap();
    assert_eq!(env.result("out").unwrap(), &people());
}

#[test]
fn test_data_unknown_dataset() {
    let mut env = Environment::new();
    let err = run_steps(
        vec![Step::Data {
            name: "nope".into(),
        }],
        &mut env,
    )
    .unwrap_err();
    assert_eq!(err, PipelineError::UnknownDataset("nope".into()));
}

#[test]
fn test_read_missing_result() {
    let mut env = Environment::new();
    let err = run_steps(
        vec![Step::Read {
            label: "later".into(),
        }],
        &mut env,
    )
    .unwrap_err();
    assert_eq!(err, PipelineError::MissingResult("later".into()));
}

#[test]
fn test_transform_without_source_fails() {
    let mut env = Environment::new();
    let err = run_steps(vec![save("out")], &mut env).unwrap_err();
    assert_eq!(err, PipelineError::NoInput("saveAs"));
    assert!(!env.has_result("out"));
}

// ============================================================================
// Transform steps
// ============================================================================

#[test]
fn test_create_adds_column() {
    let mut env = Environment::new();
    run_steps(
        vec![
            sequence("n", 3),
            Step::Create {
                column: "row".into(),
                value: ValueExpr::rownum(),
            },
            save("out"),
        ],
        &mut env,
    )
    .unwrap();

    let table = env.result("out").unwrap();
    assert_eq!(table.columns, vec!["n".to_string(), "row".to_string()]);
    assert_eq!(table.get(2, "row"), Scalar::Integer(2));
}

#[test]
fn test_create_overwrites_existing_column() {
    let mut env = Environment::new();
    run_steps(
        vec![
            sequence("n", 2),
            Step::Create {
                column: "n".into(),
                value: ValueExpr::text("x"),
            },
            save("out"),
        ],
        &mut env,
    )
    .unwrap();

    let table = env.result("out").unwrap();
    assert_eq!(table.columns.len(), 1);
    assert_eq!(table.get(1, "n"), Scalar::Text("x".into()));
}

#[test]
fn test_create_with_missing_column_fails() {
    let mut env = Environment::new();
    let err = run_steps(
        vec![
            sequence("n", 2),
            Step::Create {
                column: "copy".into(),
                value: ValueExpr::column("m").unwrap(),
            },
        ],
        &mut env,
    )
    .unwrap_err();
    assert_eq!(
        err,
        PipelineError::Eval(EvalError::MissingColumn {
            column: "m".into(),
            row: 0
        })
    );
}

#[test]
fn test_create_with_absent_value_fails() {
    let mut env = Environment::new();
    let err = run_steps(
        vec![
            sequence("n", 1),
            Step::Create {
                column: "x".into(),
                value: ValueExpr::absent(),
            },
        ],
        &mut env,
    )
    .unwrap_err();
    assert_eq!(err, PipelineError::Eval(EvalError::Incomplete));
}

#[test]
fn test_filter_keeps_only_true_rows() {
    let mut env = Environment::new().with_user_data("people", people());
    run_steps(
        vec![
            Step::Data {
                name: "people".into(),
            },
            Step::Filter {
                value: ValueExpr::column("keep").unwrap(),
            },
            save("out"),
        ],
        &mut env,
    )
    .unwrap();

    let table = env.result("out").unwrap();
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.get(0, "name"), Scalar::Text("ada".into()));
}

#[test]
fn test_filter_rejects_non_logical() {
    let mut env = Environment::new();
    let err = run_steps(
        vec![
            sequence("n", 2),
            Step::Filter {
                value: ValueExpr::column("n").unwrap(),
            },
        ],
        &mut env,
    )
    .unwrap_err();
    assert_eq!(
        err,
        PipelineError::NotLogical {
            row: 0,
            found: "integer"
        }
    );
}

#[test]
fn test_select_keeps_named_columns_in_order() {
    let mut env = Environment::new().with_user_data("people", people());
    run_steps(
        vec![
            Step::Data {
                name: "people".into(),
            },
            Step::Select {
                columns: vec!["name".into()],
            },
            save("out"),
        ],
        &mut env,
    )
    .unwrap();

    let table = env.result("out").unwrap();
    assert_eq!(table.columns, vec!["name".to_string()]);
    assert!(table.rows.iter().all(|r| !r.contains_key("keep")));
}

#[test]
fn test_select_unknown_column() {
    let mut env = Environment::new();
    let err = run_steps(
        vec![
            sequence("n", 2),
            Step::Select {
                columns: vec!["n".into(), "z".into()],
            },
        ],
        &mut env,
    )
    .unwrap_err();
    assert_eq!(err, PipelineError::UnknownColumn("z".into()));
}

#[test]
fn test_save_as_mid_pipeline_passes_table_on() {
    let mut env = Environment::new();
    run_steps(
        vec![
            sequence("n", 3),
            save("all"),
            Step::Filter {
                value: ValueExpr::logical(false),
            },
            save("none"),
        ],
        &mut env,
    )
    .unwrap();

    assert_eq!(env.result("all").unwrap().row_count(), 3);
    assert_eq!(env.result("none").unwrap().row_count(), 0);
}

// ============================================================================
// Pipeline contract
// ============================================================================

#[test]
fn test_requires_lists_reads_without_duplicates() {
    let pipeline = StepPipeline::new(vec![
        Step::Read { label: "b".into() },
        save("x"),
        Step::Read { label: "a".into() },
        Step::Read { label: "b".into() },
        save("y"),
        save("x"),
    ]);
    assert_eq!(pipeline.requires(), vec!["b".to_string(), "a".to_string()]);
    assert_eq!(pipeline.produces(), vec!["x".to_string(), "y".to_string()]);
}

#[test]
fn test_pipeline_without_reads_requires_nothing() {
    let pipeline = StepPipeline::new(vec![sequence("n", 1), save("x")]);
    assert!(pipeline.requires().is_empty());
}

#[test]
fn test_reseed_gives_reproducible_pipelines() {
    let steps = vec![
        sequence("n", 5),
        Step::Create {
            column: "u".into(),
            value: ValueExpr::uniform(0.0, 1.0).unwrap(),
        },
        Step::Create {
            column: "v".into(),
            value: ValueExpr::uniform(0.0, 1.0).unwrap(),
        },
        save("out"),
    ];
    let mut first = StepPipeline::new(steps.clone());
    let mut second = StepPipeline::new(steps);
    first.reseed(11);
    second.reseed(11);

    let mut env_a = Environment::new();
    let mut env_b = Environment::new();
    first.run(&mut env_a).unwrap();
    second.run(&mut env_b).unwrap();

    let a = env_a.result("out").unwrap();
    assert_eq!(a, env_b.result("out").unwrap());
    // Sibling steps draw from different streams.
    assert_ne!(a.get(0, "u"), a.get(0, "v"));
}

#[test]
fn test_derive_seed_spreads_indices() {
    assert_ne!(derive_seed(1, 0), derive_seed(1, 1));
    assert_ne!(derive_seed(1, 0), derive_seed(2, 0));
    assert_eq!(derive_seed(9, 3), derive_seed(9, 3));
}

#[test]
fn test_error_display_and_source() {
    use std::error::Error;

    let err = PipelineError::from(EvalError::Incomplete);
    assert_eq!(err.to_string(), "Evaluation failed");
    assert_eq!(err.source().unwrap().to_string(), "Missing expression");

    let err = PipelineError::NoInput("filter");
    assert!(err.to_string().contains("\"filter\""));
    assert!(err.source().is_none());
}
