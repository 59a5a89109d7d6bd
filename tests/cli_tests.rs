//! qplan-explain binary tests

use std::io::Write;
use std::process::Command;

use tempfile::NamedTempFile;

use qplan::catalog::TableOid;
use qplan::planner::{Expression, ExpressionType, HashPlan, PlanNodeBuilder, SeqScanPlan};

fn explain() -> Command {
    Command::new(env!("CARGO_BIN_EXE_qplan-explain"))
}

fn plan_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_explain_and_check() {
    let plan = HashPlan::builder()
        .hash_key(Expression::parameter(0))
        .add_child(
            SeqScanPlan::builder()
                .table_oid(TableOid(1001))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let file = plan_file(&plan.to_json_pretty().unwrap());

    let output = explain().arg(file.path()).arg("--check").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Hash: [$0]"), "{}", stdout);
    assert!(stdout.contains("  SeqScan: table=1001"), "{}", stdout);
    assert!(stdout.contains(&format!("hash: {:016x}", plan.plan_hash())));
    assert!(stdout.contains("round trip: ok"));
}

#[test]
fn test_check_decimal_literals() {
    let literal = |v: f64| {
        Expression::compare(
            ExpressionType::CompareEqual,
            Expression::parameter(0),
            Expression::constant(v),
        )
        .unwrap()
    };
    let plan = SeqScanPlan::builder()
        .table_oid(TableOid(1001))
        .predicate(Expression::and(
            literal(985.6906946328695),
            Expression::and(literal(f64::INFINITY), literal(f64::NAN)),
        ))
        .build()
        .unwrap();
    let file = plan_file(&plan.to_json_string().unwrap());

    let output = explain().arg(file.path()).arg("--check").output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(output.status.success(), "{}", stdout);
    assert!(stdout.contains(&format!("hash: {:016x}", plan.plan_hash())));
    assert!(stdout.contains("round trip: ok"));
}

#[test]
fn test_malformed_plan_exit_code() {
    let file = plan_file(r#"{"plan_node_type": "TABLESAMPLE", "children": []}"#);
    let output = explain().arg(file.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Malformed plan"), "{}", stderr);
}

#[test]
fn test_missing_file_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let output = explain()
        .arg(dir.path().join("absent.json"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}
