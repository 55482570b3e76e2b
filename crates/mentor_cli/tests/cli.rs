use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;

fn bin(store: &Path) -> Command {
    let path = assert_cmd::cargo::cargo_bin!("mentor");
    let mut cmd = Command::new(path);
    cmd.env_remove("MENTOR_MODEL_PATH")
        .env_remove("MENTOR_TOKENIZER_PATH")
        .env_remove("MENTOR_STORE")
        .arg("--store")
        .arg(store);
    cmd
}

fn trained_store(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let store = dir.path().join("data/mentor_store.json");
    bin(&store)
        .args(["train", "--sample"])
        .assert()
        .success()
        .stdout(predicate::str::contains("status=success items=10 topics=math,python"));
    store
}

#[test]
fn evaluate_before_training_fails_with_hint() {
    let dir = tempfile::tempdir().unwrap();
    bin(&dir.path().join("missing.json"))
        .args(["evaluate", "--question", "q", "--answer", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("run `mentor train` first"));
}

#[test]
fn sample_training_supports_search() {
    let dir = tempfile::tempdir().unwrap();
    let store = trained_store(&dir);

    bin(&store)
        .args(["search", "--query", "derivative of x squared", "--top-k", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rank=1 similarity="))
        .stdout(predicate::str::contains("question=What is the derivative of x²?"))
        .stdout(predicate::str::contains("rank=2").not());
}

#[test]
fn evaluate_json_output_scores_exact_answer() {
    let dir = tempfile::tempdir().unwrap();
    let store = trained_store(&dir);

    let assert = bin(&store)
        .args([
            "evaluate",
            "--json",
            "--question",
            "What is the quadratic formula?",
            "--answer",
            "The quadratic formula is x = (-b ± √(b²-4ac)) / 2a. It's used to solve quadratic equations of the form ax² + bx + c = 0.",
        ])
        .assert()
        .success();

    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["matched_question"], "What is the quadratic formula?");
    assert_eq!(json["topic"], "math");
    assert!(json["overall_score"].as_f64().unwrap() > 0.99);
    assert!(json["feedback"].as_str().unwrap().starts_with("Excellent!"));
}

#[test]
fn topics_lists_each_topic_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = trained_store(&dir);

    bin(&store)
        .arg("topics")
        .assert()
        .success()
        .stdout("math\npython\n");
}

#[test]
fn train_from_csv_and_write_sample() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");
    let csv = dir.path().join("qa.csv");
    std::fs::write(&csv, "question,answer,topic\nWhat is testing?,Verification.,qa\n,no question,qa\n").unwrap();

    bin(&store)
        .arg("train")
        .arg("--input")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("status=success items=1 topics=qa"));

    let sample_out = dir.path().join("out/training_data.json");
    bin(&store)
        .args(["train", "--sample", "--write-sample"])
        .arg(&sample_out)
        .assert()
        .success();
    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&sample_out).unwrap()).unwrap();
    assert_eq!(written.as_array().unwrap().len(), 10);
}

#[test]
fn train_requires_a_source() {
    let dir = tempfile::tempdir().unwrap();
    bin(&dir.path().join("store.json"))
        .arg("train")
        .assert()
        .failure();
}

#[test]
fn interactive_session_reads_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let store = trained_store(&dir);

    bin(&store)
        .arg("interactive")
        .write_stdin("search: prime number\nWhat is a prime number?|A number with exactly two divisors\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. [MATH] What is a prime number?"))
        .stdout(predicate::str::contains("EVALUATION RESULTS"))
        .stdout(predicate::str::contains("Thank you for using Mentor!"));
}

#[test]
fn corrupt_store_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");
    std::fs::write(&store, "not a store").unwrap();

    bin(&store)
        .arg("topics")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Corrupt store data"));
}
