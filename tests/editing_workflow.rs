use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradecalcd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradecalcd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn next(seq: &mut u32) -> String {
    *seq += 1;
    seq.to_string()
}

fn add_assessment(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    seq: &mut u32,
    name: &str,
    weightage: f64,
    score: f64,
) -> i64 {
    for (field, value) in [
        ("name", json!(name)),
        ("weightage", json!(weightage)),
        ("score", json!(score)),
    ] {
        let _ = request_ok(
            stdin,
            reader,
            &next(seq),
            "draft.setField",
            json!({ "field": field, "value": value }),
        );
    }
    let res = request_ok(stdin, reader, &next(seq), "assessments.add", json!({}));
    res.get("assessmentId")
        .and_then(|v| v.as_i64())
        .expect("assessmentId")
}

fn list_model(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    seq: &mut u32,
) -> serde_json::Value {
    request_ok(stdin, reader, &next(seq), "assessments.list", json!({}))
}

#[test]
fn switching_edits_discards_unsaved_changes() {
    let workspace = temp_dir("gradecalc-edit-switch");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let mut seq = 0_u32;

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let essay = add_assessment(&mut stdin, &mut reader, &mut seq, "Essay", 30.0, 65.0);
    let lab = add_assessment(&mut stdin, &mut reader, &mut seq, "Lab", 20.0, 85.0);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "assessments.edit",
        json!({ "id": essay }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "editing.setField",
        json!({ "field": "name", "value": "Essay (revised)" }),
    );

    // Jump to the lab row without saving; the essay rename evaporates.
    let res = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "assessments.edit",
        json!({ "id": lab }),
    );
    assert_eq!(
        res.get("editing")
            .and_then(|e| e.get("id"))
            .and_then(|v| v.as_i64()),
        Some(lab)
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "editing.setField",
        json!({ "field": "score", "value": 90.0 }),
    );
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "assessments.update",
        json!({}),
    );
    assert_eq!(updated.get("updated").and_then(|v| v.as_bool()), Some(true));

    let model = list_model(&mut stdin, &mut reader, &mut seq);
    let rows = model
        .get("assessments")
        .and_then(|v| v.as_array())
        .expect("assessments array");
    assert_eq!(rows[0].get("name").and_then(|v| v.as_str()), Some("Essay"));
    assert_eq!(rows[1].get("score").and_then(|v| v.as_f64()), Some(90.0));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn cancel_and_stale_updates_leave_the_list_alone() {
    let workspace = temp_dir("gradecalc-edit-cancel");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let mut seq = 0_u32;

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let essay = add_assessment(&mut stdin, &mut reader, &mut seq, "Essay", 30.0, 65.0);
    let lab = add_assessment(&mut stdin, &mut reader, &mut seq, "Lab", 20.0, 85.0);

    // Cancel drops the working copy.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "assessments.edit",
        json!({ "id": essay }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "editing.setField",
        json!({ "field": "weightage", "value": 99.0 }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "assessments.cancelEdit",
        json!({}),
    );
    let model = list_model(&mut stdin, &mut reader, &mut seq);
    assert!(model.get("editing").map(|v| v.is_null()).unwrap_or(false));
    let rows = model
        .get("assessments")
        .and_then(|v| v.as_array())
        .expect("assessments array");
    assert_eq!(rows[0].get("weightage").and_then(|v| v.as_f64()), Some(30.0));

    // Update with no edit in progress: nothing to commit.
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "assessments.update",
        json!({}),
    );
    assert_eq!(updated.get("updated").and_then(|v| v.as_bool()), Some(false));

    // Deleting the row mid-edit turns the later update into a no-op too.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "assessments.edit",
        json!({ "id": lab }),
    );
    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "assessments.delete",
        json!({ "id": lab }),
    );
    assert_eq!(deleted.get("deleted").and_then(|v| v.as_bool()), Some(true));
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "assessments.update",
        json!({}),
    );
    assert_eq!(updated.get("updated").and_then(|v| v.as_bool()), Some(false));

    let model = list_model(&mut stdin, &mut reader, &mut seq);
    let rows = model
        .get("assessments")
        .and_then(|v| v.as_array())
        .expect("assessments array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name").and_then(|v| v.as_str()), Some("Essay"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn draft_survives_an_edit_session() {
    let workspace = temp_dir("gradecalc-edit-draft");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let mut seq = 0_u32;

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let essay = add_assessment(&mut stdin, &mut reader, &mut seq, "Essay", 30.0, 65.0);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "draft.setField",
        json!({ "field": "name", "value": "Half-typed quiz" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "assessments.edit",
        json!({ "id": essay }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        &next(&mut seq),
        "assessments.cancelEdit",
        json!({}),
    );

    // The add-row is hidden during an edit, not cleared.
    let model = list_model(&mut stdin, &mut reader, &mut seq);
    assert_eq!(
        model
            .get("draft")
            .and_then(|d| d.get("name"))
            .and_then(|v| v.as_str()),
        Some("Half-typed quiz")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
