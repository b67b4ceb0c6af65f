use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::AssessmentStore;
use serde_json::json;

/// Everything the front-end needs to render one frame: the committed list,
/// the add-form draft, the row under edit (if any), and the derived grade.
/// The grade is recomputed on every call, never cached.
fn render_model(store: &AssessmentStore) -> serde_json::Value {
    json!({
        "assessments": store.assessments(),
        "draft": store.draft(),
        "editing": store.editing(),
        "finalGrade": calc::final_grade(store.assessments()),
    })
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ok(&req.id, render_model(store))
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(conn), Some(store)) = (state.db.as_ref(), state.store.as_mut()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let id = store.add();
    if let Err(e) = store.sync_after_change(conn) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "assessmentId": id }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(conn), Some(store)) = (state.db.as_ref(), state.store.as_mut()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(id) = req.params.get("id").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing id", None);
    };

    let deleted = store.delete(id);
    // Delete persists even when the collection ends up empty (or the id was
    // absent), unlike the post-add/update sync.
    if let Err(e) = store.persist(conn) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "deleted": deleted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assessments.list" => Some(handle_list(state, req)),
        "assessments.add" => Some(handle_add(state, req)),
        "assessments.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
