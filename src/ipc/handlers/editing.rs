use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(id) = req.params.get("id").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing id", None);
    };

    if !store.edit(id) {
        return err(&req.id, "not_found", "assessment not found", None);
    }
    ok(&req.id, json!({ "editing": store.editing() }))
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(conn), Some(store)) = (state.db.as_ref(), state.store.as_mut()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let updated = store.update();
    if updated {
        if let Err(e) = store.sync_after_change(conn) {
            return err(&req.id, "db_update_failed", e.to_string(), None);
        }
    }
    ok(&req.id, json!({ "updated": updated }))
}

fn handle_cancel_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    store.cancel_edit();
    ok(&req.id, json!({}))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assessments.edit" => Some(handle_edit(state, req)),
        "assessments.update" => Some(handle_update(state, req)),
        "assessments.cancelEdit" => Some(handle_cancel_edit(state, req)),
        _ => None,
    }
}
