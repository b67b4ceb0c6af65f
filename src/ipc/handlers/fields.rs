use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::Field;
use serde_json::json;

/// Both set-field intents carry `{field, value}`. A missing or unknown field
/// name is protocol misuse; an out-of-range *value* is not (the store drops
/// it and the reply carries the unchanged state).
fn parse_field_change(req: &Request) -> Result<(Field, &serde_json::Value), serde_json::Value> {
    let Some(field_raw) = req.params.get("field").and_then(|v| v.as_str()) else {
        return Err(err(&req.id, "bad_params", "missing field", None));
    };
    let Some(field) = Field::parse(field_raw) else {
        return Err(err(
            &req.id,
            "bad_params",
            format!("unknown field: {}", field_raw),
            None,
        ));
    };
    let Some(value) = req.params.get("value") else {
        return Err(err(&req.id, "bad_params", "missing value", None));
    };
    Ok((field, value))
}

fn handle_draft_set_field(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let (field, value) = match parse_field_change(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    store.set_draft_field(field, value);
    ok(&req.id, json!({ "draft": store.draft() }))
}

fn handle_editing_set_field(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let (field, value) = match parse_field_change(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    if !store.set_editing_field(field, value) {
        return err(&req.id, "no_edit", "no edit in progress", None);
    }
    ok(&req.id, json!({ "editing": store.editing() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "draft.setField" => Some(handle_draft_set_field(state, req)),
        "editing.setField" => Some(handle_editing_set_field(state, req)),
        _ => None,
    }
}
