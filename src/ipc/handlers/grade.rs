use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_grade_final(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let fg = calc::final_grade(store.assessments());
    ok(&req.id, json!({ "grade": fg.grade, "score": fg.score }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grade.final" => Some(handle_grade_final(state, req)),
        _ => None,
    }
}
