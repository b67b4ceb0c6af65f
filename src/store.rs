use anyhow::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db;

/// Fixed slot key the collection persists under.
pub const STATE_KEY: &str = "assessments";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    pub name: String,
    pub weightage: f64,
    pub score: f64,
}

/// The not-yet-committed row being composed in the add form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DraftAssessment {
    pub name: String,
    pub weightage: f64,
    pub score: f64,
}

/// At most one row is under edit at a time; the slot holds a working copy of
/// that row, never a reference into the committed list.
#[derive(Debug, Clone, PartialEq)]
pub enum EditingState {
    Idle,
    Editing(Assessment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Weightage,
    Score,
}

impl Field {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Self::Name),
            "weightage" => Some(Self::Weightage),
            "score" => Some(Self::Score),
            _ => None,
        }
    }
}

/// Form fields deliver numbers either as JSON numbers or as raw text. A value
/// that does not parse, is not finite, or falls outside [0, 100] is rejected.
fn accept_percent(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    if parsed.is_finite() && (0.0..=100.0).contains(&parsed) {
        Some(parsed)
    } else {
        None
    }
}

fn apply_field(
    name: &mut String,
    weightage: &mut f64,
    score: &mut f64,
    field: Field,
    value: &serde_json::Value,
) {
    match field {
        Field::Name => {
            if let Some(s) = value.as_str() {
                *name = s.to_string();
            }
        }
        Field::Weightage => {
            if let Some(v) = accept_percent(value) {
                *weightage = v;
            }
        }
        Field::Score => {
            if let Some(v) = accept_percent(value) {
                *score = v;
            }
        }
    }
}

/// Owns the assessment list, the add-form draft, and the editing slot. All
/// mutations go through the named methods below; persistence is an explicit
/// call the IPC layer makes after each committed mutation.
#[derive(Debug)]
pub struct AssessmentStore {
    assessments: Vec<Assessment>,
    draft: DraftAssessment,
    editing: EditingState,
    // Seeded from max(id)+1 at load; ids are never reused after deletions.
    next_id: i64,
}

impl AssessmentStore {
    /// Hydrate from the persisted slot. Absent or malformed state starts the
    /// store empty; a malformed blob is logged and otherwise ignored.
    pub fn load(conn: &Connection) -> Self {
        let assessments = match db::state_get_json(conn, STATE_KEY) {
            Ok(Some(raw)) => match serde_json::from_value::<Vec<Assessment>>(raw) {
                Ok(list) => list,
                Err(e) => {
                    warn!("ignoring malformed '{}' state: {}", STATE_KEY, e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("ignoring unreadable '{}' state: {}", STATE_KEY, e);
                Vec::new()
            }
        };
        let next_id = assessments.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        Self {
            assessments,
            draft: DraftAssessment::default(),
            editing: EditingState::Idle,
            next_id,
        }
    }

    pub fn assessments(&self) -> &[Assessment] {
        &self.assessments
    }

    pub fn draft(&self) -> &DraftAssessment {
        &self.draft
    }

    pub fn editing(&self) -> Option<&Assessment> {
        match &self.editing {
            EditingState::Idle => None,
            EditingState::Editing(a) => Some(a),
        }
    }

    /// Commit the draft as a new assessment at the end of the list and reset
    /// the draft for the next entry. Returns the assigned id.
    pub fn add(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        let draft = std::mem::take(&mut self.draft);
        self.assessments.push(Assessment {
            id,
            name: draft.name,
            weightage: draft.weightage,
            score: draft.score,
        });
        id
    }

    /// Begin editing the row with the given id: a copy goes into the editing
    /// slot and the committed list stays untouched until `update`. Starting a
    /// new edit replaces any edit already in progress, dropping its unsaved
    /// values. Returns false for an unknown id.
    pub fn edit(&mut self, id: i64) -> bool {
        let Some(found) = self.assessments.iter().find(|a| a.id == id) else {
            return false;
        };
        self.editing = EditingState::Editing(found.clone());
        true
    }

    /// Commit the editing copy back over the matching row, keeping its
    /// position, and return to idle. Returns false when nothing was being
    /// edited or the row was deleted mid-edit (the list is left unchanged).
    pub fn update(&mut self) -> bool {
        let EditingState::Editing(edited) =
            std::mem::replace(&mut self.editing, EditingState::Idle)
        else {
            return false;
        };
        match self.assessments.iter_mut().find(|a| a.id == edited.id) {
            Some(slot) => {
                *slot = edited;
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = EditingState::Idle;
    }

    /// Remove the assessment with the given id; no-op for unknown ids.
    pub fn delete(&mut self, id: i64) -> bool {
        let before = self.assessments.len();
        self.assessments.retain(|a| a.id != id);
        self.assessments.len() != before
    }

    /// Apply a field-change intent to the draft row. Invalid numeric input is
    /// dropped and the field keeps its previous value.
    pub fn set_draft_field(&mut self, field: Field, value: &serde_json::Value) {
        let d = &mut self.draft;
        apply_field(&mut d.name, &mut d.weightage, &mut d.score, field, value);
    }

    /// Same as `set_draft_field`, against the row under edit. Returns false
    /// when no edit is in progress.
    pub fn set_editing_field(&mut self, field: Field, value: &serde_json::Value) -> bool {
        let EditingState::Editing(a) = &mut self.editing else {
            return false;
        };
        apply_field(&mut a.name, &mut a.weightage, &mut a.score, field, value);
        true
    }

    /// Write the collection to its slot, including when it is empty.
    pub fn persist(&self, conn: &Connection) -> Result<()> {
        db::state_set_json(conn, STATE_KEY, &serde_json::to_value(&self.assessments)?)
    }

    /// Post-mutation sync for add/update: skips the write when the collection
    /// is empty. Delete goes through `persist` instead.
    pub fn sync_after_change(&self, conn: &Connection) -> Result<()> {
        if self.assessments.is_empty() {
            return Ok(());
        }
        self.persist(conn)
    }
}
