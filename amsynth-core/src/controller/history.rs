use amsynth_types::{ParamId, Preset};

/// One undoable edit of the working preset.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// A single parameter; `value` is what undo restores.
    Param { id: ParamId, value: f32 },
    /// The whole preset as it was before a randomise.
    Randomise { snapshot: Box<Preset> },
}

impl Change {
    pub fn param(id: ParamId, value: f32) -> Self {
        Change::Param { id, value }
    }

    pub fn randomise(snapshot: &Preset) -> Self {
        Change::Randomise {
            snapshot: Box::new(snapshot.clone()),
        }
    }
}

/// Undo and redo stacks over [`Change`]s.
#[derive(Debug, Default)]
pub struct ChangeHistory {
    undo_stack: Vec<Change>,
    redo_stack: Vec<Change>,
}

impl ChangeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new edit. Anything previously undone is no longer redoable.
    pub fn push(&mut self, change: Change) {
        self.undo_stack.push(change);
        self.redo_stack.clear();
    }

    /// Revert the most recent edit on `preset`. Returns false if there was
    /// nothing to undo.
    pub fn undo(&mut self, preset: &mut Preset) -> bool {
        let Some(change) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(create_inverse(&change, preset));
        apply_change(change, preset);
        true
    }

    /// Reapply the most recently undone edit on `preset`.
    pub fn redo(&mut self, preset: &mut Preset) -> bool {
        let Some(change) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(create_inverse(&change, preset));
        apply_change(change, preset);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

/// Capture the live state that `change` is about to overwrite.
fn create_inverse(change: &Change, preset: &Preset) -> Change {
    match change {
        Change::Param { id, .. } => Change::param(*id, preset.parameter(*id).value()),
        Change::Randomise { .. } => Change::randomise(preset),
    }
}

fn apply_change(change: Change, preset: &mut Preset) {
    match change {
        Change::Param { id, value } => preset.parameter(id).set_value(value),
        Change::Randomise { snapshot } => preset.assign_from(&snapshot),
    }
}
