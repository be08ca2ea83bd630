use crate::catalog::LOADING_PLACEHOLDER_ID;

/// Currently chosen provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Unselected,
    Selected(String),
}

/// What a selection event did to the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    /// Nothing chosen.
    Cleared,
    /// The loading placeholder was picked; the visible control must be reset.
    Rejected,
    Selected(String),
}

impl SelectionState {
    pub fn selected(&self) -> Option<&str> {
        match self {
            SelectionState::Unselected => None,
            SelectionState::Selected(id) => Some(id),
        }
    }

    /// Apply a selection event carrying the selector's raw value.
    pub fn apply(&mut self, value: &str) -> SelectionChange {
        if value.is_empty() {
            *self = SelectionState::Unselected;
            return SelectionChange::Cleared;
        }
        if value == LOADING_PLACEHOLDER_ID {
            *self = SelectionState::Unselected;
            return SelectionChange::Rejected;
        }
        *self = SelectionState::Selected(value.to_string());
        SelectionChange::Selected(value.to_string())
    }
}
