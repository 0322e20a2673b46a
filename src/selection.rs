use crate::registry::{Model, ModelRegistry};

/// At most one model is selected. The selection stores the model's manifest
/// index and never owns the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Unselected,
    Selected(usize),
}

#[derive(Debug, Default)]
pub struct SelectionController {
    state: Selection,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Selection {
        self.state
    }

    pub fn selected(&self) -> Option<usize> {
        match self.state {
            Selection::Selected(index) => Some(index),
            Selection::Unselected => None,
        }
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.state == Selection::Selected(index)
    }

    /// The model the editor panel binds against.
    pub fn selected_model<'a>(&self, registry: &'a ModelRegistry) -> Option<&'a Model> {
        self.selected().and_then(|index| registry.get(index))
    }

    /// Returns `false` when `index` was already selected or is not registered.
    pub fn select(&mut self, registry: &mut ModelRegistry, index: usize) -> bool {
        if self.is_selected(index) {
            return false;
        }
        if registry.get(index).is_none() {
            log::warn!("Ignoring selection of unregistered model {}", index);
            return false;
        }
        // Hide the previous outline before showing the new one.
        if let Some(previous) = self.selected() {
            if let Some(model) = registry.get_mut(previous) {
                model.set_highlight_visible(false);
            }
        }
        if let Some(model) = registry.get_mut(index) {
            model.set_highlight_visible(true);
            log::debug!("Selected model {} '{}'", index, model.name());
        }
        self.state = Selection::Selected(index);
        true
    }

    pub fn clear(&mut self, registry: &mut ModelRegistry) {
        if let Some(previous) = self.selected() {
            if let Some(model) = registry.get_mut(previous) {
                model.set_highlight_visible(false);
            }
        }
        self.state = Selection::Unselected;
    }

    pub fn on_model_destroyed(&mut self, registry: &mut ModelRegistry, index: usize) {
        if self.is_selected(index) {
            self.clear(registry);
        }
    }
}
