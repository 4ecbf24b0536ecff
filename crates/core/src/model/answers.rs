use std::collections::{BTreeSet, HashMap};

static NO_SELECTION: BTreeSet<String> = BTreeSet::new();

/// Per-question multi-select state for one session.
///
/// Maps a question index to the set of option texts currently selected.
/// Membership is the only thing tracked; selection order is not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    selections: HashMap<usize, BTreeSet<String>>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `option` to the question's selection, or removes it if already selected.
    ///
    /// Returns `true` when the option is selected after the call.
    pub fn toggle(&mut self, question: usize, option: &str) -> bool {
        let set = self.selections.entry(question).or_default();
        let selected = if set.remove(option) {
            false
        } else {
            set.insert(option.to_owned());
            true
        };
        if set.is_empty() {
            self.selections.remove(&question);
        }
        selected
    }

    /// Selected options for a question; empty when it was never answered.
    #[must_use]
    pub fn selected(&self, question: usize) -> &BTreeSet<String> {
        self.selections.get(&question).unwrap_or(&NO_SELECTION)
    }

    #[must_use]
    pub fn is_selected(&self, question: usize, option: &str) -> bool {
        self.selected(question).contains(option)
    }

    /// Number of questions with at least one selection.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.selections.len()
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }
}
