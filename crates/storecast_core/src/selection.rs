//! crates/storecast_core/src/selection.rs
//!
//! Store targeting for the message composer. Exactly one input method is
//! active at a time; the committed selection is always derived from the
//! store directory, so it stays in directory order and can never contain a
//! store the directory does not.

use uuid::Uuid;

use crate::domain::Store;
use serde::{Deserialize, Serialize};

/// The input method currently governing store targeting.
///
/// The modes are mutually exclusive. Switching to a different mode resets
/// the committed selection, so a selection can never mix stores picked
/// under different methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// No method chosen yet; the selection is necessarily empty.
    #[default]
    None,
    /// Comma-separated store codes typed by hand.
    Manual,
    /// Stores ticked in the searchable picker.
    Picker,
    /// The entire active directory.
    All,
}

/// The committed selection: the active mode plus the selected stores, kept
/// in directory order.
#[derive(Debug, Clone, Default)]
pub struct StoreSelection {
    mode: SelectionMode,
    selected: Vec<Store>,
}

impl StoreSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn selected(&self) -> &[Store] {
        &self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Enters manual mode and discards any previous selection, whichever
    /// mode produced it.
    pub fn choose_manual(&mut self) {
        self.mode = SelectionMode::Manual;
        self.selected.clear();
    }

    /// Enters picker mode. Coming from a different mode this discards the
    /// previous selection; re-opening the picker while already in picker
    /// mode keeps the committed selection so it can seed the modal.
    pub fn choose_picker(&mut self) {
        if self.mode != SelectionMode::Picker {
            self.mode = SelectionMode::Picker;
            self.selected.clear();
        }
    }

    /// Selects the entire directory in one action.
    pub fn choose_all(&mut self, directory: &[Store]) {
        self.mode = SelectionMode::All;
        self.selected = directory.to_vec();
    }

    /// Replaces the selection with the directory stores whose code matches
    /// a token of `input`. Matching is case-insensitive and unmatched
    /// tokens are dropped silently.
    pub fn apply_manual_input(&mut self, input: &str, directory: &[Store]) {
        let tokens = manual_tokens(input);
        self.mode = SelectionMode::Manual;
        self.selected = directory
            .iter()
            .filter(|store| tokens.contains(&store.code.to_uppercase()))
            .cloned()
            .collect();
    }

    /// Commits a picker submission: the directory stores whose ids appear
    /// in `ids`, in directory order.
    pub fn commit_picker(&mut self, ids: &[Uuid], directory: &[Store]) {
        self.mode = SelectionMode::Picker;
        self.selected = resolve_ids(directory, ids);
    }

    /// Removes a single store from the selection (the chip dismiss
    /// action). The mode is left as-is.
    pub fn remove(&mut self, store_id: Uuid) {
        self.selected.retain(|store| store.id != store_id);
    }
}

/// Splits a comma-separated code list into trimmed, uppercased tokens,
/// dropping empty segments.
fn manual_tokens(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|token| token.trim().to_uppercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// The stores whose ids appear in `ids`, in directory order. Ids that do
/// not resolve are dropped silently.
pub fn resolve_ids(directory: &[Store], ids: &[Uuid]) -> Vec<Store> {
    directory
        .iter()
        .filter(|store| ids.contains(&store.id))
        .cloned()
        .collect()
}

/// Stores matching `query` as a case-insensitive substring of the name,
/// code, or area. Stores without an area never match on area; an empty
/// query matches everything.
pub fn filter_stores<'a>(directory: &'a [Store], query: &str) -> Vec<&'a Store> {
    let needle = query.to_lowercase();
    directory
        .iter()
        .filter(|store| {
            store.name.to_lowercase().contains(&needle)
                || store.code.to_lowercase().contains(&needle)
                || store
                    .area
                    .as_deref()
                    .is_some_and(|area| area.to_lowercase().contains(&needle))
        })
        .collect()
}

/// The picker modal's working state.
///
/// The provisional set diverges from the committed selection until it is
/// submitted, so cancelling the modal discards every provisional change.
#[derive(Debug, Clone, Default)]
pub struct PickerSession {
    query: String,
    provisional: Vec<Uuid>,
}

impl PickerSession {
    /// Opens the picker seeded with the currently committed selection.
    pub fn seeded_from(selection: &StoreSelection) -> Self {
        Self {
            query: String::new(),
            provisional: selection.selected().iter().map(|store| store.id).collect(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn provisional(&self) -> &[Uuid] {
        &self.provisional
    }

    pub fn set_query(&mut self, query: String) {
        self.query = query;
    }

    /// The directory stores visible under the current query.
    pub fn filtered<'a>(&self, directory: &'a [Store]) -> Vec<&'a Store> {
        filter_stores(directory, &self.query)
    }

    /// Ticks or unticks a single store.
    pub fn toggle(&mut self, store_id: Uuid) {
        if let Some(position) = self.provisional.iter().position(|id| *id == store_id) {
            self.provisional.remove(position);
        } else {
            self.provisional.push(store_id);
        }
    }

    /// Replaces the provisional set with the currently filtered subset.
    /// The unfiltered directory is deliberately not touched.
    pub fn select_all_filtered(&mut self, directory: &[Store]) {
        self.provisional = self
            .filtered(directory)
            .into_iter()
            .map(|store| store.id)
            .collect();
    }

    /// Unticks the currently filtered subset, leaving provisional picks
    /// that fall outside the query in place.
    pub fn deselect_all_filtered(&mut self, directory: &[Store]) {
        let visible: Vec<Uuid> = self
            .filtered(directory)
            .into_iter()
            .map(|store| store.id)
            .collect();
        self.provisional.retain(|id| !visible.contains(id));
    }

    /// Commits the provisional set wholesale into `selection`, consuming
    /// the modal state.
    pub fn submit(self, selection: &mut StoreSelection, directory: &[Store]) {
        selection.commit_picker(&self.provisional, directory);
    }
}
