//! Multi-select over parcels: the selection set itself and the freehand
//! lasso that feeds it.

pub mod lasso;

use crate::data::parcel::ParcelId;
use crate::input::events::KeyModifiers;
use crate::prelude::HashSet;

pub use lasso::{LassoEngine, LassoPolygon, LassoState};

/// The set of selected parcel ids.
///
/// `revision` increases on every call that changes the contents, so readers
/// can tell cheaply whether to restyle or recount.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    ids: HashSet<ParcelId>,
    revision: u64,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self, changed: bool) -> bool {
        if changed {
            self.revision += 1;
        }
        changed
    }

    pub fn add(&mut self, id: ParcelId) -> bool {
        let changed = self.ids.insert(id);
        self.bump(changed)
    }

    pub fn remove(&mut self, id: &ParcelId) -> bool {
        let changed = self.ids.remove(id);
        self.bump(changed)
    }

    pub fn toggle(&mut self, id: ParcelId) -> bool {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
        self.bump(true)
    }

    /// Makes `{id}` the whole selection
    pub fn replace(&mut self, id: ParcelId) -> bool {
        let changed = !(self.ids.len() == 1 && self.ids.contains(&id));
        if changed {
            self.ids.clear();
            self.ids.insert(id);
        }
        self.bump(changed)
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.ids.is_empty();
        self.ids.clear();
        self.bump(changed)
    }

    /// Adds every id, keeping what is already selected
    pub fn extend<I: IntoIterator<Item = ParcelId>>(&mut self, ids: I) -> bool {
        let before = self.ids.len();
        self.ids.extend(ids);
        let changed = self.ids.len() != before;
        self.bump(changed)
    }

    /// Keeps only ids for which `keep` returns true
    pub fn retain<F: FnMut(&ParcelId) -> bool>(&mut self, keep: F) -> bool {
        let before = self.ids.len();
        self.ids.retain(keep);
        let changed = self.ids.len() != before;
        self.bump(changed)
    }

    /// Click semantics: with Ctrl/Cmd/Shift toggle `id`; without, select only
    /// `id`, or clear when `id` already is the sole selection
    pub fn apply_click(&mut self, id: ParcelId, modifiers: KeyModifiers) -> bool {
        if modifiers.is_multi_select() {
            self.toggle(id)
        } else if self.ids.len() == 1 && self.ids.contains(&id) {
            self.clear()
        } else {
            self.replace(id)
        }
    }

    pub fn contains(&self, id: &ParcelId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParcelId> {
        self.ids.iter()
    }

    /// Ids in ascending order, the form bulk actions send
    pub fn sorted_ids(&self) -> Vec<ParcelId> {
        let mut ids: Vec<ParcelId> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}
