//! Click/keyboard-driven selection state machine layered on `TreeStore`.

use crate::tree::rows::{row_index, visible_rows};
use crate::tree::{Expansion, NodeId, Selection, TreeStore};

/// How a node was activated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gesture {
    /// Disclosure-control activation: flips expansion, leaves selection alone.
    pub toggle: bool,
    /// Collapse the node before applying the transition.
    pub force_collapse_first: bool,
}

impl Gesture {
    /// Row-body click.
    pub const ROW: Gesture = Gesture {
        toggle: false,
        force_collapse_first: false,
    };

    /// Click on the expand/collapse affordance, or the keyboard toggle.
    pub const TOGGLE: Gesture = Gesture {
        toggle: true,
        force_collapse_first: false,
    };

    /// Programmatic reveal: always ends expanded and selected.
    pub const REVEAL: Gesture = Gesture {
        toggle: false,
        force_collapse_first: true,
    };
}

/// Where keyboard focus should go after a keyboard toggle re-renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusRestore {
    /// The node that held focus.
    pub node: NodeId,
    /// Visible row the focused node occupied before the toggle, `None` if it
    /// was not visible.
    pub row: Option<usize>,
    /// Node now occupying that row.
    pub occupant: Option<NodeId>,
}

/// Single-selection controller.
///
/// Holds no reference to the store; every operation takes the store it acts
/// on, so the host decides which tree is current.
#[derive(Debug, Default)]
pub struct SelectionController {
    last_activated: Option<NodeId>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently selected node, if it still exists in `store`.
    pub fn last_activated(&self, store: &TreeStore) -> Option<NodeId> {
        self.last_activated.filter(|id| store.contains(*id))
    }

    /// Apply one activation to `node`. Returns `None` when the node does not
    /// exist in `store`.
    pub fn activate(
        &mut self,
        store: &mut TreeStore,
        node: NodeId,
        gesture: Gesture,
    ) -> Option<NodeId> {
        store.node(node)?;

        if gesture.force_collapse_first {
            store.set_expansion(node, Expansion::Collapsed);
        }

        if gesture.toggle {
            let flipped = store.node(node)?.expansion().toggled();
            store.set_expansion(node, flipped);
            store.notify_selection_changed(node, true);
        } else {
            let current = store.node(node)?;
            let was_selected = current.selection().is_selected();
            let is_leaf = current.children().is_empty();
            let disabled = current.is_disabled();

            if !was_selected {
                store.reset_selection();
            }

            let collapsed = store.node(node)?.expansion() == Expansion::Collapsed;
            if is_leaf && collapsed {
                store.collapse_empty_leaves();
            }
            if collapsed {
                store.set_expansion(node, Expansion::Expanded);
            }

            store.notify_selection_changed(node, false);

            if !disabled {
                store.set_selection(node, Selection::Selected);
                self.last_activated = Some(node);
            }
        }

        store.request_render();
        Some(node)
    }

    /// Select and expand the node whose id is `id`.
    ///
    /// Ancestors are left as they are; call `TreeStore::expand_ancestors`
    /// as well to make the node visible.
    pub fn reveal(&mut self, store: &mut TreeStore, id: &str) -> Option<NodeId> {
        let node = store.find_by_id(id)?;
        store.set_selection(node, Selection::NotSelected);
        self.activate(store, node, Gesture::REVEAL)
    }

    /// Keyboard toggle on the focused node.
    ///
    /// Returns the row the focused node occupied before the toggle and which
    /// node occupies it afterwards, so the view can move focus there once it
    /// has re-rendered.
    pub fn keyboard_activate(
        &mut self,
        store: &mut TreeStore,
        focused: NodeId,
    ) -> Option<FocusRestore> {
        let row = row_index(&visible_rows(store), focused);
        self.activate(store, focused, Gesture::TOGGLE)?;
        let occupant = row.and_then(|r| visible_rows(store).get(r).map(|after| after.node));
        Some(FocusRestore {
            node: focused,
            row,
            occupant,
        })
    }
}
