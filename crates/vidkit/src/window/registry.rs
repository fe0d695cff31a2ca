//! Window arena and hierarchy
//!
//! Windows live in a slot map keyed by [`WindowId`]. Parent/child links are
//! stored as ids: each window records its parent and an ordered child list,
//! and the registry keeps a flat creation-order list for iteration.

use super::Window;
use crate::error::{VideoError, VideoResult};
use crate::foundation::collections::{HandleMap, WindowId};

/// Window registry
#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: HandleMap<WindowId, Window>,
    order: Vec<WindowId>,
}

impl WindowRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a window, linking it under its parent when one is set
    pub fn insert(&mut self, window: Window) -> VideoResult<WindowId> {
        if let Some(parent) = window.parent {
            if !self.windows.contains_key(parent) {
                return Err(VideoError::InvalidWindow);
            }
        }

        let parent = window.parent;
        let id = self.windows.insert_with_key(|id| {
            let mut window = window;
            window.id = id;
            window.children.clear();
            window
        });
        self.order.push(id);
        if let Some(parent) = parent {
            self.link_child(parent, id);
        }
        Ok(id)
    }

    /// Remove a window that has no children left
    ///
    /// The window is unlinked from its parent and from the global list.
    pub fn remove(&mut self, id: WindowId) -> Option<Window> {
        let window = self.windows.get(id)?;
        debug_assert!(window.children.is_empty(), "children must be destroyed first");
        self.unlink(id);
        self.order.retain(|other| *other != id);
        self.windows.remove(id)
    }

    /// Look up a window
    pub fn get(&self, id: WindowId) -> VideoResult<&Window> {
        self.windows.get(id).ok_or(VideoError::InvalidWindow)
    }

    /// Look up a window mutably
    pub fn get_mut(&mut self, id: WindowId) -> VideoResult<&mut Window> {
        self.windows.get_mut(id).ok_or(VideoError::InvalidWindow)
    }

    /// Whether the handle resolves to a live window
    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.contains_key(id)
    }

    /// Live windows in creation order
    pub fn ids(&self) -> Vec<WindowId> {
        self.order.clone()
    }

    /// Iterate over live windows in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.order.iter().filter_map(|id| self.windows.get(*id))
    }

    /// Number of live windows
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether no window is alive
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Children of a window, most recently attached first
    pub fn children(&self, id: WindowId) -> Vec<WindowId> {
        self.windows.get(id).map(|window| window.children.clone()).unwrap_or_default()
    }

    /// Whether `ancestor` is `id` or lies on its parent chain
    pub fn is_ancestor_or_self(&self, ancestor: WindowId, id: WindowId) -> bool {
        let mut current = Some(id);
        while let Some(window) = current {
            if window == ancestor {
                return true;
            }
            current = self.windows.get(window).and_then(|w| w.parent);
        }
        false
    }

    /// Top of a window's parent chain
    pub fn toplevel(&self, id: WindowId) -> WindowId {
        let mut current = id;
        while let Some(parent) = self.windows.get(current).and_then(|w| w.parent) {
            current = parent;
        }
        current
    }

    /// Move a window under a new parent, or make it top-level
    ///
    /// The window is prepended to the new parent's child list. Attaching a
    /// window below itself or one of its descendants is rejected.
    pub fn reparent(&mut self, id: WindowId, parent: Option<WindowId>) -> VideoResult<()> {
        if !self.contains(id) {
            return Err(VideoError::InvalidWindow);
        }
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(VideoError::InvalidWindow);
            }
            if self.is_ancestor_or_self(id, parent) {
                return Err(VideoError::invalid_param("parent", "would create a cycle"));
            }
        }

        self.unlink(id);
        if let Some(window) = self.windows.get_mut(id) {
            window.parent = parent;
        }
        if let Some(parent) = parent {
            self.link_child(parent, id);
        }
        Ok(())
    }

    fn link_child(&mut self, parent: WindowId, child: WindowId) {
        if let Some(window) = self.windows.get_mut(child) {
            window.parent = Some(parent);
        }
        if let Some(parent) = self.windows.get_mut(parent) {
            parent.children.insert(0, child);
        }
    }

    fn unlink(&mut self, id: WindowId) {
        let parent = self.windows.get(id).and_then(|window| window.parent);
        if let Some(parent) = parent.and_then(|parent| self.windows.get_mut(parent)) {
            parent.children.retain(|child| *child != id);
        }
        if let Some(window) = self.windows.get_mut(id) {
            window.parent = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Rect;
    use crate::window::WindowFlags;

    fn window(parent: Option<WindowId>) -> Window {
        let mut window = Window::new("w".into(), Rect::new(0, 0, 10, 10), WindowFlags::empty());
        window.parent = parent;
        window
    }

    fn assert_consistent(registry: &WindowRegistry) {
        for window in registry.iter() {
            let mut seen = vec![window.id()];
            let mut current = window.parent();
            while let Some(parent) = current {
                assert!(!seen.contains(&parent), "parent chain cycles");
                seen.push(parent);
                current = registry.get(parent).unwrap().parent();
            }

            let listings = registry
                .iter()
                .filter(|other| other.children().contains(&window.id()))
                .count();
            assert_eq!(listings, usize::from(window.parent().is_some()));
        }
    }

    #[test]
    fn test_children_are_prepended() {
        let mut registry = WindowRegistry::new();
        let root = registry.insert(window(None)).unwrap();
        let a = registry.insert(window(Some(root))).unwrap();
        let b = registry.insert(window(Some(root))).unwrap();
        assert_eq!(registry.get(root).unwrap().children(), &[b, a]);
        assert_eq!(registry.ids(), vec![root, a, b]);
        assert_eq!(registry.toplevel(b), root);
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut registry = WindowRegistry::new();
        let root = registry.insert(window(None)).unwrap();
        let child = registry.insert(window(Some(root))).unwrap();
        let grandchild = registry.insert(window(Some(child))).unwrap();

        assert!(registry.reparent(root, Some(grandchild)).is_err());
        assert!(registry.reparent(root, Some(root)).is_err());
        assert_consistent(&registry);

        registry.reparent(grandchild, Some(root)).unwrap();
        assert_eq!(registry.get(root).unwrap().children(), &[grandchild, child]);
        assert!(registry.get(child).unwrap().children().is_empty());

        registry.reparent(child, None).unwrap();
        assert_eq!(registry.get(child).unwrap().parent(), None);
        assert_consistent(&registry);
    }

    #[test]
    fn test_remove_unlinks() {
        let mut registry = WindowRegistry::new();
        let root = registry.insert(window(None)).unwrap();
        let child = registry.insert(window(Some(root))).unwrap();
        registry.remove(child).unwrap();
        assert!(registry.get(root).unwrap().children().is_empty());
        assert_eq!(registry.get(child).unwrap_err(), VideoError::InvalidWindow);
        assert_eq!(registry.ids(), vec![root]);
    }

    #[test]
    fn test_insert_with_missing_parent_fails() {
        let mut registry = WindowRegistry::new();
        let root = registry.insert(window(None)).unwrap();
        registry.remove(root);
        assert_eq!(registry.insert(window(Some(root))).unwrap_err(), VideoError::InvalidWindow);
        assert!(registry.is_empty());
    }
}
