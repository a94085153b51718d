//! View identities and the navigation history stack.
//!
//! [`NavigationStack`] is pure state; rendering and timers live in the
//! navigator actor. The stack never holds two consecutive identical
//! views, and once the Shutdown view is reached it is terminal.

/// The views the appliance can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum ViewIdentity {
    Player,
    Volume,
    Menu,
    Shutdown,
    /// Empty screen used in place of a backlight on displays without one.
    Blank,
}

impl ViewIdentity {
    /// Transient views are dropped rather than buried when another view
    /// is pushed over them.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Volume)
    }
}

/// The component that receives key input while a view is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum InputTarget {
    Volume,
    Menu,
}

/// One entry of the navigation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NavigationEntry {
    pub view: ViewIdentity,
    pub captured: Option<InputTarget>,
}

impl NavigationEntry {
    pub fn new(view: ViewIdentity, captured: Option<InputTarget>) -> Self {
        Self { view, captured }
    }

    /// The Player view, capturing volume keys.
    pub fn player() -> Self {
        Self::new(ViewIdentity::Player, Some(InputTarget::Volume))
    }

    pub fn volume() -> Self {
        Self::new(ViewIdentity::Volume, Some(InputTarget::Volume))
    }

    pub fn menu() -> Self {
        Self::new(ViewIdentity::Menu, Some(InputTarget::Menu))
    }

    pub fn shutdown() -> Self {
        Self::new(ViewIdentity::Shutdown, None)
    }

    pub fn blank() -> Self {
        Self::new(ViewIdentity::Blank, None)
    }
}

/// History of shown views, root first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationStack {
    entries: Vec<NavigationEntry>,
    terminal: bool,
}

impl NavigationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<NavigationEntry> {
        self.entries.last().copied()
    }

    pub fn active_view(&self) -> Option<ViewIdentity> {
        self.active().map(|e| e.view)
    }

    pub fn entries(&self) -> &[NavigationEntry] {
        &self.entries
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// True once the Shutdown view has been shown.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Push `entry`. Pushing the active identity is a no-op and returns
    /// `false`; a transient top entry is replaced instead of buried.
    pub fn push(&mut self, entry: NavigationEntry) -> bool {
        if self.terminal || self.active_view() == Some(entry.view) {
            return false;
        }
        if self.active_view().is_some_and(ViewIdentity::is_transient) {
            self.entries.pop();
            if self.active_view() == Some(entry.view) {
                return true;
            }
        }
        self.entries.push(entry);
        true
    }

    /// Pop the active entry and return the restored one. Does nothing
    /// when only the root (or nothing) remains.
    pub fn pop(&mut self) -> Option<NavigationEntry> {
        if self.terminal || self.entries.len() <= 1 {
            return None;
        }
        self.entries.pop();
        self.active()
    }

    /// Replace the active entry with the terminal Shutdown view.
    /// Returns `false` if the stack was already terminal.
    pub fn terminate(&mut self) -> bool {
        if self.terminal {
            return false;
        }
        match self.entries.last_mut() {
            Some(top) => *top = NavigationEntry::shutdown(),
            None => self.entries.push(NavigationEntry::shutdown()),
        }
        self.terminal = true;
        true
    }

    /// Remove the topmost buried occurrence of `view` below the active
    /// entry without touching the active entry. Collapses any duplicate
    /// neighbours the removal creates.
    pub fn remove_buried(&mut self, view: ViewIdentity) -> bool {
        let Some(top) = self.entries.len().checked_sub(1) else {
            return false;
        };
        let Some(idx) = self.entries[..top].iter().rposition(|e| e.view == view) else {
            return false;
        };
        self.entries.remove(idx);
        self.entries.dedup_by(|next, prev| next.view == prev.view);
        true
    }
}
