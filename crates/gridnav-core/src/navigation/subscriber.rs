//! Active-node change subscriber trait

use super::ActiveNodeChange;

/// Trait for components that need to follow the keyboard cursor
pub trait NavigationSubscriber: Send + Sync {
    /// Called after the active node changed
    fn on_active_node_change(&self, change: &ActiveNodeChange);
}
