//! Keyboard navigation for virtualized data grids
//!
//! This crate provides the cursor model, the movement and scroll
//! synchronization logic and the collaborator traits a grid implements to
//! be navigated from the keyboard.

pub mod columns;
pub mod host;
pub mod navigation;
pub mod settings;

// Re-export commonly used types
pub use columns::{Column, ColumnArena, ColumnId, LayoutSpan};
pub use host::{GridHost, PivotHost};
pub use navigation::{
    ActiveNode, ActiveNodeChange, KeyEvent, KeyboardNavigation, NavigationService, NavigationSubscriber,
    NodePatch, PivotNavigationService, ScrollAxis, TargetType,
};
pub use settings::{FilterMode, GridOptions, GridSelectionMode, NavigationSettings};
