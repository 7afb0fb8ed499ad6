//! Minimal view layer: components render a [`Node`] tree from store state
//! and are re-rendered through an explicit store subscription.

mod component;
mod node;

pub use component::{mount, Component, Mounted, ViewError};
pub use node::Node;
