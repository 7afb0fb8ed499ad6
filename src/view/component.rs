use super::node::Node;
use crate::store::{Listener, Subscription};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("no control '{id}' in the current frame")]
    UnknownControl { id: String },
}

/// A view bound to one store.
///
/// `render` is a pure function of the state; the component only decides
/// which store it reads and what a click on each control does.
pub trait Component: Send + Sync + 'static {
    type State: Clone + Send + Sync + 'static;

    fn state(&self) -> Self::State;

    fn subscribe(&self, listener: Listener<Self::State>) -> Subscription;

    fn render(state: &Self::State) -> Node;

    /// Handle activation of the control with `id`.
    fn on_click(&self, id: &str);
}

/// A component registered with its store.
///
/// Every store change re-renders into [`frame`](Mounted::frame). Dropping
/// the value (or calling [`unmount`](Mounted::unmount)) unsubscribes.
pub struct Mounted<C: Component> {
    component: C,
    frame: Arc<RwLock<Node>>,
    renders: Arc<AtomicUsize>,
    subscription: Subscription,
}

/// Render `component` once and subscribe it to its store.
pub fn mount<C: Component>(component: C) -> Mounted<C> {
    let frame = Arc::new(RwLock::new(C::render(&component.state())));
    let renders = Arc::new(AtomicUsize::new(1));

    let subscription = component.subscribe(Box::new({
        let frame = Arc::clone(&frame);
        let renders = Arc::clone(&renders);
        move |state: &C::State| {
            let node = C::render(state);
            *frame.write() = node;
            renders.fetch_add(1, Ordering::SeqCst);
        }
    }));
    tracing::debug!(component = std::any::type_name::<C>(), "mounted");

    Mounted {
        component,
        frame,
        renders,
        subscription,
    }
}

impl<C: Component> Mounted<C> {
    /// The most recent render.
    pub fn frame(&self) -> Node {
        self.frame.read().clone()
    }

    /// How many times the component has rendered, including the first.
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    /// Activate the control `id` if the current frame shows it.
    pub fn click(&self, id: &str) -> Result<(), ViewError> {
        if self.frame.read().find_button(id).is_none() {
            return Err(ViewError::UnknownControl { id: id.to_string() });
        }
        self.component.on_click(id);
        Ok(())
    }

    /// Stop re-rendering and hand the component back.
    pub fn unmount(self) -> C {
        let Mounted {
            component,
            subscription,
            ..
        } = self;
        subscription.unsubscribe();
        tracing::debug!(component = std::any::type_name::<C>(), "unmounted");
        component
    }
}
