// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owning a layer stack and fanning its events out to listeners.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::{Command, GridError, Layer, LayerEvent, Properties};

/// Handle returned by [`LayerStack::add_listener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&LayerEvent)>;

/// The top layer of a stack plus the listeners interested in its events.
///
/// Commands enter at the top layer. Whatever event comes back, already
/// translated into the top layer's space, is handed to every listener in
/// registration order. Listeners receive a shared reference to one immutable
/// event value.
pub struct LayerStack<L> {
    top: L,
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl<L: fmt::Debug> fmt::Debug for LayerStack<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerStack")
            .field("top", &self.top)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<L: Layer> LayerStack<L> {
    /// Wraps a fully composed stack.
    pub fn new(top: L) -> Self {
        Self {
            top,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// The top layer.
    pub fn top(&self) -> &L {
        &self.top
    }

    /// Mutable access to the top layer.
    ///
    /// Events returned by direct calls should be passed to [`LayerStack::notify`].
    pub fn top_mut(&mut self) -> &mut L {
        &mut self.top
    }

    /// Unwraps the top layer.
    pub fn into_inner(self) -> L {
        self.top
    }

    /// Registers `listener` for every event leaving the top layer.
    pub fn add_listener(&mut self, listener: impl FnMut(&LayerEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Runs `command` and notifies listeners of the resulting event.
    ///
    /// Returns whether any layer handled the command.
    pub fn do_command(&mut self, command: &Command) -> Result<bool, GridError> {
        let outcome = self.top.do_command(command)?;
        if let Some(event) = &outcome.event {
            self.notify(event);
        }
        Ok(outcome.handled)
    }

    /// Hands `event` to every listener.
    pub fn notify(&mut self, event: &LayerEvent) {
        #[cfg(feature = "tracing")]
        tracing::trace!(listeners = self.listeners.len(), ?event, "notifying");
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    /// Writes the state of every layer under `prefix`.
    pub fn save_state(&self, prefix: &str, properties: &mut Properties) {
        self.top.save_state(prefix, properties);
    }

    /// Restores the state of every layer and notifies listeners of the result.
    pub fn load_state(&mut self, prefix: &str, properties: &Properties) -> Result<(), GridError> {
        if let Some(event) = self.top.load_state(prefix, properties)? {
            self.notify(&event);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::LayerStack;
    use crate::{
        Axis, Command, DataLayer, HideShowLayer, LayerEvent, LayerExt, Properties, ReorderLayer,
    };

    type Body = HideShowLayer<ReorderLayer<DataLayer>>;

    fn body() -> LayerStack<Body> {
        let data = DataLayer::new(5, 3, 10, 10);
        LayerStack::new(HideShowLayer::new(
            ReorderLayer::new(data, Axis::Column),
            Axis::Column,
        ))
    }

    #[test]
    fn listeners_see_each_event_once() {
        let mut stack = body();
        let seen: Rc<RefCell<Vec<LayerEvent>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let id = stack.add_listener(move |event| sink.borrow_mut().push(event.clone()));

        let hide = Command::Hide {
            axis: Axis::Column,
            positions: vec![0],
        };
        assert!(stack.do_command(&hide).unwrap());
        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].as_structural().is_some());

        // Handled without a change: nothing to report.
        assert!(stack.do_command(&Command::ResetReorder { axis: Axis::Column }).unwrap());
        assert_eq!(seen.borrow().len(), 1);

        assert!(!stack.do_command(&Command::SelectAll).unwrap());
        assert!(stack.remove_listener(id));
        assert!(!stack.remove_listener(id));
        stack.do_command(&Command::ShowAll { axis: Axis::Column }).unwrap();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(stack.listener_count(), 0);
    }

    #[test]
    fn state_round_trips_through_the_stack() {
        let mut stack = body();
        stack
            .do_command(&Command::Reorder {
                axis: Axis::Column,
                from: vec![4],
                to: 0,
            })
            .unwrap();
        stack
            .do_command(&Command::Hide {
                axis: Axis::Column,
                positions: vec![2],
            })
            .unwrap();
        let mut props = Properties::new();
        stack.save_state("body", &mut props);

        let mut restored = body();
        let notified = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&notified);
        restored.add_listener(move |_| *counter.borrow_mut() += 1);
        restored.load_state("body", &props).unwrap();
        assert_eq!(*notified.borrow(), 1);
        let top = restored.top();
        assert_eq!(top.column_count(), 4);
        let indexes: Vec<_> = (0..4).map(|p| top.column_index_by_position(p)).collect();
        let expected: Vec<_> = (0..4)
            .map(|p| stack.top().column_index_by_position(p))
            .collect();
        assert_eq!(indexes, expected);
    }
}
