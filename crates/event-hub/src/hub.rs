//! Reentrancy-safe dispatch front end
//!
//! [`EventHub`] wraps the registry in `Rc<RefCell<…>>` rather than
//! `Arc<Mutex<…>>`: the execution model is single-threaded and handlers are
//! allowed to call `on`, `off` and `trigger` on the hub that is currently
//! firing them, which a lock would turn into a deadlock. No `RefCell`
//! borrow is ever held across a handler invocation.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::core::{Context, Delivery, Handler, HubStats, Registry};

/// Wildcard channel, fired once per triggered event name with that name in
/// [`Delivery::event`]. No parsing magic: it is an ordinary key in the
/// table, so triggering `"all"` directly also runs its bindings as the
/// direct list.
pub const ALL: &str = "all";

type WeakHandler<T> = Weak<dyn Fn(&Delivery<'_, T>)>;

/// A shared handle to one subscription table. Cloning the hub clones the
/// handle, not the table; each host object is expected to own its own hub.
pub struct EventHub<T> {
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T> Clone for EventHub<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<T: 'static> EventHub<T> {
    /// Create a hub with an empty subscription table.
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry::new())),
        }
    }

    /// Bind `handler` to each whitespace-separated name in `events`.
    ///
    /// A `None` handler makes the whole call a no-op; the permissiveness is
    /// part of the contract, not an error. Returns the hub for chaining.
    pub fn on(
        &self,
        events: &str,
        handler: impl Into<Option<Handler<T>>>,
        context: impl Into<Option<Context>>,
    ) -> &Self {
        let Some(handler) = handler.into() else {
            return self;
        };
        self.registry.borrow_mut().bind(events, handler, context.into());
        self
    }

    /// Bind a one-shot handler: for each named event the binding removes
    /// itself before its first delivery runs, so a reentrant trigger from
    /// inside the handler cannot fire it twice.
    pub fn once(
        &self,
        events: &str,
        handler: impl Into<Option<Handler<T>>>,
        context: impl Into<Option<Context>>,
    ) -> &Self {
        let Some(handler) = handler.into() else {
            return self;
        };
        let context = context.into();
        for name in events.split_whitespace() {
            // The slot holds a weak reference to the wrapper so it can
            // unbind itself by identity without creating an Rc cycle.
            let slot: Rc<RefCell<Option<WeakHandler<T>>>> = Rc::new(RefCell::new(None));
            let registered = Rc::clone(&slot);
            let table = Rc::downgrade(&self.registry);
            let event = name.to_owned();
            let inner = Rc::clone(&handler);
            let wrapper: Handler<T> = Rc::new(move |delivery| {
                let me = registered.borrow().as_ref().and_then(Weak::upgrade);
                if let (Some(table), Some(me)) = (table.upgrade(), me) {
                    table.borrow_mut().unbind(Some(&event), Some(&me), None);
                }
                inner(delivery);
            });
            *slot.borrow_mut() = Some(Rc::downgrade(&wrapper));
            self.on(name, wrapper, context.clone());
        }
        self
    }

    /// Remove every binding matching the filter; each omitted argument is a
    /// wildcard, so `off(None, None, None)` empties the table and
    /// `off(None, None, Some(ctx))` sweeps one context out of every event.
    /// Removals that match nothing are silent no-ops. Safe to call from
    /// inside a firing handler.
    pub fn off(
        &self,
        events: Option<&str>,
        handler: Option<&Handler<T>>,
        context: Option<&Context>,
    ) -> &Self {
        self.registry.borrow_mut().unbind(events, handler, context);
        self
    }

    /// Drop every binding. Equivalent to `off(None, None, None)`.
    pub fn clear(&self) -> &Self {
        let dropped = self.registry.borrow_mut().unbind(None, None, None);
        log::info!("[EventHub] cleared {dropped} binding(s)");
        self
    }

    /// Fire each whitespace-separated name in `events`, left to right, with
    /// no arguments.
    pub fn trigger(&self, events: &str) -> &Self {
        self.trigger_with(events, &[])
    }

    /// Fire each whitespace-separated name in `events`, left to right.
    ///
    /// For each name the binding list for that name and the list for
    /// [`ALL`] are both snapshotted before anything is invoked; handlers
    /// that mutate the table mid-firing update the live table, never the
    /// snapshots in flight. The `all` list is re-snapshotted for every name
    /// in the call, so an `all` handler registered while one name fires
    /// runs for the names after it.
    pub fn trigger_with(&self, events: &str, args: &[T]) -> &Self {
        for name in events.split_whitespace() {
            let (direct, wildcard) = {
                let registry = self.registry.borrow();
                (registry.snapshot(name), registry.snapshot(ALL))
            };
            self.registry
                .borrow_mut()
                .note_dispatch(direct.len() + wildcard.len());
            log::trace!(
                "[EventHub] trigger '{name}': {} direct, {} wildcard",
                direct.len(),
                wildcard.len()
            );
            for binding in &direct {
                binding.deliver(name, args);
            }
            for binding in &wildcard {
                binding.deliver(name, args);
            }
        }
        self
    }

    /// Live binding count for one event name.
    pub fn bindings(&self, event: &str) -> usize {
        self.registry.borrow().bindings(event)
    }

    /// Current dispatch and binding counters.
    pub fn stats(&self) -> HubStats {
        self.registry.borrow().stats()
    }
}

impl<T: 'static> Default for EventHub<T> {
    fn default() -> Self {
        Self::new()
    }
}
