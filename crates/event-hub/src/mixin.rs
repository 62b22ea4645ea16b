//! Composition seam for host objects
//!
//! Hosts do not inherit anything: they own an [`EventHub`] and implement
//! [`Subscribable`] by pointing at it. The provided methods return the host
//! itself so call chains read the same on a host as on a bare hub.

use crate::core::{Context, Handler};
use crate::hub::EventHub;

/// Capability trait mixing `on`/`once`/`off`/`trigger` onto any type that
/// owns an event hub.
pub trait Subscribable<T: 'static> {
    /// The hub this host dispatches through.
    fn events(&self) -> &EventHub<T>;

    fn on(
        &self,
        events: &str,
        handler: impl Into<Option<Handler<T>>>,
        context: impl Into<Option<Context>>,
    ) -> &Self
    where
        Self: Sized,
    {
        self.events().on(events, handler, context);
        self
    }

    fn once(
        &self,
        events: &str,
        handler: impl Into<Option<Handler<T>>>,
        context: impl Into<Option<Context>>,
    ) -> &Self
    where
        Self: Sized,
    {
        self.events().once(events, handler, context);
        self
    }

    fn off(
        &self,
        events: Option<&str>,
        handler: Option<&Handler<T>>,
        context: Option<&Context>,
    ) -> &Self
    where
        Self: Sized,
    {
        self.events().off(events, handler, context);
        self
    }

    fn trigger(&self, events: &str) -> &Self
    where
        Self: Sized,
    {
        self.events().trigger(events);
        self
    }

    fn trigger_with(&self, events: &str, args: &[T]) -> &Self
    where
        Self: Sized,
    {
        self.events().trigger_with(events, args);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Widget {
        events: EventHub<()>,
    }

    impl Widget {
        fn new() -> Self {
            Self {
                events: EventHub::new(),
            }
        }
    }

    impl Subscribable<()> for Widget {
        fn events(&self) -> &EventHub<()> {
            &self.events
        }
    }

    #[test]
    fn host_dispatches_through_its_own_hub() {
        let widget = Widget::new();
        let count = Rc::new(Cell::new(0));
        let bump = Rc::clone(&count);
        let handler: Handler<()> = Rc::new(move |_| bump.set(bump.get() + 1));

        widget.on("event", handler, None);
        widget.trigger("event").trigger("event");
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn hosts_do_not_share_tables() {
        let a = Widget::new();
        let b = Widget::new();
        let count = Rc::new(Cell::new(0));
        let bump = Rc::clone(&count);
        let handler: Handler<()> = Rc::new(move |_| bump.set(bump.get() + 1));

        a.on("event", handler, None);
        b.trigger("event");
        assert_eq!(count.get(), 0);
        a.trigger("event");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn chained_calls_return_the_host_itself() {
        let widget = Widget::new();
        assert!(std::ptr::eq(widget.off(None, None, None), &widget));

        let handler: Handler<()> = Rc::new(|_| {});
        let chained = widget.on("event", handler, None).trigger("event");
        assert!(std::ptr::eq(chained, &widget));
    }
}
