//! Subscription table and data model
//!
//! Everything in this module is plain `&mut self` bookkeeping: the registry
//! records, filters and snapshots bindings but never invokes a handler, so
//! the reentrancy rules all live in [`crate::hub`].

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

/// A registered callback. Two handlers are the same binding target only if
/// they are the same `Rc` allocation.
pub type Handler<T> = Rc<dyn Fn(&Delivery<'_, T>)>;

/// Opaque per-binding context, handed back to the handler on every delivery
/// and usable as a removal filter. Compared by `Rc` identity.
pub type Context = Rc<dyn Any>;

/// One invocation of one handler: the event name being processed, the
/// borrowed trigger arguments and the binding's own context if it has one.
///
/// Handlers on the `all` channel receive the same shape; `event` tells them
/// which name actually fired.
pub struct Delivery<'a, T> {
    pub event: &'a str,
    pub args: &'a [T],
    pub context: Option<&'a Context>,
}

/// One (handler, context) pair registered under an event name.
pub struct Binding<T> {
    pub(crate) handler: Handler<T>,
    pub(crate) context: Option<Context>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            handler: Rc::clone(&self.handler),
            context: self.context.clone(),
        }
    }
}

impl<T> Binding<T> {
    /// Removal filter: an omitted handler or context matches anything; a
    /// given context only matches bindings that carry that exact context.
    fn matches(&self, handler: Option<&Handler<T>>, context: Option<&Context>) -> bool {
        let handler_hit = handler.is_none_or(|h| Rc::ptr_eq(&self.handler, h));
        let context_hit = context.is_none_or(|c| {
            self.context
                .as_ref()
                .is_some_and(|own| Rc::ptr_eq(own, c))
        });
        handler_hit && context_hit
    }

    pub(crate) fn deliver(&self, event: &str, args: &[T]) {
        (self.handler)(&Delivery {
            event,
            args,
            context: self.context.as_ref(),
        });
    }
}

/// Counters for hub introspection
#[derive(Debug, Clone, Default)]
pub struct HubStats {
    /// Event names processed by `trigger` (one per name, per call)
    pub events_triggered: usize,
    /// Handler invocations scheduled from snapshots
    pub deliveries: usize,
    /// Bindings currently in the table
    pub active_bindings: usize,
    /// Bindings ever created
    pub total_bindings: usize,
}

/// The subscription table: event name -> bindings in registration order.
///
/// Keys are created lazily on first bind and dropped when their binding list
/// drains empty.
pub(crate) struct Registry<T> {
    table: HashMap<String, Vec<Binding<T>>>,
    events_triggered: usize,
    deliveries: usize,
    total_bindings: usize,
}

impl<T> Registry<T> {
    pub(crate) fn new() -> Self {
        Self {
            table: HashMap::new(),
            events_triggered: 0,
            deliveries: 0,
            total_bindings: 0,
        }
    }

    /// Append a binding for each whitespace-separated name in `events`.
    /// Duplicate (event, handler, context) registrations are independent
    /// bindings and fire independently.
    pub(crate) fn bind(&mut self, events: &str, handler: Handler<T>, context: Option<Context>) {
        for name in events.split_whitespace() {
            self.table.entry(name.to_owned()).or_default().push(Binding {
                handler: Rc::clone(&handler),
                context: context.clone(),
            });
            self.total_bindings += 1;
            log::trace!("[EventHub] bound handler to '{name}'");
        }
    }

    /// Remove every binding matching the filter; omitted arguments are
    /// wildcards. Returns the number of bindings dropped. Removals that
    /// match nothing are silent no-ops.
    pub(crate) fn unbind(
        &mut self,
        events: Option<&str>,
        handler: Option<&Handler<T>>,
        context: Option<&Context>,
    ) -> usize {
        if events.is_none() && handler.is_none() && context.is_none() {
            let dropped = self.table.values().map(Vec::len).sum();
            self.table.clear();
            return dropped;
        }

        let mut dropped = 0;
        match events {
            Some(events) => {
                for name in events.split_whitespace() {
                    dropped += self.unbind_one(name, handler, context);
                }
            }
            None => {
                let names: Vec<String> = self.table.keys().cloned().collect();
                for name in &names {
                    dropped += self.unbind_one(name, handler, context);
                }
            }
        }
        dropped
    }

    fn unbind_one(
        &mut self,
        name: &str,
        handler: Option<&Handler<T>>,
        context: Option<&Context>,
    ) -> usize {
        let Some(bindings) = self.table.get_mut(name) else {
            return 0;
        };
        let before = bindings.len();
        bindings.retain(|binding| !binding.matches(handler, context));
        let dropped = before - bindings.len();
        if bindings.is_empty() {
            self.table.remove(name);
        }
        if dropped > 0 {
            log::trace!("[EventHub] unbound {dropped} handler(s) from '{name}'");
        }
        dropped
    }

    /// Copy of the binding list for `name` as it stands right now. Dispatch
    /// iterates this copy, so later table mutation cannot touch it.
    pub(crate) fn snapshot(&self, name: &str) -> Vec<Binding<T>> {
        self.table.get(name).cloned().unwrap_or_default()
    }

    /// Live binding count for one event name.
    pub(crate) fn bindings(&self, name: &str) -> usize {
        self.table.get(name).map_or(0, Vec::len)
    }

    pub(crate) fn note_dispatch(&mut self, deliveries: usize) {
        self.events_triggered += 1;
        self.deliveries += deliveries;
    }

    pub(crate) fn stats(&self) -> HubStats {
        HubStats {
            events_triggered: self.events_triggered,
            deliveries: self.deliveries,
            active_bindings: self.table.values().map(Vec::len).sum(),
            total_bindings: self.total_bindings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler<()> {
        Rc::new(|_| {})
    }

    #[test]
    fn bind_splits_whitespace_names() {
        let mut registry: Registry<()> = Registry::new();
        registry.bind("a b  c", noop(), None);

        assert_eq!(registry.bindings("a"), 1);
        assert_eq!(registry.bindings("b"), 1);
        assert_eq!(registry.bindings("c"), 1);
        assert_eq!(registry.stats().active_bindings, 3);
        assert_eq!(registry.stats().total_bindings, 3);
    }

    #[test]
    fn duplicate_registrations_are_independent() {
        let mut registry: Registry<()> = Registry::new();
        let handler = noop();
        registry.bind("e", Rc::clone(&handler), None);
        registry.bind("e", Rc::clone(&handler), None);

        assert_eq!(registry.bindings("e"), 2);
        // One unbind by identity removes both entries for that handler.
        assert_eq!(registry.unbind(Some("e"), Some(&handler), None), 2);
        assert_eq!(registry.bindings("e"), 0);
    }

    #[test]
    fn unbind_by_handler_identity() {
        let mut registry: Registry<()> = Registry::new();
        let keep = noop();
        let gone = noop();
        registry.bind("e", Rc::clone(&keep), None);
        registry.bind("e", Rc::clone(&gone), None);

        assert_eq!(registry.unbind(Some("e"), Some(&gone), None), 1);
        let remaining = registry.snapshot("e");
        assert_eq!(remaining.len(), 1);
        assert!(Rc::ptr_eq(&remaining[0].handler, &keep));
    }

    #[test]
    fn unbind_by_context_spans_all_events() {
        let mut registry: Registry<()> = Registry::new();
        let ctx: Context = Rc::new("owner");
        registry.bind("x y", noop(), Some(ctx.clone()));
        registry.bind("x y", noop(), None);

        assert_eq!(registry.unbind(None, None, Some(&ctx)), 2);
        assert_eq!(registry.bindings("x"), 1);
        assert_eq!(registry.bindings("y"), 1);
    }

    #[test]
    fn unbind_requires_both_filters_to_match() {
        let mut registry: Registry<()> = Registry::new();
        let ctx: Context = Rc::new(1u8);
        let other: Context = Rc::new(2u8);
        let handler = noop();
        registry.bind("e", Rc::clone(&handler), Some(ctx.clone()));

        // Right handler, wrong context: nothing happens.
        assert_eq!(registry.unbind(Some("e"), Some(&handler), Some(&other)), 0);
        assert_eq!(registry.unbind(Some("e"), Some(&handler), Some(&ctx)), 1);
    }

    #[test]
    fn context_filter_skips_contextless_bindings() {
        let mut registry: Registry<()> = Registry::new();
        let ctx: Context = Rc::new(());
        registry.bind("e", noop(), None);

        assert_eq!(registry.unbind(None, None, Some(&ctx)), 0);
        assert_eq!(registry.bindings("e"), 1);
    }

    #[test]
    fn emptied_event_key_is_dropped() {
        let mut registry: Registry<()> = Registry::new();
        let handler = noop();
        registry.bind("e", Rc::clone(&handler), None);
        registry.unbind(Some("e"), Some(&handler), None);

        assert_eq!(registry.bindings("e"), 0);
        assert_eq!(registry.stats().active_bindings, 0);
    }

    #[test]
    fn unknown_removals_are_silent() {
        let mut registry: Registry<()> = Registry::new();
        assert_eq!(registry.unbind(Some("missing"), None, None), 0);
        assert_eq!(registry.unbind(None, Some(&noop()), None), 0);
        assert_eq!(registry.unbind(None, None, None), 0);
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutation() {
        let mut registry: Registry<()> = Registry::new();
        registry.bind("e", noop(), None);

        let snapshot = registry.snapshot("e");
        registry.unbind(Some("e"), None, None);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.bindings("e"), 0);
    }

    #[test]
    fn unbind_all_clears_table() {
        let mut registry: Registry<()> = Registry::new();
        registry.bind("a b", noop(), None);
        registry.bind("c", noop(), None);

        assert_eq!(registry.unbind(None, None, None), 3);
        assert_eq!(registry.stats().active_bindings, 0);
        // Totals survive a clear.
        assert_eq!(registry.stats().total_bindings, 3);
    }
}
