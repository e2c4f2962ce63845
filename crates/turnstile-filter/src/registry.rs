//! Filter registry.
//!
//! The processor resolves filters through the [`FilterRegistry`] trait: all
//! filters of one type for the inbound and outbound stages, and a single
//! filter by name for the endpoint stage. Loading filters (from config, a
//! plugin directory, etc.) is the registry owner's job; the processor only
//! reads.
//!
//! [`InMemoryFilterRegistry`] is a thread-safe implementation suitable for
//! embedding and tests.

use crate::filter::Filter;
use parking_lot::RwLock;
use std::sync::Arc;
use turnstile_core::FilterType;

/// Read access to the set of loaded filters.
///
/// Implementations must be safe for concurrent lookups from many in-flight
/// requests.
pub trait FilterRegistry: Send + Sync + 'static {
    /// Returns every filter of `filter_type`, sorted by ascending order.
    ///
    /// Filters with equal order keep their registration order.
    fn filters_by_type(&self, filter_type: FilterType) -> Vec<Arc<dyn Filter>>;

    /// Returns the filter registered under `name`.
    fn filter_by_name(&self, name: &str) -> Option<Arc<dyn Filter>>;
}

/// A registry backed by an in-memory list.
///
/// Registration order is preserved and used to break ties between filters
/// with the same order. Re-registering a name replaces the earlier filter in
/// place.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use turnstile_core::FilterType;
/// use turnstile_filter::fixtures::MockFilter;
/// use turnstile_filter::{FilterRegistry, InMemoryFilterRegistry};
///
/// let registry = InMemoryFilterRegistry::new();
/// registry.put_filter(Arc::new(MockFilter::inbound(2)));
/// registry.put_filter(Arc::new(MockFilter::inbound(1)));
///
/// let names: Vec<_> = registry
///     .filters_by_type(FilterType::Inbound)
///     .iter()
///     .map(|f| f.name().to_string())
///     .collect();
/// assert_eq!(names, vec!["pre.Mock1", "pre.Mock2"]);
/// ```
#[derive(Default)]
pub struct InMemoryFilterRegistry {
    filters: RwLock<Vec<Arc<dyn Filter>>>,
}

impl InMemoryFilterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a filter, returning the filter it replaced, if any.
    pub fn put_filter(&self, filter: Arc<dyn Filter>) -> Option<Arc<dyn Filter>> {
        let mut filters = self.filters.write();
        if let Some(slot) = filters.iter_mut().find(|f| f.name() == filter.name()) {
            tracing::debug!(filter = filter.name(), "replacing registered filter");
            return Some(std::mem::replace(slot, filter));
        }
        filters.push(filter);
        None
    }

    /// Registers an owned filter.
    pub fn register<F: Filter>(&self, filter: F) -> Option<Arc<dyn Filter>> {
        self.put_filter(Arc::new(filter))
    }

    /// Removes the filter registered under `name`.
    pub fn remove_filter(&self, name: &str) -> Option<Arc<dyn Filter>> {
        let mut filters = self.filters.write();
        let index = filters.iter().position(|f| f.name() == name)?;
        Some(filters.remove(index))
    }

    /// Returns the registered filter names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.filters
            .read()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    /// Returns the number of registered filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.read().len()
    }

    /// Returns true if no filter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.read().is_empty()
    }
}

impl FilterRegistry for InMemoryFilterRegistry {
    fn filters_by_type(&self, filter_type: FilterType) -> Vec<Arc<dyn Filter>> {
        let mut selected: Vec<_> = self
            .filters
            .read()
            .iter()
            .filter(|f| f.filter_type() == filter_type)
            .cloned()
            .collect();
        // stable: equal orders keep registration order
        selected.sort_by_key(|f| f.order());
        selected
    }

    fn filter_by_name(&self, name: &str) -> Option<Arc<dyn Filter>> {
        self.filters.read().iter().find(|f| f.name() == name).cloned()
    }
}

impl std::fmt::Debug for InMemoryFilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryFilterRegistry")
            .field("filters", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::MockFilter;
    use http::StatusCode;

    fn names(filters: &[Arc<dyn Filter>]) -> Vec<String> {
        filters.iter().map(|f| f.name().to_string()).collect()
    }

    #[test]
    fn test_filters_by_type_selects_and_sorts() {
        let registry = InMemoryFilterRegistry::new();
        registry.register(MockFilter::outbound(5));
        registry.register(MockFilter::inbound(9));
        registry.register(MockFilter::endpoint("endpoint.A", StatusCode::OK));
        registry.register(MockFilter::inbound(-1));
        registry.register(MockFilter::outbound(0));

        assert_eq!(
            names(&registry.filters_by_type(FilterType::Inbound)),
            vec!["pre.Mock-1", "pre.Mock9"]
        );
        assert_eq!(
            names(&registry.filters_by_type(FilterType::Outbound)),
            vec!["post.Mock0", "post.Mock5"]
        );
        assert!(registry.filters_by_type(FilterType::Route).is_empty());
    }

    #[test]
    fn test_equal_order_keeps_registration_order() {
        let registry = InMemoryFilterRegistry::new();
        registry.register(MockFilter::inbound(1).named("pre.Zeta"));
        registry.register(MockFilter::inbound(1).named("pre.Alpha"));
        registry.register(MockFilter::inbound(0).named("pre.First"));

        assert_eq!(
            names(&registry.filters_by_type(FilterType::Inbound)),
            vec!["pre.First", "pre.Zeta", "pre.Alpha"]
        );
    }

    #[test]
    fn test_put_filter_replaces_in_place() {
        let registry = InMemoryFilterRegistry::new();
        registry.register(MockFilter::inbound(1).named("pre.A"));
        registry.register(MockFilter::inbound(1).named("pre.B"));

        let replaced = registry.register(MockFilter::inbound(1).named("pre.A"));
        assert!(replaced.is_some());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["pre.A", "pre.B"]);
    }

    #[test]
    fn test_filter_by_name_and_remove() {
        let registry = InMemoryFilterRegistry::new();
        assert!(registry.is_empty());
        registry.register(MockFilter::endpoint("endpoint.Proxy", StatusCode::OK));

        assert!(registry.filter_by_name("endpoint.Proxy").is_some());
        assert!(registry.filter_by_name("endpoint.Other").is_none());

        assert!(registry.remove_filter("endpoint.Proxy").is_some());
        assert!(registry.remove_filter("endpoint.Proxy").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_lookups() {
        let registry = Arc::new(InMemoryFilterRegistry::new());
        for order in 0..10 {
            registry.register(MockFilter::inbound(order));
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        assert_eq!(registry.filters_by_type(FilterType::Inbound).len(), 10);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
