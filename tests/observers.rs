mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{new_cart, register_collaborators, Clock};
use parking_lot::Mutex;
use weft_di::{
    DiObserver, Lifetime, LoggingObserver, MetricsObserver, ProxyHash, Resolver, ServiceCollection, ServiceId,
};

/// Records every notification as a line of text.
#[derive(Default)]
struct Journal {
    lines: Mutex<Vec<String>>,
}

impl DiObserver for Journal {
    fn resolving(&self, id: &ServiceId) {
        self.lines.lock().push(format!("resolving {}", id));
    }

    fn resolved(&self, id: &ServiceId, _duration: Duration) {
        self.lines.lock().push(format!("resolved {}", id));
    }

    fn constructed(&self, _type_name: &str, lifetime: Lifetime) {
        self.lines.lock().push(format!("constructed {:?}", lifetime));
    }

    fn lazy_created(&self, _hash: ProxyHash, target: &ServiceId) {
        self.lines.lock().push(format!("proxy {}", target));
    }

    fn lazy_resolved(&self, _hash: ProxyHash, target: &ServiceId) {
        self.lines.lock().push(format!("forced {}", target));
    }
}

#[test]
fn observers_see_the_resolution_sequence() {
    let journal = Arc::new(Journal::default());
    let mut services = ServiceCollection::new();
    register_collaborators(&mut services);
    services.add_observer(journal.clone());
    let container = services.build();

    container.get::<Clock>(&ServiceId::new("Clock")).unwrap();
    container.get::<Clock>(&ServiceId::new("Clock")).unwrap();

    let lines = journal.lines.lock().clone();
    // the second request is a cache hit and never reaches the registry
    assert_eq!(lines, vec!["resolving Clock", "constructed Singleton", "resolved Clock"]);
}

#[test]
fn observers_see_proxies_created_and_forced() {
    let journal = Arc::new(Journal::default());
    let mut services = ServiceCollection::new();
    register_collaborators(&mut services);
    services.add_observer(journal.clone());
    let container = services.build();

    let cart = new_cart(&container);
    journal.lines.lock().clear();
    cart.clock.get().unwrap();

    let lines = journal.lines.lock().clone();
    assert_eq!(lines.first().map(String::as_str), Some("resolving Clock"));
    assert_eq!(lines.last().map(String::as_str), Some("forced Clock"));
}

#[test]
fn metrics_accumulate_and_reset() {
    let metrics = Arc::new(MetricsObserver::new());
    let mut services = ServiceCollection::new();
    register_collaborators(&mut services);
    services
        .add_observer(metrics.clone())
        .add_observer(Arc::new(LoggingObserver::new()));
    let container = services.build();

    let cart = new_cart(&container);
    cart.clock.get().unwrap();

    assert_eq!(metrics.proxies_created(), 1);
    assert_eq!(metrics.proxies_resolved(), 1);
    // ticket for the cart, then the clock behind the proxy
    assert_eq!(metrics.resolution_count(), 2);
    assert!(metrics.average_resolution_time().is_some());
    assert_eq!(metrics.construction_count(), 3);

    metrics.reset();
    assert_eq!(metrics.resolution_count(), 0);
    assert!(metrics.average_resolution_time().is_none());
}

#[test]
fn logging_observer_emits_through_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut services = ServiceCollection::new();
        register_collaborators(&mut services);
        services.add_observer(Arc::new(LoggingObserver::new()));
        let container = services.build();
        assert!(container.get::<Clock>(&ServiceId::new("Clock")).is_ok());
    });
}
