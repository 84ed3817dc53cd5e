//! Tests for Dispatcher

use super::*;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

fn lang_message() -> Message {
    Message::new("/lang", vec![TypedValue::Int32(2), TypedValue::from("Bonjour")]).unwrap()
}

/// Handler that appends `(label, args)` to a shared log
fn recorder(
    log: &Arc<Mutex<Vec<(&'static str, Vec<TypedValue>)>>>,
    label: &'static str,
) -> impl Fn(&[TypedValue]) -> Result<(), HandlerError> + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |args: &[TypedValue]| {
        log.lock().push((label, args.to_vec()));
        Ok(())
    }
}

#[test]
fn test_handlers_run_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register("/lang", recorder(&log, "h1")).unwrap();
    dispatcher.register("/lang", recorder(&log, "h2")).unwrap();

    let report = dispatcher.dispatch(&lang_message());

    assert_eq!(report, DispatchReport { matched: 1, invoked: 2, failed: 0 });
    let log = log.lock();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].0, "h1");
    assert_eq!(log[1].0, "h2");
    assert_eq!(log[0].1, log[1].1);
    assert_eq!(log[0].1, lang_message().args().to_vec());
}

#[test]
fn test_patterns_run_in_first_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register("/*", recorder(&log, "wild")).unwrap();
    dispatcher.register("/lang", recorder(&log, "exact")).unwrap();
    dispatcher.register("/*", recorder(&log, "wild2")).unwrap();

    let report = dispatcher.dispatch(&lang_message());

    assert_eq!(report.matched, 2);
    let labels: Vec<_> = log.lock().iter().map(|(l, _)| *l).collect();
    assert_eq!(labels, vec!["wild", "wild2", "exact"]);
    assert_eq!(dispatcher.patterns(), vec!["/*", "/lang"]);
}

#[test]
fn test_unmatched_address_is_dropped() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = Arc::clone(&calls);
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register("/lang", move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

    let unknown = Message::new("/unknown", vec![]).unwrap();
    let report = dispatcher.dispatch(&unknown);

    assert_eq!(report, DispatchReport::default());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_failing_handler_does_not_stop_siblings() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register("/lang", |_| Err(HandlerError::Other("boom".to_string())))
        .unwrap();
    dispatcher.register("/lang", recorder(&log, "h2")).unwrap();

    let report = dispatcher.dispatch(&lang_message());

    assert_eq!(report, DispatchReport { matched: 1, invoked: 2, failed: 1 });
    assert_eq!(log.lock().len(), 1);
}

#[test]
fn test_panicking_handler_is_isolated() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register("/lang", |_| panic!("handler exploded"))
        .unwrap();
    dispatcher.register("/lang", recorder(&log, "h2")).unwrap();

    let first = dispatcher.dispatch(&lang_message());
    let second = dispatcher.dispatch(&lang_message());

    assert_eq!(first.failed, 1);
    assert_eq!(second.failed, 1);
    assert_eq!(log.lock().len(), 2);
}

#[test]
fn test_unregister_removes_only_that_handler() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new();
    let h1 = dispatcher.register("/lang", recorder(&log, "h1")).unwrap();
    dispatcher.register("/lang", recorder(&log, "h2")).unwrap();

    assert!(dispatcher.unregister("/lang", h1));
    assert!(!dispatcher.unregister("/lang", h1));
    assert!(!dispatcher.unregister("/missing", h1));

    dispatcher.dispatch(&lang_message());
    let labels: Vec<_> = log.lock().iter().map(|(l, _)| *l).collect();
    assert_eq!(labels, vec!["h2"]);
    assert_eq!(dispatcher.len(), 1);
}

#[test]
fn test_unregister_last_handler_drops_route() {
    let mut dispatcher = Dispatcher::new();
    let id = dispatcher.register("/lang", |_| Ok(())).unwrap();
    assert!(!dispatcher.is_empty());

    dispatcher.unregister("/lang", id);
    assert!(dispatcher.is_empty());
    assert!(dispatcher.patterns().is_empty());
}

#[test]
fn test_handler_ids_are_not_reused_across_patterns() {
    let mut dispatcher = Dispatcher::new();
    let a = dispatcher.register("/a", |_| Ok(())).unwrap();
    let b = dispatcher.register("/b", |_| Ok(())).unwrap();
    assert_ne!(a, b);

    // id of /a does not remove the /b handler
    assert!(!dispatcher.unregister("/b", a));
    assert_eq!(dispatcher.len(), 2);
}

#[test]
fn test_register_rejects_bad_pattern() {
    let mut dispatcher = Dispatcher::new();
    assert!(matches!(
        dispatcher.register("lang", |_| Ok(())),
        Err(OscError::InvalidAddress { .. })
    ));
    assert!(dispatcher.register("", |_| Ok(())).is_err());
    assert!(dispatcher.is_empty());
}

#[test]
fn test_taps_see_unmatched_messages() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let mut dispatcher = Dispatcher::new();
    dispatcher.tap(move |m| seen_clone.lock().push(m.address().to_string()));

    let report = dispatcher.dispatch(&Message::new("/unknown", vec![]).unwrap());

    assert_eq!(report.invoked, 0);
    assert_eq!(*seen.lock(), vec!["/unknown".to_string()]);
}
