//! Discovery through the facade: registry sync, context block, legacy tracker

use std::rc::Rc;
use std::time::Duration;

use sid::{ActionKind, InputDataType, OperationStatus, SidConfig, SidHost, TrackerError};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <script type="application/sid+json">{"version":"1.0","app":"Shop","page":"Checkout"}</script>
</head>
<body>
  <section id="shipping">
    <input data-sid="email" data-sid-action="fill" data-sid-input="email,required" data-sid-desc="Email">
    <select data-sid="country" data-sid-action="select" data-sid-input="text,optional" data-sid-options="us,fr">
      <option value="us">US</option><option value="fr">FR</option>
    </select>
  </section>
  <button data-sid="pay" data-sid-desc="Pay" data-sid-tracking="navigation" data-sid-destination="/done">Pay</button>
  <p>no annotation here</p>
</body>
</html>"#;

fn ids(host: &SidHost) -> Vec<String> {
    host.sid().unwrap().elements().into_iter().map(|e| e.id).collect()
}

// ============================================================================
// REGISTRY
// ============================================================================

#[test]
fn test_discovers_annotated_elements_only() {
    let host = SidHost::from_html(PAGE).unwrap();
    let sid = host.init(SidConfig::default());

    assert_eq!(ids(&host), ["email", "country", "pay"]);

    let country = sid.get_element("country").unwrap();
    let input = country.actions[0].input.as_ref().unwrap();
    assert_eq!(country.actions[0].kind, ActionKind::Select);
    assert_eq!(input.data_type, InputDataType::Text);
    assert!(!input.required);
    assert_eq!(input.options.as_deref(), Some(&["us".to_string(), "fr".to_string()][..]));
}

#[test]
fn test_detach_and_reattach_restores_identical_entries() {
    let host = SidHost::from_html(PAGE).unwrap();
    let sid = host.init(SidConfig::default());
    let before = sid.get_element("email").unwrap();

    let doc = host.document();
    let (section, body) = {
        let doc = doc.borrow();
        (doc.query_selector("#shipping").unwrap().unwrap(), doc.body().unwrap())
    };

    doc.borrow_mut().detach(section).unwrap();
    assert_eq!(ids(&host), ["pay"]);

    doc.borrow_mut().append_child(body, section).unwrap();
    assert_eq!(sid.get_element("email"), Some(before));
    assert_eq!(sid.elements().len(), 3);
}

#[test]
fn test_dynamic_elements_tracked() {
    let host = SidHost::from_html(PAGE).unwrap();
    let sid = host.init(SidConfig::default());
    let doc = host.document();

    let toast = {
        let mut doc = doc.borrow_mut();
        let toast = doc.create_element("button");
        doc.set_attribute(toast, "data-sid", "dismiss").unwrap();
        doc.set_attribute(toast, "data-sid-action", "click").unwrap();
        let body = doc.body().unwrap();
        doc.append_child(body, toast).unwrap();
        toast
    };
    assert!(sid.get_element("dismiss").is_some());

    doc.borrow_mut().set_attribute(toast, "data-sid-desc", "Dismiss toast").unwrap();
    assert_eq!(sid.get_element("dismiss").unwrap().desc, "Dismiss toast");

    doc.borrow_mut().set_attribute(toast, "data-sid", "close").unwrap();
    assert!(sid.get_element("dismiss").is_none());
    assert!(sid.get_element("close").is_some());
}

#[test]
fn test_observation_disabled() {
    let host = SidHost::from_html(PAGE).unwrap();
    let sid = host.init(SidConfig {
        observe_mutations: false,
        ..SidConfig::default()
    });
    let doc = host.document();
    let section = doc.borrow().query_selector("#shipping").unwrap().unwrap();

    doc.borrow_mut().detach(section).unwrap();
    assert_eq!(sid.elements().len(), 3);
}

// ============================================================================
// CONTEXT
// ============================================================================

#[test]
fn test_context_cached_until_refresh() {
    let host = SidHost::from_html(PAGE).unwrap();
    let sid = host.init(SidConfig::default());

    let first = sid.context();
    assert_eq!(first.app.as_deref(), Some("Shop"));
    assert!(Rc::ptr_eq(&first, &sid.context()));

    {
        let doc = host.document();
        let mut doc = doc.borrow_mut();
        let script = doc.query_selector("script").unwrap().unwrap();
        doc.detach(script).unwrap();
    }
    assert_eq!(sid.page_context().as_deref(), Some("Checkout"));

    let refreshed = sid.refresh_context();
    assert!(!Rc::ptr_eq(&first, &refreshed));
    assert!(refreshed.is_empty());
}

#[test]
fn test_missing_context_block() {
    let host = SidHost::from_html("<p>plain</p>").unwrap();
    let sid = host.init(SidConfig::default());
    assert!(sid.context().is_empty());
    assert_eq!(sid.app_context(), None);
}

// ============================================================================
// LEGACY TRACKER
// ============================================================================

#[test]
fn test_legacy_operation_lifecycle() {
    let host = SidHost::from_html(PAGE).unwrap();
    let sid = host.init(SidConfig::default());

    let op = sid.tracker().start("pay", ActionKind::Click);
    assert_eq!(sid.get_operation(&op.id).unwrap().status, OperationStatus::Pending);

    let (polled, ()) = smol::block_on(smol::future::zip(
        sid.poll_operation(&op.id, Duration::from_secs(1), Duration::from_millis(5)),
        async {
            smol::Timer::after(Duration::from_millis(10)).await;
            sid.tracker().complete(&op.id, OperationStatus::Success, Some("paid".into()), None);
        },
    ));

    let record = polled.unwrap();
    assert_eq!(record.status, OperationStatus::Success);
    assert_eq!(record.message.as_deref(), Some("paid"));
}

#[test]
fn test_legacy_poll_errors() {
    let host = SidHost::from_html(PAGE).unwrap();
    let sid = host.init(SidConfig::default());

    let missing = smol::block_on(sid.poll_operation("op-404", Duration::from_millis(10), Duration::from_millis(1)));
    assert_eq!(missing, Err(TrackerError::NotFound("op-404".into())));

    let op = sid.tracker().start("pay", ActionKind::Click);
    let stuck = smol::block_on(sid.poll_operation(&op.id, Duration::from_millis(10), Duration::from_millis(2)));
    assert!(matches!(stuck, Err(TrackerError::Timeout { timeout_ms: 10, .. })));
}
