//! Tests for termination conditions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::*;

#[test]
fn test_node_count_termination() {
    let scope = SolveScope::new(1);
    let term = NodeCountTermination::new(3);

    assert!(!term.is_terminated(&scope));
    scope.record_node();
    scope.record_node();
    assert!(!term.is_terminated(&scope));
    scope.record_node();
    assert!(term.is_terminated(&scope));
}

#[test]
fn test_time_termination() {
    let scope = SolveScope::new(1);
    assert!(TimeTermination::new(Duration::ZERO).is_terminated(&scope));
    assert!(!TimeTermination::seconds(3600).is_terminated(&scope));
}

#[test]
fn test_external_termination() {
    let scope = SolveScope::new(1);
    let flag = Arc::new(AtomicBool::new(false));
    let term = ExternalTermination::new(flag.clone());

    assert!(!term.is_terminated(&scope));
    flag.store(true, Ordering::SeqCst);
    assert!(term.is_terminated(&scope));
}

#[test]
fn test_or_termination() {
    let scope = SolveScope::new(1);
    let term = OrTermination::new((
        TimeTermination::seconds(3600),
        NodeCountTermination::new(1),
    ));

    assert!(!term.is_terminated(&scope));
    scope.record_node();
    assert!(term.is_terminated(&scope));
}

#[test]
fn test_optional_limits() {
    let scope = SolveScope::new(1);
    let unlimited = OrTermination::new((None::<TimeTermination>, None::<NodeCountTermination>));
    let limited = OrTermination::new((None::<TimeTermination>, Some(NodeCountTermination::new(1))));

    assert!(!unlimited.is_terminated(&scope));
    assert!(!limited.is_terminated(&scope));
    scope.record_node();
    assert!(!unlimited.is_terminated(&scope));
    assert!(limited.is_terminated(&scope));
}

