// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;
use std::sync::Arc;

use fleet_core::{job_fixture, DesiredMap, Goal, ObservedState, PortMapping, Task};
use fleet_ports::DefaultPortAllocator;
use fleet_storage::InMemoryExecutionsStore;
use parking_lot::Mutex;

use super::*;
use crate::registry::SupervisorRegistry;
use crate::test_support::{status_for, FakeDesiredStateSource, FakeSupervisorFactory};

struct Fixture {
    reconciler: Reconciler,
    desired: FakeDesiredStateSource,
    factory: FakeSupervisorFactory,
}

fn fixture() -> Fixture {
    let desired = FakeDesiredStateSource::default();
    let factory = FakeSupervisorFactory::new();
    let registry = Arc::new(Mutex::new(SupervisorRegistry::new(Arc::new(factory.clone()))));
    let store = Arc::new(InMemoryExecutionsStore::new());
    let allocator = Arc::new(DefaultPortAllocator::default());

    let reconciler = Reconciler::new(
        Box::new(desired.clone()),
        store,
        allocator,
        registry,
    );

    Fixture {
        reconciler,
        desired,
        factory,
    }
}

#[tokio::test]
async fn cold_start_creates_supervisor_and_starts_it() {
    let f = fixture();
    let job = job_fixture("web");
    let mut desired_map = DesiredMap::new();
    desired_map.insert(job.id.clone(), Task { job: job.clone(), goal: Goal::Start });
    f.desired.set_tasks(desired_map);

    f.reconciler.reconcile().await.unwrap();

    let supervisor = f.factory.get(&job.id).expect("supervisor created");
    assert_eq!(
        supervisor.call_count(crate::test_support::SupervisorCall::Start),
        1
    );
}

#[tokio::test]
async fn second_tick_with_no_changes_is_idempotent() {
    let f = fixture();
    let job = job_fixture("web");
    let mut desired_map = DesiredMap::new();
    desired_map.insert(job.id.clone(), Task { job: job.clone(), goal: Goal::Start });
    f.desired.set_tasks(desired_map);

    f.reconciler.reconcile().await.unwrap();
    let supervisor = f.factory.get(&job.id).unwrap();
    supervisor.set_status(status_for(ObservedState::Starting));

    f.reconciler.reconcile().await.unwrap();

    assert_eq!(
        supervisor.call_count(crate::test_support::SupervisorCall::Start),
        1,
        "a running start must not be re-issued"
    );
}

#[tokio::test]
async fn removing_from_desired_without_undeploy_does_not_stop() {
    let f = fixture();
    let job = job_fixture("web");
    let mut desired_map = DesiredMap::new();
    desired_map.insert(job.id.clone(), Task { job: job.clone(), goal: Goal::Start });
    f.desired.set_tasks(desired_map);
    f.reconciler.reconcile().await.unwrap();

    f.desired.set_tasks(DesiredMap::new());
    f.reconciler.reconcile().await.unwrap();

    let supervisor = f.factory.get(&job.id).unwrap();
    assert_eq!(
        supervisor.call_count(crate::test_support::SupervisorCall::Stop),
        0,
        "B1: deletion without UNDEPLOY must not stop the supervisor"
    );
}

#[tokio::test]
async fn undeploy_stops_then_reaps_after_is_done() {
    let f = fixture();
    let job = job_fixture("web");
    let mut desired_map = DesiredMap::new();
    desired_map.insert(job.id.clone(), Task { job: job.clone(), goal: Goal::Start });
    f.desired.set_tasks(desired_map.clone());
    f.reconciler.reconcile().await.unwrap();

    desired_map.insert(job.id.clone(), Task { job: job.clone(), goal: Goal::Undeploy });
    f.desired.set_tasks(desired_map);
    f.reconciler.reconcile().await.unwrap();

    let supervisor = f.factory.get(&job.id).unwrap();
    assert_eq!(
        supervisor.call_count(crate::test_support::SupervisorCall::Stop),
        1
    );

    supervisor.set_status(status_for(ObservedState::Stopped));
    f.reconciler.reconcile().await.unwrap();

    assert_eq!(
        supervisor.call_count(crate::test_support::SupervisorCall::Close),
        1,
        "a done, undeployed execution must be reaped and closed"
    );
}

#[tokio::test]
async fn reappearing_after_undeploy_gets_a_fresh_supervisor_and_fresh_ports() {
    let f = fixture();
    let job = job_fixture("web");
    let mut desired_map = DesiredMap::new();
    desired_map.insert(job.id.clone(), Task { job: job.clone(), goal: Goal::Start });
    f.desired.set_tasks(desired_map.clone());
    f.reconciler.reconcile().await.unwrap();
    let first = f.factory.get(&job.id).unwrap();

    desired_map.insert(job.id.clone(), Task { job: job.clone(), goal: Goal::Undeploy });
    f.desired.set_tasks(desired_map.clone());
    f.reconciler.reconcile().await.unwrap();
    first.set_status(status_for(ObservedState::Stopped));

    // Re-add to START while the old execution hasn't been reaped yet:
    // the re-add must be deferred.
    desired_map.insert(job.id.clone(), Task { job: job.clone(), goal: Goal::Start });
    f.desired.set_tasks(desired_map);
    f.reconciler.reconcile().await.unwrap();

    assert_eq!(f.factory.created_count(), 2, "reap + fresh create happen in the same tick");
    let second = f.factory.get(&job.id).unwrap();
    assert_eq!(second.call_count(crate::test_support::SupervisorCall::Start), 1);
}

#[tokio::test]
async fn static_port_conflict_is_skipped_and_others_proceed() {
    let f = fixture();
    let taken = job_fixture("taken").with_port("p", PortMapping::static_port(9999, 9999));
    let conflicting = job_fixture("conflicting").with_port("p", PortMapping::static_port(9999, 9999));
    let unrelated = job_fixture("unrelated");

    let mut desired_map = DesiredMap::new();
    desired_map.insert(taken.id.clone(), Task { job: taken.clone(), goal: Goal::Start });
    f.desired.set_tasks(desired_map.clone());
    f.reconciler.reconcile().await.unwrap();
    assert!(f.factory.get(&taken.id).is_some());

    desired_map.insert(conflicting.id.clone(), Task { job: conflicting.clone(), goal: Goal::Start });
    desired_map.insert(unrelated.id.clone(), Task { job: unrelated.clone(), goal: Goal::Start });
    f.desired.set_tasks(desired_map);
    f.reconciler.reconcile().await.unwrap();

    assert!(f.factory.get(&conflicting.id).is_none(), "B3: conflicting job skipped this tick");
    assert!(f.factory.get(&unrelated.id).is_some(), "B3: other jobs still proceed");
}
