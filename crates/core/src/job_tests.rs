// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn job_id_equality_is_structural() {
    let a = JobId::new("web", "v1", "abc123");
    let b = JobId::new("web", "v1", "abc123");
    let c = JobId::new("web", "v2", "abc123");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn job_id_display_truncates_hash() {
    let id = JobId::new("web", "v1", "abcdefghijklmnop");
    assert_eq!(id.to_string(), "web@v1#abcdefgh");
}

#[test]
fn job_id_display_keeps_short_hash_whole() {
    let id = JobId::new("web", "v1", "ab");
    assert_eq!(id.to_string(), "web@v1#ab");
}

#[test]
fn with_port_inserts_by_name() {
    let job = Job::new(JobId::new("web", "v1", "h"), "nginx:latest", vec![])
        .with_port("http", PortMapping::dynamic(8080))
        .with_port("admin", PortMapping::static_port(9090, 9090));

    assert_eq!(job.ports.len(), 2);
    assert_eq!(job.ports["http"].internal_port, 8080);
    assert!(job.ports["admin"].is_static());
}

#[test]
fn job_serde_round_trips() {
    let job = test_support::job_fixture("web").with_port("http", PortMapping::dynamic(80));
    let encoded = serde_json::to_string(&job).unwrap();
    let decoded: Job = serde_json::from_str(&encoded).unwrap();
    assert_eq!(job, decoded);
}
