//! The end-to-end scenarios from §8 of the specification, table-for-table.

use std::time::Duration;

use dagrunner::{Scheduler, SchedulerConfig};
use dagrunner_test_support::builders::{failing_task, ok_task, sleepy_task, stateful_task_reading, stateful_value_task};

fn index_of(names: &[String], name: &str) -> usize {
    names.iter().position(|n| n == name).unwrap_or_else(|| panic!("'{name}' never ran: {names:?}"))
}

/// E1: a; b,c,d after a; e after b; f after d,e. Workers=2, no failures.
#[test]
fn e1_diamond_shaped_dag_all_pass_in_dependency_order() {
    let mut s = Scheduler::new(SchedulerConfig::builder().workers(2).build());
    s.register("a", &[], ok_task()).unwrap();
    s.register("b", &["a"], ok_task()).unwrap();
    s.register("c", &["a"], ok_task()).unwrap();
    s.register("d", &["a"], ok_task()).unwrap();
    s.register("e", &["b"], ok_task()).unwrap();
    s.register("f", &["d", "e"], ok_task()).unwrap();

    let summary = s.start();

    assert!(summary.failed.is_empty());
    let mut passed = summary.passed.clone();
    passed.sort();
    assert_eq!(passed, vec!["a", "b", "c", "d", "e", "f"]);

    let ran = &summary.ran;
    assert!(index_of(ran, "a") < index_of(ran, "b"));
    assert!(index_of(ran, "a") < index_of(ran, "c"));
    assert!(index_of(ran, "a") < index_of(ran, "d"));
    assert!(index_of(ran, "b") < index_of(ran, "e"));
    assert!(index_of(ran, "d") < index_of(ran, "f"));
    assert!(index_of(ran, "e") < index_of(ran, "f"));
}

/// Builds the 17-task DAG shared by E2/E3/E4:
/// i01..i04 roots; i05..i08 after i01; i09..i11 after i04;
/// i12..i14 after i06; i15 after i09; i16 after i12; i17 after i16.
fn register_e2_dag(s: &mut Scheduler, i06: dagrunner::TaskFn) {
    for i in 1..=4 {
        s.register(format!("i{i:02}"), &[], ok_task()).unwrap();
    }
    for i in 5..=8 {
        let body = if i == 6 { i06.clone() } else { ok_task() };
        s.register(format!("i{i:02}"), &["i01"], body).unwrap();
    }
    for i in 9..=11 {
        s.register(format!("i{i:02}"), &["i04"], ok_task()).unwrap();
    }
    for i in 12..=14 {
        s.register(format!("i{i:02}"), &["i06"], ok_task()).unwrap();
    }
    s.register("i15", &["i09"], ok_task()).unwrap();
    s.register("i16", &["i12"], ok_task()).unwrap();
    s.register("i17", &["i16"], ok_task()).unwrap();
}

#[test]
fn e2_seventeen_task_dag_all_pass_respecting_order() {
    let mut s = Scheduler::new(SchedulerConfig::builder().workers(5).build());
    register_e2_dag(&mut s, ok_task());

    let summary = s.start();

    assert_eq!(summary.failed.len(), 0);
    assert_eq!(summary.passed.len(), 17);

    let ran = &summary.ran;
    for i in 5..=8 {
        assert!(index_of(ran, "i01") < index_of(ran, &format!("i{i:02}")));
    }
    for i in 9..=11 {
        assert!(index_of(ran, "i04") < index_of(ran, &format!("i{i:02}")));
    }
    assert!(index_of(ran, "i12") < index_of(ran, "i16"));
    assert!(index_of(ran, "i16") < index_of(ran, "i17"));
}

#[test]
fn e3_failure_without_skip_dependents_still_runs_descendants() {
    let mut s = Scheduler::new(
        SchedulerConfig::builder()
            .workers(5)
            .skip_dependents(false)
            .build(),
    );
    register_e2_dag(&mut s, failing_task("i06 exploded"));

    let summary = s.start();

    assert_eq!(summary.failed, vec!["i06".to_string()]);
    assert!(summary.skipped.is_empty());
    for name in ["i12", "i13", "i14", "i16", "i17"] {
        assert!(summary.ran.contains(&name.to_string()), "{name} should still have run");
        assert!(summary.passed.contains(&name.to_string()), "{name} should still have passed");
    }
}

#[test]
fn e4_failure_with_skip_dependents_cascades_transitively() {
    let mut s = Scheduler::new(
        SchedulerConfig::builder()
            .workers(5)
            .skip_dependents(true)
            .build(),
    );
    register_e2_dag(&mut s, failing_task("i06 exploded"));

    let summary = s.start();

    assert_eq!(summary.failed, vec!["i06".to_string()]);
    for name in ["i12", "i13", "i14", "i16", "i17"] {
        assert!(summary.skipped.contains(&name.to_string()), "{name} should have been skipped");
    }
    // i01..i05, i07..i11, i15 are unaffected by i06's failure.
    for name in ["i01", "i02", "i03", "i04", "i05", "i07", "i08", "i09", "i10", "i11", "i15"] {
        assert!(summary.passed.contains(&name.to_string()), "{name} should still have passed");
    }
}

/// E5: a; b after a; c after a; d after c; e after c; f after b,d.
/// Workers=3, d raises, default policy.
#[test]
fn e5_failure_of_a_shared_parent_does_not_block_the_sibling_branch() {
    let mut s = Scheduler::new(SchedulerConfig::builder().workers(3).build());
    s.register("a", &[], ok_task()).unwrap();
    s.register("b", &["a"], ok_task()).unwrap();
    s.register("c", &["a"], ok_task()).unwrap();
    s.register("d", &["c"], failing_task("d exploded")).unwrap();
    s.register("e", &["c"], ok_task()).unwrap();
    s.register("f", &["b", "d"], ok_task()).unwrap();

    let summary = s.start();

    assert_eq!(summary.failed, vec!["d".to_string()]);
    assert!(summary.ran.contains(&"f".to_string()));
    assert!(summary.passed.contains(&"f".to_string()));
    for name in ["a", "b", "c", "e", "f"] {
        assert!(summary.passed.contains(&name.to_string()));
    }
}

/// E6: load; behave; compute after load — all stateful, `store_results=true`.
#[test]
fn e6_stateful_tasks_populate_state_results_and_duration_covers_the_longest_task() {
    let mut s = Scheduler::new(
        SchedulerConfig::builder()
            .workers(3)
            .store_results(true)
            .build(),
    );
    s.register("load", &[], stateful_value_task("loaded".to_string())).unwrap();
    let sleep_for = Duration::from_millis(60);
    s.register(
        "behave",
        &[],
        stateful_task_reading(move |_state| {
            std::thread::sleep(sleep_for);
        }),
    )
    .unwrap();
    s.register(
        "compute",
        &["load"],
        stateful_task_reading(|state| {
            let loaded: String = state.result("load").unwrap_or_default();
            loaded.len() as i64
        }),
    )
    .unwrap();

    let summary = s.start();

    assert_eq!(summary.failed.len(), 0);
    assert_eq!(
        s.state().result::<String>("load"),
        Some("loaded".to_string())
    );
    assert_eq!(s.state().result::<i64>("compute"), Some(6));
    assert!(summary.duration >= sleep_for.as_secs_f64());
}

/// Boundary: the empty DAG starts and finishes immediately.
#[test]
fn empty_dag_returns_immediately() {
    let mut s = Scheduler::new(SchedulerConfig::builder().workers(4).build());
    let summary = s.start();
    assert!(summary.ran.is_empty());
    assert!(summary.duration >= 0.0);
}

/// Boundary: a single dependency-free task runs and is recorded as passed.
#[test]
fn single_task_with_no_dependencies_runs_and_passes() {
    let mut s = Scheduler::new(SchedulerConfig::builder().workers(1).build());
    s.register("solo", &[], ok_task()).unwrap();
    let summary = s.start();
    assert_eq!(summary.ran, vec!["solo".to_string()]);
    assert_eq!(summary.passed, vec!["solo".to_string()]);
}

/// Boundary: with a single worker, a chain runs strictly serially in a valid
/// topological order (trivially true for a chain, but exercises
/// `workers=1` specifically rather than relying on the default).
#[test]
fn single_worker_runs_a_chain_in_order() {
    let mut s = Scheduler::new(SchedulerConfig::builder().workers(1).build());
    s.register("a", &[], ok_task()).unwrap();
    s.register("b", &["a"], ok_task()).unwrap();
    s.register("c", &["b"], ok_task()).unwrap();
    s.register("d", &["c"], sleepy_task(Duration::from_millis(5))).unwrap();

    let summary = s.start();
    assert_eq!(summary.ran, vec!["a", "b", "c", "d"].into_iter().map(String::from).collect::<Vec<_>>());
}
