use std::cell::RefCell;
use std::rc::Rc;

use std::collections::BTreeMap;

use change_summary::{
    diff_object_from_change_records, diff_object_from_old_object, BoxError, ChangeStrategy, ObjectDiff, ObjectObserver,
    ObserverError, PropertySnapshot, Scheduler, SchedulerConfig,
};
use change_summary_model::{Object, RecordQueue, Value};
use proptest::prelude::*;

const STRATEGIES: [ChangeStrategy; 2] = [ChangeStrategy::Polling, ChangeStrategy::Records];

type Log = Rc<RefCell<Vec<ObjectDiff>>>;

fn observe(strategy: ChangeStrategy, target: &Value) -> (ObjectObserver, Log) {
    let scheduler = Scheduler::new(SchedulerConfig::default().with_strategy(strategy));
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    let observer = ObjectObserver::new(&scheduler, target, move |diff: &ObjectDiff, _: &Value| {
        sink.borrow_mut().push(diff.clone());
        Ok(())
    })
    .unwrap();
    (observer, log)
}

#[derive(Default)]
struct Expect<'a> {
    added: &'a [(&'a str, Value)],
    removed: &'a [&'a str],
    changed: &'a [(&'a str, Value)],
    old_values: &'a [(&'a str, Value)],
}

fn assert_object_changes(observer: &ObjectObserver, log: &Log, expect: Expect<'_>) {
    observer.deliver();
    let diffs: Vec<ObjectDiff> = log.borrow_mut().drain(..).collect();
    assert_eq!(diffs.len(), 1, "expected exactly one report");
    let diff = &diffs[0];

    let pairs = |pairs: &[(&str, Value)]| -> Vec<(String, Value)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    };
    let entries = |map: &indexmap::IndexMap<String, Value>| -> Vec<(String, Value)> {
        let mut entries: Vec<(String, Value)> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    };

    let mut added = pairs(expect.added);
    added.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(entries(&diff.added), added);

    let mut removed: Vec<(String, Value)> = expect
        .removed
        .iter()
        .map(|k| (k.to_string(), Value::Undefined))
        .collect();
    removed.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(entries(&diff.removed), removed);

    let mut changed = pairs(expect.changed);
    changed.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(entries(&diff.changed), changed);

    for (key, old) in expect.old_values {
        assert_eq!(diff.old_value(key), *old, "old value of {key}");
    }
}

fn assert_no_changes(observer: &ObjectObserver, log: &Log) {
    observer.deliver();
    assert!(log.borrow().is_empty());
}

fn empty() -> Value {
    Value::Object(Object::new())
}

#[test]
fn object_token_is_passed_to_callback() {
    let obj = empty();
    let seen = Rc::new(RefCell::new(Value::Undefined));
    let sink = seen.clone();
    let observer = ObjectObserver::with_token(
        &Scheduler::default(),
        &obj,
        move |_: &ObjectDiff, token: &Value| -> Result<(), BoxError> {
            *sink.borrow_mut() = token.clone();
            Ok(())
        },
        Value::from("token"),
    )
    .unwrap();
    obj.set_property("foo", Value::from(1));
    observer.deliver();
    assert_eq!(*seen.borrow(), Value::from("token"));
}

#[test]
fn object_observe_primitive_fails() {
    let err = ObjectObserver::new(&Scheduler::default(), &Value::from("text"), |_: &ObjectDiff, _: &Value| Ok(()))
        .unwrap_err();
    assert_eq!(err, ObserverError::NotAnObject { type_name: "string" });
}

#[test]
fn object_delivery_until_no_changes() {
    for strategy in STRATEGIES {
        let obj = Value::object([("foo", 5)]);
        let count = Rc::new(RefCell::new(0));
        let counter = count.clone();
        let model = obj.clone();
        let scheduler = Scheduler::new(SchedulerConfig::default().with_strategy(strategy));
        let observer = ObjectObserver::new(&scheduler, &obj, move |_: &ObjectDiff, _: &Value| {
            *counter.borrow_mut() += 1;
            let foo = model.get_property("foo").as_f64().unwrap_or(0.0);
            if foo != 0.0 {
                model.set_property("foo", Value::from(foo - 1.0));
            }
            Ok(())
        })
        .unwrap();

        obj.set_property("foo", Value::from(4));
        observer.deliver();
        assert_eq!(*count.borrow(), 5, "{strategy:?}");
        observer.close();
    }
}

#[test]
fn object_disconnect() {
    for strategy in STRATEGIES {
        let obj = Value::object([("foo", "bar")]);
        let (observer, log) = observe(strategy, &obj);

        obj.set_property("foo", Value::from("baz"));
        obj.set_property("bat", Value::from("bag"));
        obj.set_property("blaz", Value::from("foo"));
        obj.as_object().unwrap().delete("foo");
        obj.as_object().unwrap().delete("blaz");

        assert_object_changes(
            &observer,
            &log,
            Expect {
                added: &[("bat", Value::from("bag"))],
                removed: &["foo"],
                old_values: &[("foo", Value::from("bar")), ("bat", Value::Undefined)],
                ..Expect::default()
            },
        );

        obj.set_property("foo", Value::from("blarg"));
        observer.close();
        obj.set_property("bar", Value::from("blaz"));
        assert_no_changes(&observer, &log);
        assert_eq!(obj.as_object().unwrap().watcher_count(), 0);
    }
}

#[test]
fn object_reset() {
    for strategy in STRATEGIES {
        let obj = Value::object([("foo", "bar")]);
        let (observer, log) = observe(strategy, &obj);

        obj.set_property("foo", Value::from("baz"));
        assert_object_changes(
            &observer,
            &log,
            Expect {
                changed: &[("foo", Value::from("baz"))],
                old_values: &[("foo", Value::from("bar"))],
                ..Expect::default()
            },
        );

        obj.set_property("blaz", Value::from("bat"));
        observer.reset();
        assert_no_changes(&observer, &log);

        obj.set_property("bat", Value::from("bag"));
        assert_object_changes(
            &observer,
            &log,
            Expect {
                added: &[("bat", Value::from("bag"))],
                old_values: &[("bat", Value::Undefined)],
                ..Expect::default()
            },
        );
    }
}

#[test]
fn object_observe_array() {
    for strategy in STRATEGIES {
        let arr = Value::array(Vec::<Value>::new());
        let (observer, log) = observe(strategy, &arr);

        arr.set_property("length", Value::from(5));
        arr.set_index(3, Value::from("baz"));

        assert_object_changes(
            &observer,
            &log,
            Expect {
                added: &[("3", Value::from("baz"))],
                changed: &[("length", Value::from(5))],
                old_values: &[("length", Value::from(0)), ("3", Value::Undefined)],
                ..Expect::default()
            },
        );
    }
}

#[test]
fn object_add_delete_and_reobserve() {
    for strategy in STRATEGIES {
        let model = empty();
        let (observer, log) = observe(strategy, &model);

        model.set_property("id", Value::from(0));
        assert_object_changes(
            &observer,
            &log,
            Expect {
                added: &[("id", Value::from(0))],
                old_values: &[("id", Value::Undefined)],
                ..Expect::default()
            },
        );

        model.as_object().unwrap().delete("id");
        assert_object_changes(
            &observer,
            &log,
            Expect {
                removed: &["id"],
                old_values: &[("id", Value::from(0))],
                ..Expect::default()
            },
        );

        observer.close();
        model.set_property("id", Value::from(101));
        assert_no_changes(&observer, &log);

        let (observer, log) = observe(strategy, &model);
        model.set_property("id2", Value::from(202));
        assert_object_changes(
            &observer,
            &log,
            Expect {
                added: &[("id2", Value::from(202))],
                old_values: &[("id2", Value::Undefined)],
                ..Expect::default()
            },
        );
    }
}

#[test]
fn object_delete_add_delete() {
    for strategy in STRATEGIES {
        let model = Value::object([("id", 1)]);
        let (observer, log) = observe(strategy, &model);

        model.as_object().unwrap().delete("id");
        assert_object_changes(
            &observer,
            &log,
            Expect {
                removed: &["id"],
                old_values: &[("id", Value::from(1))],
                ..Expect::default()
            },
        );

        model.set_property("id", Value::from(1));
        assert_object_changes(
            &observer,
            &log,
            Expect {
                added: &[("id", Value::from(1))],
                old_values: &[("id", Value::Undefined)],
                ..Expect::default()
            },
        );

        model.as_object().unwrap().delete("id");
        model.set_property("id", Value::from(1));
        assert_no_changes(&observer, &log);
    }
}

#[test]
fn object_set_undefined() {
    for strategy in STRATEGIES {
        let model = empty();
        let (observer, log) = observe(strategy, &model);

        model.set_property("x", Value::Undefined);
        assert_object_changes(
            &observer,
            &log,
            Expect {
                added: &[("x", Value::Undefined)],
                old_values: &[("x", Value::Undefined)],
                ..Expect::default()
            },
        );
    }
}

#[test]
fn object_identity_change_is_reported() {
    for strategy in STRATEGIES {
        let model = Value::object([("child", Value::object([("n", 1)]))]);
        let (observer, log) = observe(strategy, &model);

        // Deep mutation is invisible to a shallow diff.
        model.get_property("child").set_property("n", Value::from(2));
        assert_no_changes(&observer, &log);

        let replacement = Value::object([("n", 2)]);
        model.set_property("child", replacement.clone());
        assert_object_changes(
            &observer,
            &log,
            Expect {
                changed: &[("child", replacement)],
                ..Expect::default()
            },
        );
    }
}

#[test]
fn object_mutation_between_check_and_report_is_kept() {
    for strategy in STRATEGIES {
        let model = Value::object([("a", 1)]);
        let (observer, log) = observe(strategy, &model);

        model.set_property("a", Value::from(2));
        assert!(observer.check());
        model.set_property("b", Value::from(3));
        observer.report().unwrap();
        {
            let diffs = log.borrow();
            assert_eq!(diffs.len(), 1);
            assert_eq!(diffs[0].changed.get("a"), Some(&Value::from(2)));
            assert!(diffs[0].added.is_empty(), "{strategy:?}");
        }
        log.borrow_mut().clear();

        assert!(observer.check(), "{strategy:?}");
        observer.report().unwrap();
        let diffs = log.borrow();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].added.get("b"), Some(&Value::from(3)));
        assert!(diffs[0].changed.is_empty());
    }
}

fn entries_of(obj: &Object) -> BTreeMap<String, Value> {
    obj.snapshot().into_iter().collect()
}

/// Undoes `diff` on the properties of `after`.
fn rebuild_before(after: &Object, diff: &ObjectDiff) -> BTreeMap<String, Value> {
    let mut before = entries_of(after);
    for key in diff.added.keys() {
        before.remove(key);
    }
    for key in diff.removed.keys().chain(diff.changed.keys()) {
        before.insert(key.clone(), diff.old_value(key));
    }
    before
}

fn object_ops() -> impl Strategy<Value = Vec<(u8, Option<u8>)>> {
    prop::collection::vec((0u8..5, prop::option::of(0u8..4)), 0..16)
}

proptest! {
    #[test]
    fn object_diff_rebuilds_previous_properties(
        initial in prop::collection::btree_map(0u8..5, 0u8..4, 0..5),
        ops in object_ops(),
    ) {
        let obj = Object::from_entries(initial.iter().map(|(k, v)| (format!("k{k}"), i64::from(*v))));
        let value = Value::Object(obj.clone());
        let before = entries_of(&obj);
        let snapshot = PropertySnapshot::capture(&value);
        let queue = RecordQueue::new();
        obj.watch(&queue);

        for (key, op) in &ops {
            let key = format!("k{key}");
            match op {
                Some(n) => obj.set(key, i64::from(*n)),
                None => {
                    obj.delete(&key);
                }
            }
        }

        let polled = diff_object_from_old_object(&value, &snapshot);
        prop_assert_eq!(rebuild_before(&obj, &polled), before.clone());

        let recorded = diff_object_from_change_records(&value, &queue.take());
        prop_assert_eq!(rebuild_before(&obj, &recorded), before);
    }
}
