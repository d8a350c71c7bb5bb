use change_summary::{ArrayReduction, ChangeStrategy, ObserverError, Scheduler, SchedulerConfig};
use change_summary_model::Value;
use serde_json::json;

fn sum(acc: &Value, n: &Value) -> Value {
    Value::from(acc.as_f64().unwrap_or(0.0) + n.as_f64().unwrap_or(0.0))
}

fn items(values: &[i64]) -> Value {
    Value::from(json!(values.iter().map(|n| json!({ "n": n })).collect::<Vec<_>>()))
}

#[test]
fn reduction_follows_element_changes() {
    for strategy in [ChangeStrategy::Polling, ChangeStrategy::Records] {
        let scheduler = Scheduler::new(SchedulerConfig::default().with_strategy(strategy));
        let list = items(&[1, 2, 3]);
        let total = ArrayReduction::new(&scheduler, &list, "n", sum, Some(Value::from(0))).unwrap();
        assert_eq!(total.value(), Value::from(6));

        list.get_index(1).set_property("n", Value::from(20));
        scheduler.perform_microtask_checkpoint().unwrap();
        assert_eq!(total.value(), Value::from(24), "{strategy:?}");
    }
}

#[test]
fn reduction_follows_membership_changes() {
    for strategy in [ChangeStrategy::Polling, ChangeStrategy::Records] {
        let scheduler = Scheduler::new(SchedulerConfig::default().with_strategy(strategy));
        let list = items(&[1, 2, 3]);
        let arr = list.as_array().unwrap().clone();
        let total = ArrayReduction::new(&scheduler, &list, "n", sum, Some(Value::from(0))).unwrap();

        arr.pop();
        scheduler.perform_microtask_checkpoint().unwrap();
        assert_eq!(total.value(), Value::from(3));

        arr.shift();
        scheduler.perform_microtask_checkpoint().unwrap();
        assert_eq!(total.value(), Value::from(2));

        // The element that moved to index 0 is still tracked.
        arr.get(0).set_property("n", Value::from(5));
        scheduler.perform_microtask_checkpoint().unwrap();
        assert_eq!(total.value(), Value::from(5), "{strategy:?}");

        arr.push(Value::from(json!({"n": 10})));
        scheduler.perform_microtask_checkpoint().unwrap();
        assert_eq!(total.value(), Value::from(15));
    }
}

#[test]
fn reduction_without_initial_value() {
    let scheduler = Scheduler::default();
    let list = items(&[]);
    let max = ArrayReduction::new(
        &scheduler,
        &list,
        "n",
        |acc: &Value, n: &Value| {
            let (a, b) = (acc.as_f64().unwrap_or(f64::MIN), n.as_f64().unwrap_or(f64::MIN));
            Value::from(a.max(b))
        },
        None,
    )
    .unwrap();
    assert_eq!(max.value(), Value::Undefined);

    list.as_array().unwrap().push(Value::from(json!({"n": 4})));
    list.as_array().unwrap().push(Value::from(json!({"n": 9})));
    scheduler.perform_microtask_checkpoint().unwrap();
    assert_eq!(max.value(), Value::from(9));
}

#[test]
fn reduction_deliver_and_close() {
    let scheduler = Scheduler::default();
    let list = items(&[1, 2]);
    let total = ArrayReduction::new(&scheduler, &list, "n", sum, Some(Value::from(0))).unwrap();
    assert_eq!(scheduler.observer_count(), 3);

    list.get_index(0).set_property("n", Value::from(4));
    let report = total.deliver();
    assert_eq!(report.reports, 1);
    assert_eq!(total.value(), Value::from(6));

    total.close();
    assert!(total.is_closed());
    assert_eq!(scheduler.observer_count(), 0);

    list.get_index(0).set_property("n", Value::from(100));
    scheduler.perform_microtask_checkpoint().unwrap();
    assert_eq!(total.value(), Value::from(6));
}

#[test]
fn dropping_reduction_closes_its_observers() {
    let scheduler = Scheduler::default();
    let list = items(&[1, 2]);
    let total = ArrayReduction::new(&scheduler, &list, "n", sum, None).unwrap();
    assert_eq!(total.value(), Value::from(3));
    drop(total);
    assert_eq!(scheduler.observer_count(), 0);
}

#[test]
fn reduction_rejects_bad_input() {
    let scheduler = Scheduler::default();
    let err = ArrayReduction::new(&scheduler, &Value::object([("n", 1)]), "n", sum, None).unwrap_err();
    assert_eq!(err, ObserverError::NotAnArray { type_name: "object" });

    let err = ArrayReduction::new(&scheduler, &items(&[1]), "a..b", sum, None).unwrap_err();
    assert!(matches!(err, ObserverError::InvalidPath(_)));
    assert_eq!(scheduler.observer_count(), 0);
}
