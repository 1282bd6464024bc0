//! Ordering, grandparent and write-once rules against in-memory records.

use chrono::{TimeDelta, Utc};
use nebula_record_validator::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

// ============================================================================
// ORDERING
// ============================================================================

#[rstest]
#[case(Value::from(3), vec![])]
#[case(Value::from(10), vec![ErrorKind::Before])]
#[case(Value::from(12), vec![ErrorKind::Before])]
#[case(Value::Nil, vec![])]
fn before_fails_iff_value_is_not_less(#[case] start: Value, #[case] expected: Vec<ErrorKind>) {
    let rules = RuleSet::new()
        .validates(&["start_at"], &Options::new().with("before", "finish_at"))
        .unwrap();
    let record = MemoryRecord::new()
        .with_attribute("start_at", start)
        .with_attribute("finish_at", 10);

    assert_eq!(rules.validate(&record).unwrap().kinds_on("start_at"), expected);
}

#[test]
fn after_reports_label_and_values() {
    let rules = RuleSet::new()
        .validates(&["finish_at"], &Options::new().with("after", "start_at"))
        .unwrap();
    let record = MemoryRecord::new()
        .with_attribute("start_at", 10)
        .with_attribute("finish_at", 4);

    let errors = rules.validate(&record).unwrap();
    let entry = &errors.entries()[0];
    assert_eq!(entry.kind, ErrorKind::After);
    assert_eq!(entry.param("attribute2"), Some("Start at"));
    assert_eq!(entry.param("value"), Some("4"));
    assert_eq!(entry.param("compared_to"), Some("10"));
}

#[test]
fn now_is_resolved_on_every_pass() {
    let rules = RuleSet::new()
        .validates(&["expires_at"], &Options::new().with("after", "now"))
        .unwrap();
    let soon = MemoryRecord::new().with_attribute("expires_at", Utc::now() + TimeDelta::milliseconds(500));

    assert!(rules.validate(&soon).unwrap().is_empty());
    std::thread::sleep(std::time::Duration::from_millis(700));
    assert_eq!(rules.validate(&soon).unwrap().kinds_on("expires_at"), vec![ErrorKind::After]);
}

#[test]
fn computed_ordering_target() {
    let rules = RuleSet::new()
        .validates(
            &["age"],
            &Options::new().nested(
                "after",
                Options::new().computed("value_of", "Minimum age", |record| {
                    let adult = record.invoke("adult")?.is_truthy();
                    Ok(Value::from(if adult { 17 } else { 0 }))
                }),
            ),
        )
        .unwrap();

    let minor = MemoryRecord::new().with_attribute("age", 12).with_attribute("adult", false);
    let claims_adult = minor.clone().with_attribute("adult", true);

    assert!(rules.validate(&minor).unwrap().is_empty());
    let errors = rules.validate(&claims_adult).unwrap();
    assert_eq!(errors.entries()[0].param("attribute2"), Some("Minimum age"));
}

// ============================================================================
// GRANDPARENT
// ============================================================================

fn member_of(realm: i64) -> Value {
    Value::record(MemoryRecord::new().with_attribute("realm_id", realm))
}

#[test]
fn grandparent_through_foreign_key() {
    let rules = RuleSet::new()
        .validates(
            &["user_id"],
            &Options::new().nested(
                "grandparent",
                Options::new().with("scope", "org").with("parent", "realm_id"),
            ),
        )
        .unwrap();

    let same = MemoryRecord::new()
        .with_attribute("user_id", 7)
        .with_accessor("user", member_of(1))
        .with_accessor("org", member_of(1));
    let different = same.clone().with_accessor("org", member_of(2));

    assert!(rules.validate(&same).unwrap().is_empty());
    assert_eq!(rules.validate(&different).unwrap().kinds_on("user_id"), vec![ErrorKind::Invalid]);
}

#[test]
fn grandparent_reports_once_for_several_failing_scopes() {
    let rules = RuleSet::new()
        .validates(
            &["user"],
            &Options::new().nested(
                "grandparent",
                Options::new()
                    .with("scope", vec!["phone", "address"])
                    .with("parent", "realm_id"),
            ),
        )
        .unwrap();
    let record = MemoryRecord::new()
        .with_attribute("user", member_of(1))
        .with_accessor("phone", member_of(2))
        .with_accessor("address", member_of(3));

    assert_eq!(rules.validate(&record).unwrap().len(), 1);
}

#[test]
fn grandparent_on_plain_value_is_a_fault() {
    let rules = RuleSet::new()
        .validates(
            &["user"],
            &Options::new().nested(
                "grandparent",
                Options::new().with("scope", "org").with("parent", "realm_id"),
            ),
        )
        .unwrap();
    let record = MemoryRecord::new()
        .with_attribute("user", "not a record")
        .with_accessor("org", member_of(1));

    assert!(matches!(
        rules.validate(&record),
        Err(RecordError::NotARecord { .. })
    ));
}

// ============================================================================
// WRITE ONCE
// ============================================================================

#[rstest]
#[case("write_once")]
#[case("worm")]
fn write_once_lifecycle(#[case] rule: &str) {
    let rules = RuleSet::new()
        .validates(&["token"], &Options::new().with(rule, true))
        .unwrap();

    // first write on an unpersisted record
    let mut record = MemoryRecord::new().with_attribute("token", Value::Nil);
    record.set("token", "abc");
    assert!(rules.validate(&record).unwrap().is_empty());

    record.persist();
    record.set("token", "xyz");
    let errors = rules.validate(&record).unwrap();
    assert_eq!(errors.kinds_on("token"), vec![ErrorKind::Unchangeable]);
    assert_eq!(rules.rules()[0].validator().kind(), rule);
}

#[test]
fn immutable_nil_forbids_late_first_write() {
    let loose = RuleSet::new()
        .validates(&["token"], &Options::new().with("write_once", true))
        .unwrap();
    let strict = RuleSet::new()
        .validates(
            &["token"],
            &Options::new().nested("write_once", Options::new().with("immutable_nil", true)),
        )
        .unwrap();

    let mut record = MemoryRecord::new().with_attribute("token", Value::Nil).persisted();
    record.set("token", "abc");

    assert!(loose.validate(&record).unwrap().is_empty());
    assert_eq!(strict.validate(&record).unwrap().kinds_on("token"), vec![ErrorKind::Unchangeable]);
}
