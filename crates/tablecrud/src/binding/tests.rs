use super::*;
use crate::error::ExecutionStage;
use serde_json::json;

#[test]
fn test_from_triples_preserves_order() {
    let set = BindingSet::from_triples("", [("name", "s", "Ali"), ("age", "i", "23")]).unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.columns().collect::<Vec<_>>(), vec!["name", "age"]);
    assert_eq!(set.bindings()[0].tag(), TypeTag::String);
    assert_eq!(set.bindings()[1].tag(), TypeTag::Integer);
    assert_eq!(set.bindings()[1].value(), &Value::from("23"));
}

#[test]
fn test_empty_set_is_valid() {
    let set = BindingSet::from_json("", &json!([])).unwrap();
    assert!(set.is_empty());
    assert_eq!(set.fragment(), "");
    assert_eq!(BindingSet::empty(), set);
}

#[test]
fn test_unknown_tags_rejected() {
    for tag in ["x", "I", "z", "1", "?"] {
        let err = BindingSet::from_json("", &json!([["age", tag, "23"]])).unwrap_err();
        assert!(err.is_unknown_type(), "tag {tag}: {err}");
    }
}

#[test]
fn test_blob_tag_unsupported() {
    let err = BindingSet::from_json("", &json!([["avatar", "b", "..."]])).unwrap_err();
    assert!(err.is_unsupported_type());
    assert_eq!(err.to_string(), "Unsupported type (b)");

    let err = Binding::parse("avatar", "b", "...").unwrap_err();
    assert!(err.is_unsupported_type());
}

#[test]
fn test_malformed_shapes_rejected() {
    let cases = [
        // empty column
        json!([["", "s", "Ali"]]),
        // wrong arity
        json!([["name", "s"]]),
        json!([["name", "s", "Ali", "extra"]]),
        // wrong field order: tag first
        json!([["s", "name", "Ali"]]),
        // wrong field order: value first
        json!([["Ali", "name", "s"]]),
        // keyed object instead of positional triple
        json!([{"0": "name", "1": "s", "2": "Ali"}]),
        // non-string column
        json!([[1, "s", "Ali"]]),
        // multi-character and empty tags
        json!([["name", "ss", "Ali"]]),
        json!([["name", "", "Ali"]]),
        // non-scalar value
        json!([["name", "s", ["Ali"]]]),
        // not a list at all
        json!({"name": "Ali"}),
        json!(["name", "s", "Ali"]),
    ];

    for case in cases {
        let err = BindingSet::from_json("", &case).unwrap_err();
        assert!(err.is_malformed(), "{case}: {err}");
    }
}

#[test]
fn test_shape_is_checked_before_tag() {
    // A bad tag on a triple with the wrong arity is reported as a shape error.
    let err = BindingSet::from_json("", &json!([["name", "x"]])).unwrap_err();
    assert!(err.is_malformed());
}

#[test]
fn test_first_failure_wins() {
    let err = BindingSet::from_json("", &json!([["a", "i", 1], ["b", "q", 2], ["", "s", 3]]))
        .unwrap_err();
    assert!(err.is_unknown_type());
}

#[test]
fn test_typed_constructors() {
    assert!(Binding::integer("", 1).unwrap_err().is_malformed());
    assert!(Binding::parse("", "i", 1).unwrap_err().is_malformed());
    assert!(Binding::parse("", "x", 1).unwrap_err().is_malformed());
    assert!(Binding::parse("age", "x", 1).unwrap_err().is_unknown_type());

    let b = Binding::typed("score", 1.5).unwrap();
    assert_eq!(b.tag(), TypeTag::Double);
    let b = Binding::typed("nick", Option::<&str>::None).unwrap();
    assert_eq!(b.value(), &Value::Null);
}

#[test]
fn test_value_kind_is_checked_at_bind_time() {
    // Construction accepts a mismatched value...
    let b = Binding::parse("age", "i", "twenty").unwrap();
    // ...and binding rejects it.
    let err = b.bind_value().unwrap_err();
    assert!(err.is_execution());
    assert_eq!(err.stage(), Some(ExecutionStage::Bind));
    assert!(err.to_string().contains("age"));
}

#[test]
fn test_bind_value_coerces_by_tag() {
    let b = Binding::parse("age", "i", "23").unwrap();
    assert_eq!(b.bind_value().unwrap(), Value::Integer(23));
    let b = Binding::parse("name", "s", 42).unwrap();
    assert_eq!(b.bind_value().unwrap(), Value::from("42"));
}

#[test]
fn test_fragment_placeholder_count() {
    let set = BindingSet::new(
        "WHERE id = ? AND note <> 'n?'",
        vec![Binding::integer("id", 5).unwrap()],
    );
    assert_eq!(set.placeholder_count(), 1);
    assert_eq!(BindingSet::fragment_only("ORDER BY id").placeholder_count(), 0);
}
