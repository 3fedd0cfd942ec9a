use bson::{Bson, DateTime, Timestamp, doc};
use telemetry_gateway::decode::{Cell, ColumnKind, Decoder, decode_value};
use telemetry_gateway::errors::GatewayError;

fn fields(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn columns_advance_in_lockstep_with_null_placeholders() {
    let docs = vec![
        Ok(doc! { "tick": 1, "score": 2.5 }),
        Ok(doc! { "tick": 2 }),
        Ok(doc! { "score": 7.0, "extra": "ignored" }),
    ];
    let set = Decoder::new("position").decode(docs, &fields(&["tick", "score"]));
    assert_eq!(set.documents(), 3);
    assert_eq!(set.values("tick").unwrap(), &[Cell::Number(1.0), Cell::Number(2.0), Cell::Null]);
    assert_eq!(set.values("score").unwrap(), &[Cell::Number(2.5), Cell::Null, Cell::Number(7.0)]);
}

#[test]
fn vector_field_decomposes_into_interleaved_triples() {
    let docs = vec![
        Ok(doc! { "tick": 1, "params": { "position": "Vector3(1.5, -2, 3.25)" } }),
        Ok(doc! { "tick": 2 }),
        Ok(doc! { "tick": 3, "params": { "position": "Vector3(0,0,1)" } }),
    ];
    let set = Decoder::new("position").decode(docs, &fields(&["tick", "params.position"]));
    let pos = set.column("params.position").unwrap();
    assert_eq!(pos.kind, ColumnKind::Vector3);
    assert_eq!(pos.rows(), 3);
    assert_eq!(
        pos.values,
        vec![
            Cell::Number(1.5),
            Cell::Number(-2.0),
            Cell::Number(3.25),
            Cell::Null,
            Cell::Null,
            Cell::Null,
            Cell::Number(0.0),
            Cell::Number(0.0),
            Cell::Number(1.0),
        ]
    );
    assert_eq!(set.values("tick").unwrap().len(), 3);
    assert_eq!(set.malformed_vectors(), 0);
}

#[test]
fn malformed_vectors_yield_null_triples_and_are_counted() {
    let docs = vec![
        Ok(doc! { "position": "Vector3(1, 2)" }),
        Ok(doc! { "position": 12 }),
        Ok(doc! { "position": "Vector3(4, 5, 6)" }),
    ];
    let set = Decoder::new("position").decode(docs, &fields(&["position"]));
    let v = set.values("position").unwrap();
    assert_eq!(v.len(), 9);
    assert!(v[..6].iter().all(Cell::is_null));
    assert_eq!(v[6..].iter().map(|c| c.as_f64().unwrap()).collect::<Vec<_>>(), vec![4.0, 5.0, 6.0]);
    assert_eq!(set.malformed_vectors(), 2);
}

#[test]
fn vector_key_matches_leaf_only() {
    let d = Decoder::new("position");
    assert!(d.is_vector_field("position"));
    assert!(d.is_vector_field("params.position"));
    assert!(!d.is_vector_field("params.position_x"));
    assert!(!d.is_vector_field("position.x"));
    assert!(Decoder::new("pos").is_vector_field("a.b.pos"));
}

#[test]
fn value_type_mapping() {
    assert_eq!(decode_value(&Bson::Double(0.5)), Cell::Number(0.5));
    assert_eq!(decode_value(&Bson::Int32(-3)), Cell::Number(-3.0));
    assert_eq!(decode_value(&Bson::Int64(1 << 40)), Cell::Number(1_099_511_627_776.0));
    assert_eq!(decode_value(&Bson::String("s".into())), Cell::String("s".into()));
    assert_eq!(decode_value(&Bson::Boolean(true)), Cell::Boolean(true));
    assert_eq!(decode_value(&Bson::DateTime(DateTime::from_millis(1_700_000_000_123))), Cell::Number(1_700_000_000_123.0));
    assert_eq!(decode_value(&Bson::Timestamp(Timestamp { time: 42, increment: 7 })), Cell::Number(42.0));
    assert_eq!(decode_value(&Bson::Null), Cell::Null);
    assert_eq!(decode_value(&Bson::Undefined), Cell::Null);
    assert_eq!(decode_value(&Bson::Array(vec![Bson::Int32(1)])), Cell::Null);
    assert_eq!(decode_value(&Bson::Document(doc! { "a": 1 })), Cell::Null);
}

#[test]
fn cursor_errors_are_counted_and_iteration_continues() {
    let docs = vec![
        Ok(doc! { "tick": 1 }),
        Err(GatewayError::Transport("boom".into())),
        Ok(doc! { "tick": 2 }),
    ];
    let set = Decoder::new("position").decode(docs, &fields(&["tick"]));
    assert_eq!(set.cursor_errors(), 1);
    assert_eq!(set.documents(), 2);
    assert_eq!(set.values("tick").unwrap(), &[Cell::Number(1.0), Cell::Number(2.0)]);
}

#[test]
fn json_shape_is_field_to_array() {
    let docs = vec![Ok(doc! { "tick": 1, "name": "a", "on": false, "position": "Vector3(1,2,3)" })];
    let set = Decoder::new("position").decode(docs, &fields(&["tick", "name", "on", "position", "missing"]));
    assert_eq!(
        set.to_json(),
        serde_json::json!({
            "tick": [1.0],
            "name": ["a"],
            "on": [false],
            "position": [1.0, 2.0, 3.0],
            "missing": [null],
        })
    );
}

#[test]
fn empty_cursor_gives_empty_columns_for_each_field() {
    let set = Decoder::new("position").decode(Vec::new(), &fields(&["a", "position"]));
    assert_eq!(set.columns().len(), 2);
    assert!(set.columns().iter().all(|c| c.values.is_empty()));
    assert_eq!(set.documents(), 0);
}
