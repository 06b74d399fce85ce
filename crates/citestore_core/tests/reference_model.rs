use citestore_core::{FieldMap, Reference, ReferenceField, ReferenceFields};

#[test]
fn serializes_with_column_names() {
    let mut reference = Reference::new("dijkstra1968");
    reference.title = Some("Go To Statement Considered Harmful".to_string());
    reference.volume_or_number = Some("11".to_string());

    let value = serde_json::to_value(&reference).unwrap();
    assert_eq!(value["citekey"], "dijkstra1968");
    assert_eq!(value["volume_or_number"], "11");
    assert!(value["author"].is_null());

    let decoded: Reference = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, reference);
}

#[test]
fn field_map_and_reference_agree_on_fields() {
    let mut fields = FieldMap::new();
    for field in ReferenceField::ALL {
        fields.insert(field.as_str().to_string(), format!("{field}-value"));
    }

    let reference = Reference::from_field_map(&fields).unwrap();
    assert_eq!(reference.get_fields(), fields);
    assert_eq!(reference.get_field(ReferenceField::Month), Some("month-value"));
    assert_eq!(fields.citekey().as_deref(), Some("citekey-value"));
}
