mod common;

use chrono::{Duration, TimeZone, Utc};
use common::*;
use ent_sdk::{EntError, FieldValue};
use uuid::Uuid;

#[tokio::test]
async fn create_with_explicit_values() {
    let (registry, session, vc) = setup();
    let sub = registry.schema("EntTestSubObject").unwrap().example(&vc).save(&session).await.unwrap();
    let ent = registry
        .schema("EntTestObject")
        .unwrap()
        .create(&vc)
        .set("a_good_thing", "Eating cheese")
        .set("username", "vdurmont")
        .set("firstname", "Vincent")
        .set("required_sub_object", sub.id())
        .save(&session)
        .await
        .unwrap();
    assert_eq!(ent.get("firstname"), &FieldValue::from("Vincent"));
    assert_eq!(ent.get("lastname"), &FieldValue::from("Doe"));
    assert_eq!(ent.get("sadness"), &FieldValue::from(Status::Sad));
    // Examples only apply to the example factory.
    assert!(ent.get("city").is_null());
}

#[tokio::test]
async fn missing_mandatory_value_is_rejected() {
    let (registry, session, vc) = setup();
    let err = registry
        .schema("EntTestObject")
        .unwrap()
        .create(&vc)
        .set("a_good_thing", "Eating cheese")
        .set("username", "vdurmont")
        .save(&session)
        .await
        .unwrap_err();
    match err {
        EntError::Validation(message) => assert!(message.starts_with("Missing value for EntTestObject.")),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(session.row_count("test_object").await, 0);
}

#[tokio::test]
async fn assigned_id_and_creation_time_are_honored() {
    let (registry, session, vc) = setup();
    let id = Uuid::new_v4();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let ent = registry
        .schema("EntTestSubObject")
        .unwrap()
        .create(&vc)
        .with_id(id)
        .with_created_at(at)
        .save(&session)
        .await
        .unwrap();
    assert_eq!(ent.id(), id);
    assert_eq!(ent.created_at(), at);
}

#[tokio::test]
async fn unknown_field_is_rejected() {
    let (registry, session, vc) = setup();
    let err = registry
        .schema("EntTestSubObject")
        .unwrap()
        .create(&vc)
        .set("nope", 1)
        .save(&session)
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn wrong_kind_and_overlong_values_are_rejected() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestObject").unwrap();
    let err = objects.example(&vc).set("status_code", "404").save(&session).await.unwrap_err();
    assert!(err.is_validation());
    let err = objects.example(&vc).set("city", "x".repeat(101)).save(&session).await.unwrap_err();
    assert!(err.is_validation());
    let err = objects.example(&vc).set("status", "MAYBE").save(&session).await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn validators_run_on_create() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestObject").unwrap();
    let err = objects.example(&vc).set("validated_field", "Yolo").save(&session).await.unwrap_err();
    assert_eq!(err.to_string(), "validation: Invalid value for EntTestObject.validated_field");

    let ent = objects.example(&vc).set("validated_field", "y_olo").save(&session).await.unwrap();
    assert_eq!(ent.get("validated_field"), &FieldValue::from("y_olo"));
    let ent = objects.example(&vc).set("validated_field", "").save(&session).await.unwrap();
    assert_eq!(ent.get("validated_field"), &FieldValue::from(""));
}

#[tokio::test]
async fn validators_run_on_update() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestObject").unwrap();
    let ent = objects.example(&vc).save(&session).await.unwrap();

    let err = objects
        .update(&vc, &ent)
        .set("validated_field", "Yolo")
        .save(&session)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let updated = objects
        .update(&vc, &ent)
        .set("validated_field", "y_olo")
        .save(&session)
        .await
        .unwrap();
    assert_eq!(updated.get("validated_field"), &FieldValue::from("y_olo"));
}

#[tokio::test]
async fn pattern_validators_run_on_update() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestObject").unwrap();
    let ent = objects.example(&vc).save(&session).await.unwrap();
    assert_eq!(ent.get("a_pattern_validated_field"), &FieldValue::from("vdurmont"));

    let err = objects
        .update(&vc, &ent)
        .set("a_pattern_validated_field", "Yolo")
        .save(&session)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let updated = objects
        .update(&vc, &ent)
        .set("a_pattern_validated_field", "yolo")
        .save(&session)
        .await
        .unwrap();
    assert_eq!(updated.get("a_pattern_validated_field"), &FieldValue::from("yolo"));
}

#[tokio::test]
async fn update_writes_only_the_fields_set() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestObject").unwrap();
    let ent = objects.example(&vc).save(&session).await.unwrap();
    let stale = ent.clone();

    // Someone else changes the city in between.
    objects.update(&vc, &ent).set("city", "Paris").save(&session).await.unwrap();

    let updated = objects.update(&vc, &stale).set("firstname", "Chris").save(&session).await.unwrap();
    assert_eq!(updated.get("firstname"), &FieldValue::from("Chris"));
    assert_eq!(updated.get("city"), &FieldValue::from("Paris"));
}

#[tokio::test]
async fn update_action_exposes_pending_values() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestObject").unwrap();
    let ent = objects.example(&vc).save(&session).await.unwrap();
    let action = objects.update(&vc, &ent);
    assert_eq!(action.get("firstname"), &FieldValue::from("Vincent"));
    let action = action.set("firstname", "Chris").set("city", None::<String>);
    assert_eq!(action.get("firstname"), &FieldValue::from("Chris"));
    let updated = action.save(&session).await.unwrap();
    assert!(updated.get("city").is_null());
}

#[tokio::test]
async fn immutable_fields_cannot_be_updated() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestObject").unwrap();
    let ent = objects.example(&vc).save(&session).await.unwrap();
    assert_eq!(ent.get("context"), &FieldValue::from("This is some good context."));
    let err = objects.update(&vc, &ent).set("context", "new").save(&session).await.unwrap_err();
    assert_eq!(err.to_string(), "validation: EntTestObject.context is immutable");
}

#[tokio::test]
async fn immutable_schemas_cannot_be_updated() {
    let (registry, session, vc) = setup();
    let obj5 = registry.schema("EntTestObject5").unwrap();
    let ent = obj5.create(&vc).set("obj5_field", "Yo!").save(&session).await.unwrap();
    assert_eq!(ent.get("is_it_true"), &FieldValue::Bool(true));
    let err = obj5.update(&vc, &ent).set("obj5_field", "No").save(&session).await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn update_refreshes_updated_at() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestSubObject").unwrap();
    let past = Utc::now() - Duration::days(1);
    let ent = objects.create(&vc).with_created_at(past).save(&session).await.unwrap();
    assert_eq!(ent.updated_at(), ent.created_at());
    let updated = objects.update(&vc, &ent).set("email", "a@b.c").save(&session).await.unwrap();
    assert_eq!(updated.created_at(), ent.created_at());
    assert!(updated.updated_at() > ent.updated_at());
}

#[tokio::test]
async fn delete_removes_the_row() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestObject").unwrap();
    let ent = objects.example(&vc).save(&session).await.unwrap();
    objects.delete(&vc, &ent).save(&session).await.unwrap();
    assert!(objects.gen(&session, &vc, ent.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn explicit_null_beats_the_example() {
    let (registry, session, vc) = setup();
    let ent = registry
        .schema("EntTestObject")
        .unwrap()
        .example(&vc)
        .set("city", FieldValue::Null)
        .set("optional_sub_object_no_ex", FieldValue::Null)
        .save(&session)
        .await
        .unwrap();
    assert!(ent.get("city").is_null());
    assert!(ent.get("optional_sub_object_no_ex_id").is_null());
}

#[tokio::test]
async fn null_edge_is_synthesized_like_a_missing_one() {
    let (registry, session, vc) = setup();
    let ent = registry
        .schema("EntTestObject")
        .unwrap()
        .example(&vc)
        .set("optional_sub_object", FieldValue::Null)
        .set("self", FieldValue::Null)
        .save(&session)
        .await
        .unwrap();
    assert!(ent.get("optional_sub_object_id").as_uuid().is_some());
    assert!(ent.get("self_id").is_null());
    assert_eq!(session.row_count("test_sub_object").await, 2);
}

#[tokio::test]
async fn explicit_null_on_a_mandatory_field_fails() {
    let (registry, session, vc) = setup();
    let err = registry
        .schema("EntTestObject")
        .unwrap()
        .example(&vc)
        .set("firstname", FieldValue::Null)
        .save(&session)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "validation: Missing value for EntTestObject.firstname");
}
