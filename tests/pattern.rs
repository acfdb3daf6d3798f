mod common;

use chrono::{Duration, Utc};
use common::*;
use ent_sdk::{col, generate_id, EntError, FieldValue};

#[tokio::test]
async fn gen_dispatches_to_the_owning_schema() {
    let (registry, session, vc) = setup();
    let things = registry.pattern("EntTestThing").unwrap();
    let object = registry.schema("EntTestObject").unwrap().example(&vc).save(&session).await.unwrap();
    let object2 = registry.schema("EntTestObject2").unwrap().example(&vc).save(&session).await.unwrap();

    let loaded = things.gen(&session, &vc, object.id()).await.unwrap().expect("visible");
    assert_eq!(loaded.type_name(), "EntTestObject");
    assert_eq!(loaded.get("firstname"), &FieldValue::from("Vincent"));

    let loaded = things.genx(&session, &vc, object2.id().to_string()).await.unwrap();
    assert_eq!(loaded.type_name(), "EntTestObject2");
}

#[tokio::test]
async fn ids_of_other_schemas_are_not_things() {
    let (registry, session, vc) = setup();
    let things = registry.pattern("EntTestThing").unwrap();
    let sub = registry.schema("EntTestSubObject").unwrap().example(&vc).save(&session).await.unwrap();
    assert!(things.gen(&session, &vc, sub.id()).await.unwrap().is_none());
    assert!(things.genx(&session, &vc, sub.id()).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn unregistered_tag_is_an_error() {
    let (registry, session, vc) = setup();
    let things = registry.pattern("EntTestThing").unwrap();
    let id = generate_id([0x00, 0x00], Utc::now());
    match things.gen(&session, &vc, id).await {
        Err(EntError::UnknownTypeTag { tag, id: reported }) => {
            assert_eq!(tag, [0x00, 0x00]);
            assert_eq!(reported, id);
        }
        other => panic!("expected an unknown tag, got {:?}", other),
    }
}

#[tokio::test]
async fn query_across_schemas() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestObject").unwrap();
    let objects2 = registry.schema("EntTestObject2").unwrap();
    let start = Utc::now() - Duration::minutes(5);
    let at = |i: i64| start + Duration::seconds(i);

    let red = objects.example(&vc).set("a_good_thing", "red").with_created_at(at(0)).save(&session).await.unwrap();
    let blue = objects.example(&vc).set("a_good_thing", "blue").with_created_at(at(1)).save(&session).await.unwrap();
    let brown = objects2.example(&vc).set("a_good_thing", "brown").with_created_at(at(2)).save(&session).await.unwrap();
    objects2.example(&vc).set("a_good_thing", "yellow").with_created_at(at(3)).save(&session).await.unwrap();

    let things = registry.pattern("EntTestThing").unwrap();
    let mut query = things.query(&vc);
    query.where_(col("a_good_thing").starts_with("b")).order_by_id_desc();
    let ents = query.gen(&session).await.unwrap();
    let ids: Vec<_> = ents.iter().map(|e| e.id()).collect();
    assert_eq!(ids, [brown.id(), blue.id()]);
    assert_eq!(ents[0].type_name(), "EntTestObject2");
    assert_eq!(ents[1].type_name(), "EntTestObject");

    let mut query = things.query(&vc);
    query.where_(col("a_good_thing").starts_with("r"));
    assert_eq!(query.genx_first(&session).await.unwrap().id(), red.id());

    for (prefix, expected) in [("y", 1), ("b", 2), ("v", 0)] {
        let mut query = things.query(&vc);
        query.where_(col("a_good_thing").starts_with(prefix));
        assert_eq!(query.gen_count_no_privacy(&session).await.unwrap(), expected, "prefix {}", prefix);
    }

    let mut query = things.query(&vc);
    query.where_(col("ent_type").eq("EntTestObject2"));
    assert_eq!(query.gen_count_no_privacy(&session).await.unwrap(), 2);
}

#[tokio::test]
async fn pattern_updates_are_limited_to_pattern_fields() {
    let (registry, session, vc) = setup();
    let things = registry.pattern("EntTestThing").unwrap();
    let object = registry.schema("EntTestObject").unwrap().example(&vc).save(&session).await.unwrap();
    let thing = things.genx(&session, &vc, object.id()).await.unwrap();

    let updated = things
        .update(&vc, &thing)
        .set("a_good_thing", "Taking a nap")
        .set("thing_status", ThingStatus::Good)
        .save(&session)
        .await
        .unwrap();
    assert_eq!(updated.get("a_good_thing"), &FieldValue::from("Taking a nap"));
    assert_eq!(updated.get_as::<ThingStatus>("thing_status"), Some(ThingStatus::Good));

    let err = things.update(&vc, &thing).set("firstname", "Chris").save(&session).await.unwrap_err();
    assert!(err.is_validation());

    things.delete(&vc, &updated).save(&session).await.unwrap();
    assert!(things.gen(&session, &vc, object.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn pattern_example_uses_the_example_schema() {
    let (registry, session, vc) = setup();
    let things = registry.pattern("EntTestThing").unwrap();
    let ent = things.example(&vc).unwrap().save(&session).await.unwrap();
    assert_eq!(ent.type_name(), "EntTestObject2");
    assert_eq!(ent.get("a_good_thing"), &FieldValue::from("A sunny day"));
}
