mod common;

use chrono::{Duration, Utc};
use common::*;
use ent_sdk::{col, ColumnRef, Direction, FieldValue, MemorySession, SchemaHandle, Vc};

async fn people(handle: &SchemaHandle, session: &MemorySession, vc: &Vc, names: &[(&str, &str)]) {
    let start = Utc::now() - Duration::minutes(10);
    for (i, (first, city)) in names.iter().enumerate() {
        handle
            .example(vc)
            .set("firstname", *first)
            .set("city", *city)
            .with_created_at(start + Duration::seconds(i as i64))
            .save(session)
            .await
            .unwrap();
    }
}

fn firstnames(ents: &[ent_sdk::Ent]) -> Vec<String> {
    ents.iter().filter_map(|e| e.get_as::<String>("firstname")).collect()
}

#[tokio::test]
async fn filters_combine_with_and() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestObject").unwrap();
    people(&objects, &session, &vc, &[("ann", "Paris"), ("bob", "Paris"), ("cat", "Rome")]).await;

    let mut query = objects.query(&vc);
    query.where_(col("city").eq("Paris")).where_(col("firstname").ne("bob"));
    assert_eq!(firstnames(&query.gen(&session).await.unwrap()), ["ann"]);

    let mut query = objects.query(&vc);
    query
        .where_(col("firstname").eq("ann") | col("city").eq("Rome"))
        .order_by(col("firstname"), Direction::Asc);
    assert_eq!(firstnames(&query.gen(&session).await.unwrap()), ["ann", "cat"]);

    let mut query = objects.query(&vc);
    query.where_(!col("city").eq("Paris"));
    assert_eq!(firstnames(&query.gen(&session).await.unwrap()), ["cat"]);
}

#[tokio::test]
async fn null_comparisons_match_nothing() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestObject").unwrap();
    objects.example(&vc).set("city", FieldValue::Null).save(&session).await.unwrap();
    objects.example(&vc).save(&session).await.unwrap();

    let mut query = objects.query(&vc);
    query.where_(col("city").ne("Los Angeles"));
    assert!(query.gen(&session).await.unwrap().is_empty());

    let mut query = objects.query(&vc);
    query.where_(col("city").is_null());
    assert_eq!(query.gen(&session).await.unwrap().len(), 1);
}

#[tokio::test]
async fn ordering_and_paging() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestObject").unwrap();
    people(&objects, &session, &vc, &[("a", "x"), ("b", "x"), ("c", "x"), ("d", "x")]).await;

    let mut query = objects.query(&vc);
    query.order_by_id_desc().limit(2).offset(1);
    assert_eq!(firstnames(&query.gen(&session).await.unwrap()), ["c", "b"]);

    let mut query = objects.query(&vc);
    query.order_by_id_asc();
    assert_eq!(firstnames(&query.gen(&session).await.unwrap()), ["a", "b", "c", "d"]);

    let mut query = objects.query(&vc);
    query.where_(col("firstname").in_(["b", "d"])).order_by(col("created_at"), Direction::Desc);
    assert_eq!(firstnames(&query.gen(&session).await.unwrap()), ["d", "b"]);
}

#[tokio::test]
async fn first_and_count() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestObject").unwrap();
    people(&objects, &session, &vc, &[("red", "x"), ("rose", "x"), ("blue", "x")]).await;

    let mut query = objects.query(&vc);
    query.where_(col("firstname").starts_with("r")).order_by_id_asc().limit(1);
    let first = query.genx_first(&session).await.unwrap();
    assert_eq!(first.get_as::<String>("firstname").as_deref(), Some("red"));
    // Paging does not affect the count.
    assert_eq!(query.gen_count_no_privacy(&session).await.unwrap(), 2);

    let mut query = objects.query(&vc);
    query.where_(col("firstname").starts_with("v"));
    assert!(query.gen_first(&session).await.unwrap().is_none());
    let err = query.genx_first(&session).await.unwrap_err();
    assert_eq!(err.to_string(), "not found: Expected query to return an ent, got None.");
    assert_eq!(query.gen_count_no_privacy(&session).await.unwrap(), 0);
}

#[tokio::test]
async fn join_filters_on_the_edge_target() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestObject").unwrap();
    let subs = registry.schema("EntTestSubObject").unwrap();
    let special = subs.create(&vc).set("email", "special@example.com").save(&session).await.unwrap();
    let wanted = objects
        .example(&vc)
        .set("required_sub_object", special.id())
        .save(&session)
        .await
        .unwrap();
    objects.example(&vc).save(&session).await.unwrap();

    let mut query = objects.query(&vc);
    query
        .join(
            subs.table(),
            col("required_sub_object_id").eq_col(ColumnRef::qualified("test_sub_object", "id")),
        )
        .where_(ColumnRef::qualified("test_sub_object", "email").eq("special@example.com"));
    let found = query.gen(&session).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), wanted.id());
    assert_eq!(found[0].type_name(), "EntTestObject");
}

#[tokio::test]
async fn queries_are_reusable() {
    let (registry, session, vc) = setup();
    let objects = registry.schema("EntTestObject").unwrap();
    people(&objects, &session, &vc, &[("a", "x"), ("b", "y")]).await;

    let mut base = objects.query(&vc);
    base.where_(col("city").eq("x"));
    let mut narrowed = base.clone();
    narrowed.where_(col("firstname").eq("b"));
    assert_eq!(base.gen(&session).await.unwrap().len(), 1);
    assert!(narrowed.gen(&session).await.unwrap().is_empty());
}
