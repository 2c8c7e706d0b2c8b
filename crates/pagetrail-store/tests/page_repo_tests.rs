// Page repository: section updates, row CRUD, state loading

mod common;

use common::{obj, seed_page, setup_db};
use pagetrail_core::model::{CollectionKind, Section};
use pagetrail_store::repo::PageRepo;
use serde_json::json;

#[test]
fn test_get_missing_page_is_none() {
    let (_dir, conn) = setup_db();
    assert!(PageRepo::get_page(&conn, "nope").unwrap().is_none());
    let err = PageRepo::load_page_state(&conn, "nope").unwrap_err();
    assert_eq!(err.code(), "ERR_NOT_FOUND");
}

#[test]
fn test_update_section() {
    let (_dir, conn) = setup_db();
    seed_page(&conn, "p1", "u1");
    PageRepo::update_section(&conn, "p1", Section::Settings, &obj(json!({"title": "New"})), 5)
        .unwrap();
    let page = PageRepo::get_page(&conn, "p1").unwrap().unwrap();
    assert_eq!(page.settings["title"], "New");
    assert_eq!(page.updated_at, 5);
}

#[test]
fn test_ordered_rows_load_by_position_with_ids() {
    let (_dir, conn) = setup_db();
    seed_page(&conn, "p1", "u1");
    let ids = PageRepo::create_rows(
        &conn,
        "p1",
        CollectionKind::Links,
        &[
            json!({"title": "B", "position": 1}),
            json!({"title": "A", "position": 0}),
        ],
    )
    .unwrap();
    assert_eq!(ids.len(), 2);

    let state = PageRepo::load_page_state(&conn, "p1").unwrap();
    let links = state.collection(CollectionKind::Links);
    assert_eq!(links[0]["title"], "A");
    assert_eq!(links[0]["id"], json!(ids[1]));
    assert_eq!(links[1]["id"], json!(ids[0]));
}

#[test]
fn test_value_set_and_unordered_shapes() {
    let (_dir, conn) = setup_db();
    seed_page(&conn, "p1", "u1");
    PageRepo::create_rows(&conn, "p1", CollectionKind::AccentColors, &[json!("#fff")]).unwrap();
    PageRepo::create_rows(&conn, "p1", CollectionKind::Labels, &[json!({"text": "new"})]).unwrap();

    let state = PageRepo::load_page_state(&conn, "p1").unwrap();
    assert_eq!(state.collection(CollectionKind::AccentColors), &[json!("#fff")]);
    assert_eq!(state.collection(CollectionKind::Labels), &[json!({"text": "new"})]);
}

#[test]
fn test_row_ids_are_never_reused() {
    let (_dir, conn) = setup_db();
    seed_page(&conn, "p1", "u1");
    let first = PageRepo::create_row(&conn, "p1", CollectionKind::Categories, &json!({"name": "a"}))
        .unwrap();
    PageRepo::delete_rows(&conn, "p1", CollectionKind::Categories, &[first]).unwrap();
    let second =
        PageRepo::create_row(&conn, "p1", CollectionKind::Categories, &json!({"name": "b"}))
            .unwrap();
    assert!(second > first);
}

#[test]
fn test_create_row_with_id_only_when_free() {
    let (_dir, conn) = setup_db();
    seed_page(&conn, "p1", "u1");
    let id = PageRepo::create_row(&conn, "p1", CollectionKind::Links, &json!({"title": "x"}))
        .unwrap();
    PageRepo::delete_rows(&conn, "p1", CollectionKind::Links, &[id]).unwrap();

    assert!(
        PageRepo::create_row_with_id(&conn, "p1", CollectionKind::Links, id, &json!({"title": "x"}))
            .unwrap()
    );
    assert!(
        !PageRepo::create_row_with_id(&conn, "p1", CollectionKind::Links, id, &json!({"title": "y"}))
            .unwrap()
    );
    let rows = PageRepo::list_rows(&conn, "p1", CollectionKind::Links).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].body["title"], "x");
}

#[test]
fn test_update_and_delete_many() {
    let (_dir, conn) = setup_db();
    seed_page(&conn, "p1", "u1");
    let ids = PageRepo::create_rows(
        &conn,
        "p1",
        CollectionKind::SocialIcons,
        &[json!({"platform": "x"}), json!({"platform": "y"})],
    )
    .unwrap();

    let updated = PageRepo::update_rows(
        &conn,
        "p1",
        CollectionKind::SocialIcons,
        &[(ids[0], json!({"platform": "z"})), (9999, json!({}))],
    )
    .unwrap();
    assert_eq!(updated, 1);

    assert_eq!(
        PageRepo::delete_collection(&conn, "p1", CollectionKind::SocialIcons).unwrap(),
        2
    );
}

#[test]
fn test_rows_scoped_to_page() {
    let (_dir, conn) = setup_db();
    seed_page(&conn, "p1", "u1");
    seed_page(&conn, "p2", "u2");
    let id = PageRepo::create_row(&conn, "p1", CollectionKind::Links, &json!({"title": "x"}))
        .unwrap();
    assert!(!PageRepo::update_row(&conn, "p2", CollectionKind::Links, id, &json!({})).unwrap());
    assert_eq!(
        PageRepo::delete_rows(&conn, "p2", CollectionKind::Links, &[id]).unwrap(),
        0
    );
}
