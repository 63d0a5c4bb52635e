use std::sync::Arc;

use folio_core::admin::{submit_contact_message, AdminError, AdminService};
use folio_core::cache::{CacheStore, MemoryStorage};
use folio_core::models::{AboutSection, ContactInfo, ContactMessage, CvInfo, Skill};
use folio_core::{ApiClient, ApiError, Portfolio, ResourceKey};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn memory_store() -> Arc<CacheStore> {
    Arc::new(CacheStore::new(Arc::new(MemoryStorage::new())))
}

fn owner_admin(server: &MockServer, store: &Arc<CacheStore>) -> (AdminService, Portfolio) {
    let api = ApiClient::new(&server.uri(), "anon-key")
        .unwrap()
        .with_token("owner-jwt".to_string());
    let portfolio = Portfolio::new(store.clone(), &api);
    (AdminService::new(api, store.clone()).unwrap(), portfolio)
}

async fn mount_rows(server: &MockServer, table: &str, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/v1/{}", table)))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

fn skill_rows() -> serde_json::Value {
    json!([
        { "id": "b", "name": "Rust", "level": 90, "icon": "Code", "color": "from-blue-400 to-blue-600" },
        { "id": "a", "name": "SQL", "level": 70, "icon": "Database", "color": "from-purple-400 to-purple-600" }
    ])
}

#[tokio::test]
async fn test_select_all_orders_newest_first_with_anon_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/skills"))
        .and(query_param("select", "*"))
        .and(query_param("order", "created_at.desc"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .and(header("x-client-info", "portfolio-app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(skill_rows()))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), "anon-key").unwrap();
    let skills: Vec<Skill> = api.select_all("skills").await.unwrap();

    assert_eq!(skills.len(), 2);
    assert_eq!(skills[0].name, "Rust");
}

#[tokio::test]
async fn test_select_single_on_empty_table_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cv_info"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), "anon-key").unwrap();
    let err = api.select_single::<CvInfo>("cv_info").await.unwrap_err();

    assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_portfolio_cold_load_then_warm_revalidation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/skills"))
        .respond_with(ResponseTemplate::new(200).set_body_json(skill_rows()))
        .expect(2)
        .mount(&server)
        .await;

    let store = memory_store();
    let api = ApiClient::new(&server.uri(), "anon-key").unwrap();
    let mut portfolio = Portfolio::new(store.clone(), &api);

    portfolio.load(ResourceKey::Skills).await;
    assert_eq!(portfolio.skills.data().len(), 2);
    assert!(store.get::<Vec<Skill>>("skills").is_some());

    // Second load is served from cache and revalidated in the background
    portfolio.load(ResourceKey::Skills).await;
    assert!(!portfolio.skills.is_loading());
    assert_eq!(portfolio.skills.data().len(), 2);
    portfolio.settle_all().await;
    assert_eq!(portfolio.skills.data()[1].name, "SQL");
}

#[tokio::test]
async fn test_portfolio_surfaces_cold_failures_per_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/contact_info"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
        .mount(&server)
        .await;

    let store = memory_store();
    let api = ApiClient::new(&server.uri(), "anon-key").unwrap();
    let mut portfolio = Portfolio::new(store.clone(), &api);

    portfolio.load(ResourceKey::ContactInfo).await;

    assert!(portfolio.contact_info.data().is_none());
    assert!(!portfolio.contact_info.is_loading());
    let failed = portfolio.failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, ResourceKey::ContactInfo);
    assert!(failed[0].1.contains("database offline"));
    assert!(store.get::<serde_json::Value>("contact_info").is_none());
}

#[tokio::test]
async fn test_successful_update_clears_cache() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/skills"))
        .and(query_param("id", "eq.abc"))
        .and(header("authorization", "Bearer owner-jwt"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = memory_store();
    store.set("skills", &skill_rows());
    store.set("projects", &json!([]));
    let api = ApiClient::new(&server.uri(), "anon-key")
        .unwrap()
        .with_token("owner-jwt".to_string());
    let admin = AdminService::new(api, store.clone()).unwrap();

    let skill = Skill {
        name: "Rust".to_string(),
        level: 95,
        icon: "Code".to_string(),
        ..Default::default()
    };
    admin.update_skill("abc", skill).await.unwrap();

    assert!(store.get::<serde_json::Value>("skills").is_none());
    // Other resources are not touched
    assert!(store.get::<serde_json::Value>("projects").is_some());
}

#[tokio::test]
async fn test_failed_insert_leaves_cache_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/skills"))
        .respond_with(
            ResponseTemplate::new(403).set_body_string("new row violates row-level security policy"),
        )
        .mount(&server)
        .await;

    let store = memory_store();
    store.set("skills", &skill_rows());
    let api = ApiClient::new(&server.uri(), "anon-key")
        .unwrap()
        .with_token("owner-jwt".to_string());
    let admin = AdminService::new(api, store.clone()).unwrap();

    let skill = Skill {
        name: "Go".to_string(),
        level: 60,
        icon: "Server".to_string(),
        ..Default::default()
    };
    let err = admin.create_skill(skill).await.unwrap_err();

    match err {
        AdminError::Remote(e) => {
            assert!(matches!(e.downcast_ref::<ApiError>(), Some(ApiError::AccessDenied(_))));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(store.get::<serde_json::Value>("skills"), Some(skill_rows()));
}

#[tokio::test]
async fn test_delete_clears_only_its_resource() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/projects"))
        .and(query_param("id", "eq.p1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = memory_store();
    store.set("projects", &json!([{ "id": "p1" }]));
    store.set("skills", &skill_rows());
    let api = ApiClient::new(&server.uri(), "anon-key")
        .unwrap()
        .with_token("owner-jwt".to_string());
    let admin = AdminService::new(api, store.clone()).unwrap();

    admin.delete(ResourceKey::Projects, "p1").await.unwrap();

    assert!(store.get::<serde_json::Value>("projects").is_none());
    assert!(store.get::<serde_json::Value>("skills").is_some());
}

#[tokio::test]
async fn test_upload_cv_stores_file_and_inserts_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/portfolio-images/cv/cv-\d+-[a-z0-9]{7}\.pdf$"))
        .and(header("x-upsert", "true"))
        .and(header("content-type", "application/pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "portfolio-images/cv/x.pdf" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/cv_info"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let store = memory_store();
    store.set("cv_info", &json!({ "name": "old" }));
    let api = ApiClient::new(&server.uri(), "anon-key")
        .unwrap()
        .with_token("owner-jwt".to_string());
    let admin = AdminService::new(api, store.clone()).unwrap();

    let cv = admin
        .upload_cv("Resume.pdf", b"%PDF-1.7 test".to_vec(), None, 12, 8)
        .await
        .unwrap();

    let prefix = format!("{}/storage/v1/object/public/portfolio-images/cv/cv-", server.uri());
    assert!(cv.cv_file_url.starts_with(&prefix));
    assert_eq!(cv.projects_count, "12");
    assert_eq!(cv.skills_count, "8");
    assert!(store.get::<CvInfo>("cv_info").is_none());
}

#[tokio::test]
async fn test_sign_in_returns_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_json(json!({ "email": "owner@example.com", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "owner-jwt",
            "refresh_token": "refresh",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": { "id": "user-1", "email": "owner@example.com" }
        })))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), "anon-key").unwrap();
    let session = api.sign_in("owner@example.com", "hunter2").await.unwrap();

    assert_eq!(session.access_token, "owner-jwt");
    assert_eq!(session.user_id, "user-1");
    assert!(!session.is_expired());
}

#[tokio::test]
async fn test_sign_in_with_bad_password_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), "anon-key").unwrap();
    let err = api.sign_in("owner@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::BadRequest(_))));
}

#[tokio::test]
async fn test_contact_message_is_inserted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/contact_messages"))
        .and(body_json(json!([
            { "name": "Ali", "email": "ali@example.com", "message": "Hello" }
        ])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), "anon-key").unwrap();
    let message = ContactMessage::new("Ali", "ali@example.com", "Hello");
    submit_contact_message(&api, &message).await.unwrap();

    let invalid = ContactMessage::new("Ali", "nope", "Hello");
    assert!(matches!(
        submit_contact_message(&api, &invalid).await,
        Err(AdminError::Invalid(_))
    ));
}

#[tokio::test]
async fn test_first_cv_upload_inserts_cv_row() {
    let server = MockServer::start().await;
    mount_rows(&server, "cv_info", json!([])).await;
    mount_rows(&server, "projects", json!([{ "id": "p1", "title_en": "Shop" }, { "id": "p2", "title_en": "Blog" }, { "id": "p3", "title_en": "Bot" }])).await;
    mount_rows(&server, "skills", skill_rows()).await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/portfolio-images/cv/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/cv_info"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let store = memory_store();
    let (admin, mut portfolio) = owner_admin(&server, &store);

    let cv = admin
        .publish_cv(&mut portfolio, "cv.pdf", b"%PDF-1.4 first".to_vec())
        .await
        .unwrap();

    assert!(cv.id.is_empty());
    assert_eq!(cv.projects_count, "3");
    assert_eq!(cv.skills_count, "2");
    assert!(store.get::<serde_json::Value>("cv_info").is_none());
}

#[tokio::test]
async fn test_cv_upload_stops_when_cv_row_cannot_be_read() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cv_info"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
        .mount(&server)
        .await;
    mount_rows(&server, "projects", json!([])).await;
    mount_rows(&server, "skills", json!([])).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = memory_store();
    let (admin, mut portfolio) = owner_admin(&server, &store);

    let err = admin
        .publish_cv(&mut portfolio, "cv.pdf", b"%PDF-1.4".to_vec())
        .await
        .unwrap_err();
    match err {
        AdminError::Load(key, e) => {
            assert_eq!(key, ResourceKey::CvInfo);
            assert!(!e.is_not_found());
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_saving_about_updates_the_existing_row() {
    let server = MockServer::start().await;
    mount_rows(&server, "about_section", json!([{ "id": "about-1", "title_en": "Old" }])).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/about_section"))
        .and(query_param("id", "eq.about-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let store = memory_store();
    let (admin, mut portfolio) = owner_admin(&server, &store);

    let about = AboutSection {
        title_en: "About me".to_string(),
        ..Default::default()
    };
    let saved = admin.replace_about(&mut portfolio, about).await.unwrap();

    assert_eq!(saved.id, "about-1");
    assert!(store.get::<serde_json::Value>("about_section").is_none());
}

#[tokio::test]
async fn test_saving_contact_info_into_empty_table_inserts() {
    let server = MockServer::start().await;
    mount_rows(&server, "contact_info", json!([])).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/contact_info"))
        .and(body_json(json!([{
            "phone": "",
            "email": "me@example.com",
            "github_url": "",
            "telegram_url": "",
            "linkedin_url": ""
        }])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let store = memory_store();
    let (admin, mut portfolio) = owner_admin(&server, &store);

    let info = ContactInfo {
        email: "me@example.com".to_string(),
        ..Default::default()
    };
    let saved = admin.replace_contact_info(&mut portfolio, info).await.unwrap();
    assert!(saved.id.is_empty());
}
