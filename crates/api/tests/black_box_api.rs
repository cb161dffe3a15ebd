use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;
use reqwest::StatusCode;
use serde_json::{Value, json};

use gatekeep_api::app::{self, services};
use gatekeep_api::config::Config;
use gatekeep_auth::test_support::{self, ISSUER_PRIVATE_PEM, ROGUE_PRIVATE_PEM};
use gatekeep_core::{GroupId, RecordId, Role};
use gatekeep_directory::{AcademicRecord, Group, RecruiterRecord, StudentRecord, Verified};

const STUDENT_EMAIL: &str = "asha.rao@iitbhu.ac.in";
const ADMIN_EMAIL: &str = "dean.office@iitbhu.ac.in";
const TPR_EMAIL: &str = "tpr.lead@iitbhu.ac.in";
const UNGROUPED_EMAIL: &str = "no.groups@iitbhu.ac.in";
const RECRUITER_EMAIL: &str = "hr@acme.example";

/// Issuer stand-in serving a swappable JWKS document.
#[derive(Clone)]
struct Issuer {
    jwks: Arc<Mutex<Value>>,
    hits: Arc<AtomicUsize>,
}

impl Issuer {
    fn publish(&self, jwks: Value) {
        *self.jwks.lock().unwrap() = jwks;
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn serve_jwks(State(issuer): State<Issuer>) -> Json<Value> {
    issuer.hits.fetch_add(1, Ordering::SeqCst);
    Json(issuer.jwks.lock().unwrap().clone())
}

struct TestServer {
    base_url: String,
    issuer: Issuer,
    student_id: RecordId,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    async fn spawn() -> Self {
        let issuer = Issuer {
            jwks: Arc::new(Mutex::new(test_support::issuer_jwks_json(test_support::ISSUER_KID))),
            hits: Arc::new(AtomicUsize::new(0)),
        };
        let (jwks_url, jwks_handle) = spawn_router(
            Router::new()
                .route("/jwks", get(serve_jwks))
                .with_state(issuer.clone()),
        )
        .await;

        let config = Config::from_lookup(|key| match key {
            "JWKS_URL" => Some(format!("{jwks_url}/jwks")),
            _ => None,
        })
        .expect("test config");

        let (seed, student_id) = directory_seed();
        let services = services::build_services(&config, seed).expect("seeded directory");

        // Build app (same router as prod), but bind to an ephemeral port.
        let (base_url, app_handle) = spawn_router(app::build_app(Arc::new(services))).await;

        Self {
            base_url,
            issuer,
            student_id,
            handles: vec![jwks_handle, app_handle],
        }
    }

    async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = reqwest::Client::new().get(format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            req = req.header("token", token);
        }
        req.send().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

async fn spawn_router(router: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral port");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), handle)
}

fn directory_seed() -> (services::DirectorySeed, RecordId) {
    let students = Group::new(GroupId::new(), "students", [Role::STUDENT]);
    let admins = Group::new(GroupId::new(), "placement-office", [Role::STUDENT, Role::ADMIN]);
    let tprs = Group::new(GroupId::new(), "tpr", [Role::STUDENT, Role::TPR]);
    let recruiters = Group::new(GroupId::new(), "recruiters", [Role::RECRUITER]);
    let reviewer = RecordId::new();

    let mut asha = StudentRecord::new(RecordId::new(), STUDENT_EMAIL, "Asha");
    asha.last_name = Some("Rao".into());
    asha.roll_no = 20075001;
    asha.groups = vec![students.id];
    asha.academics = Verified::attested(
        AcademicRecord {
            cgpa: Some(8.0),
            ..AcademicRecord::default()
        },
        reviewer,
        Utc::now(),
    );

    // Stored under the legacy domain; tokens carry the current one.
    let mut dean = StudentRecord::new(RecordId::new(), "dean.office@itbhu.ac.in", "Vikram");
    dean.roll_no = 19075002;
    dean.groups = vec![admins.id];

    let mut tpr = StudentRecord::new(RecordId::new(), TPR_EMAIL, "Meera");
    tpr.roll_no = 20075099;
    tpr.groups = vec![tprs.id];

    let mut ungrouped = StudentRecord::new(RecordId::new(), UNGROUPED_EMAIL, "Kiran");
    ungrouped.roll_no = 21034010;

    let mut hr = RecruiterRecord::new(RecordId::new(), RECRUITER_EMAIL, Default::default());
    hr.name = "Acme Talent".into();
    hr.groups = vec![recruiters.id];

    let student_id = asha.id;
    let seed = services::DirectorySeed {
        groups: vec![students, admins, tprs, recruiters],
        students: vec![asha, dean, tpr, ungrouped],
        recruiters: vec![hr],
    };
    (seed, student_id)
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.get("/health", None).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn student_routes_require_a_token() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/api/student/profile", None).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "auth/malformed-token");
}

#[tokio::test]
async fn student_verify_returns_populated_student() {
    let srv = TestServer::spawn().await;
    let token = test_support::mint(STUDENT_EMAIL, 600);

    let res = srv.get("/api/token/student/verify", Some(&token)).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], Value::Null);
    assert_eq!(body["student"]["email"], STUDENT_EMAIL);
    assert_eq!(body["student"]["groupDetails"][0]["name"], "students");
    assert!(body["expire"].as_i64().unwrap() > Utc::now().timestamp());
}

#[tokio::test]
async fn student_verify_reports_failures_in_body() {
    let srv = TestServer::spawn().await;

    let expired = test_support::mint(STUDENT_EMAIL, -60);
    let body: Value = srv
        .get("/api/token/student/verify", Some(&expired))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["error"], "auth/token-expired");
    assert_eq!(body["student"], Value::Null);
    assert!(body["expire"].as_i64().unwrap() < Utc::now().timestamp());

    let forged = test_support::sign(
        ROGUE_PRIVATE_PEM,
        test_support::ISSUER_KID,
        &json!({ "email": STUDENT_EMAIL, "exp": Utc::now().timestamp() + 600 }),
    );
    let body: Value = srv
        .get("/api/token/student/verify", Some(&forged))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["error"], "auth/signature-invalid");

    let ungrouped = test_support::mint(UNGROUPED_EMAIL, 600);
    let body: Value = srv
        .get("/api/token/student/verify", Some(&ungrouped))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["error"], "directory/role-mismatch");
}

#[tokio::test]
async fn alias_domain_resolves_legacy_record() {
    let srv = TestServer::spawn().await;
    let token = test_support::mint(ADMIN_EMAIL, 600);

    let body: Value = srv
        .get("/api/token/student/verify", Some(&token))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["error"], Value::Null);
    assert_eq!(body["student"]["email"], "dean.office@itbhu.ac.in");
}

#[tokio::test]
async fn recruiter_verify_statuses() {
    let srv = TestServer::spawn().await;

    let res = srv
        .get("/api/token/verify", Some(&test_support::mint(RECRUITER_EMAIL, 600)))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], 200);
    assert_eq!(body["email"], RECRUITER_EMAIL);
    assert_eq!(body["data"]["name"], "Acme Talent");

    let res = srv.get("/api/token/verify", Some("not-a-jwt")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], 401);
    assert_eq!(body["error"], "auth/malformed-token");
    assert_eq!(body["email"], Value::Null);

    // A valid token whose subject is not a recruiter.
    let res = srv
        .get("/api/token/verify", Some(&test_support::mint(STUDENT_EMAIL, 600)))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "directory/not-found");
    assert_eq!(body["status"], 403);
    assert_eq!(body["email"], STUDENT_EMAIL);
}

#[tokio::test]
async fn listing_requires_admin_and_supports_search() {
    let srv = TestServer::spawn().await;
    let admin = test_support::mint(ADMIN_EMAIL, 600);

    let res = srv
        .get("/api/student", Some(&test_support::mint(STUDENT_EMAIL, 600)))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "directory/role-mismatch");

    let body: Value = srv.get("/api/student", Some(&admin)).await.json().await.unwrap();
    assert_eq!(body["total"], 4);

    let body: Value = srv
        .get("/api/student?search=20075&page=1&per_page=1", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["rollNo"], 20075001);

    let body: Value = srv
        .get("/api/student?search=RAO", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["firstName"], "Asha");

    let res = srv.get("/api/student?search=12x", Some(&admin)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn tpr_routes_check_roles() {
    let srv = TestServer::spawn().await;

    let body: Value = srv
        .get("/api/student/tpr/all", Some(&test_support::mint(ADMIN_EMAIL, 600)))
        .await
        .json()
        .await
        .unwrap();
    let tprs = body["data"].as_array().unwrap();
    assert_eq!(tprs.len(), 1);
    assert_eq!(tprs[0]["email"], TPR_EMAIL);

    let res = srv
        .get("/api/student/tprLogin", Some(&test_support::mint(TPR_EMAIL, 600)))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["email"], TPR_EMAIL);

    let res = srv
        .get("/api/student/tprLogin", Some(&test_support::mint(STUDENT_EMAIL, 600)))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn profile_renders_generic_fields() {
    let srv = TestServer::spawn().await;

    let body: Value = srv
        .get("/api/student/profile", Some(&test_support::mint(STUDENT_EMAIL, 600)))
        .await
        .json()
        .await
        .unwrap();

    let personal = &body["profile"]["personalProfile"];
    assert_eq!(personal["firstName"]["dataType"], "string");
    assert_eq!(personal["firstName"]["value"], "Asha");
    assert_eq!(personal["firstName"]["isRequired"], true);
    assert_eq!(personal["category"]["isNull"], true);
}

#[tokio::test]
async fn student_by_id_validates_and_finds() {
    let srv = TestServer::spawn().await;
    let token = test_support::mint(STUDENT_EMAIL, 600);

    let res = srv
        .get(&format!("/api/student/id?id={}", srv.student_id), Some(&token))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["email"], STUDENT_EMAIL);

    let res = srv.get("/api/student/id?id=nope", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .get(&format!("/api/student/id?id={}", RecordId::new()), Some(&token))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn editing_verified_academics_revokes_attestation() {
    let srv = TestServer::spawn().await;
    let token = test_support::mint(STUDENT_EMAIL, 600);
    let client = reqwest::Client::new();

    let mut record: Value = srv
        .get(&format!("/api/student/id?id={}", srv.student_id), Some(&token))
        .await
        .json::<Value>()
        .await
        .unwrap()["data"]
        .clone();
    assert_eq!(record["academics"]["verification"]["isVerified"], true);

    record["academics"]["cgpa"] = json!(8.5);
    record["email"] = json!("someone.else@iitbhu.ac.in");

    let res = client
        .put(format!("{}/api/student/update", srv.base_url))
        .header("token", &token)
        .json(&record)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["changed"], true);
    assert_eq!(body["revoked"], json!(["academics"]));
    assert_eq!(body["data"]["email"], STUDENT_EMAIL);

    let stored: Value = client
        .get(format!("{}/api/student/id?id={}", srv.base_url, srv.student_id))
        .header("token", &token)
        .header("cache-control", "no-cache")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["data"]["academics"]["cgpa"], 8.5);
    assert_eq!(stored["data"]["academics"]["verification"]["isVerified"], false);
}

#[tokio::test]
async fn resubmitting_unchanged_record_keeps_attestation() {
    let srv = TestServer::spawn().await;
    let token = test_support::mint(STUDENT_EMAIL, 600);
    let client = reqwest::Client::new();

    let record: Value = srv
        .get(&format!("/api/student/id?id={}", srv.student_id), Some(&token))
        .await
        .json::<Value>()
        .await
        .unwrap()["data"]
        .clone();

    let body: Value = client
        .put(format!("{}/api/student/update", srv.base_url))
        .header("token", &token)
        .json(&record)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["changed"], false);
    assert_eq!(body["revoked"], json!([]));
    assert_eq!(body["data"]["academics"]["verification"]["isVerified"], true);
}

#[tokio::test]
async fn rotated_keys_are_picked_up_and_unknown_kids_rejected() {
    let srv = TestServer::spawn().await;

    // Prime the cache with the original key set.
    let body: Value = srv
        .get("/api/token/student/verify", Some(&test_support::mint(STUDENT_EMAIL, 600)))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["error"], Value::Null);

    srv.issuer.publish(test_support::issuer_jwks_json("rotated-kid"));
    let rotated = test_support::sign(
        ISSUER_PRIVATE_PEM,
        "rotated-kid",
        &json!({ "email": STUDENT_EMAIL, "exp": Utc::now().timestamp() + 600 }),
    );
    let body: Value = srv
        .get("/api/token/student/verify", Some(&rotated))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["error"], Value::Null);

    let unknown = test_support::sign(
        ISSUER_PRIVATE_PEM,
        "never-published",
        &json!({ "email": STUDENT_EMAIL, "exp": Utc::now().timestamp() + 600 }),
    );
    let body: Value = srv
        .get("/api/token/student/verify", Some(&unknown))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["error"], "auth/key-not-found");
}

#[tokio::test]
async fn invalidate_cache_forces_refetch() {
    let srv = TestServer::spawn().await;
    let token = test_support::mint(STUDENT_EMAIL, 600);

    srv.get("/api/token/student/verify", Some(&token)).await;
    srv.get("/api/token/student/verify", Some(&token)).await;
    let before = srv.issuer.hits();
    assert_eq!(before, 1);

    let res = srv.get("/api/token/invalidate_cache", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Successfully invalidated cache");

    srv.get("/api/token/student/verify", Some(&token)).await;
    assert_eq!(srv.issuer.hits(), before + 1);
}
