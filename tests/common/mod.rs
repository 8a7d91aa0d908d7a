//! In-process fake backend for integration tests
//!
//! Serves the document store, identity service and municipal directory
//! endpoints on an ephemeral local port, backed by in-memory state the
//! tests can seed and inspect. Per-category failures can be injected to
//! exercise the fan-out merge.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use chrono::Utc;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use comunidad_core::config::{AuthConfig, CloudConfig, DirectoryConfig};

pub const DIRECTORY_TOKEN: &str = "test-directory-token";

struct StoredDoc {
    id: String,
    fields: Value,
    create_time: String,
}

#[derive(Default)]
struct BackendState {
    /// category -> complaint documents, in insertion order
    complaints: HashMap<String, Vec<StoredDoc>>,
    /// uid -> profile document
    users: HashMap<String, StoredDoc>,
    /// email -> (password, uid)
    accounts: HashMap<String, (String, String)>,
    /// Categories whose reads answer 503
    failing_categories: HashSet<String>,
    masked_patches: usize,
    next_id: u64,
}

type Shared = Arc<Mutex<BackendState>>;

pub struct FakeBackend {
    addr: SocketAddr,
    state: Shared,
}

impl FakeBackend {
    /// Bind an ephemeral port and serve the fake backend from a spawned
    /// task for the rest of the test.
    pub async fn spawn() -> FakeBackend {
        let state: Shared = Arc::default();

        let documents = "/v1/projects/{project}/databases/{db}/documents";
        let app = Router::new()
            .route(
                &format!("{documents}/quejas/{{parent}}"),
                post(run_query),
            )
            .route(
                &format!("{documents}/quejas/{{category}}/quejasList"),
                post(create_complaint).get(list_complaints),
            )
            .route(
                &format!("{documents}/quejas/{{category}}/quejasList/{{id}}"),
                axum::routing::patch(patch_complaint),
            )
            .route(&format!("{documents}/usuarios"), get(list_users))
            .route(
                &format!("{documents}/usuarios/{{uid}}"),
                axum::routing::patch(set_user).get(get_user).delete(delete_user),
            )
            .route("/v1/{action}", post(auth_action))
            .route("/NucleoDigital", post(directory_listing))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        FakeBackend { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn cloud_config(&self) -> CloudConfig {
        CloudConfig {
            base_url: self.base_url(),
            project_id: "test-project".to_string(),
        }
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            base_url: self.base_url(),
            api_key: SecretString::from("test-key"),
        }
    }

    pub fn directory_config(&self) -> DirectoryConfig {
        DirectoryConfig {
            base_url: self.base_url(),
            bearer_token: SecretString::from(DIRECTORY_TOKEN),
            email: "ops@example.com".to_string(),
            password: SecretString::from("directory-pass"),
        }
    }

    /// Make every read of one category answer 503 from now on
    pub fn fail_category(&self, category: &str) {
        self.lock().failing_categories.insert(category.to_string());
    }

    /// Insert a complaint document directly, bypassing HTTP
    pub fn seed_complaint(&self, category: &str, email: &str, status: &str) -> String {
        let mut state = self.lock();
        state.next_id += 1;
        let id = format!("doc-{}", state.next_id);
        let doc = StoredDoc {
            id: id.clone(),
            fields: json!({
                "nombre": {"stringValue": "Seeded Reporter"},
                "correo": {"stringValue": email},
                "calle": {"stringValue": "Calle 5"},
                "cruzamientos": {"stringValue": "Av. Héroes"},
                "colonia": {"stringValue": "Centro"},
                "tiempoProblema": {"stringValue": "2 semanas"},
                "motivoQueja": {"stringValue": "Seeded complaint"},
                "estado": {"stringValue": status},
                "tipo": {"stringValue": category},
            }),
            create_time: Utc::now().to_rfc3339(),
        };
        state
            .complaints
            .entry(category.to_string())
            .or_default()
            .push(doc);
        id
    }

    pub fn complaint_count(&self, category: &str) -> usize {
        self.lock()
            .complaints
            .get(category)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// The estado field a stored complaint currently holds
    pub fn stored_status(&self, category: &str, id: &str) -> Option<String> {
        let state = self.lock();
        let doc = state.complaints.get(category)?.iter().find(|d| d.id == id)?;
        Some(doc.fields["estado"]["stringValue"].as_str()?.to_string())
    }

    /// How many single-field patches the backend has received
    pub fn masked_patch_count(&self) -> usize {
        self.lock().masked_patches
    }

    /// A field of a stored profile document
    pub fn user_field(&self, uid: &str, field: &str) -> Option<String> {
        let state = self.lock();
        let doc = state.users.get(uid)?;
        Some(doc.fields[field]["stringValue"].as_str()?.to_string())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn document_json(project: &str, db: &str, category: &str, doc: &StoredDoc) -> Value {
    json!({
        "name": format!(
            "projects/{project}/databases/{db}/documents/quejas/{category}/quejasList/{}",
            doc.id
        ),
        "fields": doc.fields,
        "createTime": doc.create_time,
        "updateTime": doc.create_time,
    })
}

fn error_json(status: StatusCode, message: &str) -> (StatusCode, axum::Json<Value>) {
    (
        status,
        axum::Json(json!({"error": {"code": status.as_u16(), "message": message}})),
    )
}

fn category_unavailable() -> (StatusCode, axum::Json<Value>) {
    error_json(StatusCode::SERVICE_UNAVAILABLE, "backend unavailable")
}

async fn create_complaint(
    State(state): State<Shared>,
    Path((project, db, category)): Path<(String, String, String)>,
    axum::Json(body): axum::Json<Value>,
) -> impl IntoResponse {
    let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
    state.next_id += 1;
    let doc = StoredDoc {
        id: format!("doc-{}", state.next_id),
        fields: body["fields"].clone(),
        create_time: Utc::now().to_rfc3339(),
    };
    let response = document_json(&project, &db, &category, &doc);
    state
        .complaints
        .entry(category)
        .or_default()
        .push(doc);
    (StatusCode::OK, axum::Json(response))
}

async fn list_complaints(
    State(state): State<Shared>,
    Path((project, db, category)): Path<(String, String, String)>,
) -> impl IntoResponse {
    let state = state.lock().unwrap_or_else(|e| e.into_inner());
    if state.failing_categories.contains(&category) {
        return category_unavailable();
    }
    let documents: Vec<Value> = state
        .complaints
        .get(&category)
        .map(|docs| {
            docs.iter()
                .map(|doc| document_json(&project, &db, &category, doc))
                .collect()
        })
        .unwrap_or_default();
    (StatusCode::OK, axum::Json(json!({"documents": documents})))
}

async fn run_query(
    State(state): State<Shared>,
    Path((project, db, parent)): Path<(String, String, String)>,
    axum::Json(body): axum::Json<Value>,
) -> impl IntoResponse {
    let Some(category) = parent.strip_suffix(":runQuery") else {
        return error_json(StatusCode::NOT_FOUND, "unsupported document action");
    };

    let state = state.lock().unwrap_or_else(|e| e.into_inner());
    if state.failing_categories.contains(category) {
        return category_unavailable();
    }

    let wanted = body["structuredQuery"]["where"]["fieldFilter"]["value"]["stringValue"]
        .as_str()
        .unwrap_or_default();
    let entries: Vec<Value> = state
        .complaints
        .get(category)
        .map(|docs| {
            docs.iter()
                .filter(|doc| doc.fields["correo"]["stringValue"].as_str() == Some(wanted))
                .map(|doc| json!({"document": document_json(&project, &db, category, doc)}))
                .collect()
        })
        .unwrap_or_default();
    (StatusCode::OK, axum::Json(Value::Array(entries)))
}

async fn patch_complaint(
    State(state): State<Shared>,
    Path((project, db, category, id)): Path<(String, String, String, String)>,
    Query(params): Query<HashMap<String, String>>,
    axum::Json(body): axum::Json<Value>,
) -> impl IntoResponse {
    let mut state = state.lock().unwrap_or_else(|e| e.into_inner());

    let masked = params.contains_key("updateMask.fieldPaths");
    if masked {
        state.masked_patches += 1;
    }

    let Some(doc) = state
        .complaints
        .get_mut(&category)
        .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
    else {
        return error_json(StatusCode::NOT_FOUND, "document not found");
    };

    if let Some(fields) = body["fields"].as_object() {
        for (key, value) in fields {
            doc.fields[key] = value.clone();
        }
    }
    let response = document_json(&project, &db, &category, doc);
    (StatusCode::OK, axum::Json(response))
}

fn user_document_json(project: &str, db: &str, doc: &StoredDoc) -> Value {
    json!({
        "name": format!(
            "projects/{project}/databases/{db}/documents/usuarios/{}",
            doc.id
        ),
        "fields": doc.fields,
        "createTime": doc.create_time,
        "updateTime": doc.create_time,
    })
}

async fn set_user(
    State(state): State<Shared>,
    Path((project, db, uid)): Path<(String, String, String)>,
    axum::Json(body): axum::Json<Value>,
) -> impl IntoResponse {
    let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
    // Overwrites keep the original creation time
    let create_time = state
        .users
        .get(&uid)
        .map(|doc| doc.create_time.clone())
        .unwrap_or_else(|| Utc::now().to_rfc3339());
    let doc = StoredDoc {
        id: uid.clone(),
        fields: body["fields"].clone(),
        create_time,
    };
    let response = user_document_json(&project, &db, &doc);
    state.users.insert(uid, doc);
    (StatusCode::OK, axum::Json(response))
}

async fn get_user(
    State(state): State<Shared>,
    Path((project, db, uid)): Path<(String, String, String)>,
) -> impl IntoResponse {
    let state = state.lock().unwrap_or_else(|e| e.into_inner());
    match state.users.get(&uid) {
        Some(doc) => (
            StatusCode::OK,
            axum::Json(user_document_json(&project, &db, doc)),
        ),
        None => error_json(StatusCode::NOT_FOUND, "document not found"),
    }
}

async fn delete_user(
    State(state): State<Shared>,
    Path((_project, _db, uid)): Path<(String, String, String)>,
) -> impl IntoResponse {
    let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
    state.users.remove(&uid);
    (StatusCode::OK, axum::Json(json!({})))
}

async fn list_users(
    State(state): State<Shared>,
    Path((project, db)): Path<(String, String)>,
) -> impl IntoResponse {
    let state = state.lock().unwrap_or_else(|e| e.into_inner());
    let documents: Vec<Value> = state
        .users
        .values()
        .map(|doc| user_document_json(&project, &db, doc))
        .collect();
    (StatusCode::OK, axum::Json(json!({"documents": documents})))
}

async fn auth_action(
    State(state): State<Shared>,
    Path(action): Path<String>,
    axum::Json(body): axum::Json<Value>,
) -> impl IntoResponse {
    let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    let session = |uid: &str, email: &str| {
        json!({
            "idToken": format!("token-{uid}"),
            "email": email,
            "refreshToken": format!("refresh-{uid}"),
            "expiresIn": "3600",
            "localId": uid,
        })
    };

    match action.as_str() {
        "accounts:signUp" => {
            if state.accounts.contains_key(&email) {
                return error_json(StatusCode::BAD_REQUEST, "EMAIL_EXISTS");
            }
            if password.len() < 6 {
                return error_json(
                    StatusCode::BAD_REQUEST,
                    "WEAK_PASSWORD : Password should be at least 6 characters",
                );
            }
            state.next_id += 1;
            let uid = format!("uid-{}", state.next_id);
            state.accounts.insert(email.clone(), (password, uid.clone()));
            (StatusCode::OK, axum::Json(session(&uid, &email)))
        }
        "accounts:signInWithPassword" => match state.accounts.get(&email) {
            None => error_json(StatusCode::BAD_REQUEST, "EMAIL_NOT_FOUND"),
            Some((stored, _)) if *stored != password => {
                error_json(StatusCode::BAD_REQUEST, "INVALID_PASSWORD")
            }
            Some((_, uid)) => {
                let uid = uid.clone();
                (StatusCode::OK, axum::Json(session(&uid, &email)))
            }
        },
        _ => error_json(StatusCode::NOT_FOUND, "unknown action"),
    }
}

async fn directory_listing(headers: HeaderMap) -> impl IntoResponse {
    let authorized = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {DIRECTORY_TOKEN}"))
        .unwrap_or(false);
    if !authorized {
        return error_json(StatusCode::UNAUTHORIZED, "invalid token");
    }

    (
        StatusCode::OK,
        axum::Json(json!({
            "nombreEquipo": "Comedatos",
            "datosTablas": {
                "comedatos_ayuda_mejorar_comunidad": [
                    {
                        "id": 1,
                        "servicios": "Alumbrado Público",
                        "direccion": "Av. Insurgentes 123",
                        "encargado": "Juan Pérez",
                        "contacto": "983 832 1000"
                    },
                    {
                        "id": 2,
                        "servicios": "Bacheo",
                        "direccion": "Calle 22 de Enero 45",
                        "encargado": "María Gómez",
                        "contacto": "983 832 2000"
                    }
                ]
            }
        })),
    )
}
