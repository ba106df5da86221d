//! In-memory emulation of the status-page `v1` API.
//!
//! Serves components, component groups and incidents under
//! `/v1/pages/{page_id}/...`, requires `Authorization: Bearer {token}` on every
//! request, and answers errors with a `{"error": "..."}` envelope. Records are
//! kept in insertion order so list endpoints are stable.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub page_id: String,
    pub group_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub group: bool,
    pub name: String,
    pub description: Option<String>,
    pub position: i32,
    pub status: String,
    pub showcase: bool,
    pub only_show_if_degraded: bool,
    pub automation_email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub page_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub position: i32,
    pub components: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub page_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub body: String,
    pub status: String,
    pub components: Vec<Component>,
    pub deliver_notifications: bool,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
pub struct ComponentFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub group_id: Option<String>,
    pub position: Option<i32>,
    pub showcase: Option<bool>,
    pub only_show_if_degraded: Option<bool>,
}

#[derive(Deserialize)]
pub struct ComponentEnvelope {
    pub component: ComponentFields,
}

#[derive(Deserialize)]
pub struct GroupFields {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub components: Vec<String>,
}

#[derive(Deserialize)]
pub struct GroupEnvelope {
    pub component_group: GroupFields,
}

#[derive(Deserialize)]
pub struct IncidentFields {
    pub name: Option<String>,
    pub body: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub components: HashMap<String, String>,
    pub component_ids: Option<Vec<String>>,
    pub deliver_notifications: Option<bool>,
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Deserialize)]
pub struct IncidentEnvelope {
    pub incident: IncidentFields,
}

/// Records for all pages. Incidents store member ids and are rendered with
/// the current component records on every read.
#[derive(Default)]
pub struct Store {
    components: Vec<Component>,
    groups: Vec<Group>,
    incidents: Vec<(Incident, Vec<String>)>,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    token: Arc<str>,
    db: Db,
}

const COMPONENT_STATUSES: [&str; 5] = [
    "operational",
    "under_maintenance",
    "degraded_performance",
    "partial_outage",
    "major_outage",
];

const INCIDENT_STATUSES: [&str; 4] = ["investigating", "identified", "monitoring", "resolved"];

type ApiResult<T> = Result<T, (StatusCode, Json<serde_json::Value>)>;

fn api_error(status: StatusCode, message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({ "error": message })))
}

fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    api_error(StatusCode::NOT_FOUND, "The requested resource could not be found.")
}

fn check_component_status(status: &str) -> ApiResult<()> {
    if COMPONENT_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            &format!("invalid component status `{status}`"),
        ))
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

pub fn app(token: &str) -> Router {
    let state = AppState {
        token: Arc::from(token),
        db: Arc::new(RwLock::new(Store::default())),
    };
    Router::new()
        .route(
            "/v1/pages/{page_id}/components",
            get(list_components).post(create_component),
        )
        .route(
            "/v1/pages/{page_id}/components/{id}",
            get(get_component).patch(update_component).delete(delete_component),
        )
        .route(
            "/v1/pages/{page_id}/component-groups",
            get(list_groups).post(create_group),
        )
        .route("/v1/pages/{page_id}/component-groups/{id}", get(get_group))
        .route(
            "/v1/pages/{page_id}/incidents",
            get(list_incidents).post(create_incident),
        )
        .route(
            "/v1/pages/{page_id}/incidents/{id}",
            get(get_incident).put(update_incident).delete(delete_incident),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(token)).await
}

async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let expected = format!("Bearer {}", state.token);
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == expected);
    if !authorized {
        tracing::warn!(uri = %request.uri(), "rejecting unauthenticated request");
        return api_error(StatusCode::UNAUTHORIZED, "Could not authenticate").into_response();
    }
    next.run(request).await
}

// --- components ---

async fn list_components(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> Json<Vec<Component>> {
    let store = state.db.read().await;
    Json(
        store
            .components
            .iter()
            .filter(|c| c.page_id == page_id)
            .cloned()
            .collect(),
    )
}

async fn create_component(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    Json(input): Json<ComponentEnvelope>,
) -> ApiResult<(StatusCode, Json<Component>)> {
    let fields = input.component;
    let name = fields
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| api_error(StatusCode::UNPROCESSABLE_ENTITY, "name can't be blank"))?;
    let status = fields.status.unwrap_or_else(|| "operational".to_string());
    check_component_status(&status)?;

    let mut store = state.db.write().await;
    let now = Utc::now();
    let id = new_id();
    let position = store.components.iter().filter(|c| c.page_id == page_id).count() as i32 + 1;
    let component = Component {
        automation_email: format!("component+{id}@notifications.statuspage.io"),
        id,
        page_id,
        group_id: fields.group_id,
        created_at: now,
        updated_at: now,
        group: false,
        name,
        description: fields.description,
        position: fields.position.unwrap_or(position),
        status,
        showcase: fields.showcase.unwrap_or(true),
        only_show_if_degraded: fields.only_show_if_degraded.unwrap_or(false),
    };
    store.components.push(component.clone());
    Ok((StatusCode::CREATED, Json(component)))
}

async fn get_component(
    State(state): State<AppState>,
    Path((page_id, id)): Path<(String, String)>,
) -> ApiResult<Json<Component>> {
    let store = state.db.read().await;
    store
        .components
        .iter()
        .find(|c| c.page_id == page_id && c.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}

async fn update_component(
    State(state): State<AppState>,
    Path((page_id, id)): Path<(String, String)>,
    Json(input): Json<ComponentEnvelope>,
) -> ApiResult<Json<Component>> {
    let fields = input.component;
    if let Some(status) = &fields.status {
        check_component_status(status)?;
    }

    let mut store = state.db.write().await;
    let component = store
        .components
        .iter_mut()
        .find(|c| c.page_id == page_id && c.id == id)
        .ok_or_else(not_found)?;
    if let Some(name) = fields.name {
        component.name = name;
    }
    if let Some(description) = fields.description {
        component.description = Some(description);
    }
    if let Some(status) = fields.status {
        component.status = status;
    }
    if let Some(group_id) = fields.group_id {
        component.group_id = Some(group_id);
    }
    if let Some(position) = fields.position {
        component.position = position;
    }
    if let Some(showcase) = fields.showcase {
        component.showcase = showcase;
    }
    if let Some(only) = fields.only_show_if_degraded {
        component.only_show_if_degraded = only;
    }
    component.updated_at = Utc::now();
    Ok(Json(component.clone()))
}

async fn delete_component(
    State(state): State<AppState>,
    Path((page_id, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let mut store = state.db.write().await;
    let index = store
        .components
        .iter()
        .position(|c| c.page_id == page_id && c.id == id)
        .ok_or_else(not_found)?;
    store.components.remove(index);
    for group in &mut store.groups {
        group.components.retain(|member| *member != id);
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- component groups ---

async fn list_groups(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> Json<Vec<Group>> {
    let store = state.db.read().await;
    Json(
        store
            .groups
            .iter()
            .filter(|g| g.page_id == page_id)
            .cloned()
            .collect(),
    )
}

async fn create_group(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    Json(input): Json<GroupEnvelope>,
) -> ApiResult<(StatusCode, Json<Group>)> {
    let fields = input.component_group;
    let mut store = state.db.write().await;
    for member in &fields.components {
        if !store.components.iter().any(|c| c.page_id == page_id && c.id == *member) {
            return Err(api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                &format!("unknown component `{member}`"),
            ));
        }
    }

    let now = Utc::now();
    let position = store.groups.iter().filter(|g| g.page_id == page_id).count() as i32 + 1;
    let group = Group {
        id: new_id(),
        page_id: page_id.clone(),
        created_at: now,
        updated_at: now,
        name: fields.name,
        description: fields.description,
        position,
        components: fields.components,
    };
    for component in store.components.iter_mut() {
        if component.page_id == page_id && group.components.contains(&component.id) {
            component.group_id = Some(group.id.clone());
        }
    }
    store.groups.push(group.clone());
    Ok((StatusCode::CREATED, Json(group)))
}

async fn get_group(
    State(state): State<AppState>,
    Path((page_id, id)): Path<(String, String)>,
) -> ApiResult<Json<Group>> {
    let store = state.db.read().await;
    store
        .groups
        .iter()
        .find(|g| g.page_id == page_id && g.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}

// --- incidents ---

impl Store {
    fn render(&self, incident: &Incident, members: &[String]) -> Incident {
        let mut rendered = incident.clone();
        rendered.components = members
            .iter()
            .filter_map(|id| {
                self.components
                    .iter()
                    .find(|c| c.page_id == incident.page_id && c.id == *id)
                    .cloned()
            })
            .collect();
        rendered
    }

    /// Apply the per-component status map carried by an incident write.
    fn apply_statuses(
        &mut self,
        page_id: &str,
        statuses: &HashMap<String, String>,
    ) -> ApiResult<()> {
        for status in statuses.values() {
            check_component_status(status)?;
        }
        let now = Utc::now();
        for component in self.components.iter_mut().filter(|c| c.page_id == page_id) {
            if let Some(status) = statuses.get(&component.id) {
                component.status = status.clone();
                component.updated_at = now;
            }
        }
        Ok(())
    }
}

fn check_incident_status(status: &str) -> ApiResult<()> {
    if INCIDENT_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            &format!("invalid incident status `{status}`"),
        ))
    }
}

async fn list_incidents(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> Json<Vec<Incident>> {
    let store = state.db.read().await;
    Json(
        store
            .incidents
            .iter()
            .filter(|(i, _)| i.page_id == page_id)
            .map(|(i, members)| store.render(i, members))
            .collect(),
    )
}

async fn create_incident(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    Json(input): Json<IncidentEnvelope>,
) -> ApiResult<(StatusCode, Json<Incident>)> {
    let fields = input.incident;
    let name = fields
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| api_error(StatusCode::UNPROCESSABLE_ENTITY, "name can't be blank"))?;
    let status = fields.status.unwrap_or_else(|| "investigating".to_string());
    check_incident_status(&status)?;

    let mut store = state.db.write().await;
    store.apply_statuses(&page_id, &fields.components)?;

    let now = Utc::now();
    let incident = Incident {
        id: new_id(),
        page_id,
        created_at: now,
        updated_at: now,
        name,
        body: fields.body.unwrap_or_default(),
        status,
        components: Vec::new(),
        deliver_notifications: fields.deliver_notifications.unwrap_or(true),
        metadata: fields.metadata.unwrap_or_default(),
    };
    let members = fields.component_ids.unwrap_or_default();
    let rendered = store.render(&incident, &members);
    store.incidents.push((incident, members));
    Ok((StatusCode::CREATED, Json(rendered)))
}

async fn get_incident(
    State(state): State<AppState>,
    Path((page_id, id)): Path<(String, String)>,
) -> ApiResult<Json<Incident>> {
    let store = state.db.read().await;
    store
        .incidents
        .iter()
        .find(|(i, _)| i.page_id == page_id && i.id == id)
        .map(|(i, members)| Json(store.render(i, members)))
        .ok_or_else(not_found)
}

async fn update_incident(
    State(state): State<AppState>,
    Path((page_id, id)): Path<(String, String)>,
    Json(input): Json<IncidentEnvelope>,
) -> ApiResult<Json<Incident>> {
    let fields = input.incident;
    if let Some(status) = &fields.status {
        check_incident_status(status)?;
    }

    let mut store = state.db.write().await;
    let index = store
        .incidents
        .iter()
        .position(|(i, _)| i.page_id == page_id && i.id == id)
        .ok_or_else(not_found)?;
    store.apply_statuses(&page_id, &fields.components)?;

    let (incident, members) = &mut store.incidents[index];
    if let Some(name) = fields.name {
        incident.name = name;
    }
    if let Some(body) = fields.body {
        incident.body = body;
    }
    if let Some(status) = fields.status {
        incident.status = status;
    }
    if let Some(deliver) = fields.deliver_notifications {
        incident.deliver_notifications = deliver;
    }
    if let Some(metadata) = fields.metadata {
        incident.metadata = metadata;
    }
    if let Some(ids) = fields.component_ids {
        *members = ids;
    }
    incident.updated_at = Utc::now();

    let (incident, members) = &store.incidents[index];
    Ok(Json(store.render(incident, members)))
}

async fn delete_incident(
    State(state): State<AppState>,
    Path((page_id, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let mut store = state.db.write().await;
    let index = store
        .incidents
        .iter()
        .position(|(i, _)| i.page_id == page_id && i.id == id)
        .ok_or_else(not_found)?;
    store.incidents.remove(index);
    Ok(StatusCode::NO_CONTENT)
}
