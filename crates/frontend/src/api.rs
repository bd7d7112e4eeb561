use mangrove_shared::models::ViewState;
use mangrove_shared::render::VIEW_MESSAGE_SOURCE;
use serde::{Deserialize, Serialize};

/// Fields requested for every render cycle.
const CYCLE_FIELDS: &str = r#"
    session { id mode key view { lat lng zoom } }
    domain { mode defaultKey selected options { key label } }
    legend { title entries { label color value } }
    layer { html assetReference layerName view { lat lng zoom } }
    error { kind message retryable }
"#;

/// Build the variables JSON for a start session mutation.
pub fn build_start_session_variables(session_id: Option<&str>) -> serde_json::Value {
    serde_json::json!({ "sessionId": session_id })
}

/// Build the variables JSON for a select mode mutation. `mode` is the
/// GraphQL enum name, e.g. `LAND_COVER`.
pub fn build_select_mode_variables(session_id: &str, mode: &str) -> serde_json::Value {
    serde_json::json!({ "sessionId": session_id, "mode": mode })
}

pub fn build_select_key_variables(session_id: &str, key: &str) -> serde_json::Value {
    serde_json::json!({ "sessionId": session_id, "key": key })
}

pub fn build_move_view_variables(session_id: &str, view: &ViewState) -> serde_json::Value {
    serde_json::json!({
        "sessionId": session_id,
        "view": {
            "lat": view.center.lat,
            "lng": view.center.lng,
            "zoom": view.zoom
        }
    })
}

#[derive(Deserialize)]
struct ViewMessage {
    source: String,
    lat: f64,
    lng: f64,
    zoom: f64,
}

/// Parse a pan/zoom report posted by the embedded map. Messages from any
/// other source, and out-of-range views, are ignored.
pub fn parse_view_message(data: &str) -> Option<ViewState> {
    let msg: ViewMessage = serde_json::from_str(data).ok()?;
    if msg.source != VIEW_MESSAGE_SOURCE || !(0.0..=255.0).contains(&msg.zoom) {
        return None;
    }
    ViewState::new(msg.lat, msg.lng, msg.zoom.round() as u8).ok()
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

fn api_url() -> Result<String, String> {
    let window = web_sys::window().ok_or("no window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| "no origin".to_string())?;
    Ok(format!("{}/graphql", origin))
}

async fn query<T: for<'de> Deserialize<'de>>(
    query_str: &str,
    variables: Option<serde_json::Value>,
) -> Result<T, String> {
    let req = GraphQLRequest {
        query: query_str.to_string(),
        variables,
    };

    let resp = reqwest::Client::new()
        .post(api_url()?)
        .json(&req)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let gql_resp: GraphQLResponse<T> = resp.json().await.map_err(|e| e.to_string())?;

    if let Some(errors) = gql_resp.errors {
        if !errors.is_empty() {
            return Err(errors[0].message.clone());
        }
    }

    gql_resp.data.ok_or_else(|| "No data returned".to_string())
}

// Types mirroring the GraphQL schema

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModeData {
    /// GraphQL enum name.
    pub mode: String,
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ViewData {
    pub lat: f64,
    pub lng: f64,
    pub zoom: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionData {
    pub id: String,
    pub mode: Option<String>,
    pub key: Option<String>,
    pub view: ViewData,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptionData {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainData {
    pub mode: String,
    pub options: Vec<OptionData>,
    pub default_key: String,
    pub selected: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LegendEntryData {
    pub label: String,
    pub color: String,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LegendData {
    pub title: String,
    pub entries: Vec<LegendEntryData>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerData {
    pub html: String,
    pub asset_reference: String,
    pub layer_name: String,
    pub view: ViewData,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderErrorData {
    pub kind: String,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderCycleData {
    pub session: SessionData,
    pub domain: Option<DomainData>,
    pub legend: Option<LegendData>,
    pub layer: Option<LayerData>,
    pub error: Option<RenderErrorData>,
}

// API functions

#[derive(Deserialize)]
pub struct ModesResponse {
    pub modes: Vec<ModeData>,
}

pub async fn fetch_modes() -> Result<Vec<ModeData>, String> {
    let resp: ModesResponse = query(r#"query { modes { mode id label } }"#, None).await?;
    Ok(resp.modes)
}

#[derive(Deserialize)]
pub struct StartSessionResponse {
    #[serde(rename = "startSession")]
    pub start_session: RenderCycleData,
}

pub async fn start_session(session_id: Option<&str>) -> Result<RenderCycleData, String> {
    let resp: StartSessionResponse = query(
        &format!(
            "mutation StartSession($sessionId: ID) {{ startSession(sessionId: $sessionId) {{ {} }} }}",
            CYCLE_FIELDS
        ),
        Some(build_start_session_variables(session_id)),
    )
    .await?;
    Ok(resp.start_session)
}

#[derive(Deserialize)]
pub struct SelectModeResponse {
    #[serde(rename = "selectMode")]
    pub select_mode: RenderCycleData,
}

pub async fn select_mode(session_id: &str, mode: &str) -> Result<RenderCycleData, String> {
    let resp: SelectModeResponse = query(
        &format!(
            "mutation SelectMode($sessionId: ID!, $mode: GqlMode!) {{ selectMode(sessionId: $sessionId, mode: $mode) {{ {} }} }}",
            CYCLE_FIELDS
        ),
        Some(build_select_mode_variables(session_id, mode)),
    )
    .await?;
    Ok(resp.select_mode)
}

#[derive(Deserialize)]
pub struct SelectKeyResponse {
    #[serde(rename = "selectKey")]
    pub select_key: RenderCycleData,
}

pub async fn select_key(session_id: &str, key: &str) -> Result<RenderCycleData, String> {
    let resp: SelectKeyResponse = query(
        &format!(
            "mutation SelectKey($sessionId: ID!, $key: String!) {{ selectKey(sessionId: $sessionId, key: $key) {{ {} }} }}",
            CYCLE_FIELDS
        ),
        Some(build_select_key_variables(session_id, key)),
    )
    .await?;
    Ok(resp.select_key)
}

#[derive(Deserialize)]
pub struct MoveViewResponse {
    #[serde(rename = "moveView")]
    pub move_view: RenderCycleData,
}

pub async fn move_view(session_id: &str, view: &ViewState) -> Result<RenderCycleData, String> {
    let resp: MoveViewResponse = query(
        &format!(
            "mutation MoveView($sessionId: ID!, $view: ViewInput!) {{ moveView(sessionId: $sessionId, view: $view) {{ {} }} }}",
            CYCLE_FIELDS
        ),
        Some(build_move_view_variables(session_id, view)),
    )
    .await?;
    Ok(resp.move_view)
}
