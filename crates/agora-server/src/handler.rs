use agora_sdk::{base_anchor, Address, AgentStats, Post, PostWithAddress, PostsPage, QueryOptions};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ServerError, ServerResult};
use crate::router::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub agent_id: String,
    pub agent_name: String,
    pub stats: AgentStats,
}

/// Query string of `GET /v1/bases/:base/posts`.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<u32>,
    pub since: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Edge {
    pub from: Address,
    pub to: Address,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdjacencyResponse {
    pub base: String,
    pub anchor: Address,
    pub edges: Vec<Edge>,
}

fn parse_address(raw: &str) -> ServerResult<Address> {
    Address::parse(raw).map_err(|e| ServerError::BadRequest(format!("invalid address {raw:?}: {e}")))
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

pub async fn info_handler(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "agora-server".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        agent_id: state.agent.id().to_hex(),
        agent_name: state.agent.name().to_string(),
        stats: state.agent.stats(),
    })
}

pub async fn create_post_handler(
    State(state): State<AppState>,
    Json(post): Json<Post>,
) -> ServerResult<(StatusCode, Json<PostWithAddress>)> {
    let created = state.agent.create(post).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_post_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ServerResult<Json<PostWithAddress>> {
    let address = parse_address(&address)?;
    Ok(Json(state.agent.get(&address)?))
}

pub async fn list_posts_handler(
    State(state): State<AppState>,
    Path(base): Path<String>,
    Query(params): Query<PageParams>,
) -> ServerResult<Json<PostsPage>> {
    let options = QueryOptions {
        limit: params.limit,
        since: params.since.as_deref().map(parse_address).transpose()?,
    };
    Ok(Json(state.agent.all_for_base(&base, &options)?))
}

pub async fn adjacency_handler(
    State(state): State<AppState>,
    Path(base): Path<String>,
) -> ServerResult<Json<AdjacencyResponse>> {
    let edges = state
        .agent
        .adjacency_list_for_base(&base)?
        .into_iter()
        .map(|(from, to)| Edge { from, to })
        .collect();
    Ok(Json(AdjacencyResponse {
        anchor: base_anchor(&base),
        base,
        edges,
    }))
}

pub async fn consistency_handler(
    State(state): State<AppState>,
) -> ServerResult<Json<serde_json::Value>> {
    state.agent.await_consistency().await?;
    Ok(Json(json!({ "consistent": true })))
}
