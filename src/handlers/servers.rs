// src/handlers/servers.rs
use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, warn};
use serde::Serialize;
use crate::handlers::IpRateLimiter;
use crate::models::server::ServerRecord;
use crate::storage::memory::ServerRegistry;
use crate::utils::{extract_peer_ip, RequestError};

#[derive(Debug, Serialize)]
pub struct ServerListResponse {
    pub count: usize,
    pub servers: Vec<ServerRecord>,
}

impl ServerListResponse {
    pub fn from_snapshot(servers: Vec<ServerRecord>) -> Self {
        Self {
            count: servers.len(),
            servers,
        }
    }
}

pub async fn get_servers(
    registry: web::Data<ServerRegistry>,
    rate_limiter: web::Data<IpRateLimiter>,
    req: HttpRequest,
) -> Result<HttpResponse, RequestError> {
    let peer_ip = extract_peer_ip(&req)?;

    if rate_limiter.check_key(&peer_ip).is_err() {
        warn!("Rate limit exceeded for server list for ip: {}", peer_ip);
        return Err(RequestError::RateLimitExceeded);
    }

    let response = ServerListResponse::from_snapshot(registry.snapshot());
    debug!("Serving server list with {} servers", response.count);

    Ok(HttpResponse::Ok().json(response))
}
