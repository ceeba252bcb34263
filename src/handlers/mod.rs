use actix_web::web;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::RateLimiter;
use std::net::IpAddr;

pub mod heartbeat;
pub mod index;
pub mod servers;

/// Per-client-IP limiter shared by the read-only HTTP endpoints.
pub type IpRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// Read-only routes over the registry snapshot.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index::index))
        .route("/servers", web::get().to(servers::get_servers));
}
