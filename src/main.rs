// src/main.rs
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use governor::RateLimiter;
use hlmaster::config::Config;
use hlmaster::handlers::{self, heartbeat::HeartbeatListener, IpRateLimiter};
use hlmaster::storage::memory::ServerRegistry;
use hlmaster::sweeper::Sweeper;
use log::{error, info};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env();
    let registry = Arc::new(ServerRegistry::new());

    // Without the announcement socket there is nothing to serve
    let listener = match HeartbeatListener::bind(
        &config.master_bind_address,
        registry.clone(),
        config.heartbeat_filter,
    )
    .await
    {
        Ok(listener) => listener,
        Err(e) => {
            error!("UDP listen error on {}: {}", config.master_bind_address, e);
            return Err(e);
        }
    };
    tokio::spawn(listener.run());
    tokio::spawn(Sweeper::new(registry.clone(), &config).run());

    let registry_data = web::Data::from(registry);
    let rate_limiter: web::Data<IpRateLimiter> =
        web::Data::new(RateLimiter::keyed(config.server_list_quota()));

    let bind = config.http_bind();
    info!("Web server starting on {}", bind);
    HttpServer::new(move || {
        App::new()
            .app_data(registry_data.clone())
            .app_data(rate_limiter.clone())
            .configure(handlers::routes)
    })
    .bind(&bind)?
    .run()
    .await
}
