// src/handlers/index.rs
use actix_web::{web, HttpRequest, HttpResponse};
use log::warn;
use std::fmt::Write;
use crate::handlers::IpRateLimiter;
use crate::models::server::ServerRecord;
use crate::storage::memory::ServerRegistry;
use crate::utils::{escape_html, extract_peer_ip, format_clock, RequestError};

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Server List</title>
    <style>
        body { font-family: sans-serif; padding: 20px; background-color: #f8f9fa; }
        table { border-collapse: collapse; width: 100%; background: white; }
        th, td { border: 1px solid #dee2e6; padding: 6px 10px; text-align: left; }
        th { background: #212529; color: white; }
    </style>
</head>
<body>
"#;

const PAGE_TAIL: &str = r#"    <p><small>Refreshes every 10 seconds. Times are UTC.</small></p>
    <script>setTimeout(function(){ location.reload(); }, 10000);</script>
</body>
</html>
"#;

/// Renders the server list page from a registry snapshot.
pub fn render_page(servers: &[ServerRecord]) -> String {
    let mut html = String::from(PAGE_HEAD);
    // Writing into a String cannot fail
    let _ = writeln!(html, "    <h2>Online servers</h2>");
    let _ = writeln!(html, "    <p>Servers online: {}</p>", servers.len());
    html.push_str(
        "    <table>\n        <tr><th>Name</th><th>Address</th><th>Map</th><th>Players</th><th>Last update</th></tr>\n",
    );
    for server in servers {
        let _ = writeln!(
            html,
            "        <tr><td>{}</td><td>{}</td><td>{}</td><td>{}/{}</td><td>{}</td></tr>",
            escape_html(&server.name),
            server.address,
            escape_html(&server.map),
            server.players,
            server.max_players,
            format_clock(server.last_seen)
        );
    }
    html.push_str("    </table>\n");
    html.push_str(PAGE_TAIL);
    html
}

pub async fn index(
    registry: web::Data<ServerRegistry>,
    rate_limiter: web::Data<IpRateLimiter>,
    req: HttpRequest,
) -> Result<HttpResponse, RequestError> {
    let peer_ip = extract_peer_ip(&req)?;

    if rate_limiter.check_key(&peer_ip).is_err() {
        warn!("Rate limit exceeded for index for ip: {}", peer_ip);
        return Err(RequestError::RateLimitExceeded);
    }

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_page(&registry.snapshot())))
}
