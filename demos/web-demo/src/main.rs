mod controller;
mod interceptors;
mod service;

use anyhow::Context;
use tether_web::prelude::*;

use controller::{HealthController, UserController};
use interceptors::{AdminGuard, RequestLogger};

const CONFIG: &str = include_str!("../config/application.toml");

fn main() -> anyhow::Result<()> {
    // ==================== 启动 ====================

    let mut app = Application::from_toml_str(CONFIG).context("Failed to load configuration")?;
    app.init_logging().context("Failed to initialize logging")?;

    println!("🚀 Starting {}", app.settings().app.name);

    // ==================== 路由注册 ====================

    let router = app.router_mut();
    let users = router.controller::<UserController>();
    let health = router.controller::<HealthController>();
    let logger = router.interceptor::<RequestLogger>();
    let guard = router.interceptor::<AdminGuard>();

    router.get("/health", health, "health")?;

    router.group("/api", logger, |r| {
        r.group("/v1", InterceptorIds::none(), |r| {
            r.get("/users", users, "index")?;
            r.get("/users/@id", users, "show")
        })?;
        r.group("/admin", guard, |r| r.delete("/users/@id:\\d+", users, "show"))
    })?;

    for route in app.router().list_routes() {
        println!(
            "   {:<7} {:<28} → {}::{} {:?}",
            route.method, route.path, route.handler, route.action, route.interceptors
        );
    }

    // ==================== 请求演示 ====================

    let requests = [
        ("GET", "/health"),
        ("GET", "/api/v1/users"),
        ("GET", "/api/v1/users/1/"),
        ("GET", "/api/v1/users/9"),
        ("GET", "/api/v1/users/abc"),
        ("DELETE", "/api/admin/users/1"),
        ("POST", "/api/v1/users"),
    ];

    for (method, path) in requests {
        let response = app.handle(method, path);
        println!("📨 {} {} → {} {}", method, path, response.status().as_u16(), response.body());
    }

    // ==================== 统计 ====================

    println!("📊 Route cache: {}", serde_json::to_string_pretty(&app.router().cache_stats())?);
    println!("📦 Container: {}", serde_json::to_string_pretty(&app.container().stats())?);

    Ok(())
}
