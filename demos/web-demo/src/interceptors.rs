use std::time::Instant;

use tether_core::{Arguments, ContainerResult, Injectable};
use tether_web::prelude::*;

/// 请求日志拦截器
pub struct RequestLogger;

impl Injectable for RequestLogger {
    fn construct(_args: &Arguments) -> ContainerResult<Self> {
        Ok(RequestLogger)
    }
}

impl Interceptor for RequestLogger {
    fn name(&self) -> &str {
        "RequestLogger"
    }

    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> HandlerResult {
        let start = Instant::now();
        tracing::info!(method = %ctx.method(), path = ctx.path(), "→ request");

        let result = next.run(ctx);

        let elapsed_us = start.elapsed().as_micros() as u64;
        match &result {
            Ok(response) => tracing::info!(status = response.status().as_u16(), elapsed_us, "← response"),
            Err(err) => tracing::warn!(error = %err, elapsed_us, "← failed"),
        }
        result
    }
}

/// 管理接口守卫：演示中没有凭据来源，始终拒绝
pub struct AdminGuard;

impl Injectable for AdminGuard {
    fn construct(_args: &Arguments) -> ContainerResult<Self> {
        Ok(AdminGuard)
    }
}

impl Interceptor for AdminGuard {
    fn name(&self) -> &str {
        "AdminGuard"
    }

    fn handle(&self, ctx: &mut RequestContext, _next: Next<'_>) -> HandlerResult {
        tracing::warn!(path = ctx.path(), "Admin access denied");
        response::json(
            StatusCode::UNAUTHORIZED,
            &serde_json::json!({ "error": "Authentication required" }),
        )
    }
}

tether_core::injectable!(RequestLogger, AdminGuard);
