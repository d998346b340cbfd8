//! 集成测试共用的控制器、拦截器与服务

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tether_core::{Arguments, Container, ContainerResult, Injectable, Parameter};
use tether_web::prelude::*;

/// 记录执行顺序
#[derive(Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

pub struct UserRepository {
    names: HashMap<String, String>,
}

impl UserRepository {
    pub fn find(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }
}

impl Injectable for UserRepository {
    fn construct(_args: &Arguments) -> ContainerResult<Self> {
        let names = [("7", "ada"), ("8", "grace")]
            .into_iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();
        Ok(UserRepository { names })
    }
}

/// 审计服务只能通过绑定获得，没有注册构造信息
pub struct AuditLog;

pub struct UserController {
    repo: Arc<UserRepository>,
    trace: Arc<Trace>,
}

impl Injectable for UserController {
    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::service::<UserRepository>("repo"),
            Parameter::service::<Trace>("trace"),
        ]
    }

    fn construct(args: &Arguments) -> ContainerResult<Self> {
        Ok(UserController {
            repo: args.get("repo")?,
            trace: args.get("trace")?,
        })
    }
}

impl UserController {
    fn index(&self, _args: &Arguments, _ctx: &mut RequestContext) -> HandlerResult {
        self.trace.push("handler");
        Ok(response::text(StatusCode::OK, "users"))
    }

    fn show(&self, args: &Arguments, ctx: &mut RequestContext) -> HandlerResult {
        self.trace.push("handler");
        let id = args.str("id")?;
        let name = self.repo.find(id).unwrap_or("unknown");
        let viewer = ctx.extensions().get::<Viewer>().map_or("anonymous", |v| v.0);
        Ok(response::text(StatusCode::OK, format!("user {} {} for {}", id, name, viewer)))
    }

    fn audit(&self, args: &Arguments, _ctx: &mut RequestContext) -> HandlerResult {
        args.get::<AuditLog>("audit")?;
        Ok(response::text(StatusCode::OK, "audited"))
    }

    fn maybe_audit(&self, args: &Arguments, _ctx: &mut RequestContext) -> HandlerResult {
        let audit = args.optional::<AuditLog>("audit")?;
        let page = args.value::<u32>("page")?;
        let body = format!("audit={} page={}", audit.is_some(), page);
        Ok(response::text(StatusCode::OK, body))
    }

    fn paged(&self, args: &Arguments, _ctx: &mut RequestContext) -> HandlerResult {
        Ok(response::text(StatusCode::OK, args.str("page")?.to_string()))
    }

    fn fail(&self, _args: &Arguments, _ctx: &mut RequestContext) -> HandlerResult {
        Err(anyhow::anyhow!("database unavailable").into())
    }

    fn lookup(&self, args: &Arguments, _ctx: &mut RequestContext) -> HandlerResult {
        let repo: Arc<UserRepository> = args.get("repository")?;
        let id = args.str("id")?;
        Ok(response::text(StatusCode::OK, repo.find(id).unwrap_or("unknown").to_string()))
    }
}

impl Controller for UserController {
    fn actions() -> Vec<Action<Self>> {
        vec![
            Action::new("index", Self::index),
            Action::new("show", Self::show).param(Parameter::value::<String>("id")),
            Action::new("audit", Self::audit).param(Parameter::service::<AuditLog>("audit")),
            Action::new("maybe_audit", Self::maybe_audit)
                .param(Parameter::service::<AuditLog>("audit").optional())
                .param(Parameter::value::<u32>("page").default_value(1u32)),
            Action::new("paged", Self::paged).param(Parameter::value::<String>("page")),
            Action::new("fail", Self::fail),
            Action::new("lookup", Self::lookup)
                .param(Parameter::value::<String>("id"))
                .param(Parameter::service::<UserRepository>("repository")),
        ]
    }
}

/// 拦截器写入的请求上下文扩展
#[derive(Clone, Copy)]
pub struct Viewer(pub &'static str);

/// 记录自身名称后继续
pub struct FirstInterceptor {
    trace: Arc<Trace>,
}

impl Injectable for FirstInterceptor {
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::service::<Trace>("trace")]
    }

    fn construct(args: &Arguments) -> ContainerResult<Self> {
        Ok(FirstInterceptor {
            trace: args.get("trace")?,
        })
    }
}

impl Interceptor for FirstInterceptor {
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> HandlerResult {
        self.trace.push("A");
        ctx.extensions_mut().insert(Viewer("admin"));
        next.run(ctx)
    }
}

pub struct SecondInterceptor {
    trace: Arc<Trace>,
}

impl Injectable for SecondInterceptor {
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::service::<Trace>("trace")]
    }

    fn construct(args: &Arguments) -> ContainerResult<Self> {
        Ok(SecondInterceptor {
            trace: args.get("trace")?,
        })
    }
}

impl Interceptor for SecondInterceptor {
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> HandlerResult {
        self.trace.push("B");
        next.run(ctx)
    }
}

/// 不调用 next，直接返回
pub struct Blocker {
    trace: Arc<Trace>,
}

impl Injectable for Blocker {
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::service::<Trace>("trace")]
    }

    fn construct(args: &Arguments) -> ContainerResult<Self> {
        Ok(Blocker {
            trace: args.get("trace")?,
        })
    }
}

impl Interceptor for Blocker {
    fn handle(&self, _ctx: &mut RequestContext, _next: Next<'_>) -> HandlerResult {
        self.trace.push("blocked");
        Ok(response::text(StatusCode::UNAUTHORIZED, "blocked"))
    }
}

/// 容器中注册好所有可解析类型，并绑定一个共享的 Trace
pub fn container(trace: &Trace) -> Arc<Container> {
    let container = Arc::new(Container::new());
    container.bind_instance(Arc::new(trace.clone()));
    container.register::<UserRepository>();
    container.register::<UserController>();
    container.register::<FirstInterceptor>();
    container.register::<SecondInterceptor>();
    container.register::<Blocker>();
    container
}

/// 注册好控制器与拦截器的空路由器
pub fn router(trace: &Trace) -> Router {
    let mut router = Router::new(container(trace));
    router.controller::<UserController>();
    router.interceptor::<FirstInterceptor>();
    router.interceptor::<SecondInterceptor>();
    router.interceptor::<Blocker>();
    router
}

pub fn users() -> &'static str {
    type_key::<UserController>()
}

pub fn body(router: &Router, method: Method, path: &str) -> String {
    match router.dispatch(&method, path) {
        Ok(response) => response.into_body(),
        Err(err) => panic!("dispatch {} {} failed: {}", method, path, err),
    }
}
