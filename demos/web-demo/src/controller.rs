use std::sync::Arc;

use serde_json::json;
use tether_core::{Arguments, ContainerResult, Injectable, Parameter};
use tether_web::prelude::*;

use crate::service::UserService;

pub struct UserController {
    service: Arc<UserService>,
}

impl Injectable for UserController {
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::service::<UserService>("service")]
    }

    fn construct(args: &Arguments) -> ContainerResult<Self> {
        Ok(UserController {
            service: args.get("service")?,
        })
    }
}

impl UserController {
    fn index(&self, _args: &Arguments, _ctx: &mut RequestContext) -> HandlerResult {
        response::json(StatusCode::OK, &self.service.list())
    }

    fn show(&self, args: &Arguments, _ctx: &mut RequestContext) -> HandlerResult {
        let id: u32 = match args.str("id")?.parse() {
            Ok(id) => id,
            Err(_) => return response::json(StatusCode::BAD_REQUEST, &json!({ "error": "id must be a number" })),
        };

        match self.service.get(id) {
            Some(user) => response::json(StatusCode::OK, &user),
            None => response::json(StatusCode::NOT_FOUND, &json!({ "error": format!("user {} not found", id) })),
        }
    }
}

impl Controller for UserController {
    fn actions() -> Vec<Action<Self>> {
        vec![
            Action::new("index", Self::index),
            Action::new("show", Self::show).param(Parameter::value::<String>("id")),
        ]
    }
}

pub struct HealthController;

impl Injectable for HealthController {
    fn construct(_args: &Arguments) -> ContainerResult<Self> {
        Ok(HealthController)
    }
}

impl HealthController {
    fn health(&self, args: &Arguments, _ctx: &mut RequestContext) -> HandlerResult {
        let service: Arc<UserService> = args.get("service")?;
        response::json(StatusCode::OK, &json!({ "status": "UP", "app": service.app_name() }))
    }
}

impl Controller for HealthController {
    fn actions() -> Vec<Action<Self>> {
        vec![Action::new("health", Self::health).param(Parameter::service::<UserService>("service"))]
    }
}

tether_core::injectable!(UserController, HealthController);
