use std::sync::Arc;

use serde::Serialize;
use tether_core::{Arguments, ContainerResult, Injectable, Parameter, Settings, SETTINGS_KEY};

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub email: String,
}

/// 内存中的用户仓库
pub struct UserRepository {
    users: Vec<User>,
}

impl Injectable for UserRepository {
    fn construct(_args: &Arguments) -> ContainerResult<Self> {
        let users = vec![
            User {
                id: 1,
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            },
            User {
                id: 2,
                name: "Bob".to_string(),
                email: "bob@example.com".to_string(),
            },
        ];
        Ok(UserRepository { users })
    }
}

impl UserRepository {
    pub fn all(&self) -> &[User] {
        &self.users
    }

    pub fn find(&self, id: u32) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

/// 业务服务，依赖仓库与应用配置
pub struct UserService {
    repo: Arc<UserRepository>,
    settings: Arc<Settings>,
}

impl Injectable for UserService {
    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::service::<UserRepository>("repo"),
            Parameter::service_key("settings", SETTINGS_KEY),
        ]
    }

    fn construct(args: &Arguments) -> ContainerResult<Self> {
        Ok(UserService {
            repo: args.get("repo")?,
            settings: args.get("settings")?,
        })
    }
}

impl UserService {
    pub fn list(&self) -> Vec<User> {
        self.repo.all().to_vec()
    }

    pub fn get(&self, id: u32) -> Option<User> {
        self.repo.find(id).cloned()
    }

    pub fn app_name(&self) -> &str {
        &self.settings.app.name
    }
}

tether_core::injectable!(UserRepository, UserService);
