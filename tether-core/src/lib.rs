// tether-core: 请求分发层使用的依赖解析容器
//
// 提供类型安全的依赖解析功能，支持：
// - 显式绑定实例与延迟工厂
// - 注册期声明构造参数，递归自动解析
// - 循环依赖检测与单实例缓存
// - TOML 配置与日志初始化

pub mod config;
pub mod constants;
pub mod container;
pub mod error;
pub mod injectable;
pub mod logging;
pub mod utils;

// 重新导出常用类型
pub use config::{AppSettings, RouterSettings, Settings};
pub use constants::*;
pub use container::{Binding, Container, ContainerStats, Provider, Resolver};
pub use error::{ConfigError, ContainerError, ContainerResult};
pub use injectable::{
    type_key, Argument, Arguments, DefaultValue, Injectable, Instance, ParamKind, Parameter,
    TypeRegistration,
};
pub use logging::{LogFormat, LogLevel, LoggingConfig};

// 导出 inventory，供 injectable! 宏使用
pub use inventory;

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::container::{Binding, Container, Resolver};
    pub use crate::error::{ContainerError, ContainerResult};
    pub use crate::injectable::{type_key, Arguments, Injectable, Parameter};
}
