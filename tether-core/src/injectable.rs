//! 可注入类型的声明
//!
//! 容器不做运行时反射：每个可自动解析的类型通过 [`Injectable`] 显式声明
//! 构造参数（按声明顺序），并提供一个从 [`Arguments`] 构造实例的函数。

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{ContainerError, ContainerResult};

/// 容器中保存的类型擦除实例
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 类型标识：Rust 类型使用完整类型名作为 key
pub fn type_key<T: ?Sized + 'static>() -> &'static str {
    std::any::type_name::<T>()
}

/// 可由容器自动构造的类型
///
/// # 示例
///
/// ```
/// use tether_core::{Arguments, ContainerResult, Injectable, Parameter};
/// use std::sync::Arc;
///
/// struct Database;
///
/// impl Injectable for Database {
///     fn construct(_args: &Arguments) -> ContainerResult<Self> {
///         Ok(Database)
///     }
/// }
///
/// struct UserRepository {
///     db: Arc<Database>,
///     page_size: u32,
/// }
///
/// impl Injectable for UserRepository {
///     fn parameters() -> Vec<Parameter> {
///         vec![
///             Parameter::service::<Database>("db"),
///             Parameter::value::<u32>("page_size").default_value(20u32),
///         ]
///     }
///
///     fn construct(args: &Arguments) -> ContainerResult<Self> {
///         Ok(UserRepository {
///             db: args.get("db")?,
///             page_size: args.value("page_size")?,
///         })
///     }
/// }
/// ```
pub trait Injectable: Any + Send + Sync + Sized {
    /// 构造参数声明；为空表示没有构造参数
    fn parameters() -> Vec<Parameter> {
        Vec::new()
    }

    /// 使用已绑定的参数创建实例
    fn construct(args: &Arguments) -> ContainerResult<Self>;
}

/// 参数声明的类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// 没有声明类型
    Untyped,
    /// 基础类型，永远不会通过容器解析
    Value(&'static str),
    /// 对象类型，通过容器递归解析，值为解析 key
    Service(String),
}

/// 参数默认值
#[derive(Clone)]
pub enum DefaultValue {
    /// 空默认值（可选依赖）
    Null,
    Value(Instance),
}

impl DefaultValue {
    pub fn to_argument(&self) -> Argument {
        match self {
            DefaultValue::Null => Argument::Null,
            DefaultValue::Value(value) => Argument::Instance(Arc::clone(value)),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Null => write!(f, "Null"),
            DefaultValue::Value(_) => write!(f, "Value(..)"),
        }
    }
}

/// 构造函数或 action 的形式参数
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    kind: ParamKind,
    default: Option<DefaultValue>,
}

impl Parameter {
    fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// 依赖类型 `T`，以 `type_key::<T>()` 解析
    pub fn service<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Service(type_key::<T>().to_string()))
    }

    /// 依赖以任意字符串 key 绑定的服务
    pub fn service_key(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Service(key.into()))
    }

    /// 基础类型参数，必须有默认值（或者由路径参数提供）
    pub fn value<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Value(type_key::<T>()))
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Untyped)
    }

    /// 设置默认值
    pub fn default_value<V: Any + Send + Sync>(mut self, value: V) -> Self {
        self.default = Some(DefaultValue::Value(Arc::new(value)));
        self
    }

    /// 标记为可选，默认值为空
    pub fn optional(mut self) -> Self {
        self.default = Some(DefaultValue::Null);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// 已绑定的单个参数
#[derive(Clone)]
pub enum Argument {
    Instance(Instance),
    Null,
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Instance(_) => write!(f, "Instance(..)"),
            Argument::Null => write!(f, "Null"),
        }
    }
}

/// 按声明顺序绑定好的参数集合
#[derive(Debug, Clone)]
pub struct Arguments {
    owner: String,
    values: Vec<(String, Argument)>,
}

impl Arguments {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            values: Vec::new(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, argument: Argument) {
        self.values.push((name.into(), argument));
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 参数名，按声明顺序
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    fn find(&self, name: &str) -> ContainerResult<&Argument> {
        self.values
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, argument)| argument)
            .ok_or_else(|| self.missing(name))
    }

    fn missing(&self, name: &str) -> ContainerError {
        ContainerError::MissingArgument {
            owner: self.owner.clone(),
            parameter: name.to_string(),
        }
    }

    fn downcast<T: Any + Send + Sync>(&self, name: &str, instance: &Instance) -> ContainerResult<Arc<T>> {
        Arc::clone(instance)
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                key: format!("{}::{}", self.owner, name),
                expected: type_key::<T>(),
            })
    }

    /// 必需参数；空默认值视为未提供
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>> {
        match self.find(name)? {
            Argument::Instance(instance) => self.downcast(name, instance),
            Argument::Null => Err(self.missing(name)),
        }
    }

    /// 可选参数；空默认值返回 `None`
    pub fn optional<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Option<Arc<T>>> {
        match self.find(name)? {
            Argument::Instance(instance) => self.downcast(name, instance).map(Some),
            Argument::Null => Ok(None),
        }
    }

    /// 克隆出基础类型的值
    pub fn value<T: Any + Send + Sync + Clone>(&self, name: &str) -> ContainerResult<T> {
        self.get::<T>(name).map(|value| T::clone(&value))
    }

    /// 字符串参数（路径参数总是以 `String` 提供）
    pub fn str(&self, name: &str) -> ContainerResult<&str> {
        match self.find(name)? {
            Argument::Instance(instance) => instance
                .downcast_ref::<String>()
                .map(String::as_str)
                .ok_or_else(|| ContainerError::TypeMismatch {
                    key: format!("{}::{}", self.owner, name),
                    expected: type_key::<String>(),
                }),
            Argument::Null => Err(self.missing(name)),
        }
    }
}

/// 链接期类型注册，由 [`injectable!`](crate::injectable) 提交给 `inventory`
pub struct TypeRegistration {
    pub key: fn() -> &'static str,
    pub parameters: fn() -> Vec<Parameter>,
    pub construct: fn(&Arguments) -> ContainerResult<Instance>,
}

impl TypeRegistration {
    pub const fn of<T: Injectable>() -> Self {
        Self {
            key: type_key::<T>,
            parameters: T::parameters,
            construct: construct_erased::<T>,
        }
    }
}

fn construct_erased<T: Injectable>(args: &Arguments) -> ContainerResult<Instance> {
    let instance: Instance = Arc::new(T::construct(args)?);
    Ok(instance)
}

inventory::collect!(TypeRegistration);

/// 在链接期注册可注入类型，使任意容器都能自动解析它们
///
/// ```ignore
/// tether_core::injectable!(UserRepository, UserController);
/// ```
#[macro_export]
macro_rules! injectable {
    ($($ty:ty),+ $(,)?) => {
        $(
            $crate::inventory::submit! {
                $crate::TypeRegistration::of::<$ty>()
            }
        )+
    };
}
