//! 控制器支持
//!
//! 控制器通过静态的动作表声明自己能处理的动作。路由以名称引用动作，
//! 分发时在表中查找，取代运行时的方法反射。

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tether_core::{type_key, Arguments, ContainerError, Instance, Parameter};

use crate::request::RequestContext;
use crate::response::HandlerResult;

/// 动作函数：控制器实例、已绑定的参数和请求上下文
pub type ActionFn<C> = fn(&C, &Arguments, &mut RequestContext) -> HandlerResult;

/// 控制器 trait
///
/// # 示例
///
/// ```
/// use tether_core::{Arguments, ContainerResult, Injectable, Parameter};
/// use tether_web::{response, Action, Controller, HandlerResult, RequestContext};
/// use http::StatusCode;
///
/// struct UserController;
///
/// impl Injectable for UserController {
///     fn construct(_args: &Arguments) -> ContainerResult<Self> {
///         Ok(UserController)
///     }
/// }
///
/// impl UserController {
///     fn show(&self, args: &Arguments, _ctx: &mut RequestContext) -> HandlerResult {
///         Ok(response::text(StatusCode::OK, format!("user {}", args.str("id")?)))
///     }
/// }
///
/// impl Controller for UserController {
///     fn actions() -> Vec<Action<Self>> {
///         vec![Action::new("show", Self::show).param(Parameter::value::<String>("id"))]
///     }
/// }
/// ```
pub trait Controller: Any + Send + Sync + Sized {
    /// 动作表
    fn actions() -> Vec<Action<Self>>;
}

/// 一个具名动作及其形式参数
pub struct Action<C> {
    name: String,
    parameters: Vec<Parameter>,
    call: ActionFn<C>,
}

impl<C> Action<C> {
    pub fn new(name: impl Into<String>, call: ActionFn<C>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            call,
        }
    }

    /// 追加一个形式参数，按声明顺序绑定
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

type Invoker = Arc<dyn Fn(&Instance, &Arguments, &mut RequestContext) -> HandlerResult + Send + Sync>;

/// 类型擦除后的动作
#[derive(Clone)]
pub struct BoundAction {
    name: String,
    parameters: Arc<[Parameter]>,
    invoke: Invoker,
}

impl BoundAction {
    fn erase<C: Controller>(action: Action<C>) -> Self {
        let call = action.call;
        Self {
            name: action.name,
            parameters: action.parameters.into(),
            invoke: Arc::new(
                move |instance: &Instance, args: &Arguments, ctx: &mut RequestContext| -> HandlerResult {
                    let controller = (**instance).downcast_ref::<C>().ok_or_else(|| {
                        ContainerError::TypeMismatch {
                            key: args.owner().to_string(),
                            expected: type_key::<C>(),
                        }
                    })?;
                    call(controller, args, ctx)
                },
            ),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// 以容器解析出的处理器实例调用动作
    pub fn invoke(&self, handler: &Instance, args: &Arguments, ctx: &mut RequestContext) -> HandlerResult {
        (self.invoke)(handler, args, ctx)
    }
}

impl fmt::Debug for BoundAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundAction")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// 控制器注册表：处理器 key → 动作表
#[derive(Debug, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, HashMap<String, BoundAction>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以 `type_key::<C>()` 注册动作表，返回该 key
    pub fn register<C: Controller>(&mut self) -> &'static str {
        self.register_as::<C>(type_key::<C>());
        type_key::<C>()
    }

    /// 以任意处理器 key 注册动作表，替换已有的注册
    pub fn register_as<C: Controller>(&mut self, handler: impl Into<String>) {
        let handler = handler.into();
        let actions: HashMap<String, BoundAction> = C::actions()
            .into_iter()
            .map(|action| (action.name.clone(), BoundAction::erase(action)))
            .collect();

        tracing::debug!(handler = %handler, actions = actions.len(), "Registered controller");
        self.controllers.insert(handler, actions);
    }

    pub fn action(&self, handler: &str, action: &str) -> Option<&BoundAction> {
        self.controllers.get(handler)?.get(action)
    }

    pub fn contains(&self, handler: &str) -> bool {
        self.controllers.contains_key(handler)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response;
    use http::{Method, StatusCode};
    use tether_core::Argument;

    struct Greeter {
        greeting: String,
    }

    impl Greeter {
        fn hello(&self, args: &Arguments, _ctx: &mut RequestContext) -> HandlerResult {
            Ok(response::text(
                StatusCode::OK,
                format!("{} {}", self.greeting, args.str("name")?),
            ))
        }
    }

    impl Controller for Greeter {
        fn actions() -> Vec<Action<Self>> {
            vec![Action::new("hello", Self::hello).param(Parameter::value::<String>("name"))]
        }
    }

    #[test]
    fn test_register_and_invoke() {
        let mut registry = ControllerRegistry::new();
        let key = registry.register::<Greeter>();

        assert_eq!(key, type_key::<Greeter>());
        assert!(registry.contains(key));
        assert!(registry.action(key, "goodbye").is_none());

        let action = registry.action(key, "hello").unwrap();
        assert_eq!(action.parameters().len(), 1);

        let instance: Instance = Arc::new(Greeter {
            greeting: "hi".to_string(),
        });
        let mut args = Arguments::new("Greeter::hello");
        args.push("name", Argument::Instance(Arc::new("ada".to_string())));
        let mut ctx = RequestContext::new(Method::GET, "/hello/ada");

        let response = action.invoke(&instance, &args, &mut ctx).unwrap();
        assert_eq!(response.body(), "hi ada");
    }

    #[test]
    fn test_invoke_with_wrong_instance() {
        let mut registry = ControllerRegistry::new();
        let key = registry.register::<Greeter>();
        let action = registry.action(key, "hello").unwrap();

        let instance: Instance = Arc::new(42u32);
        let args = Arguments::new("Greeter::hello");
        let mut ctx = RequestContext::new(Method::GET, "/hello");

        assert!(action.invoke(&instance, &args, &mut ctx).is_err());
    }
}
