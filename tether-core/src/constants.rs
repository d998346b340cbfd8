/// 核心组件常量定义
///
/// 应用启动时以固定名称绑定到容器中的组件

/// 配置实例的别名 key
pub const SETTINGS_KEY: &str = "settings";
