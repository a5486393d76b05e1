//! 错误类型定义

use thiserror::Error;

/// 装箱的动态错误，工厂函数产生的错误以此形式保存
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("无效的组件类型: {type_name}, 原因: {message}")]
    InvalidComponentType { type_name: String, message: String },

    #[error("无效的工厂结果类型: {type_name}, 原因: {message}")]
    InvalidResultType { type_name: String, message: String },

    #[error("无法将 '{source_type}' 转换为: {target}")]
    NotCoercible { target: String, source_type: String },

    #[error("类型 '{type_name}' 中的注入字段未导出: {field}")]
    FieldNotExported { type_name: String, field: String },

    #[error("字段 '{field}' 在目标类型中不存在: {type_name}")]
    FieldNotFound { type_name: String, field: String },

    #[error("没有找到候选组件: {identifier}")]
    NoCandidateFound { identifier: String },

    #[error(
        "存在多个优先级为 {priority} 的候选组件: {identifier}:\n\t{}",
        candidates.join("\n\t")
    )]
    AmbiguousCandidates {
        priority: i32,
        identifier: String,
        candidates: Vec<String>,
    },

    #[error("无法创建实例: {component}, 原因: {source}")]
    InstanceCreationFailed {
        component: String,
        #[source]
        source: BoxError,
    },

    #[error("循环依赖检测到: {chain}")]
    CyclicDependency { chain: String },

    #[error("解析深度超过上限 {max_depth}: {chain}")]
    ResolutionDepthExceeded { max_depth: usize, chain: String },

    #[error("无法为字段解析组件: {field}: {source}")]
    FieldResolution {
        field: String,
        #[source]
        source: Box<DependencyError>,
    },

    #[error("无法注入字段: {field}: {source}")]
    FieldInjection {
        field: String,
        #[source]
        source: Box<DependencyError>,
    },
}

impl DependencyError {
    /// 为字段解析错误附加字段名称
    pub fn resolving_field(field: impl Into<String>, source: DependencyError) -> Self {
        Self::FieldResolution {
            field: field.into(),
            source: Box::new(source),
        }
    }

    /// 为字段注入错误附加字段名称
    pub fn injecting_field(field: impl Into<String>, source: DependencyError) -> Self {
        Self::FieldInjection {
            field: field.into(),
            source: Box::new(source),
        }
    }

    /// 创建类型转换错误
    pub fn not_coercible(target: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self::NotCoercible {
            target: target.into(),
            source_type: source_type.into(),
        }
    }

    /// 去掉字段上下文包装，返回真正的错误
    ///
    /// 递归装配时错误可能被多层字段包装，匹配错误种类时应使用此方法。
    pub fn root_cause(&self) -> &DependencyError {
        match self {
            Self::FieldResolution { source, .. } | Self::FieldInjection { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    /// 错误经过的字段路径，由外到内
    pub fn field_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let Self::FieldResolution { field, source } | Self::FieldInjection { field, source } =
            current
        {
            path.push(field.as_str());
            current = &**source;
        }
        path
    }
}

/// 结果类型别名
pub type DependencyResult<T> = Result<T, DependencyError>;
