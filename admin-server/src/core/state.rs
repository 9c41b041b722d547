use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auth::{
    AuthorizationEvaluator, JwtService, PermissionResolver, PolicyTable, PrincipalPermissionSource,
};
use crate::core::{Config, Result, ServerError};
use crate::db::DbService;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，克隆成本极低。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | evaluator | AuthorizationEvaluator | 权限判定 |
/// | resolver | PermissionResolver | 权限解析 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | shutdown | CancellationToken | 关闭信号，触发优雅停机 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    evaluator: AuthorizationEvaluator,
    resolver: PermissionResolver,
    jwt_service: Arc<JwtService>,
    shutdown: CancellationToken,
}

impl ServerState {
    /// 用已有组件构建状态
    pub fn new(
        config: Config,
        policy: PolicyTable,
        source: Option<Arc<dyn PrincipalPermissionSource>>,
    ) -> Self {
        let policy = Arc::new(policy);
        let resolver = PermissionResolver::new(policy.clone(), source)
            .with_lookup_timeout(config.permission_lookup_timeout());
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Self {
            evaluator: AuthorizationEvaluator::new(policy),
            resolver,
            jwt_service,
            shutdown: CancellationToken::new(),
            config,
        }
    }

    /// 按配置初始化: 加载策略表，连接后台存储
    pub async fn initialize(config: &Config) -> Result<Self> {
        let policy = match &config.policy_file {
            Some(path) => {
                let table = PolicyTable::from_json_file(path)?;
                tracing::info!(path = %path, roles = table.role_hierarchy.len(), "Policy table loaded");
                table
            }
            None => PolicyTable::default(),
        };

        let source: Option<Arc<dyn PrincipalPermissionSource>> = match &config.database_url {
            Some(url) => {
                let db = DbService::connect(url)
                    .await
                    .map_err(|e| ServerError::Database(e.message))?;
                Some(Arc::new(db.permission_source()))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, permissions resolve to role defaults only");
                None
            }
        };

        Ok(Self::new(config.clone(), policy, source))
    }

    pub fn evaluator(&self) -> &AuthorizationEvaluator {
        &self.evaluator
    }

    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}
