use std::time::Duration;

use crate::auth::{JwtConfig, JwtError};

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | DATABASE_URL | (未设置) | 后台存储 SQLite 地址，未设置时只用默认权限 |
/// | POLICY_FILE | (未设置) | 替换内置策略表的 JSON 文件 |
/// | PERMISSION_LOOKUP_TIMEOUT_MS | 2000 | 权限查询超时(毫秒) |
///
/// JWT 相关变量见 [`JwtConfig::from_env`]；`LOG_LEVEL` / `LOG_DIR` 由
/// [`setup_environment`](crate::setup_environment) 读取。
///
/// # 示例
///
/// ```ignore
/// DATABASE_URL=sqlite:///var/lib/shop/store.db HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 后台存储地址
    pub database_url: Option<String>,
    /// 策略表文件
    pub policy_file: Option<String>,
    /// 单次权限查询超时 (毫秒)
    pub permission_lookup_timeout_ms: u64,
    /// JWT 认证配置
    pub jwt: JwtConfig,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置的变量使用默认值；只有 JWT 密钥可能导致失败。
    pub fn from_env() -> Result<Self, JwtError> {
        Ok(Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            database_url: non_empty_var("DATABASE_URL"),
            policy_file: non_empty_var("POLICY_FILE"),
            permission_lookup_timeout_ms: std::env::var("PERMISSION_LOOKUP_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(2000),
            jwt: JwtConfig::from_env()?,
        })
    }

    /// 测试用配置 (固定 JWT 密钥，无数据库)
    pub fn for_tests(jwt_secret: impl Into<String>) -> Self {
        Self {
            http_port: 0,
            environment: "test".into(),
            database_url: None,
            policy_file: None,
            permission_lookup_timeout_ms: 2000,
            jwt: JwtConfig {
                secret: jwt_secret.into(),
                expiration_minutes: 60,
                issuer: "admin-server".into(),
                audience: "back-office".into(),
            },
        }
    }

    pub fn permission_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.permission_lookup_timeout_ms)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
