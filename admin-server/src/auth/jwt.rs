//! JWT 令牌服务
//!
//! 处理访问令牌的签发、验证，以及 Claims 与 [`Principal`] 的互转。

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shared::models::{PermissionEntry, Principal, PrincipalId, UserType};
use thiserror::Error;

/// 开发环境兜底密钥 (仅 debug 构建)
#[cfg(debug_assertions)]
const DEV_FALLBACK_SECRET: &str = "admin-server-development-secret-do-not-deploy";

/// JWT 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// JWT 密钥 (至少 32 字节)
    pub secret: String,
    /// 令牌过期时间 (分钟)
    pub expiration_minutes: i64,
    /// 令牌签发者
    pub issuer: String,
    /// 令牌受众
    pub audience: String,
}

impl JwtConfig {
    /// 从环境变量加载
    ///
    /// | 变量 | 默认值 |
    /// |------|--------|
    /// | JWT_SECRET | (debug 构建下使用开发密钥) |
    /// | JWT_EXPIRATION_MINUTES | 1440 |
    /// | JWT_ISSUER | admin-server |
    /// | JWT_AUDIENCE | back-office |
    pub fn from_env() -> Result<Self, JwtError> {
        Ok(Self {
            secret: load_jwt_secret()?,
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1440), // 默认 24 小时
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "admin-server".to_string()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "back-office".to_string()),
        })
    }
}

/// 从环境变量加载 JWT 密钥
fn load_jwt_secret() -> Result<String, JwtError> {
    match std::env::var("JWT_SECRET") {
        Ok(secret) => {
            if secret.len() < 32 {
                return Err(JwtError::ConfigError(
                    "JWT_SECRET must be at least 32 characters long".to_string(),
                ));
            }
            Ok(secret)
        }
        Err(_) => {
            #[cfg(debug_assertions)]
            {
                tracing::warn!("⚠️  JWT_SECRET not set! Using the development secret.");
                Ok(DEV_FALLBACK_SECRET.to_string())
            }
            #[cfg(not(debug_assertions))]
            {
                Err(JwtError::ConfigError(
                    "JWT_SECRET environment variable must be set in production!".to_string(),
                ))
            }
        }
    }
}

/// `sub` 的主键类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Int,
    Str,
}

/// 存储在令牌中的 JWT Claims
///
/// `permissions` 缺失与空列表语义不同: 空列表表示显式无权限。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 主体 ID (Subject)
    pub sub: String,
    /// `sub` 的主键类型，缺失时纯数字按整数解析
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_kind: Option<SubjectKind>,
    /// 主体所属集合
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_level: Option<String>,
    #[serde(default)]
    pub is_super_admin: bool,
    /// 显式权限列表
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    /// 过期时间戳
    pub exp: i64,
    /// 签发时间戳
    pub iat: i64,
    /// 签发者
    pub iss: String,
    /// 受众
    pub aud: String,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        let id = match claims.sub_kind {
            Some(SubjectKind::Str) => PrincipalId::Str(claims.sub),
            _ => match claims.sub.parse::<i64>() {
                Ok(id) => PrincipalId::Int(id),
                Err(_) => PrincipalId::Str(claims.sub),
            },
        };

        Principal {
            id,
            user_type: claims.user_type,
            role: claims.role,
            access_level: claims.access_level,
            is_super_admin: claims.is_super_admin,
            permissions: claims
                .permissions
                .map(|ps| ps.into_iter().map(PermissionEntry::from).collect()),
        }
    }
}

/// JWT 错误
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("无效令牌: {0}")]
    InvalidToken(String),

    #[error("令牌已过期")]
    ExpiredToken,

    #[error("无效签名")]
    InvalidSignature,

    #[error("令牌生成失败: {0}")]
    GenerationFailed(String),

    #[error("配置错误: {0}")]
    ConfigError(String),
}

/// JWT 令牌服务
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// 使用指定配置创建 JWT 服务
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 为主体签发访问令牌
    pub fn generate_token(&self, principal: &Principal) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.config.expiration_minutes);

        let sub_kind = match principal.id {
            PrincipalId::Int(_) => SubjectKind::Int,
            PrincipalId::Str(_) => SubjectKind::Str,
        };

        let claims = Claims {
            sub: principal.id.to_string(),
            sub_kind: Some(sub_kind),
            user_type: principal.user_type,
            role: principal.role.clone(),
            access_level: principal.access_level.clone(),
            is_super_admin: principal.is_super_admin,
            permissions: principal
                .permissions
                .as_ref()
                .map(|ps| ps.iter().map(|p| p.name().to_string()).collect()),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        self.encode_claims(&claims)
    }

    /// 编码任意 Claims
    pub fn encode_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// 验证并解码令牌
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::InvalidToken => JwtError::InvalidToken(e.to_string()),
                _ => JwtError::InvalidToken(format!("Token validation failed: {}", e)),
            }
        })?;

        Ok(token_data.claims)
    }

    /// 验证令牌并还原主体
    pub fn principal_from_token(&self, token: &str) -> Result<Principal, JwtError> {
        self.validate_token(token).map(Principal::from)
    }

    /// 从 Authorization 头提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::with_config(JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hs256".to_string(),
            expiration_minutes: 60,
            issuer: "admin-server".to_string(),
            audience: "back-office".to_string(),
        })
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let service = service();
        let principal = Principal::new(42)
            .with_user_type(UserType::Employee)
            .with_role("employee")
            .with_permissions(["order.read", "order.create"]);

        let token = service
            .generate_token(&principal)
            .expect("Failed to generate test token");
        let claims = service
            .validate_token(&token)
            .expect("Failed to validate test token");

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_type, Some(UserType::Employee));
        assert_eq!(claims.role.as_deref(), Some("employee"));
        assert_eq!(
            claims.permissions,
            Some(vec!["order.read".to_string(), "order.create".to_string()])
        );
        assert_eq!(Principal::from(claims), principal);
    }

    #[test]
    fn test_absent_and_empty_permissions_survive_token() {
        let service = service();

        let without = Principal::new(1).with_role("manager");
        let restored = service
            .principal_from_token(&service.generate_token(&without).unwrap())
            .unwrap();
        assert!(restored.permissions.is_none());

        let empty = Principal::new(1)
            .with_role("employee")
            .with_permissions(Vec::<String>::new());
        let restored = service
            .principal_from_token(&service.generate_token(&empty).unwrap())
            .unwrap();
        assert_eq!(restored.permissions, Some(vec![]));
    }

    #[test]
    fn test_string_subject() {
        let service = service();
        let principal = Principal::new("a1b2").with_access_level("super");
        let restored = service
            .principal_from_token(&service.generate_token(&principal).unwrap())
            .unwrap();
        assert_eq!(restored.id, PrincipalId::Str("a1b2".to_string()));
        assert_eq!(restored.access_level.as_deref(), Some("super"));
    }

    #[test]
    fn test_numeric_string_subject_stays_string() {
        let service = service();
        let principal = Principal::new("42").with_role("user");
        let token = service.generate_token(&principal).unwrap();

        assert_eq!(
            service.validate_token(&token).unwrap().sub_kind,
            Some(SubjectKind::Str)
        );
        assert_eq!(
            service.principal_from_token(&token).unwrap().id,
            PrincipalId::Str("42".to_string())
        );
        assert_eq!(
            service
                .principal_from_token(&service.generate_token(&Principal::new(42)).unwrap())
                .unwrap()
                .id,
            PrincipalId::Int(42)
        );
    }

    #[test]
    fn test_subject_without_kind_parses_digits() {
        let service = service();
        let now = Utc::now().timestamp();
        let claims = |sub: &str| Claims {
            sub: sub.to_string(),
            sub_kind: None,
            user_type: None,
            role: None,
            access_level: None,
            is_super_admin: false,
            permissions: None,
            exp: now + 600,
            iat: now,
            iss: "admin-server".to_string(),
            aud: "back-office".to_string(),
        };

        let token = service.encode_claims(&claims("7")).unwrap();
        assert_eq!(
            service.principal_from_token(&token).unwrap().id,
            PrincipalId::Int(7)
        );
        let token = service.encode_claims(&claims("u-7")).unwrap();
        assert_eq!(
            service.principal_from_token(&token).unwrap().id,
            PrincipalId::Str("u-7".to_string())
        );
    }

    #[test]
    fn test_expired_token() {
        let service = service();
        let past = Utc::now().timestamp() - 3600;
        let token = service
            .encode_claims(&Claims {
                sub: "1".to_string(),
                sub_kind: None,
                user_type: None,
                role: Some("admin".to_string()),
                access_level: None,
                is_super_admin: false,
                permissions: None,
                exp: past,
                iat: past - 60,
                iss: "admin-server".to_string(),
                aud: "back-office".to_string(),
            })
            .unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service().generate_token(&Principal::new(1)).unwrap();
        let other = JwtService::with_config(JwtConfig {
            secret: "another-secret-that-is-long-enough-for-hs256".to_string(),
            ..service().config
        });
        assert!(other.validate_token(&token).is_err());
        assert!(service().validate_token("not.a.jwt").is_err());
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Bearer "), None);
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }
}
