//! 认证授权模块
//!
//! - [`PolicyTable`] - 角色等级与默认权限
//! - [`AuthorizationEvaluator`] - 权限 / 角色判定
//! - [`PermissionResolver`] - 从存储解析主体权限 (失败即拒绝)
//! - [`JwtService`] - JWT 令牌服务
//! - [`attach_principal`] / [`load_permissions`] - 认证中间件
//! - [`require_permission`] 等 - 门禁中间件

pub mod evaluator;
pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod policy;
pub mod resolver;
pub mod source;

pub use evaluator::{AuthorizationEvaluator, Requirement, Verdict};
pub use extractor::CurrentPrincipal;
pub use jwt::{Claims, JwtConfig, JwtError, JwtService, SubjectKind};
pub use middleware::{
    attach_principal, authorize, load_permissions, require_all_permissions,
    require_any_permission, require_permission, require_role,
};
pub use policy::{PolicyError, PolicyTable};
pub use resolver::PermissionResolver;
pub use source::{PrincipalPermissionSource, SourceError};
