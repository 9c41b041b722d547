use thiserror::Error;

use crate::auth::{JwtError, PolicyError};

/// 启动阶段错误
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(#[from] JwtError),

    #[error("策略表错误: {0}")]
    Policy(#[from] PolicyError),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
