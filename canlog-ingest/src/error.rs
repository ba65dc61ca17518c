//! 输入适配错误定义

use canlog_core::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// 无法识别的文件格式或日志格式
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    /// 配置文件中同一标识符出现多次（不同写法也算）
    #[error("Identifier 0x{0:X} defined twice")]
    DuplicateIdentifier(u32),
    /// 日志行结构不对
    #[error("Bad line: {0}")]
    BadLine(String),
    /// 负载字节非法
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
