//! 解码错误定义

use thiserror::Error;

/// 帧解码错误
///
/// 结构性错误（负载非法、位越界）只终止当前帧的解码，
/// 未知标识符由调用方决定跳过还是记录。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// 负载无法分解为合法字节
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    /// 字段引用的位超出负载长度
    #[error(
        "Bit range out of bounds: field '{field}' needs bits [{start_bit}, {end_bit}) but payload has {bit_len} bits"
    )]
    BitRangeOutOfBounds {
        field: String,
        start_bit: usize,
        end_bit: usize,
        bit_len: usize,
    },
    /// schema中没有该标识符
    #[error("Unknown identifier: 0x{0:X}")]
    UnknownIdentifier(u32),
    /// 无效的字段定义
    #[error("Invalid field definition '{field}': {reason}")]
    InvalidFieldDefinition { field: String, reason: String },
}

impl DecodeError {
    /// 出错字段名（仅字段级错误有）
    pub fn field_name(&self) -> Option<&str> {
        match self {
            DecodeError::BitRangeOutOfBounds { field, .. }
            | DecodeError::InvalidFieldDefinition { field, .. } => Some(field),
            _ => None,
        }
    }
}
