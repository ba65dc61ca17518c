//! 工具模块
//!
//! 提供canlog系统中常用的工具函数

use crate::error::DecodeError;

/// 8位异或校验：对所有字节逐一异或
pub fn xor_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// 将字节数组转换为十六进制字符串
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 8位二进制分组（如 `00010000`）逐个转换为字节
///
/// 每个分组必须恰好8位且只含0/1
pub fn binary_groups_to_bytes<'a, I>(groups: I) -> Result<Vec<u8>, DecodeError>
where
    I: IntoIterator<Item = &'a str>,
{
    groups
        .into_iter()
        .enumerate()
        .map(|(index, group)| {
            if group.len() != 8 || !group.bytes().all(|b| b == b'0' || b == b'1') {
                return Err(DecodeError::MalformedPayload(format!(
                    "byte {index} '{group}' is not an 8-bit binary group"
                )));
            }
            u8::from_str_radix(group, 2).map_err(|e| {
                DecodeError::MalformedPayload(format!("byte {index} '{group}': {e}"))
            })
        })
        .collect()
}

/// 将宽整数序列收窄为字节，任何超出0–255的值都视为负载非法
pub fn payload_from_values<I>(values: I) -> Result<Vec<u8>, DecodeError>
where
    I: IntoIterator<Item = u32>,
{
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            u8::try_from(value).map_err(|_| {
                DecodeError::MalformedPayload(format!(
                    "byte {index} has value {value}, outside 0-255"
                ))
            })
        })
        .collect()
}
