//! 位流拼装器
//!
//! 把负载字节按线上顺序拼成一条位序列：字节内高位在前，字节之间从左到右，
//! 不做任何字节交换。schema中所谓的"小端"完全由 `start_bit` 的取值体现。

use canlog_core::utils::{binary_groups_to_bytes, payload_from_values};
use canlog_core::DecodeError;
use std::fmt;

/// 拼装后的位序列，长度恒为 `8 × 字节数`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bitstream {
    bytes: Vec<u8>,
}

impl Bitstream {
    /// 由负载字节拼装位流
    ///
    /// # 示例
    /// ```
    /// use canlog_decode::frame_disassembler::Bitstream;
    ///
    /// let bits = Bitstream::assemble(&[0x10, 0x7F]);
    /// assert_eq!(bits.bit_len(), 16);
    /// assert_eq!(bits.to_binary_string(), "00010000 01111111");
    /// ```
    pub fn assemble(payload: &[u8]) -> Self {
        Self {
            bytes: payload.to_vec(),
        }
    }

    /// 由未收窄的整数序列拼装，任一值超出0–255即为 `MalformedPayload`
    pub fn from_values<I>(values: I) -> Result<Self, DecodeError>
    where
        I: IntoIterator<Item = u32>,
    {
        Ok(Self {
            bytes: payload_from_values(values)?,
        })
    }

    /// 解析以空白分隔的8位二进制分组，如 "00010000 01111111"
    pub fn from_binary_groups(text: &str) -> Result<Self, DecodeError> {
        Ok(Self {
            bytes: binary_groups_to_bytes(text.split_whitespace())?,
        })
    }

    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 提取 `[start_bit, start_bit + bit_length)` 并按无符号整数解释
    ///
    /// 切片的第一位是结果的最高位。长度为0、超过64或越界时返回 `None`，
    /// 从不返回截断的值。
    pub fn extract(&self, start_bit: usize, bit_length: usize) -> Option<u64> {
        if bit_length == 0 || bit_length > 64 {
            return None;
        }
        let end_bit = start_bit.checked_add(bit_length)?;
        if end_bit > self.bit_len() {
            return None;
        }

        let start_byte = start_bit / 8;
        let end_byte = (end_bit - 1) / 8;

        // 64位字段非对齐时会跨9个字节，用u128累加
        let mut value = 0u128;
        for &byte in &self.bytes[start_byte..=end_byte] {
            value = (value << 8) | byte as u128;
        }

        let total_bits = (end_byte - start_byte + 1) * 8;
        let shift = total_bits - (start_bit % 8) - bit_length;
        let mask = (1u128 << bit_length) - 1;

        Some(((value >> shift) & mask) as u64)
    }

    /// 把值写入指定位区间（高位在前），用于构造测试负载
    ///
    /// 越界或值放不下时返回 `false` 且不修改位流
    pub fn insert(&mut self, start_bit: usize, bit_length: usize, value: u64) -> bool {
        let fits = start_bit
            .checked_add(bit_length)
            .is_some_and(|end| end <= self.bit_len());
        if bit_length == 0 || bit_length > 64 || !fits {
            return false;
        }
        if bit_length < 64 && value >> bit_length != 0 {
            return false;
        }
        for i in 0..bit_length {
            let bit_pos = start_bit + i;
            let byte_idx = bit_pos / 8;
            let bit_idx = 7 - (bit_pos % 8); // MSB first
            if (value >> (bit_length - 1 - i)) & 1 == 1 {
                self.bytes[byte_idx] |= 1 << bit_idx;
            } else {
                self.bytes[byte_idx] &= !(1 << bit_idx);
            }
        }
        true
    }

    /// 以8位一组、空格分隔的二进制文本表示
    pub fn to_binary_string(&self) -> String {
        self.bytes
            .iter()
            .map(|b| format!("{b:08b}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Bitstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_binary_string())
    }
}
