//! 字段解码器
//!
//! 按单个字段描述从位流中取值，并做数值缩放或枚举查表

use canlog_core::{DecodeError, FieldDescriptor, FieldKind, FieldValue, UNKNOWN_LABEL};

use super::bitstream::Bitstream;

/// 字段解码器，无状态
pub struct FieldDecoder;

impl FieldDecoder {
    /// 解码单个字段
    ///
    /// # 参数
    /// - `bits`: 拼装后的位流
    /// - `descriptor`: 字段描述
    ///
    /// # 返回
    /// - `Ok(FieldValue)`: 数值字段为 `Real`（恒等缩放且标记为整数时为 `Integer`），
    ///   枚举字段为 `Label`，查不到时为 `"Unknown"`
    /// - `Err(DecodeError)`: 字段越界或描述非法
    pub fn decode(bits: &Bitstream, descriptor: &FieldDescriptor) -> Result<FieldValue, DecodeError> {
        descriptor.validate()?;

        let raw = bits.extract(descriptor.start_bit, descriptor.length).ok_or_else(|| {
            DecodeError::BitRangeOutOfBounds {
                field: descriptor.name.clone(),
                start_bit: descriptor.start_bit,
                end_bit: descriptor.start_bit.saturating_add(descriptor.length),
                bit_len: bits.bit_len(),
            }
        })?;

        let value = match &descriptor.kind {
            FieldKind::Numeric {
                factor,
                offset,
                integral,
            } => {
                if *integral && *factor == 1.0 && *offset == 0.0 {
                    FieldValue::Integer(raw)
                } else {
                    FieldValue::Real(raw as f64 * factor + offset)
                }
            }
            FieldKind::Enumerated { table } => FieldValue::Label(
                table
                    .get(&raw)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            ),
        };

        Ok(value)
    }

    /// 由物理值反推原始整数（解码的逆运算）
    ///
    /// 数值字段按 `(value - offset) / factor` 四舍五入；枚举字段按标签反查。
    /// factor为0、结果为负、非有限或放不进字段位宽时返回 `None`。
    pub fn encode_raw(descriptor: &FieldDescriptor, value: &FieldValue) -> Option<u64> {
        let raw = match (&descriptor.kind, value) {
            (FieldKind::Numeric { factor, offset, .. }, _) => {
                let physical = value.as_f64()?;
                if *factor == 0.0 {
                    return None;
                }
                let raw = ((physical - offset) / factor).round();
                if !raw.is_finite() || raw < 0.0 || raw > u64::MAX as f64 {
                    return None;
                }
                raw as u64
            }
            (FieldKind::Enumerated { table }, FieldValue::Label(label)) => table
                .iter()
                .find(|(_, name)| *name == label)
                .map(|(raw, _)| *raw)?,
            (FieldKind::Enumerated { .. }, _) => return None,
        };

        if descriptor.length < 64 && raw >> descriptor.length != 0 {
            return None;
        }
        Some(raw)
    }
}
