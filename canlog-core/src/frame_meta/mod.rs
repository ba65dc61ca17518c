//! 帧元数据模块
//!
//! 定义原始帧记录、字段描述、帧schema以及解码结果

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::DecodeError;

/// 单个字段允许的最大位宽（解码值为u64）
pub const MAX_FIELD_BITS: usize = 64;

/// 枚举查表失败时的固定标签
pub const UNKNOWN_LABEL: &str = "Unknown";

/// 原始帧记录
///
/// 由日志解析协作方产生，负载按线上顺序给出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFrameRecord {
    pub timestamp: u64, // 毫秒
    pub identifier: u32,
    pub frame_kind: String, // 标准帧 / 扩展帧
    pub payload: Vec<u8>,
}

impl RawFrameRecord {
    pub fn new(
        timestamp: u64,
        identifier: u32,
        frame_kind: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            timestamp,
            identifier,
            frame_kind: frame_kind.into(),
            payload,
        }
    }

    /// 标识符的十六进制文本（大写，无前缀）
    pub fn id_hex(&self) -> String {
        format!("{:X}", self.identifier)
    }
}

/// 字段解释方式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// 数值字段：raw * factor + offset
    Numeric {
        factor: f64,
        offset: f64,
        /// 恒等缩放时以整数形式输出
        integral: bool,
    },
    /// 枚举字段：raw查表得到标签
    Enumerated { table: BTreeMap<u64, String> },
}

impl FieldKind {
    /// 恒等缩放的整数数值字段
    pub fn plain() -> Self {
        FieldKind::Numeric {
            factor: 1.0,
            offset: 0.0,
            integral: true,
        }
    }

    pub fn scaled(factor: f64, offset: f64) -> Self {
        FieldKind::Numeric {
            factor,
            offset,
            integral: factor == 1.0 && offset == 0.0,
        }
    }
}

/// 字段描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub start_bit: usize,
    pub length: usize, // 位数
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// 恒等缩放的数值字段
    pub fn numeric(name: impl Into<String>, start_bit: usize, length: usize) -> Self {
        Self {
            name: name.into(),
            start_bit,
            length,
            kind: FieldKind::plain(),
        }
    }

    /// 带factor/offset的数值字段
    pub fn scaled(
        name: impl Into<String>,
        start_bit: usize,
        length: usize,
        factor: f64,
        offset: f64,
    ) -> Self {
        Self {
            name: name.into(),
            start_bit,
            length,
            kind: FieldKind::scaled(factor, offset),
        }
    }

    /// 枚举字段
    pub fn enumerated<I, S>(name: impl Into<String>, start_bit: usize, length: usize, table: I) -> Self
    where
        I: IntoIterator<Item = (u64, S)>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            start_bit,
            length,
            kind: FieldKind::Enumerated {
                table: table.into_iter().map(|(k, v)| (k, v.into())).collect(),
            },
        }
    }

    /// 字段结束位（不含）
    pub fn end_bit(&self) -> usize {
        self.start_bit + self.length
    }

    /// 检查描述本身是否合法（与负载无关）
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.name.is_empty() {
            return Err(DecodeError::InvalidFieldDefinition {
                field: self.name.clone(),
                reason: "empty field name".to_string(),
            });
        }
        if self.length == 0 || self.length > MAX_FIELD_BITS {
            return Err(DecodeError::InvalidFieldDefinition {
                field: self.name.clone(),
                reason: format!("length must be within 1..={MAX_FIELD_BITS}, got {}", self.length),
            });
        }
        if let FieldKind::Numeric { factor, offset, .. } = &self.kind {
            if !factor.is_finite() || !offset.is_finite() {
                return Err(DecodeError::InvalidFieldDefinition {
                    field: self.name.clone(),
                    reason: format!("non-finite scaling: factor={factor}, offset={offset}"),
                });
            }
        }
        Ok(())
    }
}

/// 帧schema：标识符 → 有序字段描述列表
///
/// 构造完成后只读
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSchema {
    frames: BTreeMap<u32, Vec<FieldDescriptor>>,
}

impl FrameSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个标识符的字段列表
    ///
    /// 字段名在同一帧内必须唯一，重复添加同一标识符视为错误
    pub fn insert(
        &mut self,
        identifier: u32,
        fields: Vec<FieldDescriptor>,
    ) -> Result<(), DecodeError> {
        for (i, field) in fields.iter().enumerate() {
            field.validate()?;
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(DecodeError::InvalidFieldDefinition {
                    field: field.name.clone(),
                    reason: format!("duplicate field name in frame 0x{identifier:X}"),
                });
            }
        }
        if self.frames.contains_key(&identifier) {
            return Err(DecodeError::InvalidFieldDefinition {
                field: String::new(),
                reason: format!("frame 0x{identifier:X} defined twice"),
            });
        }
        self.frames.insert(identifier, fields);
        Ok(())
    }

    pub fn get(&self, identifier: u32) -> Option<&[FieldDescriptor]> {
        self.frames.get(&identifier).map(Vec::as_slice)
    }

    pub fn contains(&self, identifier: u32) -> bool {
        self.frames.contains_key(&identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = u32> + '_ {
        self.frames.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// 解码后的字段值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(u64),
    Real(f64),
    Label(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Real(v) => Some(*v),
            FieldValue::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            FieldValue::Label(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Real(v) => write!(f, "{v}"),
            FieldValue::Label(s) => write!(f, "{s}"),
        }
    }
}

/// 字段名 → 值，迭代顺序即schema声明顺序
pub type DecodedFields = IndexMap<String, FieldValue>;

/// 解码后的帧
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedFrame {
    pub timestamp: u64,
    #[serde(
        rename = "id",
        serialize_with = "serialize_hex_id",
        deserialize_with = "deserialize_hex_id"
    )]
    pub identifier: u32,
    #[serde(rename = "type")]
    pub frame_kind: String,
    #[serde(rename = "data")]
    pub fields: DecodedFields,
}

fn serialize_hex_id<S>(identifier: &u32, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format!("{identifier:X}"))
}

/// 支持 "1801B0A0"、"0x1801B0A0" 或数字
fn deserialize_hex_id<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => {
            let s = s.trim();
            let digits = s
                .strip_prefix("0x")
                .or_else(|| s.strip_prefix("0X"))
                .unwrap_or(s);
            u32::from_str_radix(digits, 16)
                .map_err(|_| de::Error::custom(format!("invalid hex identifier: {s}")))
        }
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| de::Error::custom("identifier out of range")),
        _ => Err(de::Error::custom("expected hex string or number")),
    }
}
