//! schema加载模块
//!
//! 从 YAML / JSON 查找表构造 `FrameSchema`。查找表布局：
//!
//! ```yaml
//! 0x1803B0A0:
//!   - name: gear
//!     start_bit: 0
//!     length: 4
//!     type: enum
//!     dic: {0: P, 1: R, 2: N, 8: D}
//!   - name: target_speed
//!     start_bit: 4
//!     length: 12
//!     factor: 0.05
//! ```

use canlog_core::{FieldDescriptor, FieldKind, FrameSchema};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use tracing::info;

use crate::error::IngestError;

/// 查找表中的标识符键：整数，或十六进制/十进制字符串
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FrameId(pub u32);

impl<'de> Deserialize<'de> for FrameId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FrameIdVisitor;

        impl<'de> Visitor<'de> for FrameIdVisitor {
            type Value = FrameId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a frame identifier as integer or hex string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                u32::try_from(v)
                    .map(FrameId)
                    .map_err(|_| E::custom(format!("identifier {v} out of range")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u32::try_from(v)
                    .map(FrameId)
                    .map_err(|_| E::custom(format!("identifier {v} out of range")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                let s = v.trim();
                let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    Some(hex) => u32::from_str_radix(hex, 16),
                    None => s.parse::<u32>(),
                };
                parsed
                    .map(FrameId)
                    .map_err(|_| E::custom(format!("invalid identifier: {s}")))
            }
        }

        deserializer.deserialize_any(FrameIdVisitor)
    }
}

/// 以标识符为键的映射，按文件顺序保留每个条目
///
/// `0x100` 与 `256` 解析后是同一个标识符，不能先合并成map再检查重复
pub(crate) struct IdEntries<T>(pub(crate) Vec<(FrameId, T)>);

impl<'de, T> Deserialize<'de> for IdEntries<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T> Visitor<'de> for EntriesVisitor<T>
        where
            T: Deserialize<'de>,
        {
            type Value = IdEntries<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map keyed by frame identifier")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<FrameId, T>()? {
                    entries.push(entry);
                }
                Ok(IdEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// 查找表中的字段类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LookupType {
    #[default]
    Numeric,
    #[serde(alias = "enumerated")]
    Enum,
}

/// 查找表中的单个字段
#[derive(Debug, Clone, Deserialize)]
struct LookupField {
    name: String,
    start_bit: usize,
    length: usize,
    #[serde(rename = "type", default)]
    field_type: LookupType,
    #[serde(default)]
    factor: Option<f64>,
    #[serde(default)]
    offset: Option<f64>,
    #[serde(default)]
    integral: Option<bool>,
    #[serde(default, alias = "table")]
    dic: BTreeMap<u64, String>,
}

impl LookupField {
    fn into_descriptor(self) -> FieldDescriptor {
        let kind = match self.field_type {
            LookupType::Numeric => {
                let factor = self.factor.unwrap_or(1.0);
                let offset = self.offset.unwrap_or(0.0);
                FieldKind::Numeric {
                    factor,
                    offset,
                    integral: self
                        .integral
                        .unwrap_or(factor == 1.0 && offset == 0.0),
                }
            }
            LookupType::Enum => FieldKind::Enumerated { table: self.dic },
        };
        FieldDescriptor {
            name: self.name,
            start_bit: self.start_bit,
            length: self.length,
            kind,
        }
    }
}

type LookupTable = IdEntries<Vec<LookupField>>;

/// schema加载器
pub struct SchemaLoader;

impl SchemaLoader {
    pub fn from_yaml_str(text: &str) -> Result<FrameSchema, IngestError> {
        let table: LookupTable = serde_yaml::from_str(text)?;
        Self::build(table)
    }

    pub fn from_json_str(text: &str) -> Result<FrameSchema, IngestError> {
        let table: LookupTable = serde_json::from_str(text)?;
        Self::build(table)
    }

    /// 按扩展名选择 YAML 或 JSON
    pub fn load(path: &Path) -> Result<FrameSchema, IngestError> {
        let parse: fn(&str) -> Result<FrameSchema, IngestError> =
            match extension_of(path).as_deref() {
                Some("yaml") | Some("yml") => Self::from_yaml_str,
                Some("json") => Self::from_json_str,
                _ => {
                    return Err(IngestError::UnsupportedFormat(format!(
                        "schema file {}",
                        path.display()
                    )))
                }
            };
        let schema = parse(&std::fs::read_to_string(path)?)?;
        info!(
            "loaded schema with {} frame(s) from {}",
            schema.len(),
            path.display()
        );
        Ok(schema)
    }

    fn build(table: LookupTable) -> Result<FrameSchema, IngestError> {
        let mut schema = FrameSchema::new();
        for (FrameId(identifier), fields) in table.0 {
            let descriptors = fields.into_iter().map(LookupField::into_descriptor).collect();
            schema.insert(identifier, descriptors)?;
        }
        Ok(schema)
    }
}

pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}
