//! FrameDecoder核心实现
//!
//! 按标识符查schema，把原始帧记录解码为带名字段的 `DecodedFrame`

use canlog_core::{DecodeError, DecodedFields, DecodedFrame, FrameSchema, RawFrameRecord};
use std::fmt;
use tracing::{debug, warn};

use super::bitstream::Bitstream;
use super::field_decoder::FieldDecoder;

/// 单帧解码失败及其定位信息
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFailure {
    pub timestamp: u64,
    pub identifier: u32,
    pub error: DecodeError,
}

impl fmt::Display for FrameFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame 0x{:X} at {}ms: {}",
            self.identifier, self.timestamp, self.error
        )
    }
}

/// 批量解码结果
#[derive(Debug, Clone, Default)]
pub struct DecodeOutcome {
    /// 成功解码的帧，保持输入顺序
    pub frames: Vec<DecodedFrame>,
    /// 被跳过的未知标识符 (timestamp, identifier)
    pub unknown: Vec<(u64, u32)>,
    /// 结构性错误导致失败的帧
    pub failures: Vec<FrameFailure>,
}

impl DecodeOutcome {
    pub fn total(&self) -> usize {
        self.frames.len() + self.unknown.len() + self.failures.len()
    }
}

/// 帧解码器
///
/// 借用只读的 `FrameSchema`，自身不保存任何可变状态
#[derive(Clone, Copy)]
pub struct FrameDecoder<'a> {
    schema: &'a FrameSchema,
}

impl<'a> FrameDecoder<'a> {
    pub fn new(schema: &'a FrameSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FrameSchema {
        self.schema
    }

    /// 解码一条原始帧记录
    ///
    /// # 返回
    /// - `Ok(DecodedFrame)`: 每个字段描述对应一个条目，顺序同schema
    /// - `Err(DecodeError::UnknownIdentifier)`: schema中没有该标识符
    /// - `Err(..)`: 任一字段失败则整帧失败，不会返回部分字段
    pub fn decode(&self, record: &RawFrameRecord) -> Result<DecodedFrame, DecodeError> {
        let fields = self.decode_payload(record.identifier, &record.payload)?;
        Ok(DecodedFrame {
            timestamp: record.timestamp,
            identifier: record.identifier,
            frame_kind: record.frame_kind.clone(),
            fields,
        })
    }

    /// 按标识符解码负载字节
    pub fn decode_payload(
        &self,
        identifier: u32,
        payload: &[u8],
    ) -> Result<DecodedFields, DecodeError> {
        let descriptors = self
            .schema
            .get(identifier)
            .ok_or(DecodeError::UnknownIdentifier(identifier))?;

        if payload.is_empty() && !descriptors.is_empty() {
            return Err(DecodeError::MalformedPayload(format!(
                "empty payload for frame 0x{identifier:X} with {} field(s)",
                descriptors.len()
            )));
        }

        let bits = Bitstream::assemble(payload);
        let mut fields = DecodedFields::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let value = FieldDecoder::decode(&bits, descriptor)?;
            fields.insert(descriptor.name.clone(), value);
        }

        Ok(fields)
    }

    /// 批量解码，单帧错误不会中断整个输入
    pub fn decode_all<'r, I>(&self, records: I) -> DecodeOutcome
    where
        I: IntoIterator<Item = &'r RawFrameRecord>,
    {
        let mut outcome = DecodeOutcome::default();

        for record in records {
            match self.decode(record) {
                Ok(frame) => {
                    debug!(
                        "decoded frame 0x{:X} at {}ms ({} fields)",
                        frame.identifier,
                        frame.timestamp,
                        frame.fields.len()
                    );
                    outcome.frames.push(frame);
                }
                Err(DecodeError::UnknownIdentifier(identifier)) => {
                    debug!("skipping unknown frame 0x{identifier:X} at {}ms", record.timestamp);
                    outcome.unknown.push((record.timestamp, identifier));
                }
                Err(error) => {
                    let failure = FrameFailure {
                        timestamp: record.timestamp,
                        identifier: record.identifier,
                        error,
                    };
                    warn!("{failure}");
                    outcome.failures.push(failure);
                }
            }
        }

        outcome
    }
}
