//! 解码日志行解析
//!
//! 行格式：`[<ts>] <f1> <f2> <ID> <type> <f5> <b0> <b1> ...`，
//! 数据字节可以是8位二进制分组，也可以是1–2位十六进制

use canlog_core::utils::binary_groups_to_bytes;
use canlog_core::RawFrameRecord;

use super::{parse_hex_bytes, parse_identifier, LineParser};
use crate::error::IngestError;

/// 数据字节从第7个标记开始
const DATA_START: usize = 6;
const BINARY_GROUP_WIDTH: usize = 8;

pub struct RecordLineParser;

impl RecordLineParser {
    fn parse_timestamp(token: &str) -> Result<u64, IngestError> {
        token
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse()
            .map_err(|_| IngestError::BadLine(format!("invalid timestamp '{token}'")))
    }

    /// 出现8字符的标记即按二进制分组解析，整行不允许混用
    fn parse_data(tokens: &[&str]) -> Result<Vec<u8>, IngestError> {
        if tokens.iter().any(|t| t.len() == BINARY_GROUP_WIDTH) {
            return Ok(binary_groups_to_bytes(tokens.iter().copied())?);
        }
        parse_hex_bytes(tokens.iter().copied())
    }
}

impl LineParser for RecordLineParser {
    fn parse_line(&self, line: &str) -> Result<Option<RawFrameRecord>, IngestError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(None);
        }
        if parts.len() < DATA_START {
            return Err(IngestError::BadLine(format!(
                "expected at least {DATA_START} columns, got {}",
                parts.len()
            )));
        }

        let timestamp = Self::parse_timestamp(parts[0])?;
        let identifier = parse_identifier(parts[3])?;
        let frame_kind = parts[4].to_string();
        let payload = Self::parse_data(&parts[DATA_START..])?;

        Ok(Some(RawFrameRecord {
            timestamp,
            identifier,
            frame_kind,
            payload,
        }))
    }
}
