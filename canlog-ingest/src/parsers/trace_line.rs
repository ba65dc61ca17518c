//! 网关收发日志行解析
//!
//! 行格式：`time: <ms> id: [0x]<HEX>, data: <HEX> <HEX> ...`

use canlog_core::RawFrameRecord;
use regex::Regex;

use super::{parse_hex_bytes, parse_identifier, LineParser};
use crate::error::IngestError;

/// 标准帧标识符上限（11位）
const MAX_STANDARD_ID: u32 = 0x7FF;

pub struct TraceLineParser {
    pattern: Regex,
}

impl Default for TraceLineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceLineParser {
    pub fn new() -> Self {
        let pattern = Regex::new(
            r"^\s*time:\s*(\d+)\s+id:\s*((?:0[xX])?[0-9A-Fa-f]+),?\s*data:\s*([0-9A-Fa-fxX\s]*)$",
        )
        .expect("trace line pattern is valid");
        Self { pattern }
    }

    /// 超过11位的标识符视为扩展帧
    pub fn frame_kind_for(identifier: u32) -> &'static str {
        if identifier > MAX_STANDARD_ID {
            "Extended"
        } else {
            "Standard"
        }
    }
}

impl LineParser for TraceLineParser {
    fn parse_line(&self, line: &str) -> Result<Option<RawFrameRecord>, IngestError> {
        let Some(caps) = self.pattern.captures(line) else {
            return Ok(None);
        };

        let timestamp = caps[1]
            .parse()
            .map_err(|_| IngestError::BadLine(format!("invalid timestamp '{}'", &caps[1])))?;
        let identifier = parse_identifier(&caps[2])?;
        let payload = parse_hex_bytes(caps[3].split_whitespace())?;

        Ok(Some(RawFrameRecord {
            timestamp,
            identifier,
            frame_kind: Self::frame_kind_for(identifier).to_string(),
            payload,
        }))
    }
}
