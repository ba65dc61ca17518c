//! 日志行解析器模块
//!
//! 把两种文本日志格式切分为原始帧记录

pub mod record_line;
pub mod trace_line;

use canlog_core::utils::payload_from_values;
use canlog_core::RawFrameRecord;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::IngestError;

pub use record_line::RecordLineParser;
pub use trace_line::TraceLineParser;

/// 日志格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 解码日志：`[ts] .. .. <ID> <type> .. <bytes...>`
    Record,
    /// 网关收发日志：`time: <ms> id: <ID>, data: <bytes...>`
    Trace,
}

impl LogFormat {
    pub fn parser(self) -> Box<dyn LineParser> {
        match self {
            LogFormat::Record => Box::new(RecordLineParser),
            LogFormat::Trace => Box::new(TraceLineParser::new()),
        }
    }
}

impl FromStr for LogFormat {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "record" => Ok(LogFormat::Record),
            "trace" => Ok(LogFormat::Trace),
            other => Err(IngestError::UnsupportedFormat(format!("log format '{other}'"))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Record => f.write_str("record"),
            LogFormat::Trace => f.write_str("trace"),
        }
    }
}

/// 日志行解析器trait
pub trait LineParser {
    /// 解析一行
    ///
    /// 空行或不属于该格式的行返回 `Ok(None)`
    fn parse_line(&self, line: &str) -> Result<Option<RawFrameRecord>, IngestError>;
}

/// 出问题的行
#[derive(Debug)]
pub struct IngestIssue {
    pub line_no: usize,
    pub error: IngestError,
}

/// 整份日志的解析结果
#[derive(Debug, Default)]
pub struct IngestResult {
    /// (行号, 记录)，行号从1开始
    pub records: Vec<(usize, RawFrameRecord)>,
    pub issues: Vec<IngestIssue>,
}

impl IngestResult {
    pub fn into_records(self) -> Vec<RawFrameRecord> {
        self.records.into_iter().map(|(_, r)| r).collect()
    }
}

/// 逐行解析，坏行记录下来并跳过
pub fn read_records(parser: &dyn LineParser, text: &str) -> IngestResult {
    let mut result = IngestResult::default();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        match parser.parse_line(line) {
            Ok(Some(record)) => result.records.push((line_no, record)),
            Ok(None) => {}
            Err(error) => {
                warn!("line {line_no}: {error}");
                result.issues.push(IngestIssue { line_no, error });
            }
        }
    }

    result
}

/// 解析十六进制标识符，允许 0x 前缀
pub(crate) fn parse_identifier(token: &str) -> Result<u32, IngestError> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u32::from_str_radix(digits, 16)
        .map_err(|_| IngestError::BadLine(format!("invalid identifier '{token}'")))
}

/// 解析十六进制字节标记；超出0–255的值由 `payload_from_values` 报为负载非法
pub(crate) fn parse_hex_bytes<'a, I>(tokens: I) -> Result<Vec<u8>, IngestError>
where
    I: IntoIterator<Item = &'a str>,
{
    let values = tokens
        .into_iter()
        .map(|token| {
            let digits = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            u32::from_str_radix(digits, 16)
                .map_err(|_| IngestError::BadLine(format!("invalid data byte '{token}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(payload_from_values(values)?)
}
