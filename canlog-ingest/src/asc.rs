//! ASC 文本导出
//!
//! 每条记录一行：`<相对秒数> <通道> <ID>[x] Rx d <长度> <字节...>`，
//! 时间相对第一条记录，保留6位小数

use canlog_core::RawFrameRecord;
use std::fmt::Write as _;

use crate::parsers::trace_line::TraceLineParser;

pub struct AscExporter {
    first_timestamp: Option<u64>,
    channel: u8,
}

impl Default for AscExporter {
    fn default() -> Self {
        Self::new(1)
    }
}

impl AscExporter {
    pub fn new(channel: u8) -> Self {
        Self {
            first_timestamp: None,
            channel,
        }
    }

    /// 第一次调用时记下基准时间
    pub fn export_line(&mut self, record: &RawFrameRecord) -> String {
        let first = *self.first_timestamp.get_or_insert(record.timestamp);
        let elapsed_ms = i128::from(record.timestamp) - i128::from(first);
        let sign = if elapsed_ms < 0 { "-" } else { "" };
        let elapsed_ms = elapsed_ms.unsigned_abs();
        // 毫秒分辨率，后三位小数恒为0
        let seconds = format!("{sign}{}.{:03}000", elapsed_ms / 1000, elapsed_ms % 1000);

        let suffix = if TraceLineParser::frame_kind_for(record.identifier) == "Extended" {
            "x"
        } else {
            ""
        };

        let mut line = format!(
            "{seconds} {} {:X}{suffix} Rx d {}",
            self.channel,
            record.identifier,
            record.payload.len()
        );
        for byte in &record.payload {
            let _ = write!(line, " {byte:02x}");
        }
        line
    }

    pub fn export<'a, I>(&mut self, records: I) -> String
    where
        I: IntoIterator<Item = &'a RawFrameRecord>,
    {
        let mut out = String::new();
        for record in records {
            out.push_str(&self.export_line(record));
            out.push('\n');
        }
        out
    }
}
