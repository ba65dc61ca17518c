//! canlog 输入适配
//!
//! 日志行解析、schema / 校验配置加载、ASC 导出

pub mod asc;
pub mod error;
pub mod parsers;
pub mod profile_loader;
pub mod schema_loader;

pub use asc::AscExporter;
pub use error::IngestError;
pub use parsers::{
    read_records, IngestIssue, IngestResult, LineParser, LogFormat, RecordLineParser,
    TraceLineParser,
};
pub use profile_loader::ProfileLoader;
pub use schema_loader::SchemaLoader;
