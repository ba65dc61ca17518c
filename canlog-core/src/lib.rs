//! canlog Core Library
//!
//! This crate provides the shared data model and error taxonomy for the
//! canlog system: raw frame records, field descriptors, frame schemas and
//! decoded frames.

pub mod error;
pub mod frame_meta;
pub mod utils;

// 导出错误类型
pub use error::DecodeError;

// 导出帧元数据类型，便于其他模块使用
pub use frame_meta::*;
