//! 帧解码模块
//!
//! schema驱动的位字段解码，支持：
//! - 负载字节按线上顺序拼装为位流（不做字节交换）
//! - bit级字段精确提取，数值缩放与枚举查表
//! - 未知标识符与结构性错误的单帧隔离

pub mod bitstream;
pub mod core;
pub mod field_decoder;

pub use bitstream::Bitstream;
pub use core::{DecodeOutcome, FrameDecoder, FrameFailure};
pub use field_decoder::FieldDecoder;
