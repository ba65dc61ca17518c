//! canlog Decode Engine
//!
//! This crate turns raw bus frame records into named, typed signal values
//! using a declarative per-identifier schema.

pub mod frame_disassembler;

pub use frame_disassembler::{Bitstream, DecodeOutcome, FieldDecoder, FrameDecoder, FrameFailure};
