//! Domain logic for the frame extraction service.
//!
//! Everything here is HTTP-agnostic: upload persistence, the ffmpeg/ffprobe
//! wrappers, extraction orchestration with rollback, and the paginated frame
//! catalog. External processes are reached only through [`tool::ToolRunner`]
//! so tests can substitute fakes.

pub mod catalog;
pub mod error;
pub mod extraction;
pub mod ffmpeg;
pub mod storage;
pub mod tool;
pub mod upload;
