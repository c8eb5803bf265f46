//! 数据模型
//!
//! 会话、模式、闸门、压缩包引用等核心数据结构。

pub mod mode;
pub mod session;

pub use mode::Mode;
pub use session::{ArchiveRef, GatePair, Session};
