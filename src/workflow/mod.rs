//! 流程层（Workflow）
//!
//! 定义"一个压缩包"的完整处理流程，向下只依赖业务能力层。

pub mod archive_flow;

pub use archive_flow::ArchiveFlow;
