//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::BatchProcessor (处理 Vec<ArchiveRef>)
//!     ↓
//! workflow::ArchiveFlow (处理单个压缩包)
//!     ↓
//! services (能力层：解析 / 解包 / 模板) + rewrite (文档重写引擎)
//!     ↓
//! infrastructure (边界：ArchiveFetcher / BundleSink)
//! ```
//!
//! ## 设计原则
//!
//! 1. **失败隔离**：单个压缩包失败记录后继续，不重试
//! 2. **资源隔离**：只有编排层持有 fetcher / sink / 会话仓库
//! 3. **无业务逻辑**：只做调度和统计，不做具体重写判断

pub mod batch_processor;

pub use batch_processor::{App, BatchOutcome, BatchProcessor};
