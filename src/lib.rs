//! # Landing Transformer
//!
//! 联盟投放落地页的批量转换核心：接收 ZIP 打包的 HTML 包，
//! 清理第三方跟踪代码、归一化表单字段、注入校验/重定向脚本、
//! 可选加上服务端闸门，再重新打包输出。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部边界，只暴露能力
//! - `ArchiveFetcher` - 上传引用 → 字节
//! - `BundleSink` - 结果压缩包投递
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `param_parser` - 参数文本规范化
//! - `session_store` - 会话仓库（get / set / delete）
//! - `archive` - ZIP 解包 / 重打包
//! - `templates` - 校验脚本 / order 模板 / 闸门守卫生成
//!
//! ### ③ 流程层（Workflow）+ 重写引擎
//! - `workflow/ArchiveFlow` - 单个压缩包的完整处理流程
//! - `rewrite/` - 规则驱动的文档重写引擎
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/BatchProcessor` - 按序处理会话中的全部压缩包，失败隔离
//! - `orchestrator/App` - 本地批处理入口

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod rewrite;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ArchiveFetcher, BundleSink, FsFetcher, FsSink, HttpFetcher};
pub use models::{ArchiveRef, GatePair, Mode, Session};
pub use orchestrator::{App, BatchOutcome, BatchProcessor};
pub use services::{MemorySessionStore, SessionStore};
pub use workflow::ArchiveFlow;
