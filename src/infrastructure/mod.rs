//! 基础设施层（Infrastructure）
//!
//! 持有外部边界，只暴露能力：
//! - `ArchiveFetcher` - 上传引用 → 字节
//! - `BundleSink` - 结果压缩包投递

pub mod fetcher;
pub mod sink;

pub use fetcher::{ArchiveFetcher, FsFetcher, HttpFetcher};
pub use sink::{BundleSink, FsSink};
