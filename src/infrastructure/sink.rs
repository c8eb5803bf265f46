//! 转换结果投递的边界
//!
//! 编排层把重打包后的字节交给投递器；消息传输层的实现在核心之外。

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use crate::error::{AppError, AppResult};

/// 结果投递能力
#[async_trait]
pub trait BundleSink: Send + Sync {
    /// 投递一个命名好的结果压缩包
    async fn deliver(&self, file_name: &str, bytes: &[u8]) -> AppResult<()>;
}

/// 写入本地输出目录的投递器
pub struct FsSink {
    output_dir: PathBuf,
}

impl FsSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl BundleSink for FsSink {
    async fn deliver(&self, file_name: &str, bytes: &[u8]) -> AppResult<()> {
        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::write_failed(self.output_dir.to_string_lossy(), e))?;
        let target = self.output_dir.join(file_name);
        fs::write(&target, bytes)
            .await
            .map_err(|e| AppError::write_failed(target.to_string_lossy(), e))?;
        info!("📤 已输出: {}", target.display());
        Ok(())
    }
}
