//! 批量压缩包处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **批量处理**：按提交顺序逐个处理会话中的压缩包引用
//! 2. **失败隔离**：单个压缩包失败只记录，不中断批次，不重试
//! 3. **会话清理**：批次结束后无条件删除会话（无论成败）
//! 4. **结果汇总**：输出 成功/总数 统计和逐项状态文案
//!
//! `App` 是本地批处理入口：扫描输入目录组装会话，复用同一条编排逻辑，
//! 对话式命令表面（菜单、命令注册）在本核心之外。

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::{ArchiveFetcher, BundleSink, FsFetcher, FsSink};
use crate::models::{ArchiveRef, Mode, Session};
use crate::services::param_parser;
use crate::services::{MemorySessionStore, SessionStore};
use crate::utils::logging;
use crate::workflow::ArchiveFlow;

/// 本地批处理模式使用的固定用户号
const LOCAL_USER_ID: i64 = 0;

/// 批处理结果
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub total: usize,
    /// 逐项的用户可读状态文案
    pub reports: Vec<String>,
}

/// 批量压缩包处理器
pub struct BatchProcessor {
    config: Config,
    store: Arc<dyn SessionStore>,
    fetcher: Arc<dyn ArchiveFetcher>,
    sink: Arc<dyn BundleSink>,
}

impl BatchProcessor {
    pub fn new(
        config: Config,
        store: Arc<dyn SessionStore>,
        fetcher: Arc<dyn ArchiveFetcher>,
        sink: Arc<dyn BundleSink>,
    ) -> Self {
        Self {
            config,
            store,
            fetcher,
            sink,
        }
    }

    /// 处理一个用户会话中的全部压缩包
    ///
    /// 单个压缩包的任何失败都只影响它自己；大小超限使用单独的提示文案。
    /// 批次结束后会话被无条件删除。
    pub async fn process_all(&self, user_id: i64) -> Result<BatchOutcome> {
        let Some(mut session) = self.store.get(user_id) else {
            return Err(anyhow!("用户 {} 没有进行中的会话", user_id));
        };
        if session.processing {
            return Err(anyhow!("用户 {} 的批处理已在进行中", user_id));
        }
        session.processing = true;
        self.store.set(session.clone());

        let flow = ArchiveFlow::new(&self.config);
        let total = session.archives.len();
        let mut outcome = BatchOutcome {
            total,
            ..Default::default()
        };

        for (idx, archive_ref) in session.archives.iter().enumerate() {
            logging::log_batch_item(idx + 1, total, &archive_ref.file_name);

            match flow
                .run(
                    self.fetcher.as_ref(),
                    self.sink.as_ref(),
                    &session,
                    archive_ref,
                )
                .await
            {
                Ok(output_name) => {
                    outcome.succeeded += 1;
                    outcome
                        .reports
                        .push(format!("✅ {} → {}", archive_ref.file_name, output_name));
                }
                Err(e) if e.is_size_exceeded() => {
                    warn!("⚠️ {} 超出平台大小限制: {}", archive_ref.file_name, e);
                    outcome.reports.push(format!(
                        "⚠️ {} 超出平台大小限制，已跳过",
                        archive_ref.file_name
                    ));
                }
                Err(e) => {
                    error!("❌ {} 处理失败: {}", archive_ref.file_name, e);
                    outcome
                        .reports
                        .push(format!("❌ {} 处理失败: {}", archive_ref.file_name, e));
                }
            }
        }

        // 成功或失败都删除会话
        self.store.delete(user_id);

        logging::print_final_stats(outcome.succeeded, outcome.total);
        Ok(outcome)
    }
}

/// 应用主结构（本地批处理模式）
pub struct App {
    config: Config,
    store: Arc<dyn SessionStore>,
    processor: BatchProcessor,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let fetcher: Arc<dyn ArchiveFetcher> =
            Arc::new(FsFetcher::new(config.max_archive_bytes));
        let sink: Arc<dyn BundleSink> = Arc::new(FsSink::new(config.output_folder.clone()));
        let processor = BatchProcessor::new(
            config.clone(),
            Arc::clone(&store),
            fetcher,
            sink,
        );

        Ok(Self {
            config,
            store,
            processor,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let session = self.build_session()?;

        if session.archives.is_empty() {
            warn!("⚠️ 输入目录没有找到 ZIP 压缩包，程序结束");
            return Ok(());
        }

        logging::log_archives_loaded(session.archives.len());
        self.store.set(session);

        let outcome = self.processor.process_all(LOCAL_USER_ID).await?;
        for report in &outcome.reports {
            info!("{}", report);
        }

        Ok(())
    }

    /// 从配置组装本地会话
    fn build_session(&self) -> Result<Session> {
        let mode = Mode::parse(&self.config.mode)
            .ok_or_else(|| anyhow!("未知模式: {}", self.config.mode))?;

        let mut session = Session::new(LOCAL_USER_ID, mode);
        if !self.config.params_text.trim().is_empty() || mode.requires_gate() {
            let parsed = param_parser::parse(mode, &self.config.params_text)?;
            session.params = parsed.params;
            session.gate = parsed.gate;
        }

        let mut entries: Vec<_> = std::fs::read_dir(&self.config.input_folder)
            .map_err(|e| anyhow!("读取输入目录 {} 失败: {}", self.config.input_folder, e))?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .map(|ext| ext.to_string_lossy().to_lowercase() == "zip")
                    .unwrap_or(false)
            })
            .collect();
        entries.sort();

        for path in entries {
            let file_name = path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            session.push_archive(ArchiveRef::new(path.to_string_lossy(), file_name));
        }

        Ok(session)
    }
}
