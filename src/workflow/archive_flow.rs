//! 单个压缩包的处理流程 - 流程层
//!
//! 核心职责：定义"一个压缩包"的完整处理流程
//!
//! 流程顺序：
//! 1. 获取字节 → 解包到工作目录
//! 2. 按模式执行包级处理（清理旧产物、逐个重写文档、写入新模板、重命名 index）
//! 3. 重打包 → 投递
//!
//! 工作目录由 `WorkDir` 守卫，任何一步失败都不会留下临时文件。

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{ArchiveFetcher, BundleSink};
use crate::models::{ArchiveRef, Mode, Session};
use crate::rewrite::engine::rewrite_document;
use crate::rewrite::profile::profile_for;
use crate::services::{archive, templates};

/// 落地页家族转换时要删除的旧产物
const STALE_BUNDLE_FILES: &[&str] = &["order.php", "form-scripts.js"];

/// 单个压缩包的处理流程
///
/// - 不持有任何资源（fetcher / sink 由编排层传入）
/// - 只依赖业务能力（services / rewrite）
pub struct ArchiveFlow {
    config: Config,
}

impl ArchiveFlow {
    /// 创建新的处理流程
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// 处理一个压缩包，返回投递的输出文件名
    pub async fn run(
        &self,
        fetcher: &dyn ArchiveFetcher,
        sink: &dyn BundleSink,
        session: &Session,
        archive_ref: &ArchiveRef,
    ) -> AppResult<String> {
        info!("📦 正在处理: {}", archive_ref.file_name);

        let bytes = fetcher.fetch(&archive_ref.reference).await?;
        let (workdir, root_entry) = archive::extract(&bytes, &self.config.temp_root)?;
        let bundle_root = bundle_root(workdir.path(), &root_entry);

        self.transform_bundle(session, workdir.path(), &bundle_root)?;

        let repacked = archive::repackage(workdir.path())?;
        let output_name = output_name(session.mode, &root_entry);
        sink.deliver(&output_name, &repacked).await?;

        info!("✓ 完成: {} → {}", archive_ref.file_name, output_name);
        Ok(output_name)
    }

    /// 按模式执行包级处理
    ///
    /// 文档重写覆盖整个工作树（多个顶层目录的压缩包也全部处理）；
    /// 旧产物清理、新模板写入和 index 重命名只发生在包根。
    fn transform_bundle(
        &self,
        session: &Session,
        work_root: &Path,
        bundle_root: &Path,
    ) -> AppResult<()> {
        // edit_order 只替换 order.php，不碰文档
        if session.mode == Mode::EditOrder {
            let order = templates::order_template(&session.params);
            let target = bundle_root.join("order.php");
            std::fs::write(&target, order)
                .map_err(|e| AppError::write_failed(target.to_string_lossy(), e))?;
            return Ok(());
        }

        let Some(profile) = profile_for(session.mode) else {
            return Err(AppError::Other(format!(
                "模式 {} 没有文档重写配置",
                session.mode
            )));
        };

        if session.mode.is_landing_family() {
            purge_stale_bundle_files(bundle_root)?;
        }

        for doc_path in collect_documents(work_root)? {
            let html = std::fs::read_to_string(&doc_path)
                .map_err(|e| AppError::read_failed(doc_path.to_string_lossy(), e))?;
            let outcome = rewrite_document(
                &html,
                &profile,
                session.gate.as_ref(),
                &self.config.fallback_url,
            )?;
            std::fs::write(&doc_path, outcome.html)
                .map_err(|e| AppError::write_failed(doc_path.to_string_lossy(), e))?;

            // 被清理的本地样式表资源相对于文档所在目录
            if let Some(doc_dir) = doc_path.parent() {
                for asset in &outcome.purged_assets {
                    let asset_path = doc_dir.join(asset);
                    if asset_path.exists() {
                        debug!("删除控件样式资源: {}", asset_path.display());
                        let _ = std::fs::remove_file(&asset_path);
                    }
                }
            }
        }

        if session.mode.is_landing_family() {
            let country = session
                .params
                .get("country")
                .map(String::as_str)
                .unwrap_or("");
            let script_path = bundle_root.join("form-scripts.js");
            std::fs::write(&script_path, templates::validation_script(country))
                .map_err(|e| AppError::write_failed(script_path.to_string_lossy(), e))?;

            let order_path = bundle_root.join("order.php");
            std::fs::write(&order_path, templates::order_template(&session.params))
                .map_err(|e| AppError::write_failed(order_path.to_string_lossy(), e))?;

            rename_index(bundle_root)?;
        }

        Ok(())
    }
}

/// 根条目是目录时以它为包根，扁平压缩包以工作目录为包根
fn bundle_root(workdir: &Path, root_entry: &str) -> PathBuf {
    let candidate = workdir.join(root_entry);
    if candidate.is_dir() {
        candidate
    } else {
        workdir.to_path_buf()
    }
}

/// 输出文件名：{模式前缀}_{根条目名}.zip
///
/// 扁平压缩包的根条目是文件名，去掉扩展名再拼前缀。
fn output_name(mode: Mode, root_entry: &str) -> String {
    let stem = Path::new(root_entry)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| root_entry.to_string());
    format!("{}_{}.zip", mode.prefix(), stem)
}

/// 删除旧的 order.php / form-scripts.js / lead_*.txt
fn purge_stale_bundle_files(bundle_root: &Path) -> AppResult<()> {
    for name in STALE_BUNDLE_FILES {
        let path = bundle_root.join(name);
        if path.exists() {
            let _ = std::fs::remove_file(&path);
        }
    }
    let entries = std::fs::read_dir(bundle_root)
        .map_err(|e| AppError::read_failed(bundle_root.to_string_lossy(), e))?;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("lead_") && name.ends_with(".txt") {
            let _ = std::fs::remove_file(entry.path());
        }
    }
    Ok(())
}

/// 递归收集包内所有 HTML 文档
fn collect_documents(dir: &Path) -> AppResult<Vec<PathBuf>> {
    let mut docs = Vec::new();
    collect_documents_into(dir, &mut docs)?;
    docs.sort();
    Ok(docs)
}

fn collect_documents_into(dir: &Path, out: &mut Vec<PathBuf>) -> AppResult<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| AppError::read_failed(dir.to_string_lossy(), e))?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_documents_into(&path, out)?;
            continue;
        }
        let is_doc = path
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                ext == "html" || ext == "htm"
            })
            .unwrap_or(false);
        if is_doc {
            out.push(path);
        }
    }
    Ok(())
}

/// 落地页家族：index.html / index.htm → index.php
fn rename_index(bundle_root: &Path) -> AppResult<()> {
    for name in ["index.html", "index.htm"] {
        let from = bundle_root.join(name);
        if from.exists() {
            let to = bundle_root.join("index.php");
            std::fs::rename(&from, &to)
                .map_err(|e| AppError::write_failed(to.to_string_lossy(), e))?;
            return Ok(());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_name_for_directory_root() {
        assert_eq!(output_name(Mode::Landing, "mysite"), "Land_mysite.zip");
        assert_eq!(output_name(Mode::Prelanding, "promo"), "Preland_promo.zip");
        assert_eq!(
            output_name(Mode::ProklaLand, "mysite"),
            "Proklaland_mysite.zip"
        );
        assert_eq!(output_name(Mode::EditOrder, "mysite"), "Result_mysite.zip");
    }

    #[test]
    fn test_output_name_strips_flat_root_extension() {
        assert_eq!(output_name(Mode::Landing, "index.html"), "Land_index.zip");
    }
}
