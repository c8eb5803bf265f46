//! 压缩包解包 / 重打包服务
//!
//! `extract` 把 ZIP 字节物化到一个独立的工作目录，`repackage` 反向操作。
//! 工作目录使用 uuid 命名，由 `WorkDir` 守卫在任何退出路径上删除。

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{AppError, AppResult, ArchiveError, FsError};

/// 单个压缩包独占的工作目录
///
/// drop 时尽力删除整个目录树，保证成功、跳过、出错三种退出路径
/// 都不会留下临时文件。
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    /// 在 `temp_root` 下创建一个 uuid 命名的工作目录
    pub fn create(temp_root: &str) -> AppResult<Self> {
        let path = Path::new(temp_root).join(format!("landing_{}", Uuid::new_v4()));
        fs::create_dir_all(&path).map_err(|e| {
            AppError::Fs(FsError::CreateDirFailed {
                path: path.to_string_lossy().into_owned(),
                source: Box::new(e),
            })
        })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!("⚠️ 清理工作目录失败 ({}): {}", self.path.display(), e);
        }
    }
}

/// 解包 ZIP 字节到工作目录
///
/// # 返回
/// 工作目录守卫和根条目名（第一个条目的顶层路径段）
///
/// # 错误
/// - 零条目 ⇒ `ArchiveError::Empty`
/// - 根条目名为空 ⇒ `ArchiveError::MissingRootEntry`
pub fn extract(bytes: &[u8], temp_root: &str) -> AppResult<(WorkDir, String)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    if archive.is_empty() {
        return Err(AppError::Archive(ArchiveError::Empty));
    }

    let root_entry = {
        let first = archive.by_index(0)?;
        root_segment(first.name())
            .ok_or(AppError::Archive(ArchiveError::MissingRootEntry))?
    };

    let workdir = WorkDir::create(temp_root)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        // 路径穿越等不安全条目直接跳过
        let Some(rel) = entry.enclosed_name() else {
            warn!("⚠️ 跳过不安全的压缩包条目: {}", entry.name());
            continue;
        };
        let target = workdir.path().join(&rel);
        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| {
                AppError::Fs(FsError::CreateDirFailed {
                    path: target.to_string_lossy().into_owned(),
                    source: Box::new(e),
                })
            })?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Fs(FsError::CreateDirFailed {
                    path: parent.to_string_lossy().into_owned(),
                    source: Box::new(e),
                })
            })?;
        }
        let mut buf = Vec::new();
        entry
            .read_to_end(&mut buf)
            .map_err(|e| AppError::read_failed(target.to_string_lossy(), e))?;
        fs::write(&target, &buf)
            .map_err(|e| AppError::write_failed(target.to_string_lossy(), e))?;
    }

    Ok((workdir, root_entry))
}

/// 把工作目录重新打包为 ZIP 字节，保留完整的相对路径树
///
/// 空目录不保留（所有文件条目都保留）。
pub fn repackage(dir: &Path) -> AppResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut files = Vec::new();
    collect_files(dir, dir, &mut files)?;
    files.sort();

    for rel in &files {
        let abs = dir.join(rel);
        let bytes =
            fs::read(&abs).map_err(|e| AppError::read_failed(abs.to_string_lossy(), e))?;
        // ZIP 条目统一使用正斜杠
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        writer.start_file(name, options)?;
        writer
            .write_all(&bytes)
            .map_err(|e| AppError::write_failed(rel.to_string_lossy(), e))?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

/// 第一个条目的顶层路径段
fn root_segment(entry_name: &str) -> Option<String> {
    entry_name
        .split('/')
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// 递归收集相对文件路径
fn collect_files(base: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> AppResult<()> {
    let entries =
        fs::read_dir(dir).map_err(|e| AppError::read_failed(dir.to_string_lossy(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| AppError::read_failed(dir.to_string_lossy(), e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(base, &path, out)?;
        } else if let Ok(rel) = path.strip_prefix(base) {
            out.push(rel.to_path_buf());
        }
    }
    Ok(())
}
