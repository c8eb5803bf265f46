use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 参数文本格式错误
    Format(FormatError),
    /// 压缩包结构错误
    Archive(ArchiveError),
    /// 获取压缩包字节失败
    Fetch(FetchError),
    /// 文件系统操作错误
    Fs(FsError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Format(e) => write!(f, "参数格式错误: {}", e),
            AppError::Archive(e) => write!(f, "压缩包错误: {}", e),
            AppError::Fetch(e) => write!(f, "下载错误: {}", e),
            AppError::Fs(e) => write!(f, "文件错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Format(e) => Some(e),
            AppError::Archive(e) => Some(e),
            AppError::Fetch(e) => Some(e),
            AppError::Fs(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 参数文本格式错误
#[derive(Debug)]
pub enum FormatError {
    /// 带闸门的模式要求第一行严格为 key=value
    BadGateLine {
        line: String,
    },
    /// 参数文本为空
    EmptyInput,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::BadGateLine { line } => {
                write!(f, "第一行必须严格为 key=value，当前为: '{}'", line)
            }
            FormatError::EmptyInput => write!(f, "参数文本不能为空"),
        }
    }
}

impl std::error::Error for FormatError {}

/// 压缩包结构错误
#[derive(Debug)]
pub enum ArchiveError {
    /// 压缩包没有任何条目
    Empty,
    /// 无法确定根条目名称
    MissingRootEntry,
    /// 压缩包本身损坏或格式不支持
    Malformed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::Empty => write!(f, "压缩包为空（没有任何条目）"),
            ArchiveError::MissingRootEntry => write!(f, "无法从第一个条目确定根目录名"),
            ArchiveError::Malformed { source } => write!(f, "压缩包损坏: {}", source),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveError::Malformed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 获取压缩包字节失败
#[derive(Debug)]
pub enum FetchError {
    /// 文件超出平台大小限制
    SizeExceeded {
        size: u64,
        limit: u64,
    },
    /// 其他获取失败
    Failed {
        reference: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::SizeExceeded { size, limit } => {
                write!(f, "文件大小 {} 字节超出限制 {} 字节", size, limit)
            }
            FetchError::Failed { reference, source } => {
                write!(f, "获取 '{}' 失败: {}", reference, source)
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Failed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 文件系统操作错误
#[derive(Debug)]
pub enum FsError {
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建目录失败
    CreateDirFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 删除文件或目录失败
    RemoveFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FsError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FsError::CreateDirFailed { path, source } => {
                write!(f, "创建目录失败 ({}): {}", path, source)
            }
            FsError::RemoveFailed { path, source } => {
                write!(f, "删除失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FsError::ReadFailed { source, .. }
            | FsError::WriteFailed { source, .. }
            | FsError::CreateDirFailed { source, .. }
            | FsError::RemoveFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

// ========== 从常见错误类型转换 ==========

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Archive(ArchiveError::Malformed {
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Fs(FsError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Fs(FsError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Fs(FsError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建获取失败错误
    pub fn fetch_failed(
        reference: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Fetch(FetchError::Failed {
            reference: reference.into(),
            source: Box::new(source),
        })
    }

    /// 是否为"超出大小限制"失败（需要单独的用户提示文案）
    pub fn is_size_exceeded(&self) -> bool {
        matches!(self, AppError::Fetch(FetchError::SizeExceeded { .. }))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
