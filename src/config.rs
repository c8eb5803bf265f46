/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 本地批处理模式扫描的压缩包目录
    pub input_folder: String,
    /// 转换结果输出目录
    pub output_folder: String,
    /// 本地批处理模式使用的转换模式
    pub mode: String,
    /// 本地批处理模式使用的原始参数文本（key=value 行）
    pub params_text: String,
    /// 工作目录的根（每个压缩包使用独立的 uuid 子目录）
    pub temp_root: String,
    /// 压缩包大小上限（字节）
    pub max_archive_bytes: u64,
    /// 闸门不匹配时的重定向地址
    pub fallback_url: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_folder: "input_zips".to_string(),
            output_folder: "output_zips".to_string(),
            mode: "landing".to_string(),
            params_text: String::new(),
            temp_root: std::env::temp_dir().to_string_lossy().into_owned(),
            max_archive_bytes: 20 * 1024 * 1024,
            fallback_url: "https://www.google.com".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            input_folder: std::env::var("INPUT_FOLDER").unwrap_or(default.input_folder),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(default.output_folder),
            mode: std::env::var("TRANSFORM_MODE").unwrap_or(default.mode),
            params_text: std::env::var("TRANSFORM_PARAMS").unwrap_or(default.params_text),
            temp_root: std::env::var("TEMP_ROOT").unwrap_or(default.temp_root),
            max_archive_bytes: std::env::var("MAX_ARCHIVE_BYTES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_archive_bytes),
            fallback_url: std::env::var("FALLBACK_URL").unwrap_or(default.fallback_url),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }
}
