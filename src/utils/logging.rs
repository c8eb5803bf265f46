/// 日志工具模块
///
/// 提供日志初始化和批处理过程中的格式化输出
use tracing::info;

use crate::config::Config;

/// 初始化 tracing 订阅器（重复调用安全）
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 落地页批量转换模式");
    info!("📂 输入目录: {}", config.input_folder);
    info!("📂 输出目录: {}", config.output_folder);
    info!("🔧 转换模式: {}", config.mode);
    info!("{}", "=".repeat(60));
}

/// 记录找到的压缩包数量
pub fn log_archives_loaded(total: usize) {
    info!("✓ 找到 {} 个待处理的压缩包", total);
    info!("💡 按提交顺序逐个处理，单个失败不影响其余\n");
}

/// 记录单个压缩包开始处理
pub fn log_batch_item(index: usize, total: usize, file_name: &str) {
    info!("\n{}", "─".repeat(60));
    info!("📄 [{}/{}] {}", index, total, file_name);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(succeeded: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 批处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 成功: {}/{}", succeeded, total);
    info!("❌ 失败: {}", total - succeeded);
    info!("{}", "=".repeat(60));
}
