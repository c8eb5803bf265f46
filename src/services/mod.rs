//! 业务能力层（Services）
//!
//! 描述"我能做什么"，每个服务只负责一种能力：
//! - `param_parser` - 参数文本规范化
//! - `session_store` - 会话仓库
//! - `archive` - 压缩包解包 / 重打包
//! - `templates` - 校验脚本 / order 模板 / 闸门守卫生成

pub mod archive;
pub mod param_parser;
pub mod session_store;
pub mod templates;

pub use session_store::{MemorySessionStore, SessionStore};
