//! 文档重写引擎
//!
//! 对包内每个 HTML 文档应用一套有序的、按模式参数化的规则：
//! - `profile` - 每个模式的流水线配置（拒绝列表变体、锚点策略等）
//! - `rules` - 显式有序的脚本清理规则表
//! - `forms` - 表单归一化和字段别名表
//! - `engine` - 把各处理段按固定顺序串起来
//! - `dom` - 文档树小工具

pub mod dom;
pub mod engine;
pub mod forms;
pub mod profile;
pub mod rules;

pub use engine::{rewrite_document, RewriteOutcome};
pub use profile::{profile_for, ModeProfile};
