//! 每个模式的重写配置
//!
//! 落地页和预落地页两条分支不再复制代码，而是由一份小配置驱动
//! 同一条流水线：拒绝列表变体、锚点策略、是否处理表单等。

use crate::models::Mode;

/// 脚本拒绝列表变体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyVariant {
    /// 落地页 / prokla 家族
    Landing,
    /// 预落地页家族
    Prelanding,
}

/// 锚点处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorStrategy {
    /// 把指向外部 / 占位符 / 根路径 / 片段的锚点清空
    Reset,
    /// 把所有锚点改写为 offer 占位符
    Offer,
}

/// 注入变体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    /// 电话控件 + 校验脚本引用
    Landing,
    /// 内联滚动跟踪重定向脚本 + 兼容脚本
    Prelanding,
}

/// 单个模式的流水线配置
#[derive(Debug, Clone, Copy)]
pub struct ModeProfile {
    pub deny: DenyVariant,
    pub anchors: AnchorStrategy,
    pub normalize_forms: bool,
    pub purge_loader: bool,
    pub strip_comments: bool,
    pub inject: Injection,
}

/// 模式 → 配置
///
/// `edit_order` 不重写文档，没有配置。
pub fn profile_for(mode: Mode) -> Option<ModeProfile> {
    match mode {
        Mode::Landing | Mode::ProklaLand | Mode::LandForm => Some(ModeProfile {
            deny: DenyVariant::Landing,
            anchors: AnchorStrategy::Reset,
            normalize_forms: true,
            purge_loader: true,
            strip_comments: false,
            inject: Injection::Landing,
        }),
        Mode::Prelanding | Mode::LandToPreland => Some(ModeProfile {
            deny: DenyVariant::Prelanding,
            anchors: AnchorStrategy::Offer,
            normalize_forms: false,
            purge_loader: false,
            strip_comments: true,
            inject: Injection::Prelanding,
        }),
        Mode::EditOrder => None,
    }
}
