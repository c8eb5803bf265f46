//! 脚本清理规则表
//!
//! 一张显式有序的 (谓词, 动作) 表，而不是散落的条件判断：
//! 按顺序测试每条规则，第一条命中的规则删除该脚本元素，
//! 没有命中则保留。落地页家族和预落地页家族的表略有差异。

use crate::rewrite::profile::DenyVariant;

/// 被测试的脚本元素
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    /// src 属性（无则为 None）
    pub src: Option<&'a str>,
    /// 内联文本
    pub inline: &'a str,
}

impl<'a> ScriptContext<'a> {
    /// src 或内联文本任一包含给定签名
    fn mentions(&self, needle: &str) -> bool {
        self.src.map(|s| s.contains(needle)).unwrap_or(false) || self.inline.contains(needle)
    }

    fn src_contains(&self, needle: &str) -> bool {
        self.src.map(|s| s.contains(needle)).unwrap_or(false)
    }
}

/// 规则适用范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Both,
    LandingOnly,
    PrelandingOnly,
}

impl RuleScope {
    fn applies(&self, variant: DenyVariant) -> bool {
        match self {
            RuleScope::Both => true,
            RuleScope::LandingOnly => variant == DenyVariant::Landing,
            RuleScope::PrelandingOnly => variant == DenyVariant::Prelanding,
        }
    }
}

/// 单条删除规则
pub struct ScriptRule {
    pub name: &'static str,
    pub scope: RuleScope,
    pub matches: fn(&ScriptContext) -> bool,
}

/// 有序规则表，第一条命中即删除
pub static SCRIPT_RULES: &[ScriptRule] = &[
    ScriptRule {
        name: "analytics",
        scope: RuleScope::Both,
        matches: |ctx| {
            ctx.mentions("googletagmanager.com")
                || ctx.mentions("google-analytics.com")
                || ctx.mentions("gtag(")
        },
    },
    ScriptRule {
        name: "regional-analytics",
        scope: RuleScope::Both,
        matches: |ctx| ctx.mentions("mc.yandex") || ctx.inline.contains("ym("),
    },
    ScriptRule {
        name: "page-visit-telemetry",
        scope: RuleScope::PrelandingOnly,
        matches: |ctx| ctx.src_contains("visit.js") || ctx.inline.contains("sendVisit("),
    },
    ScriptRule {
        name: "scroll-tracking",
        scope: RuleScope::PrelandingOnly,
        matches: |ctx| ctx.src_contains("scroll-depth") || ctx.inline.contains("scrollDepth"),
    },
    ScriptRule {
        name: "phone-widget-init",
        scope: RuleScope::Both,
        matches: |ctx| ctx.mentions("intlTelInput") || ctx.mentions("intl-tel-input"),
    },
    ScriptRule {
        name: "backlink-redirect",
        scope: RuleScope::Both,
        matches: |ctx| {
            ctx.src_contains("back.js")
                || ctx.inline.contains("onpopstate")
                || ctx.inline.contains("history.pushState")
        },
    },
    ScriptRule {
        name: "popup-vendors",
        scope: RuleScope::LandingOnly,
        matches: |ctx| {
            ctx.src_contains("popunder")
                || ctx.src_contains("luckyads")
                || ctx.src_contains("propellerads")
        },
    },
    ScriptRule {
        name: "injected-validation",
        scope: RuleScope::Both,
        matches: |ctx| ctx.src_contains("form-scripts.js"),
    },
    ScriptRule {
        name: "bare-jquery-cdn",
        scope: RuleScope::Both,
        matches: |ctx| {
            ctx.src_contains("code.jquery.com")
                || ctx.src_contains("ajax.googleapis.com/ajax/libs/jquery")
        },
    },
    ScriptRule {
        name: "inline-tracking-params",
        scope: RuleScope::Both,
        matches: |ctx| {
            ctx.src.is_none()
                && (ctx.inline.contains("utm_source")
                    || ctx.inline.contains("sub_id")
                    || ctx.inline.contains("clickid"))
        },
    },
];

/// 按顺序找第一条命中的规则，返回其名字
pub fn removal_rule(variant: DenyVariant, ctx: &ScriptContext) -> Option<&'static str> {
    SCRIPT_RULES
        .iter()
        .filter(|rule| rule.scope.applies(variant))
        .find(|rule| (rule.matches)(ctx))
        .map(|rule| rule.name)
}
