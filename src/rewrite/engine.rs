//! 文档重写引擎
//!
//! 对单个 HTML 文档按固定顺序执行各个处理段：
//! 样式表清理 → 脚本清理 → noscript 清理 → 加载指示器清理 →
//! 表单归一化 → 锚点处理 → head/body 注入 → 注释清理 → 闸门守卫。
//! 哪些段生效由 `ModeProfile` 决定，不再按模式复制分支代码。

use kuchikiki::traits::TendrilSink;
use kuchikiki::NodeRef;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::GatePair;
use crate::rewrite::dom::{append_all, parse_snippet, prepend_all};
use crate::rewrite::forms;
use crate::rewrite::profile::{AnchorStrategy, DenyVariant, Injection, ModeProfile};
use crate::rewrite::rules::{removal_rule, ScriptContext};
use crate::services::templates;

/// offer 占位符，下游服务端替换
pub const OFFER_PLACEHOLDER: &str = "{offer}";

/// 落地页 head 注入片段：远程电话控件 + 共享的加载/校验样式
const LANDING_HEAD_SNIPPET: &str = concat!(
    r#"<script src="https://cdnjs.cloudflare.com/ajax/libs/intl-tel-input/17.0.19/js/intlTelInput.min.js"></script>"#,
    r#"<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/intl-tel-input/17.0.19/css/intlTelInput.css">"#,
    "<style>",
    ".field-valid{border-color:#2e7d32 !important}",
    ".field-invalid{border-color:#c62828 !important}",
    ".error-message{color:#c62828;font-size:12px;display:block}",
    ".loader{position:fixed;top:50%;left:50%;transform:translate(-50%,-50%);z-index:9999}",
    ".loader-spinner{width:48px;height:48px;border:5px solid #ccc;border-top-color:#333;border-radius:50%;animation:spin 1s linear infinite}",
    "@keyframes spin{to{transform:rotate(360deg)}}",
    ".dup-modal{position:fixed;top:0;left:0;right:0;bottom:0;background:rgba(0,0,0,.6);z-index:10000}",
    ".dup-modal-box{background:#fff;max-width:320px;margin:40vh auto 0;padding:20px;border-radius:6px;text-align:center}",
    "</style>",
);

/// 落地页 body 末尾注入片段：电话控件 + 校验脚本引用
const LANDING_BODY_SNIPPET: &str = concat!(
    r#"<script src="https://cdnjs.cloudflare.com/ajax/libs/intl-tel-input/17.0.19/js/intlTelInput.min.js"></script>"#,
    r#"<script src="form-scripts.js"></script>"#,
);

/// 预落地页 head 注入的兼容脚本
const PRELAND_HEAD_SNIPPET: &str =
    r#"<script src="https://cdnjs.cloudflare.com/ajax/libs/babel-polyfill/7.12.1/polyfill.min.js"></script>"#;

/// 预落地页内联脚本：锚点域名改写 + 滚动深度跟踪重定向
const PRELAND_BODY_SCRIPT: &str = r#"<script>
(function () {
  'use strict';
  var OFFER = '{offer}';
  var maxScroll = 0;

  window.addEventListener('scroll', function () {
    var height = document.documentElement.scrollHeight - window.innerHeight;
    if (height <= 0) { return; }
    var depth = Math.round(window.pageYOffset / height * 100);
    if (depth > maxScroll) { maxScroll = depth; }
  });

  document.addEventListener('click', function (e) {
    var target = e.target;
    while (target && target.tagName !== 'A') { target = target.parentElement; }
    if (!target) { return; }
    e.preventDefault();
    var sep = OFFER.indexOf('?') === -1 ? '?' : '&';
    window.location.href = OFFER + sep + 'scroll=' + maxScroll;
  });
})();
</script>"#;

/// 重写结果
#[derive(Debug)]
pub struct RewriteOutcome {
    /// 序列化后的文档
    pub html: String,
    /// 被清理的本地样式表资源（相对路径），由上层删除文件
    pub purged_assets: Vec<String>,
}

/// 重写单个 HTML 文档
pub fn rewrite_document(
    html: &str,
    profile: &ModeProfile,
    gate: Option<&GatePair>,
    fallback_url: &str,
) -> AppResult<RewriteOutcome> {
    let document = kuchikiki::parse_html().one(html);
    let mut purged_assets = Vec::new();

    purge_widget_stylesheets(&document, &mut purged_assets);
    purge_scripts(&document, profile.deny);
    purge_noscript(&document);
    if profile.purge_loader {
        purge_loader(&document);
    }
    if profile.normalize_forms {
        forms::normalize_forms(&document);
    }
    normalize_anchors(&document, profile.anchors);
    inject(&document, profile.inject)?;
    if profile.strip_comments {
        strip_comments(&document);
    }

    let mut out = Vec::new();
    document
        .serialize(&mut out)
        .map_err(|e| AppError::Other(format!("文档序列化失败: {}", e)))?;
    let mut serialized = String::from_utf8_lossy(&out).into_owned();

    // 闸门守卫放在文档声明之前（或无声明时放在最前面）
    if let Some(gate) = gate {
        if !gate.is_disabled() {
            let guard = templates::gate_guard(&gate.key, &gate.value, fallback_url);
            serialized = format!("{}\n{}", guard, serialized);
        }
    }

    Ok(RewriteOutcome {
        html: serialized,
        purged_assets,
    })
}

/// (a) 电话控件样式表清理；本地资源记下来等上层删除文件
fn purge_widget_stylesheets(document: &NodeRef, purged_assets: &mut Vec<String>) {
    let links: Vec<NodeRef> = match document.select("link") {
        Ok(matches) => matches.map(|m| m.as_node().clone()).collect(),
        Err(_) => Vec::new(),
    };
    for link in links {
        let href = link
            .as_element()
            .and_then(|el| el.attributes.borrow().get("href").map(|s| s.to_string()));
        let Some(href) = href else { continue };
        if !(href.contains("intlTelInput") || href.contains("intl-tel-input")) {
            continue;
        }
        if !is_remote(&href) {
            purged_assets.push(href);
        }
        link.detach();
    }
}

/// (b) 按有序规则表清理脚本
fn purge_scripts(document: &NodeRef, variant: DenyVariant) {
    let scripts: Vec<NodeRef> = match document.select("script") {
        Ok(matches) => matches.map(|m| m.as_node().clone()).collect(),
        Err(_) => Vec::new(),
    };
    for script in scripts {
        let src = script
            .as_element()
            .and_then(|el| el.attributes.borrow().get("src").map(|s| s.to_string()));
        let inline = script.text_contents();
        let ctx = ScriptContext {
            src: src.as_deref(),
            inline: &inline,
        };
        if let Some(rule) = removal_rule(variant, &ctx) {
            debug!("删除脚本（规则: {}）", rule);
            script.detach();
        }
    }
}

/// (c) noscript 清理
fn purge_noscript(document: &NodeRef) {
    let nodes: Vec<NodeRef> = match document.select("noscript") {
        Ok(matches) => matches.map(|m| m.as_node().clone()).collect(),
        Err(_) => Vec::new(),
    };
    for node in nodes {
        node.detach();
    }
}

/// (d) 旧的加载指示器清理（之后会重新注入）
fn purge_loader(document: &NodeRef) {
    let nodes: Vec<NodeRef> = match document.select("#preloader, .loader") {
        Ok(matches) => matches.map(|m| m.as_node().clone()).collect(),
        Err(_) => Vec::new(),
    };
    for node in nodes {
        node.detach();
    }
}

/// (f) 锚点处理
fn normalize_anchors(document: &NodeRef, strategy: AnchorStrategy) {
    let anchors: Vec<NodeRef> = match document.select("a") {
        Ok(matches) => matches.map(|m| m.as_node().clone()).collect(),
        Err(_) => Vec::new(),
    };
    for anchor in anchors {
        let Some(el) = anchor.as_element() else { continue };
        let mut attrs = el.attributes.borrow_mut();
        match strategy {
            AnchorStrategy::Reset => {
                let Some(href) = attrs.get("href").map(|s| s.to_string()) else {
                    continue;
                };
                if should_reset_href(&href) {
                    attrs.insert("href", String::new());
                }
            }
            AnchorStrategy::Offer => {
                attrs.insert("href", OFFER_PLACEHOLDER.to_string());
            }
        }
    }
}

/// 需要清空的锚点目标：offer 占位符、#、/、外部协议、根路径、片段
fn should_reset_href(href: &str) -> bool {
    href == OFFER_PLACEHOLDER
        || href == "#"
        || href == "/"
        || href.starts_with("http://")
        || href.starts_with("https://")
        || href.starts_with("//")
        || href.starts_with('/')
        || href.starts_with('#')
}

/// (g) head/body 注入
fn inject(document: &NodeRef, injection: Injection) -> AppResult<()> {
    let head = document
        .select_first("head")
        .map_err(|_| AppError::Other("文档缺少 head 元素".to_string()))?
        .as_node()
        .clone();
    let body = document
        .select_first("body")
        .map_err(|_| AppError::Other("文档缺少 body 元素".to_string()))?
        .as_node()
        .clone();

    match injection {
        Injection::Landing => {
            prepend_all(&head, parse_snippet(LANDING_HEAD_SNIPPET));
            append_all(&body, parse_snippet(LANDING_BODY_SNIPPET));
        }
        Injection::Prelanding => {
            append_all(&head, parse_snippet(PRELAND_HEAD_SNIPPET));
            append_all(&body, parse_snippet(PRELAND_BODY_SCRIPT));
        }
    }
    Ok(())
}

/// (h) 注释清理
fn strip_comments(document: &NodeRef) {
    let comments: Vec<NodeRef> = document
        .inclusive_descendants()
        .filter(|node| node.as_comment().is_some())
        .collect();
    for comment in comments {
        comment.detach();
    }
}

fn is_remote(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://") || href.starts_with("//")
}
