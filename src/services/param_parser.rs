//! 参数解析服务
//!
//! 把用户发送的原始 `key=value` 文本规范化为参数表。
//! 支持两种书写方式：多行 `key=value`，或单行用 `&` 连接的查询串。
//!
//! 带闸门的模式（prokla_land / land_to_preland）要求第一行严格为
//! `key=value`，该行被消费为闸门键值对，不进入参数表；
//! 校验失败返回格式错误，不修改任何会话状态。

use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{AppError, AppResult, FormatError};
use crate::models::{GatePair, Mode};

/// 解析结果：规范化参数表 + 可选的闸门键值对
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedParams {
    pub params: BTreeMap<String, String>,
    pub gate: Option<GatePair>,
}

/// 闸门行的严格格式：key=value，无任何空白
fn strict_gate_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+=[^\s=]+$").unwrap())
}

/// metka 规范化：<字母><数字> 形式
fn metka_letter_digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z])(\d+)$").unwrap())
}

/// metka 规范化：<数字><字母> 形式
fn metka_digits_letter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)([A-Za-z])$").unwrap())
}

/// 解析原始参数文本
///
/// # 参数
/// - `mode`: 当前会话模式，决定是否要求闸门行
/// - `raw`: 用户发送的原始文本
///
/// # 返回
/// 规范化后的参数表和可选闸门；格式错误时返回 `FormatError`
pub fn parse(mode: Mode, raw: &str) -> AppResult<ParsedParams> {
    // 只修剪尾部换行；开头的空行会让闸门行校验按约定失败
    let raw = raw.trim_end_matches(|c| c == '\r' || c == '\n');
    if raw.trim().is_empty() {
        return Err(AppError::Format(FormatError::EmptyInput));
    }

    let mut lines: Vec<&str> = split_entries(raw);
    let mut gate = None;

    if mode.requires_gate() {
        // 第一行必须严格为 key=value，不允许空白差异
        let first = lines.first().copied().unwrap_or("");
        if !strict_gate_re().is_match(first) {
            return Err(AppError::Format(FormatError::BadGateLine {
                line: first.to_string(),
            }));
        }
        let (key, value) = first.split_once('=').unwrap_or(("", ""));
        gate = Some(GatePair::new(key, value));
        lines.remove(0);
    }

    let mut params = BTreeMap::new();
    for line in lines {
        // 没有 '=' 的行静默跳过
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_string();
        if key.is_empty() {
            continue;
        }
        let value = percent_decode_str(value.trim())
            .decode_utf8_lossy()
            .into_owned();
        params.insert(key, value);
    }

    canonicalize(&mut params);

    Ok(ParsedParams { params, gate })
}

/// 把参数表序列化回 `key=value` 行（按键排序，解析幂等）
pub fn serialize(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 切分条目：单行含 '&' 时按查询串处理，否则按行处理
fn split_entries(raw: &str) -> Vec<&str> {
    let lines: Vec<&str> = raw.lines().collect();
    if lines.len() == 1 && lines[0].contains('&') {
        lines[0].split('&').collect()
    } else {
        lines
    }
}

/// 模式相关的值规范化
///
/// - `country` / `lang` 统一大写
/// - `metka`：<字母><数字> 或 <数字><字母> 归一为 <数字><大写字母>，
///   其他形式原样保留
fn canonicalize(params: &mut BTreeMap<String, String>) {
    for key in ["country", "lang"] {
        if let Some(value) = params.get_mut(key) {
            *value = value.to_uppercase();
        }
    }
    if let Some(metka) = params.get_mut("metka") {
        *metka = canonicalize_metka(metka);
    }
}

/// metka 规范化（公开以便单元测试和重用）
pub fn canonicalize_metka(raw: &str) -> String {
    if let Some(caps) = metka_letter_digits_re().captures(raw) {
        return format!("{}{}", &caps[2], caps[1].to_uppercase());
    }
    if let Some(caps) = metka_digits_letter_re().captures(raw) {
        return format!("{}{}", &caps[1], caps[2].to_uppercase());
    }
    raw.to_string()
}
