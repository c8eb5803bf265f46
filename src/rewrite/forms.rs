//! 表单归一化
//!
//! 落地页家族对每个"收集线索"的表单做统一改写：
//! 强制 POST、固定 id、清理旧的隐藏字段和装饰元素、
//! 预置 subid / ip / 滚动位置三个隐藏字段，
//! 并通过字段别名表把历史字段名归一为四个规范名。
//!
//! "非线索"表单（搜索框、订阅框之类）整体跳过：
//! 恰好一个自由文本输入、总输入数 ≤3 且没有 email/tel 输入，
//! 或者单独一个自由文本/textarea。两个条件在边界表单上可能
//! 有分歧，按原样保留（见 DESIGN.md）。

use kuchikiki::NodeRef;
use tracing::debug;

use crate::rewrite::dom::{parse_snippet, prepend_all};

/// 历史字段名 → 规范名（小写匹配，映射幂等）
static FIELD_ALIASES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    // first_name
    "first_name" => "first_name",
    "firstname" => "first_name",
    "first-name" => "first_name",
    "fname" => "first_name",
    "name" => "first_name",
    "your-name" => "first_name",
    "client_name" => "first_name",
    "imya" => "first_name",
    "nombre" => "first_name",
    "vorname" => "first_name",
    // last_name
    "last_name" => "last_name",
    "lastname" => "last_name",
    "last-name" => "last_name",
    "lname" => "last_name",
    "surname" => "last_name",
    "sname" => "last_name",
    "familiya" => "last_name",
    "apellido" => "last_name",
    "nachname" => "last_name",
    // email
    "email" => "email",
    "e-mail" => "email",
    "mail" => "email",
    "email_address" => "email",
    "correo" => "email",
    // phone
    "phone" => "phone",
    "tel" => "phone",
    "telephone" => "phone",
    "phone_number" => "phone",
    "mobile" => "phone",
    "mobile_phone" => "phone",
    "number" => "phone",
    "telefon" => "phone",
    "telefono" => "phone",
    "celular" => "phone",
};

/// 预置的隐藏字段和加载指示器
const HIDDEN_FIELDS_SNIPPET: &str = concat!(
    r#"<input type="hidden" name="subid" value="{subid}">"#,
    r#"<input type="hidden" name="client_ip" value="{ip}">"#,
    r#"<input type="hidden" name="scroll_depth" value="<?= $scroll ?? 0 ?>">"#,
    r#"<div id="preloader" class="loader" style="display:none"><div class="loader-spinner"></div></div>"#,
);

/// 规范字段名的错误提示文案
fn error_copy(canonical: &str) -> Option<&'static str> {
    match canonical {
        "first_name" => Some("Introduce un nombre válido"),
        "last_name" => Some("Introduce un apellido válido"),
        "email" => Some("Introduce un correo electrónico válido"),
        "phone" => Some("Introduce un número de teléfono válido"),
        _ => None,
    }
}

/// 查别名表（大小写不敏感）
pub fn canonical_field(raw_name: &str) -> Option<&'static str> {
    FIELD_ALIASES.get(raw_name.to_lowercase().as_str()).copied()
}

/// 归一化文档中的所有表单
pub fn normalize_forms(document: &NodeRef) {
    let forms: Vec<NodeRef> = match document.select("form") {
        Ok(matches) => matches.map(|m| m.as_node().clone()).collect(),
        Err(_) => Vec::new(),
    };
    for form in forms {
        normalize_form(&form);
    }
}

/// input 的 type 属性（缺省按自由文本处理）
fn input_type(node: &NodeRef) -> String {
    node.as_element()
        .and_then(|el| el.attributes.borrow().get("type").map(|t| t.to_lowercase()))
        .unwrap_or_else(|| "text".to_string())
}

/// "非线索"表单判定（两个条件按规则原样保留）
pub fn is_non_lead(inputs: &[NodeRef], textareas: &[NodeRef]) -> bool {
    let total = inputs.len();
    let free_text = inputs
        .iter()
        .filter(|i| input_type(i) == "text")
        .count();
    let has_contact = inputs
        .iter()
        .any(|i| matches!(input_type(i).as_str(), "email" | "tel"));

    let single_free_text_small_form = free_text == 1 && total <= 3 && !has_contact;
    let lone_text_field = (total == 1 && free_text == 1 && textareas.is_empty())
        || (total == 0 && textareas.len() == 1);

    single_free_text_small_form || lone_text_field
}

fn normalize_form(form: &NodeRef) {
    let inputs: Vec<NodeRef> = match form.select("input") {
        Ok(matches) => matches.map(|m| m.as_node().clone()).collect(),
        Err(_) => Vec::new(),
    };
    let textareas: Vec<NodeRef> = match form.select("textarea") {
        Ok(matches) => matches.map(|m| m.as_node().clone()).collect(),
        Err(_) => Vec::new(),
    };

    if is_non_lead(&inputs, &textareas) {
        debug!("跳过非线索表单（{} 个输入）", inputs.len());
        return;
    }

    if let Some(el) = form.as_element() {
        let mut attrs = el.attributes.borrow_mut();
        attrs.insert("method", "POST".to_string());
        attrs.insert("id", "lead_form".to_string());
        attrs.insert("style", "position: relative;".to_string());
        attrs.remove("onsubmit");
    }

    // 提交按钮上的辅助 id 去掉
    if let Ok(matches) = form.select(r#"[type="submit"]"#) {
        for m in matches {
            m.attributes.borrow_mut().remove("id");
        }
    }

    // 电话控件留下的旗帜容器装饰
    if let Ok(matches) = form.select(".flag-container") {
        let nodes: Vec<NodeRef> = matches.map(|m| m.as_node().clone()).collect();
        for node in nodes {
            node.detach();
        }
    }

    // 旧的隐藏字段全部移除
    for input in &inputs {
        if input_type(input) == "hidden" {
            input.detach();
        }
    }

    prepend_all(form, parse_snippet(HIDDEN_FIELDS_SNIPPET));

    for input in &inputs {
        let ty = input_type(input);
        if ty == "hidden" {
            continue;
        }

        let raw_name = input
            .as_element()
            .and_then(|el| el.attributes.borrow().get("name").map(|s| s.to_string()));

        let canonical = raw_name.as_deref().and_then(canonical_field);

        if let (Some(el), Some(canonical)) = (input.as_element(), canonical) {
            let mut attrs = el.attributes.borrow_mut();
            attrs.insert("name", canonical.to_string());
            if canonical == "phone" {
                attrs.insert("type", "tel".to_string());
                // 旧模板常带过期的校验属性
                attrs.remove("title");
                attrs.remove("pattern");
                attrs.remove("value");
            }
        }

        if ty != "submit" {
            if let Some(el) = input.as_element() {
                let mut attrs = el.attributes.borrow_mut();
                if attrs.get("data-state").is_none() {
                    attrs.insert("data-state", "inactive".to_string());
                }
            }
        }

        if let Some(canonical) = canonical {
            attach_error_element(input, canonical);
        }
    }
}

/// 替换输入框旁边的错误提示元素
///
/// 已有的相邻错误元素先移除，再插入按规范名定位的新元素；
/// 四个规范名之外的字段不加错误元素。
fn attach_error_element(input: &NodeRef, canonical: &str) {
    let Some(copy) = error_copy(canonical) else {
        return;
    };

    // 紧跟在输入框后面的旧错误元素
    let mut next = input.next_sibling();
    while let Some(node) = next {
        if node.as_text().is_some() {
            next = node.next_sibling();
            continue;
        }
        let is_error = node
            .as_element()
            .map(|el| {
                el.attributes
                    .borrow()
                    .get("class")
                    .map(|c| c.split_whitespace().any(|c| c == "error-message"))
                    .unwrap_or(false)
            })
            .unwrap_or(false);
        if is_error {
            node.detach();
        }
        break;
    }

    let snippet = format!(
        r#"<span class="error-message" data-for="{}" style="display:none">{}</span>"#,
        canonical, copy
    );
    for node in parse_snippet(&snippet) {
        input.insert_after(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kuchikiki::traits::TendrilSink;

    fn parse(html: &str) -> NodeRef {
        kuchikiki::parse_html().one(html)
    }

    fn serialize(doc: &NodeRef) -> String {
        let mut out = Vec::new();
        doc.serialize(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_alias_mapping_is_idempotent() {
        for alias in ["fname", "NAME", "mobile", "e-mail", "surname"] {
            let first = canonical_field(alias).unwrap();
            let second = canonical_field(first).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_unknown_alias_unmapped() {
        assert_eq!(canonical_field("comment"), None);
        assert_eq!(canonical_field(""), None);
    }

    #[test]
    fn test_lead_form_is_normalized() {
        let doc = parse(
            r#"<html><body>
            <form action="old.php" onsubmit="return spy()">
              <input name="fname" type="text">
              <input name="mobile" type="text" pattern="[0-9]+" title="digits">
              <input name="email" type="email">
              <input type="hidden" name="tracker" value="abc">
              <button type="submit" id="send_btn">Enviar</button>
            </form>
            </body></html>"#,
        );
        normalize_forms(&doc);
        let html = serialize(&doc);

        assert!(html.contains(r#"id="lead_form""#));
        assert!(html.contains(r#"method="POST""#));
        assert!(!html.contains("onsubmit"));
        assert!(!html.contains("send_btn"));
        // 旧隐藏字段没了，新的三个预置字段在
        assert!(!html.contains("tracker"));
        assert!(html.contains(r#"name="subid""#));
        assert!(html.contains("{subid}"));
        assert!(html.contains(r#"name="client_ip""#));
        assert!(html.contains("{ip}"));
        assert!(html.contains("scroll_depth"));
        // 字段重命名 + 电话重新定型
        assert!(html.contains(r#"name="first_name""#));
        assert!(html.contains(r#"name="phone""#));
        assert!(html.contains(r#"type="tel""#));
        assert!(!html.contains("pattern="));
        // 校验状态标记
        assert!(html.contains(r#"data-state="inactive""#));
        // 错误提示元素
        assert!(html.contains(r#"data-for="first_name""#));
        assert!(html.contains(r#"data-for="phone""#));
        assert!(html.contains("Introduce un nombre válido"));
    }

    #[test]
    fn test_non_lead_search_form_is_skipped() {
        let doc = parse(
            r#"<html><body>
            <form><input name="q" type="text"><button type="submit">Buscar</button></form>
            </body></html>"#,
        );
        normalize_forms(&doc);
        let html = serialize(&doc);

        assert!(!html.contains("lead_form"));
        assert!(!html.contains("subid"));
        assert!(html.contains(r#"name="q""#), "非线索表单的字段不重命名");
    }

    #[test]
    fn test_lone_textarea_is_skipped() {
        let doc = parse(r#"<html><body><form><textarea name="msg"></textarea></form></body></html>"#);
        normalize_forms(&doc);
        assert!(!serialize(&doc).contains("subid"));
    }

    #[test]
    fn test_form_with_contact_input_is_lead() {
        // 一个文本 + 一个 email：有联系方式输入，不算非线索
        let doc = parse(
            r#"<html><body>
            <form><input name="name" type="text"><input name="email" type="email"></form>
            </body></html>"#,
        );
        normalize_forms(&doc);
        assert!(serialize(&doc).contains("lead_form"));
    }

    #[test]
    fn test_existing_error_element_replaced() {
        let doc = parse(
            r#"<html><body>
            <form>
              <input name="email" type="email"><span class="error-message">old copy</span>
              <input name="phone" type="text">
            </form>
            </body></html>"#,
        );
        normalize_forms(&doc);
        let html = serialize(&doc);
        assert!(!html.contains("old copy"));
        assert!(html.contains("Introduce un correo electrónico válido"));
    }
}
