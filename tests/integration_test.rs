//! 端到端场景测试
//!
//! 用内存 fetcher / sink 驱动真实的编排层，覆盖：
//! - 场景 A：landing 模式的完整转换（重命名、字段归一、控件国家）
//! - 场景 B：prelanding + 闸门（守卫在文档声明之前）
//! - 场景 C：空压缩包混入批次（1/2 成功，批次继续）
//! - 大小超限的单独提示文案

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use landing_transformer::error::{AppError, AppResult, FetchError};
use landing_transformer::services::param_parser;
use landing_transformer::{
    ArchiveFetcher, ArchiveRef, BatchProcessor, BundleSink, Config, GatePair,
    MemorySessionStore, Mode, Session, SessionStore,
};

/// 内存压缩包源
struct MemFetcher {
    blobs: HashMap<String, Vec<u8>>,
    max_bytes: u64,
}

#[async_trait]
impl ArchiveFetcher for MemFetcher {
    async fn fetch(&self, reference: &str) -> AppResult<Vec<u8>> {
        let bytes = self
            .blobs
            .get(reference)
            .cloned()
            .ok_or_else(|| AppError::Other(format!("未知引用: {}", reference)))?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(AppError::Fetch(FetchError::SizeExceeded {
                size: bytes.len() as u64,
                limit: self.max_bytes,
            }));
        }
        Ok(bytes)
    }
}

/// 内存投递器
#[derive(Default)]
struct MemSink {
    delivered: Mutex<Vec<(String, Vec<u8>)>>,
}

#[async_trait]
impl BundleSink for MemSink {
    async fn deliver(&self, file_name: &str, bytes: &[u8]) -> AppResult<()> {
        self.delivered
            .lock()
            .expect("投递表锁中毒")
            .push((file_name.to_string(), bytes.to_vec()));
        Ok(())
    }
}

fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in entries {
        writer.start_file(name.to_string(), options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn read_zip(bytes: &[u8]) -> HashMap<String, String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut out = HashMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        out.insert(entry.name().to_string(), content);
    }
    out
}

fn make_processor(
    blobs: HashMap<String, Vec<u8>>,
    max_bytes: u64,
) -> (BatchProcessor, Arc<MemorySessionStore>, Arc<MemSink>) {
    let store = Arc::new(MemorySessionStore::new());
    let sink = Arc::new(MemSink::default());
    let fetcher = Arc::new(MemFetcher { blobs, max_bytes });
    let processor = BatchProcessor::new(
        Config::default(),
        Arc::clone(&store) as Arc<dyn SessionStore>,
        fetcher,
        Arc::clone(&sink) as Arc<dyn BundleSink>,
    );
    (processor, store, sink)
}

const LANDING_HTML: &str = r#"<!DOCTYPE html>
<html><head><title>Promo</title>
<script src="https://www.googletagmanager.com/gtag/js?id=G-1"></script>
</head><body>
<form action="send.php">
<input type="text" name="fname">
<input type="text" name="mobile">
<button type="submit">Enviar</button>
</form>
</body></html>"#;

#[tokio::test]
async fn test_scenario_a_landing_transform() {
    let mut blobs = HashMap::new();
    blobs.insert(
        "ref-a".to_string(),
        build_zip(&[("mysite/index.html", LANDING_HTML)]),
    );
    let (processor, store, sink) = make_processor(blobs, 1024 * 1024);

    // 参数规范化：metka A12 → 12A，country do → DO
    let parsed = param_parser::parse(Mode::Landing, "country=do\nmetka=A12").unwrap();
    assert_eq!(parsed.params.get("metka").map(String::as_str), Some("12A"));

    let mut session = Session::new(0, Mode::Landing);
    session.params = parsed.params;
    session.push_archive(ArchiveRef::new("ref-a", "mysite.zip"));
    store.set(session);

    let outcome = processor.process_all(0).await.expect("批处理应该成功");
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.total, 1);

    let delivered = sink.delivered.lock().unwrap();
    let (name, bytes) = &delivered[0];
    assert_eq!(name, "Land_mysite.zip");

    let files = read_zip(bytes);
    // index 重命名为 php
    assert!(files.contains_key("mysite/index.php"));
    assert!(!files.contains_key("mysite/index.html"));

    let index = &files["mysite/index.php"];
    // 字段按别名表归一
    assert!(index.contains(r#"name="first_name""#));
    assert!(index.contains(r#"name="phone""#));
    assert!(!index.contains("fname"));
    assert!(!index.contains("mobile"));
    // 跟踪脚本被清理，校验脚本引用注入在 </body> 之前
    assert!(!index.contains("googletagmanager"));
    let script_pos = index.rfind("form-scripts.js").unwrap();
    let body_close = index.rfind("</body>").unwrap();
    assert!(script_pos < body_close);

    // 电话控件只允许 DO
    let script = &files["mysite/form-scripts.js"];
    assert!(script.contains("var COUNTRY = \"DO\";"));

    // 新的 order.php 写入
    assert!(files.contains_key("mysite/order.php"));

    // 会话被无条件删除
    assert!(store.get(0).is_none());
}

#[tokio::test]
async fn test_scenario_b_prelanding_gate_guard() {
    let html = r#"<!DOCTYPE html>
<html><head><title>Pre</title></head><body><a href="next.html">seguir</a></body></html>"#;
    let mut blobs = HashMap::new();
    blobs.insert("ref-b".to_string(), build_zip(&[("site/index.html", html)]));
    let (processor, store, sink) = make_processor(blobs, 1024 * 1024);

    let mut session = Session::new(0, Mode::Prelanding);
    session.gate = Some(GatePair::new("x", "1"));
    session.push_archive(ArchiveRef::new("ref-b", "site.zip"));
    store.set(session);

    let outcome = processor.process_all(0).await.unwrap();
    assert_eq!(outcome.succeeded, 1);

    let delivered = sink.delivered.lock().unwrap();
    let (name, bytes) = &delivered[0];
    assert_eq!(name, "Preland_site.zip");

    let files = read_zip(bytes);
    let index = &files["site/index.html"];

    // 守卫在文档声明之前，带字面 key 和 value
    let guard_pos = index.find("<?php").expect("闸门守卫应注入");
    let doctype_pos = index.find("<!DOCTYPE").expect("文档声明应保留");
    assert!(guard_pos < doctype_pos);
    assert!(index.contains("$_GET['x']"));
    assert!(index.contains("!= '1'"));

    // 预落地页锚点全部指向 offer 占位符
    assert!(index.contains(r#"href="{offer}""#));
}

#[tokio::test]
async fn test_scenario_c_empty_archive_in_batch() {
    let mut blobs = HashMap::new();
    blobs.insert("empty".to_string(), build_zip(&[]));
    blobs.insert(
        "good".to_string(),
        build_zip(&[("site/index.html", LANDING_HTML)]),
    );
    let (processor, store, sink) = make_processor(blobs, 1024 * 1024);

    let mut session = Session::new(0, Mode::Landing);
    session.push_archive(ArchiveRef::new("empty", "empty.zip"));
    session.push_archive(ArchiveRef::new("good", "good.zip"));
    store.set(session);

    // 空压缩包只影响自己，批次继续
    let outcome = processor.process_all(0).await.expect("批次不应整体失败");
    assert_eq!(outcome.total, 2);
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.reports.len(), 2);

    let delivered = sink.delivered.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, "Land_site.zip");

    assert!(store.get(0).is_none());
}

#[tokio::test]
async fn test_size_exceeded_gets_distinct_report() {
    let mut blobs = HashMap::new();
    blobs.insert(
        "big".to_string(),
        build_zip(&[("site/index.html", LANDING_HTML)]),
    );
    // 上限设为 1 字节，任何压缩包都超限
    let (processor, store, _sink) = make_processor(blobs, 1);

    let mut session = Session::new(0, Mode::Landing);
    session.push_archive(ArchiveRef::new("big", "big.zip"));
    store.set(session);

    let outcome = processor.process_all(0).await.unwrap();
    assert_eq!(outcome.succeeded, 0);
    assert!(
        outcome.reports[0].contains("超出平台大小限制"),
        "大小超限要用单独的提示文案: {}",
        outcome.reports[0]
    );
}

#[tokio::test]
async fn test_edit_order_replaces_order_php() {
    let mut blobs = HashMap::new();
    blobs.insert(
        "ref".to_string(),
        build_zip(&[
            ("site/index.html", "<html><body></body></html>"),
            ("site/order.php", "<?php // viejo ?>"),
        ]),
    );
    let (processor, store, sink) = make_processor(blobs, 1024 * 1024);

    let parsed =
        param_parser::parse(Mode::EditOrder, "kt=track.example.com\nlogs=1").unwrap();
    let mut session = Session::new(0, Mode::EditOrder);
    session.params = parsed.params;
    session.push_archive(ArchiveRef::new("ref", "site.zip"));
    store.set(session);

    let outcome = processor.process_all(0).await.unwrap();
    assert_eq!(outcome.succeeded, 1);

    let delivered = sink.delivered.lock().unwrap();
    let (name, bytes) = &delivered[0];
    assert_eq!(name, "Result_site.zip");

    let files = read_zip(bytes);
    let order = &files["site/order.php"];
    assert!(!order.contains("viejo"));
    assert!(order.contains("$kt_domain = 'track.example.com';"));
    assert!(order.contains("$logs = 1;"));
    // edit_order 不重写文档
    assert_eq!(files["site/index.html"], "<html><body></body></html>");
}

#[tokio::test]
async fn test_stale_artifacts_purged_and_regenerated() {
    let html = r#"<!DOCTYPE html>
<html><head>
<link rel="stylesheet" href="css/intlTelInput.css">
</head><body>
<form>
<input type="text" name="fname">
<input type="email" name="email">
</form>
</body></html>"#;
    let mut blobs = HashMap::new();
    blobs.insert(
        "ref".to_string(),
        build_zip(&[
            ("site/index.html", html),
            ("site/css/intlTelInput.css", ".iti{}"),
            ("site/order.php", "<?php // viejo ?>"),
            ("site/form-scripts.js", "// viejo"),
            ("site/lead_20240101.txt", "{}"),
        ]),
    );
    let (processor, store, sink) = make_processor(blobs, 1024 * 1024);

    let parsed = param_parser::parse(Mode::Landing, "country=do").unwrap();
    let mut session = Session::new(0, Mode::Landing);
    session.params = parsed.params;
    session.push_archive(ArchiveRef::new("ref", "site.zip"));
    store.set(session);

    let outcome = processor.process_all(0).await.unwrap();
    assert_eq!(outcome.succeeded, 1);

    let delivered = sink.delivered.lock().unwrap();
    let files = read_zip(&delivered[0].1);

    // 旧的线索日志和本地控件样式资源整个消失
    assert!(!files.contains_key("site/lead_20240101.txt"));
    assert!(!files.contains_key("site/css/intlTelInput.css"));
    // order.php / form-scripts.js 被重新生成
    assert!(!files["site/order.php"].contains("viejo"));
    assert!(files["site/form-scripts.js"].contains("var COUNTRY = \"DO\";"));
    // 文档里指向本地控件样式的 link 也没了
    assert!(!files["site/index.php"].contains("css/intlTelInput.css"));
}

#[tokio::test]
async fn test_all_top_level_directories_are_rewritten() {
    let page = r#"<html><head></head><body><a href="next.html">seguir</a></body></html>"#;
    let mut blobs = HashMap::new();
    blobs.insert(
        "ref".to_string(),
        build_zip(&[("a/index.html", page), ("b/page.html", page)]),
    );
    let (processor, store, sink) = make_processor(blobs, 1024 * 1024);

    let mut session = Session::new(0, Mode::Prelanding);
    session.push_archive(ArchiveRef::new("ref", "two-roots.zip"));
    store.set(session);

    let outcome = processor.process_all(0).await.unwrap();
    assert_eq!(outcome.succeeded, 1);

    let delivered = sink.delivered.lock().unwrap();
    let (name, bytes) = &delivered[0];
    // 输出名取第一个条目的顶层目录
    assert_eq!(name, "Preland_a.zip");

    // 根目录之外的文档也要被重写
    let files = read_zip(bytes);
    assert!(files["a/index.html"].contains(r#"href="{offer}""#));
    assert!(files["b/page.html"].contains(r#"href="{offer}""#));
}

#[tokio::test]
async fn test_gated_mode_format_error_leaves_session_untouched() {
    // 第一行不是严格的 key=value：格式错误，不得创建/修改会话
    let result = param_parser::parse(Mode::ProklaLand, "不是键值对\ncountry=do");
    assert!(result.is_err());
}
