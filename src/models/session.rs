use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Mode;

/// 闸门键值对
///
/// 页面只有在查询参数 `key` 等于 `value` 时才渲染，否则重定向。
/// 约定 `("0", "0")` 表示关闭闸门。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePair {
    pub key: String,
    pub value: String,
}

impl GatePair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// 哨兵值 ("0", "0") 表示不注入闸门
    pub fn is_disabled(&self) -> bool {
        self.key == "0" && self.value == "0"
    }
}

/// 已上传压缩包的引用
///
/// 字节在处理时才惰性获取，上传时只记录句柄和原始文件名。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRef {
    /// 外部传输层可解析的不透明句柄（本地路径或 URL）
    pub reference: String,
    /// 上传时的原始文件名
    pub file_name: String,
}

impl ArchiveRef {
    pub fn new(reference: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            file_name: file_name.into(),
        }
    }
}

/// 单个用户的处理会话
///
/// 由模式命令创建（无条件覆盖旧会话），参数和上传事件修改，
/// 批处理结束后删除。每个用户同一时刻只有一个会话。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i64,
    pub mode: Mode,
    /// 规范化后的参数表（BTreeMap 保证序列化顺序稳定）
    pub params: BTreeMap<String, String>,
    pub gate: Option<GatePair>,
    /// 按提交顺序排列的待处理压缩包
    pub archives: Vec<ArchiveRef>,
    /// 批处理进行中标记
    pub processing: bool,
}

impl Session {
    /// 创建新会话
    pub fn new(user_id: i64, mode: Mode) -> Self {
        Self {
            user_id,
            mode,
            params: BTreeMap::new(),
            gate: None,
            archives: Vec::new(),
            processing: false,
        }
    }

    /// 追加一个压缩包引用
    pub fn push_archive(&mut self, archive: ArchiveRef) {
        self.archives.push(archive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 会话可以原样序列化，换持久化仓库时不用改模型
    #[test]
    fn test_session_json_roundtrip() {
        let mut session = Session::new(7, Mode::ProklaLand);
        session.gate = Some(GatePair::new("x", "1"));
        session.params.insert("country".to_string(), "DO".to_string());
        session.push_archive(ArchiveRef::new("ref", "a.zip"));

        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"prokla_land\""));

        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back.mode, Mode::ProklaLand);
        assert_eq!(back.gate, session.gate);
        assert_eq!(back.archives, session.archives);
    }

    #[test]
    fn test_disabled_gate_sentinel() {
        assert!(GatePair::new("0", "0").is_disabled());
        assert!(!GatePair::new("x", "0").is_disabled());
        assert!(!GatePair::new("0", "1").is_disabled());
    }
}
