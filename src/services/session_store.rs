//! 会话存储服务
//!
//! 显式的会话仓库抽象：`get` / `set` / `delete` 注入到每个事件处理器，
//! 之后换成持久化实现时不需要碰重写逻辑。
//!
//! 同一个用户的并发命令不做串行化：后写的覆盖先写的
//! （已知并记录的竞争，不做纠正）。

use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::Session;

/// 会话仓库
pub trait SessionStore: Send + Sync {
    /// 读取用户会话（克隆返回）
    fn get(&self, user_id: i64) -> Option<Session>;
    /// 无条件覆盖用户会话
    fn set(&self, session: Session);
    /// 删除用户会话
    fn delete(&self, user_id: i64);
}

/// 进程内会话仓库
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<HashMap<i64, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, user_id: i64) -> Option<Session> {
        self.inner
            .lock()
            .expect("会话表锁中毒")
            .get(&user_id)
            .cloned()
    }

    fn set(&self, session: Session) {
        self.inner
            .lock()
            .expect("会话表锁中毒")
            .insert(session.user_id, session);
    }

    fn delete(&self, user_id: i64) {
        self.inner.lock().expect("会话表锁中毒").remove(&user_id);
    }
}
