use alloc::{collections::BTreeMap, string::String, sync::Arc, vec::Vec};
use core::fmt;

use spin::{Lazy, RwLock};

use crate::{codec::Codec, error::RegistryError};

static GLOBAL: Lazy<CodecRegistry> = Lazy::new(CodecRegistry::new);

/// `CodecRegistry` 维护“名称 -> 编解码器”的进程内映射。
///
/// # 设计初衷（Why）
/// - 传输层根据内容子类型（例如 `application/grpc+proto` 中的 `proto`）查找编解码器，
///   注册表是两者之间唯一的耦合点；
/// - 既提供进程级单例 [`Self::global`]，也允许构造独立实例，测试与多租户嵌入无需共享全局状态。
///
/// # 行为逻辑（How）
/// - 以 `spin::RwLock<BTreeMap<..>>` 保存映射：查找走读锁，注册走写锁；
/// - 同名再次注册时替换旧实现并把旧实现返回给调用方，同时输出 `warn` 日志。
///
/// # 契约说明（What）
/// - **前置条件**：注册名非空；
/// - **后置条件**：`register` 返回后，所有线程的后续查找都能看到新实现；
/// - [`Self::names`] 按字典序返回。
pub struct CodecRegistry {
    codecs: RwLock<BTreeMap<String, Arc<dyn Codec>>>,
}

impl CodecRegistry {
    /// 创建空注册表。
    pub fn new() -> Self {
        Self {
            codecs: RwLock::new(BTreeMap::new()),
        }
    }

    /// 进程级注册表。
    pub fn global() -> &'static CodecRegistry {
        &GLOBAL
    }

    /// 以 `name` 注册编解码器，返回被替换的旧实现。
    pub fn register(
        &self,
        name: &str,
        codec: Arc<dyn Codec>,
    ) -> Result<Option<Arc<dyn Codec>>, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let previous = self.codecs.write().insert(String::from(name), codec);
        if previous.is_some() {
            tracing::warn!(codec.name = name, "codec registration replaced an existing entry");
        } else {
            tracing::info!(codec.name = name, "codec registered");
        }
        Ok(previous)
    }

    /// 按名称查找。
    pub fn get(&self, name: &str) -> Option<Arc<dyn Codec>> {
        self.codecs.read().get(name).cloned()
    }

    /// 是否已注册 `name`。
    pub fn contains(&self, name: &str) -> bool {
        self.codecs.read().contains_key(name)
    }

    /// 已注册的全部名称。
    pub fn names(&self) -> Vec<String> {
        self.codecs.read().keys().cloned().collect()
    }

    /// 已注册数量。
    pub fn len(&self) -> usize {
        self.codecs.read().len()
    }

    /// 是否为空。
    pub fn is_empty(&self) -> bool {
        self.codecs.read().is_empty()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("names", &self.names())
            .finish()
    }
}
