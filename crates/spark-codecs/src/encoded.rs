use alloc::vec::Vec;
use core::{fmt, ops::Deref};

use bytes::Bytes;
use spark_buffer::PooledBuffer;

/// `EncodedMessage` 是一次序列化的输出句柄。
///
/// # 设计初衷（Why）
/// - 小消息直接使用一次性 `Vec`，省去池操作的固定开销；大消息使用池化缓冲，
///   避免反复分配大块内存。两种来源对调用方表现为同一种字节视图；
/// - 池化缓冲在句柄释放时自动归还，调用方不需要、也无法手动归还。
///
/// # 契约说明（What）
/// - 通过 `Deref<Target = [u8]>` 读取完整的序列化结果；
/// - [`Self::into_bytes`] 把结果转换为可跨任务共享的 `Bytes`。池化来源会被“脱离”：
///   底层内存交给调用方，池只记录一次脱离，不会收到可复用的缓冲。
pub struct EncodedMessage {
    storage: Storage,
}

enum Storage {
    Transient(Vec<u8>),
    Pooled(PooledBuffer),
}

impl EncodedMessage {
    /// 以一次性缓冲构造。
    pub fn transient(bytes: Vec<u8>) -> Self {
        Self {
            storage: Storage::Transient(bytes),
        }
    }

    /// 以池化缓冲构造。
    pub fn pooled(buffer: PooledBuffer) -> Self {
        Self {
            storage: Storage::Pooled(buffer),
        }
    }

    /// 结果是否来自缓冲池。
    pub fn is_pooled(&self) -> bool {
        matches!(self.storage, Storage::Pooled(_))
    }

    /// 序列化字节数。
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// 是否为空消息。
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// 序列化结果的只读视图。
    pub fn as_slice(&self) -> &[u8] {
        match &self.storage {
            Storage::Transient(bytes) => bytes,
            Storage::Pooled(buffer) => buffer.as_slice(),
        }
    }

    /// 转换为拥有所有权的 `Bytes`。
    pub fn into_bytes(self) -> Bytes {
        match self.storage {
            Storage::Transient(bytes) => Bytes::from(bytes),
            Storage::Pooled(buffer) => buffer.detach().freeze(),
        }
    }
}

impl Deref for EncodedMessage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for EncodedMessage {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for EncodedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedMessage")
            .field("len", &self.len())
            .field("pooled", &self.is_pooled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_buffer::{BufferPool, SlabBufferPool};

    #[test]
    fn transient_output_exposes_bytes() {
        let encoded = EncodedMessage::transient(b"\x0a\x01x".to_vec());
        assert!(!encoded.is_pooled());
        assert_eq!(encoded.len(), 3);
        assert_eq!(&encoded[..], b"\x0a\x01x");
        assert_eq!(encoded.into_bytes(), Bytes::from_static(b"\x0a\x01x"));
    }

    #[test]
    fn dropping_pooled_output_returns_buffer() {
        let pool = SlabBufferPool::new();
        let mut buffer = pool.acquire(8);
        buffer.put_slice(b"pooled");
        let encoded = EncodedMessage::pooled(buffer);
        assert!(encoded.is_pooled());
        assert_eq!(encoded.as_slice(), b"pooled");
        assert_eq!(pool.statistics().active_leases, 1);
        drop(encoded);
        let stats = pool.statistics();
        assert_eq!(stats.active_leases, 0);
        assert_eq!(stats.total_recycled, 1);
    }

    #[test]
    fn into_bytes_detaches_pooled_output() {
        let pool = SlabBufferPool::new();
        let mut buffer = pool.acquire(8);
        buffer.put_slice(b"owned");
        let bytes = EncodedMessage::pooled(buffer).into_bytes();
        assert_eq!(&bytes[..], b"owned");
        let stats = pool.statistics();
        assert_eq!(stats.active_leases, 0);
        assert_eq!(stats.detached, 1);
        assert_eq!(stats.total_recycled, 0);
    }
}
