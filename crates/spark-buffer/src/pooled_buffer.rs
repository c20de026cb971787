use alloc::sync::Arc;
use core::{
    fmt, mem,
    ops::{Deref, DerefMut},
};

use bytes::{Buf, BytesMut};

/// `BufferRecycler` 描述缓冲池在租借结束时的回收入口。
///
/// # 设计初衷（Why）
/// - [`BufferPool`](crate::BufferPool) 只负责“租借”侧的抽象，不约束实现如何在缓冲生命周期结束时归还容量；
/// - 通过该回收接口，`PooledBuffer` 在 `Drop` 阶段统一通知池，
///   避免在编解码器中散落手动归还逻辑。
///
/// # 契约定义（What）
/// - **前置条件**：实现必须线程安全，且调用过程中不得 panic，
///   否则 `Drop` 路径上的 panic 会在展开期间导致进程终止；
/// - **后置条件**：每个租约恰好触发一次 `reclaim`。
pub trait BufferRecycler: Send + Sync + 'static {
    /// 通知池回收一次租约。
    fn reclaim(&self, reclaimed: ReclaimedBuffer);
}

/// 表示一次回收动作所携带的上下文。
///
/// - `leased_capacity`：租借时池记账的容量；
/// - `buffer`：若底层 `BytesMut` 仍归池所有则为 `Some`，
///   若调用方通过 [`PooledBuffer::detach`] 取走内存则为 `None`。
#[derive(Debug)]
pub struct ReclaimedBuffer {
    leased_capacity: usize,
    buffer: Option<BytesMut>,
}

impl ReclaimedBuffer {
    /// 创建携带完整上下文的回收结果。
    pub fn new(leased_capacity: usize, buffer: Option<BytesMut>) -> Self {
        Self {
            leased_capacity,
            buffer,
        }
    }

    /// 租借时记账的容量。
    pub fn leased_capacity(&self) -> usize {
        self.leased_capacity
    }

    /// 底层内存是否随本次回收一起交还。
    pub fn is_detached(&self) -> bool {
        self.buffer.is_none()
    }

    /// 消耗结构并返回可复用的 `BytesMut`，若已被取走则为 `None`。
    pub fn into_buffer(self) -> Option<BytesMut> {
        self.buffer
    }
}

/// `PooledBuffer` 是从缓冲池租借的连续字节缓冲。
///
/// # 设计动机（Why）
/// - 编码器需要一块可原地写入的连续内存（尾部回填式编码要求 `&mut [u8]`，
///   追加式编码要求 `BufMut`），两种写法都应复用池中已有的容量；
/// - 归还由 `Drop` 驱动，形成“作用域租借”：无论调用方以何种路径离开作用域，
///   池都恰好收到一次 `reclaim`。
///
/// # 契约说明（What）
/// - `Deref<Target = [u8]>` 暴露已写入的字节；
/// - [`Self::resize`] 在容量足够时不会重新分配，供尾部回填式编码预留空间；
/// - [`Self::writer`] 暴露底层 `BytesMut` 供追加式编码；若写入超过容量导致扩容，
///   回收时池会按实际容量修正统计；
/// - [`Self::detach`] 让调用方带走底层内存，池只记录一次“脱离”。
pub struct PooledBuffer {
    inner: BytesMut,
    leased_capacity: usize,
    detached: bool,
    recycler: Arc<dyn BufferRecycler>,
}

impl PooledBuffer {
    /// 使用给定的 `BytesMut` 与回收句柄创建缓冲。
    ///
    /// # 前置条件
    /// - `inner` 由池独占持有，未被其它视图共享；
    /// - `recycler` 的生命周期不短于缓冲本身（`Arc` 已保证）。
    ///
    /// # 后置条件
    /// - 租约记账容量等于 `inner.capacity()`；
    /// - 缓冲被释放时 `recycler` 收到恰好一次 `reclaim`。
    pub fn new(inner: BytesMut, recycler: Arc<dyn BufferRecycler>) -> Self {
        Self {
            leased_capacity: inner.capacity(),
            inner,
            detached: false,
            recycler,
        }
    }

    /// 已写入的字节数。
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// 是否尚未写入任何字节。
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// 底层容量。
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// 已写入字节的只读视图。
    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    /// 将长度调整为 `len`，新增部分以零填充。
    pub fn resize(&mut self, len: usize) {
        self.inner.resize(len, 0);
    }

    /// 追加一段连续字节。
    pub fn put_slice(&mut self, src: &[u8]) {
        self.inner.extend_from_slice(src);
    }

    /// 逐段追加 `src` 的全部剩余字节，返回拷贝的字节数。
    pub fn put_buf(&mut self, src: &mut dyn Buf) -> usize {
        let total = src.remaining();
        self.inner.reserve(total);
        while src.has_remaining() {
            let chunk = src.chunk();
            let step = chunk.len();
            self.inner.extend_from_slice(chunk);
            src.advance(step);
        }
        total
    }

    /// 清空内容，保留容量。
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// 暴露底层 `BytesMut`，供实现 `BufMut` 的追加式编码器直接写入。
    pub fn writer(&mut self) -> &mut BytesMut {
        &mut self.inner
    }

    /// 取走底层内存，结束租约但不把内存还给池。
    ///
    /// 适用于调用方需要让字节活得比租约更久的场景（例如转换为 `Bytes` 交给异步写出）。
    /// 池会把这次回收记为“脱离”，并从 `allocated_bytes` 中扣除对应容量。
    pub fn detach(mut self) -> BytesMut {
        self.detached = true;
        mem::take(&mut self.inner)
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let buffer = if self.detached {
            None
        } else {
            let mut buf = mem::take(&mut self.inner);
            buf.clear();
            Some(buf)
        };
        self.recycler
            .reclaim(ReclaimedBuffer::new(self.leased_capacity, buffer));
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.inner
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.inner
    }
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.inner
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.inner.len())
            .field("capacity", &self.inner.capacity())
            .field("leased_capacity", &self.leased_capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use spin::Mutex;

    #[derive(Default)]
    struct RecordingRecycler {
        events: Mutex<Vec<(usize, bool)>>,
    }

    impl BufferRecycler for RecordingRecycler {
        fn reclaim(&self, reclaimed: ReclaimedBuffer) {
            let capacity = reclaimed.leased_capacity();
            let detached = reclaimed.is_detached();
            self.events.lock().push((capacity, detached));
        }
    }

    #[test]
    fn drop_reclaims_exactly_once() {
        let recycler = Arc::new(RecordingRecycler::default());
        {
            let mut buffer = PooledBuffer::new(BytesMut::with_capacity(16), recycler.clone());
            buffer.put_slice(b"spark");
            assert_eq!(buffer.as_slice(), b"spark");
        }
        let events = recycler.events.lock().clone();
        assert_eq!(events.len(), 1);
        assert!(events[0].0 >= 16);
        assert!(!events[0].1);
    }

    #[test]
    fn detach_hands_out_bytes_and_reports_loss() {
        let recycler = Arc::new(RecordingRecycler::default());
        let mut buffer = PooledBuffer::new(BytesMut::with_capacity(8), recycler.clone());
        buffer.put_slice(&[1, 2, 3]);
        let bytes = buffer.detach();
        assert_eq!(&bytes[..], &[1, 2, 3]);
        let events = recycler.events.lock().clone();
        assert_eq!(events.len(), 1);
        assert!(events[0].1, "脱离的租约应以 None 回收");
    }

    #[test]
    fn put_buf_flattens_segments() {
        let recycler = Arc::new(RecordingRecycler::default());
        let mut buffer = PooledBuffer::new(BytesMut::new(), recycler);
        let mut segmented = (&b"hello "[..]).chain(&b"world"[..]);
        let copied = buffer.put_buf(&mut segmented);
        assert_eq!(copied, 11);
        assert_eq!(&buffer[..], b"hello world");
        assert!(!segmented.has_remaining());
    }

    #[test]
    fn resize_reuses_capacity_for_tail_encoding() {
        let recycler = Arc::new(RecordingRecycler::default());
        let mut buffer = PooledBuffer::new(BytesMut::with_capacity(32), recycler);
        let before = buffer.capacity();
        buffer.resize(32);
        assert_eq!(buffer.len(), 32);
        assert_eq!(buffer.capacity(), before);
        buffer[31] = 0xFF;
        assert_eq!(buffer.as_slice()[31], 0xFF);
    }
}
