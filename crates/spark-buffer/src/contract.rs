use bytes::Buf;

use crate::pooled_buffer::PooledBuffer;

/// `BufferPool` 描述可复用缓冲的租借入口。
///
/// # 设计初衷（Why）
/// - 编解码器只关心“拿到一块至少 `min_capacity` 字节的缓冲”，不关心底层是自由链表、
///   分级桶还是直接走堆分配；
/// - 归还动作由 [`PooledBuffer`] 的 `Drop` 完成，因此契约中没有显式的 `put`，
///   调用方无法遗漏或重复归还。
///
/// # 契约说明（What）
/// - **线程安全**：实现必须满足 `Send + Sync + 'static`，允许任意数量的线程并发租借与归还；
/// - **后置条件**：`acquire` 返回的缓冲 `len() == 0` 且 `capacity() >= min_capacity`；
/// - **统计**：每次 `acquire` 必须在 [`PoolStats::total_acquired`] 上计数一次，
///   每次归还在 [`PoolStats::total_recycled`]、[`PoolStats::detached`] 或
///   [`PoolStats::discarded`] 之一上计数一次。
pub trait BufferPool: Send + Sync + 'static {
    /// 租借一个容量不小于 `min_capacity` 的空缓冲。
    fn acquire(&self, min_capacity: usize) -> PooledBuffer;

    /// 将可能分段的输入拷贝进一块连续的池化缓冲。
    ///
    /// # 执行逻辑（How）
    /// 1. 以 `src.remaining()` 作为最小容量租借缓冲；
    /// 2. 逐段读取 `chunk()` 并追加，直到源缓冲耗尽。
    ///
    /// # 契约说明（What）
    /// - 每个字节恰好拷贝一次；
    /// - 返回后 `src.has_remaining() == false`。
    fn materialize(&self, src: &mut dyn Buf) -> PooledBuffer {
        let mut buffer = self.acquire(src.remaining());
        buffer.put_buf(src);
        buffer
    }

    /// 释放自由链表中的闲置缓冲，返回释放的字节数。
    fn shrink_to_fit(&self) -> usize;

    /// 读取当前统计快照。
    fn statistics(&self) -> PoolStats;
}

/// 缓冲池统计快照。
///
/// 字段均为读取瞬间的近似值：并发租借与归还期间不同字段之间不保证原子一致。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// 池当前负责的总字节数（租借中 + 闲置）。
    pub allocated_bytes: usize,
    /// 自由链表中闲置的字节数。
    pub available_bytes: usize,
    /// 尚未归还的租约数量。
    pub active_leases: usize,
    /// 累计租借次数。
    pub total_acquired: u64,
    /// 累计回到自由链表的次数。
    pub total_recycled: u64,
    /// 自由链表未命中、不得不新分配的次数。
    pub pool_misses: u64,
    /// 被调用方取走底层内存、未能回到池中的租约数量。
    pub detached: u64,
    /// 归还时自由链表已满、被直接释放的缓冲数量。
    pub discarded: u64,
    /// 自由链表中的缓冲块数量。
    pub free_slots: usize,
}
