use alloc::{sync::Arc, vec::Vec};
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use bytes::BytesMut;
use spin::{Lazy, Mutex};

use crate::{
    contract::{BufferPool, PoolStats},
    pooled_buffer::{BufferRecycler, PooledBuffer, ReclaimedBuffer},
};

/// 自由链表默认最多保留的闲置缓冲数量。
pub const DEFAULT_MAX_FREE_SLOTS: usize = 64;

/// 进程级共享池，供未显式注入缓冲池的编解码器使用。
static SHARED: Lazy<SlabBufferPool> = Lazy::new(SlabBufferPool::new);

/// `SlabBufferPool` 提供基于自由链表（Free List）的缓冲池实现，
/// 专注在**高并发、低延迟**场景下复用 `BytesMut`，以减少堆分配次数。
///
/// # 模块角色（Why）
/// - 作为 [`BufferPool`] 的默认实现，为编解码器提供统一的缓冲来源；
/// - 借助 [`PooledBuffer`] 的 `Drop` 钩子自动回收 `BytesMut`，调用方无需关注归还细节。
///
/// # 核心机制（How）
/// - 内部维护 `spin::Mutex<Vec<BytesMut>>` 作为自由链表，租借时复用容量足够的块中最小的一块
///   （best-fit），避免小请求占走大块、迫使随后的大请求重新分配；
/// - `PoolMetrics` 以原子计数跟踪字节量、租约与命中情况，支撑 [`PoolStats`] 快照；
/// - `BufferRecycler` 实现根据 [`ReclaimedBuffer`] 决定把内存放回链表还是仅更新统计；
///   链表已满时直接释放归还的缓冲，并记为一次丢弃。
///
/// # 契约说明（What）
/// - **线程安全**：共享状态均由 `spin::Mutex` 与原子计数保护；
/// - **后置条件**：`acquire(n)` 返回的缓冲为空且容量不小于 `n`；
/// - 克隆得到的实例共享同一自由链表与统计。
///
/// # 设计权衡（Trade-offs）
/// - 使用自旋锁而非 `parking_lot::Mutex`，临界区只有一次线性查找与 `swap_remove`，
///   并可在 `no_std` 环境下工作；
/// - 自由链表长度受 `max_free_slots` 限制，闲置内存有上界；峰值过后仍可调用
///   `shrink_to_fit` 立即归还全部闲置缓冲；
/// - best-fit 需要线性扫描整条链表，链表上限同时约束了这部分开销。
#[derive(Clone)]
pub struct SlabBufferPool {
    inner: Arc<PoolInner>,
}

impl Default for SlabBufferPool {
    fn default() -> Self {
        Self::with_max_free_slots(DEFAULT_MAX_FREE_SLOTS)
    }
}

impl SlabBufferPool {
    /// 创建独立的空池，常用于测试或需要隔离统计的嵌入方。
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建自由链表最多保留 `max_free_slots` 块闲置缓冲的空池。
    ///
    /// 取 0 时每次归还都直接释放，等价于关闭复用。
    pub fn with_max_free_slots(max_free_slots: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner::new(max_free_slots)),
        }
    }

    /// 返回进程级共享池的句柄。
    ///
    /// 所有句柄共享同一自由链表；首次调用时惰性创建。
    pub fn shared() -> Self {
        SHARED.clone()
    }

    fn allocate_pooled(&self, min_capacity: usize) -> PooledBuffer {
        let raw = self.inner.acquire_buffer(min_capacity);
        let recycler: Arc<dyn BufferRecycler> = self.inner.clone();
        PooledBuffer::new(raw, recycler)
    }
}

impl BufferPool for SlabBufferPool {
    fn acquire(&self, min_capacity: usize) -> PooledBuffer {
        self.allocate_pooled(min_capacity)
    }

    fn shrink_to_fit(&self) -> usize {
        self.inner.shrink_free_list()
    }

    fn statistics(&self) -> PoolStats {
        self.inner.snapshot()
    }
}

struct PoolInner {
    free_list: Mutex<Vec<BytesMut>>,
    max_free_slots: usize,
    metrics: PoolMetrics,
}

impl PoolInner {
    fn new(max_free_slots: usize) -> Self {
        Self {
            free_list: Mutex::new(Vec::new()),
            max_free_slots,
            metrics: PoolMetrics::default(),
        }
    }

    /// 从自由链表或堆上获取一个满足容量的 `BytesMut`。
    ///
    /// 链表中容量足够的块里取最小的一块。
    fn acquire_buffer(&self, min_capacity: usize) -> BytesMut {
        let reused = {
            let mut list = self.free_list.lock();
            let best_fit = list
                .iter()
                .enumerate()
                .filter(|(_, buf)| buf.capacity() >= min_capacity)
                .min_by_key(|(_, buf)| buf.capacity())
                .map(|(index, _)| index);
            best_fit.map(|index| list.swap_remove(index))
        };

        let mut buffer = match reused {
            Some(buf) => {
                self.metrics.decrease_available(buf.capacity());
                buf
            }
            None => {
                let buf = BytesMut::with_capacity(min_capacity);
                self.metrics.record_miss(buf.capacity());
                buf
            }
        };
        buffer.clear();
        self.metrics.record_acquire();
        buffer
    }

    fn shrink_free_list(&self) -> usize {
        let mut list = self.free_list.lock();
        let reclaimed: usize = list.iter().map(BytesMut::capacity).sum();
        list.clear();
        self.metrics.decrease_available(reclaimed);
        self.metrics.decrease_allocated(reclaimed);
        reclaimed
    }

    fn snapshot(&self) -> PoolStats {
        let free_slots = self.free_list.lock().len();
        PoolStats {
            allocated_bytes: self.metrics.allocated_bytes.load(Ordering::Relaxed),
            available_bytes: self.metrics.available_bytes.load(Ordering::Relaxed),
            active_leases: self.metrics.active_leases.load(Ordering::Relaxed),
            total_acquired: self.metrics.total_acquired.load(Ordering::Relaxed),
            total_recycled: self.metrics.total_recycled.load(Ordering::Relaxed),
            pool_misses: self.metrics.pool_misses.load(Ordering::Relaxed),
            detached: self.metrics.detached.load(Ordering::Relaxed),
            discarded: self.metrics.discarded.load(Ordering::Relaxed),
            free_slots,
        }
    }
}

impl BufferRecycler for PoolInner {
    fn reclaim(&self, reclaimed: ReclaimedBuffer) {
        self.metrics.decrease_active_leases();
        let leased = reclaimed.leased_capacity();
        match reclaimed.into_buffer() {
            Some(mut buf) => {
                buf.clear();
                let capacity = buf.capacity();
                // 租约期间若发生扩容，按实际容量修正记账。
                if capacity > leased {
                    self.metrics.increase_allocated(capacity - leased);
                } else if capacity < leased {
                    self.metrics.decrease_allocated(leased - capacity);
                }
                let mut list = self.free_list.lock();
                if list.len() >= self.max_free_slots {
                    drop(list);
                    drop(buf);
                    self.metrics.decrease_allocated(capacity);
                    self.metrics.discarded.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                list.push(buf);
                drop(list);
                self.metrics.increase_available(capacity);
                self.metrics.total_recycled.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.metrics.decrease_allocated(leased);
                self.metrics.detached.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[derive(Default)]
struct PoolMetrics {
    allocated_bytes: AtomicUsize,
    available_bytes: AtomicUsize,
    active_leases: AtomicUsize,
    total_acquired: AtomicU64,
    total_recycled: AtomicU64,
    pool_misses: AtomicU64,
    detached: AtomicU64,
    discarded: AtomicU64,
}

impl PoolMetrics {
    fn record_miss(&self, capacity: usize) {
        self.pool_misses.fetch_add(1, Ordering::Relaxed);
        self.increase_allocated(capacity);
    }

    fn record_acquire(&self) {
        self.total_acquired.fetch_add(1, Ordering::Relaxed);
        self.active_leases.fetch_add(1, Ordering::Relaxed);
    }

    fn increase_allocated(&self, capacity: usize) {
        self.allocated_bytes.fetch_add(capacity, Ordering::Relaxed);
    }

    fn decrease_allocated(&self, capacity: usize) {
        saturating_sub(&self.allocated_bytes, capacity);
    }

    fn increase_available(&self, capacity: usize) {
        self.available_bytes.fetch_add(capacity, Ordering::Relaxed);
    }

    fn decrease_available(&self, capacity: usize) {
        saturating_sub(&self.available_bytes, capacity);
    }

    fn decrease_active_leases(&self) {
        saturating_sub(&self.active_leases, 1);
    }
}

fn saturating_sub(target: &AtomicUsize, value: usize) {
    let _ = target.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        Some(current.saturating_sub(value))
    });
}
