#![cfg_attr(not(feature = "std"), no_std)]

//! `spark-buffer` 提供编解码热路径使用的可复用缓冲池。
//!
//! # 模块定位（Why）
//! - 大负载编码若每次都向堆申请整块内存，会在高并发 RPC 下放大分配器压力；
//!   缓冲池让同一块 `BytesMut` 在多次调用之间复用。
//! - 缓冲的归还不依赖调用方手动 `put`：`PooledBuffer` 在 `Drop` 时通知所属池，
//!   因此正常返回、提前返回与错误传播三条路径都只会归还一次。
//!
//! # 设计概要（How）
//! - `contract` 模块定义 [`BufferPool`] 契约与 [`PoolStats`] 统计快照；
//! - `pooled_buffer` 模块实现 [`PooledBuffer`]，并以 [`BufferRecycler`] 把回收钩子显式化；
//! - `pool` 模块给出基于自由链表的默认实现 [`SlabBufferPool`]，以及进程级共享实例。
//!
//! # 命名约定（Consistency）
//! - 租借统一称为 `acquire`，归还统一称为 `reclaim`，统计字段与 `PoolStats` 保持同名。

extern crate alloc;

mod contract;
mod pool;
mod pooled_buffer;

pub use contract::{BufferPool, PoolStats};
pub use pool::{DEFAULT_MAX_FREE_SLOTS, SlabBufferPool};
pub use pooled_buffer::{BufferRecycler, PooledBuffer, ReclaimedBuffer};
