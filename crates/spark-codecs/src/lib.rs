#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

//! # spark-codecs
//!
//! ## 教案意图（Why）
//! - **职责定位**：定义 protobuf 编解码链路的全部对外契约：消息能力（原生 / 标准 / 遗留）、
//!   编解码器入口 [`Codec`]、输出句柄 [`EncodedMessage`]、按名称查找的 [`CodecRegistry`]
//!   以及统一的错误类型；
//! - **架构价值**：具体编解码器（例如 `spark-codec-proto`）与消息生成代码只需依赖本 crate，
//!   彼此之间不直接耦合；
//! - **团队协作**：手写原生消息时可复用 [`wire`] 中的反向写入工具，不必各自实现 varint。
//!
//! ## 使用方式（How）
//! - 消息类型实现能力 trait 后，用 [`impl_proto_message!`] 声明自己具备哪些能力；
//! - `prost::Message` 类型自动满足 [`StandardMessage`]；
//! - 编解码器实现 [`Codec`] 并注册到 [`CodecRegistry`]。
//!
//! ## 契约说明（What）
//! - 分派优先级固定为 原生 > 标准 > 遗留，见 [`MessageTier`]；
//! - 所有失败经 [`CodecError`] 上报，并带有稳定错误码（[`codes`]）。

extern crate alloc;

mod codec;
mod encoded;
mod error;
mod legacy;
mod macros;
mod message;
mod registry;
pub mod wire;

pub use codec::Codec;
pub use encoded::EncodedMessage;
pub use error::{CodecError, CodecOperation, DecodeError, EncodeError, RegistryError, codes};
pub use legacy::{LegacyAdapter, LegacyAdapterMut};
pub use message::{
    LegacyMessage, MessageTier, NativeCodec, ProtoMessage, StandardEncode, StandardMessage,
};
pub use registry::CodecRegistry;

/// 重新导出缓冲池契约，编解码器实现无需单独声明依赖即可使用。
pub use spark_buffer::{BufferPool, PoolStats, PooledBuffer, SlabBufferPool};
