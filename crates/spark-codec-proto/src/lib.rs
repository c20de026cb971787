#![warn(missing_docs)]

//! # spark-codec-proto
//!
//! ## 教案意图（Why）
//! - **职责定位**：提供注册名为 `proto` 的 protobuf 编解码器 [`ProtoCodec`]，
//!   负责 RPC 消息与线格式字节之间的转换；
//! - **性能目标**：大消息复用缓冲池中的输出与输入缓冲，小消息直接分配，降低热路径的分配次数；
//! - **兼容目标**：同一进程内的原生、标准、遗留三代消息都能被同一个编解码器处理。
//!
//! ## 使用方式（How）
//! - 启动阶段调用一次 [`install_global`]（或对自有注册表调用 [`install`]）；
//! - 需要隔离统计或调整阈值时，用 [`ProtoCodec::with_pool`] 与 [`ProtoCodecConfig`] 自行构造。
//!
//! ## 契约说明（What）
//! - 线格式与标准 protobuf 编码完全一致；
//! - 分派优先级、阈值语义与错误分类见 [`ProtoCodec`] 与 [`classify`] 模块。

pub mod classify;
mod codec;
mod config;

use std::sync::Arc;

use spark_codecs::{Codec, CodecRegistry, RegistryError};

pub use codec::ProtoCodec;
pub use config::{DEFAULT_POOLING_THRESHOLD, ProtoCodecConfig};

/// 编解码器在注册表中的名称。
pub const PROTO_CODEC_NAME: &str = "proto";

/// 把默认配置的 [`ProtoCodec`] 注册到 `registry`，返回被替换的旧实现。
pub fn install(registry: &CodecRegistry) -> Result<Option<Arc<dyn Codec>>, RegistryError> {
    registry.register(PROTO_CODEC_NAME, Arc::new(ProtoCodec::new()))
}

/// 把默认配置的 [`ProtoCodec`] 注册到进程级注册表。
pub fn install_global() -> Result<Option<Arc<dyn Codec>>, RegistryError> {
    install(CodecRegistry::global())
}
