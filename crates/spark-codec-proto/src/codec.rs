use std::sync::Arc;

use bytes::Buf;
use spark_buffer::{BufferPool, SlabBufferPool};
use spark_codecs::{Codec, CodecError, EncodeError, EncodedMessage, MessageTier, ProtoMessage};

use crate::{
    PROTO_CODEC_NAME,
    classify::{Classified, classify, classify_mut},
    config::ProtoCodecConfig,
};

/// `ProtoCodec` 是按 protobuf 线格式工作的 [`Codec`] 实现。
///
/// # 设计初衷（Why）
/// - RPC 热路径上每个请求都要序列化与反序列化一次，频繁分配大块内存会放大 GC 压力与尾延迟，
///   因此大消息从缓冲池租借输出缓冲，小消息则直接分配，避免池操作的固定开销得不偿失；
/// - 同一进程内往往混用多代生成代码，编解码器按能力分级回退，而不是要求所有消息实现同一接口。
///
/// # 行为逻辑（How）
/// - **序列化**：分类 -> 计算精确尺寸 -> 尺寸低于阈值时编码进一次性 `Vec`，否则租借容量不小于
///   尺寸的池化缓冲并原地编码；
/// - **反序列化**：先分类目标（不受支持的类型不会触碰缓冲池），再把可能分段的输入拷贝进一块
///   连续的池化缓冲，最后解码。该缓冲在所有退出路径上归还。
///
/// # 契约说明（What）
/// - **线程安全**：不持有调用间可变状态，可被任意线程并发调用；
/// - **池占用**：每次调用至多租借一次，且在返回前（反序列化）或在调用方释放输出时（序列化）归还；
/// - **错误**：编码失败时已租借的缓冲先归还再返回错误；反序列化失败后目标可能已被部分修改。
///
/// # 风险提示（Trade-offs）
/// - 反序列化总会多一次拷贝以获得连续输入，换来的是对分段接收缓冲的统一支持；
/// - 池化输出的生命周期由调用方掌控，长时间持有会让池内闲置容量下降。
#[derive(Clone)]
pub struct ProtoCodec {
    pool: Arc<dyn BufferPool>,
    config: ProtoCodecConfig,
}

impl ProtoCodec {
    /// 使用默认配置与进程级共享池创建编解码器。
    pub fn new() -> Self {
        Self::with_config(ProtoCodecConfig::default())
    }

    /// 使用指定配置与进程级共享池创建编解码器。
    pub fn with_config(config: ProtoCodecConfig) -> Self {
        Self::with_pool(config, Arc::new(SlabBufferPool::shared()))
    }

    /// 使用指定配置与独立缓冲池创建编解码器。
    pub fn with_pool(config: ProtoCodecConfig, pool: Arc<dyn BufferPool>) -> Self {
        Self { pool, config }
    }

    /// 当前配置。
    pub fn config(&self) -> &ProtoCodecConfig {
        &self.config
    }

    /// 使用中的缓冲池。
    pub fn pool(&self) -> &Arc<dyn BufferPool> {
        &self.pool
    }

    fn encode(&self, classified: &Classified<'_>) -> Result<EncodedMessage, EncodeError> {
        let size = classified.encoded_len()?;
        if !self.config.should_pool(size) {
            return classified.encode_to_vec(size).map(EncodedMessage::transient);
        }
        let mut buffer = self.pool.acquire(size);
        classified.encode_into(&mut buffer, size)?;
        Ok(EncodedMessage::pooled(buffer))
    }
}

impl Default for ProtoCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProtoCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtoCodec")
            .field("config", &self.config)
            .field("pool", &self.pool.statistics())
            .finish()
    }
}

impl Codec for ProtoCodec {
    fn name(&self) -> &'static str {
        PROTO_CODEC_NAME
    }

    fn marshal(&self, message: &dyn ProtoMessage) -> Result<EncodedMessage, CodecError> {
        let classified = classify(message).map_err(|err| log_failure(err, None))?;
        self.encode(&classified).map_err(|source| {
            log_failure(
                CodecError::MarshalFailure {
                    type_name: message.type_name(),
                    tier: classified.tier(),
                    source,
                },
                None,
            )
        })
    }

    fn unmarshal(
        &self,
        data: &mut dyn Buf,
        message: &mut dyn ProtoMessage,
    ) -> Result<(), CodecError> {
        let payload_size = data.remaining();
        let type_name = message.type_name();
        let mut target =
            classify_mut(message).map_err(|err| log_failure(err, Some(payload_size)))?;
        let tier = target.tier();

        let flat = self.pool.materialize(data);
        let outcome = target.decode(flat.as_slice());
        drop(flat);

        outcome.map_err(|source| {
            log_failure(
                CodecError::UnmarshalFailure {
                    type_name,
                    tier,
                    source,
                },
                Some(payload_size),
            )
        })
    }
}

fn log_failure(err: CodecError, payload_size: Option<usize>) -> CodecError {
    tracing::debug!(
        codec.tier = err.tier().map(MessageTier::as_str),
        message.type_name = err.type_name(),
        error.code = err.code(),
        payload.size = payload_size,
        error = %err,
        "proto codec call failed"
    );
    err
}
