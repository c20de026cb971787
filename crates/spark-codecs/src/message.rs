use alloc::vec::Vec;
use core::fmt;

use bytes::BufMut;

use crate::error::{DecodeError, EncodeError};

/// 消息满足的能力层级，同时也是编解码器的分派优先级（自上而下）。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageTier {
    /// 生成代码直接提供的高性能编解码，见 [`NativeCodec`]。
    Native,
    /// 当代 protobuf 运行时的标准消息，见 [`StandardMessage`]。
    Standard,
    /// 旧版运行时的消息，见 [`LegacyMessage`]。
    Legacy,
}

impl MessageTier {
    /// 日志字段使用的稳定标识。
    pub const fn as_str(self) -> &'static str {
        match self {
            MessageTier::Native => "native",
            MessageTier::Standard => "standard",
            MessageTier::Legacy => "legacy",
        }
    }
}

impl fmt::Display for MessageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `ProtoMessage` 是编解码器接受的消息入口，负责声明消息具备哪些能力。
///
/// # 设计初衷（Why）
/// - 编解码器以 `&dyn ProtoMessage` 接收任意消息，运行时才知道其具体类型；
/// - 同一个类型可以同时满足多种能力，分派顺序由编解码器固定，消息只负责“如实申报”。
///
/// # 行为逻辑（How）
/// - 每种能力对应一对访问器（共享 / 可变），默认返回 `None`；
/// - 实现方为自己具备的能力返回 `Some(self)`，通常借助
///   [`impl_proto_message!`](crate::impl_proto_message) 生成。
///
/// # 契约说明（What）
/// - 共享与可变访问器必须成对一致：`as_native().is_some() == as_native_mut().is_some()`，其余能力同理；
/// - [`Self::type_name`] 用于错误与日志，默认取 Rust 类型全名。
pub trait ProtoMessage: Send + Sync {
    /// 原生编解码能力。
    fn as_native(&self) -> Option<&dyn NativeCodec> {
        None
    }

    /// 原生编解码能力（可变）。
    fn as_native_mut(&mut self) -> Option<&mut dyn NativeCodec> {
        None
    }

    /// 标准消息能力。
    fn as_standard(&self) -> Option<&dyn StandardMessage> {
        None
    }

    /// 标准消息能力（可变）。
    fn as_standard_mut(&mut self) -> Option<&mut dyn StandardMessage> {
        None
    }

    /// 遗留消息能力。
    fn as_legacy(&self) -> Option<&dyn LegacyMessage> {
        None
    }

    /// 遗留消息能力（可变）。
    fn as_legacy_mut(&mut self) -> Option<&mut dyn LegacyMessage> {
        None
    }

    /// 用于诊断信息的类型名。
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// `NativeCodec` 描述生成代码直接提供的编解码能力。
///
/// # 契约说明（What）
/// - [`Self::encoded_size`] 返回精确的序列化字节数；
/// - [`Self::encode_to_sized_buffer`] 从 `dst` **尾部**向前写入，返回写入字节数。
///   `dst.len()` 等于 `encoded_size()` 时恰好填满整块；
/// - [`Self::encode_to_new_buffer`] 自行分配并返回序列化结果；
/// - [`Self::decode_from_slice`] 从 `src` 解码进当前实例，“合并”还是“替换”由实现决定，
///   编解码器不会预先清空目标。
pub trait NativeCodec: Send + Sync {
    /// 精确的序列化字节数。
    fn encoded_size(&self) -> usize;

    /// 尾部回填式编码，返回写入的字节数。
    fn encode_to_sized_buffer(&self, dst: &mut [u8]) -> Result<usize, EncodeError>;

    /// 自行分配缓冲完成编码。
    fn encode_to_new_buffer(&self) -> Result<Vec<u8>, EncodeError>;

    /// 从连续字节中解码。
    fn decode_from_slice(&mut self, src: &[u8]) -> Result<(), DecodeError>;
}

/// 标准消息的只读侧：尺寸与编码。
///
/// 拆出只读侧是为了让遗留消息在只持有共享引用时也能被适配成标准形态。
pub trait StandardEncode: Send + Sync {
    /// 精确的序列化字节数。
    fn message_len(&self) -> usize;

    /// 把消息追加写入 `buf`。
    fn encode_message(&self, buf: &mut dyn BufMut) -> Result<(), EncodeError>;
}

/// `StandardMessage` 描述当代 protobuf 运行时消息的最小能力。
///
/// 所有 `prost::Message` 自动满足该契约。
pub trait StandardMessage: StandardEncode {
    /// 将 `src` 合并进当前实例。
    fn merge_message(&mut self, src: &[u8]) -> Result<(), DecodeError>;

    /// 恢复到默认状态。
    fn clear_message(&mut self);
}

impl<M: prost::Message> StandardEncode for M {
    fn message_len(&self) -> usize {
        prost::Message::encoded_len(self)
    }

    fn encode_message(&self, mut buf: &mut dyn BufMut) -> Result<(), EncodeError> {
        prost::Message::encode(self, &mut buf).map_err(EncodeError::from)
    }
}

impl<M: prost::Message> StandardMessage for M {
    fn merge_message(&mut self, src: &[u8]) -> Result<(), DecodeError> {
        prost::Message::merge(self, src).map_err(DecodeError::from)
    }

    fn clear_message(&mut self) {
        prost::Message::clear(self);
    }
}

/// `LegacyMessage` 描述旧版 protobuf 运行时消息的能力。
///
/// # 设计初衷（Why）
/// - 旧运行时以 `u64` 报告尺寸，方法命名与清空语义也与标准消息不同；
/// - 编解码器不直接操作该接口，而是经 [`LegacyAdapter`](crate::LegacyAdapter)
///   转换成标准形态后复用同一条路径。
pub trait LegacyMessage: Send + Sync {
    /// 序列化字节数。
    fn compute_size(&self) -> u64;

    /// 把序列化结果追加到 `out`。
    ///
    /// 调用方保证 `out` 至少还能写入 `compute_size()` 字节。
    fn write_to(&self, out: &mut dyn BufMut) -> Result<(), EncodeError>;

    /// 将 `data` 合并进当前实例。
    fn merge_from_bytes(&mut self, data: &[u8]) -> Result<(), DecodeError>;

    /// 恢复到默认状态。
    fn reset(&mut self);
}
