use alloc::borrow::Cow;
use core::fmt;

use thiserror::Error;

use crate::message::MessageTier;

/// 编解码错误码常量，遵循 `<领域>.<原因>` 命名约定，便于日志检索与告警聚合。
pub mod codes {
    /// 消息不满足任何一种能力集合。
    pub const UNSUPPORTED_MESSAGE_KIND: &str = "codec.unsupported_message_kind";
    /// 序列化阶段失败（尺寸计算、转换或写入）。
    pub const MARSHAL_FAILURE: &str = "codec.marshal_failure";
    /// 反序列化阶段失败（转换、格式错误或截断）。
    pub const UNMARSHAL_FAILURE: &str = "codec.unmarshal_failure";
}

/// 触发错误的编解码方向。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodecOperation {
    /// 消息 -> 字节。
    Marshal,
    /// 字节 -> 消息。
    Unmarshal,
}

impl CodecOperation {
    /// 稳定的小写标识，用于日志字段与错误描述。
    pub const fn as_str(self) -> &'static str {
        match self {
            CodecOperation::Marshal => "marshal",
            CodecOperation::Unmarshal => "unmarshal",
        }
    }
}

impl fmt::Display for CodecOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `CodecError` 是 [`Codec`](crate::Codec) 对外暴露的唯一错误类型。
///
/// # 设计初衷（Why）
/// - 调用方（传输层）需要区分“类型不被支持”这类编程错误与“载荷损坏”这类运行期错误，
///   前者通常意味着注册了错误的编解码器，后者则应映射为协议层的状态码；
/// - 底层能力（原生、标准、遗留）各自的失败原因通过 `source` 链保留，不在此处展开。
///
/// # 契约说明（What）
/// - [`CodecError::UnsupportedMessageKind`] 的描述必须同时包含操作方向与具体类型名；
/// - [`CodecError::code`] 返回稳定错误码，可直接作为指标标签。
#[derive(Debug, Error)]
pub enum CodecError {
    /// 消息不满足任何能力集合。
    #[error(
        "failed to {operation}, message is {type_name}, want NativeCodec, StandardMessage or LegacyMessage"
    )]
    UnsupportedMessageKind {
        /// 被拒绝的消息类型名。
        type_name: &'static str,
        /// 发生拒绝的方向。
        operation: CodecOperation,
    },
    /// 序列化失败，携带底层原因。
    #[error("failed to marshal {type_name} via {tier} path: {source}")]
    MarshalFailure {
        /// 消息类型名。
        type_name: &'static str,
        /// 选中的能力层级。
        tier: MessageTier,
        /// 底层原因。
        #[source]
        source: EncodeError,
    },
    /// 反序列化失败，携带底层原因。
    #[error("failed to unmarshal {type_name} via {tier} path: {source}")]
    UnmarshalFailure {
        /// 目标消息类型名。
        type_name: &'static str,
        /// 选中的能力层级。
        tier: MessageTier,
        /// 底层原因。
        #[source]
        source: DecodeError,
    },
}

impl CodecError {
    /// 返回稳定错误码，取值见 [`codes`]。
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::UnsupportedMessageKind { .. } => codes::UNSUPPORTED_MESSAGE_KIND,
            CodecError::MarshalFailure { .. } => codes::MARSHAL_FAILURE,
            CodecError::UnmarshalFailure { .. } => codes::UNMARSHAL_FAILURE,
        }
    }

    /// 出错消息的类型名。
    pub fn type_name(&self) -> &'static str {
        match self {
            CodecError::UnsupportedMessageKind { type_name, .. }
            | CodecError::MarshalFailure { type_name, .. }
            | CodecError::UnmarshalFailure { type_name, .. } => type_name,
        }
    }

    /// 出错时选中的能力层级；类型不被支持时为 `None`。
    pub fn tier(&self) -> Option<MessageTier> {
        match self {
            CodecError::UnsupportedMessageKind { .. } => None,
            CodecError::MarshalFailure { tier, .. } | CodecError::UnmarshalFailure { tier, .. } => {
                Some(*tier)
            }
        }
    }
}

/// 消息编码阶段的失败原因。
#[derive(Debug, Error)]
pub enum EncodeError {
    /// 目标缓冲剩余空间不足。
    #[error("insufficient buffer capacity: required {required}, remaining {remaining}")]
    InsufficientCapacity {
        /// 需要的字节数。
        required: usize,
        /// 实际可写的字节数。
        remaining: usize,
    },
    /// 实际写入字节数与事先报告的尺寸不一致。
    #[error("message reported size {expected} but wrote {written} bytes")]
    SizeMismatch {
        /// 尺寸计算给出的值。
        expected: usize,
        /// 编码实际写入的值。
        written: usize,
    },
    /// 尺寸超出当前平台可寻址范围。
    #[error("message size {size} exceeds addressable memory")]
    SizeOverflow {
        /// 原始尺寸。
        size: u64,
    },
    /// 消息实现自定义的失败原因。
    #[error("{0}")]
    Message(Cow<'static, str>),
}

impl EncodeError {
    /// 以自定义描述构造错误。
    pub fn message(reason: impl Into<Cow<'static, str>>) -> Self {
        EncodeError::Message(reason.into())
    }
}

impl From<prost::EncodeError> for EncodeError {
    fn from(err: prost::EncodeError) -> Self {
        EncodeError::InsufficientCapacity {
            required: err.required_capacity(),
            remaining: err.remaining(),
        }
    }
}

/// 消息解码阶段的失败原因。
#[derive(Debug, Error)]
pub enum DecodeError {
    /// 输入在字段中途结束。
    #[error("unexpected end of input at offset {offset}")]
    Truncated {
        /// 截断发生的位置。
        offset: usize,
    },
    /// protobuf 线格式错误。
    ///
    /// `prost::DecodeError` 只在 `std` 下实现 `Error`，因此这里只保留其描述，不挂入 `source` 链。
    #[error("malformed protobuf data: {0}")]
    Wire(prost::DecodeError),
    /// 消息实现自定义的失败原因。
    #[error("{0}")]
    Message(Cow<'static, str>),
}

impl DecodeError {
    /// 以自定义描述构造错误。
    pub fn message(reason: impl Into<Cow<'static, str>>) -> Self {
        DecodeError::Message(reason.into())
    }
}

impl From<prost::DecodeError> for DecodeError {
    fn from(err: prost::DecodeError) -> Self {
        DecodeError::Wire(err)
    }
}

/// 注册表操作失败的原因。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// 注册名为空。
    #[error("codec name must not be empty")]
    EmptyName,
}
