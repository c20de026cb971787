use bytes::Buf;

use crate::{encoded::EncodedMessage, error::CodecError, message::ProtoMessage};

/// `Codec` 是 RPC 框架按名称查找并调用的消息编解码入口。
///
/// # 设计初衷（Why）
/// - 传输层只认识“名字 + 两个方法”，具体消息格式由注册的实现决定；
/// - 输入以 `&mut dyn Buf` 表达，允许由多个不连续分段组成的接收缓冲直接传入。
///
/// # 契约说明（What）
/// - **线程安全**：同一实例会被任意数量的线程并发调用；
/// - [`Self::name`] 返回稳定的注册名；
/// - [`Self::marshal`] 成功时返回的 [`EncodedMessage`] 归调用方所有；
/// - [`Self::unmarshal`] 在确认目标类型受支持后消费 `data` 的全部剩余字节；
///   失败后目标的状态不做保证，可能已被部分修改。
pub trait Codec: Send + Sync + 'static {
    /// 注册名。
    fn name(&self) -> &'static str;

    /// 序列化消息。
    fn marshal(&self, message: &dyn ProtoMessage) -> Result<EncodedMessage, CodecError>;

    /// 把 `data` 反序列化进 `message`。
    fn unmarshal(&self, data: &mut dyn Buf, message: &mut dyn ProtoMessage)
    -> Result<(), CodecError>;
}
