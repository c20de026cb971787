use bytes::BufMut;

use crate::{
    error::{DecodeError, EncodeError},
    message::{LegacyMessage, StandardEncode, StandardMessage},
};

/// `LegacyAdapter` 把只读的遗留消息包装成标准消息的编码侧。
///
/// # 设计初衷（Why）
/// - 遗留运行时报告 `u64` 尺寸，编解码器希望所有非原生消息走同一条
///   “尺寸 + 追加写入”路径，因此在入口处做一次转换；
/// - 转换本身可能失败（尺寸超出平台可寻址范围），失败需作为序列化错误上报。
///
/// # 行为逻辑（How）
/// - [`Self::checked_len`] 把 `u64` 尺寸转换为 `usize`，溢出时返回 [`EncodeError::SizeOverflow`]；
/// - [`StandardEncode::encode_message`] 先确认目标剩余空间容得下报告的尺寸，再让遗留消息
///   直接写入目标，不经过中间缓冲。
pub struct LegacyAdapter<'a> {
    legacy: &'a dyn LegacyMessage,
}

impl<'a> LegacyAdapter<'a> {
    /// 包装遗留消息。
    pub fn new(legacy: &'a dyn LegacyMessage) -> Self {
        Self { legacy }
    }

    /// 带溢出检查的序列化尺寸。
    pub fn checked_len(&self) -> Result<usize, EncodeError> {
        let size = self.legacy.compute_size();
        usize::try_from(size).map_err(|_| EncodeError::SizeOverflow { size })
    }
}

impl StandardEncode for LegacyAdapter<'_> {
    fn message_len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    fn encode_message(&self, buf: &mut dyn BufMut) -> Result<(), EncodeError> {
        let required = self.checked_len()?;
        let remaining = buf.remaining_mut();
        if remaining < required {
            return Err(EncodeError::InsufficientCapacity {
                required,
                remaining,
            });
        }
        self.legacy.write_to(buf)
    }
}

/// 可变版本的遗留适配器，补齐解码侧能力。
pub struct LegacyAdapterMut<'a> {
    legacy: &'a mut dyn LegacyMessage,
}

impl<'a> LegacyAdapterMut<'a> {
    /// 包装可变遗留消息。
    pub fn new(legacy: &'a mut dyn LegacyMessage) -> Self {
        Self { legacy }
    }
}

impl StandardEncode for LegacyAdapterMut<'_> {
    fn message_len(&self) -> usize {
        LegacyAdapter::new(&*self.legacy).message_len()
    }

    fn encode_message(&self, buf: &mut dyn BufMut) -> Result<(), EncodeError> {
        LegacyAdapter::new(&*self.legacy).encode_message(buf)
    }
}

impl StandardMessage for LegacyAdapterMut<'_> {
    fn merge_message(&mut self, src: &[u8]) -> Result<(), DecodeError> {
        self.legacy.merge_from_bytes(src)
    }

    fn clear_message(&mut self) {
        self.legacy.reset();
    }
}
