//! 消息能力分类：决定一次编解码走原生、标准还是遗留路径。
//!
//! # 教案意图（Why）
//! - 消息以 `dyn ProtoMessage` 传入，编解码器需要在运行时选出唯一一条路径；
//! - 把“选路径”与“执行编码”拆开，使分派顺序集中在一处，便于单独测试。
//!
//! # 契约说明（What）
//! - 优先级固定：原生 > 标准 > 遗留，命中第一项即返回；
//! - 无任何能力时返回 [`CodecError::UnsupportedMessageKind`]；
//! - 分类本身没有副作用，不接触缓冲池。

use bytes::BufMut;
use spark_buffer::PooledBuffer;
use spark_codecs::{
    CodecError, CodecOperation, DecodeError, EncodeError, LegacyAdapter, LegacyAdapterMut,
    MessageTier, NativeCodec, ProtoMessage, StandardEncode, StandardMessage,
};

/// 只读分类结果，用于序列化。
pub enum Classified<'a> {
    /// 原生能力。
    Native(&'a dyn NativeCodec),
    /// 标准消息。
    Standard(&'a dyn StandardMessage),
    /// 经适配的遗留消息。
    Legacy(LegacyAdapter<'a>),
}

/// 可变分类结果，用于反序列化目标。
pub enum ClassifiedMut<'a> {
    /// 原生能力。
    Native(&'a mut dyn NativeCodec),
    /// 标准消息。
    Standard(&'a mut dyn StandardMessage),
    /// 经适配的遗留消息。
    Legacy(LegacyAdapterMut<'a>),
}

/// 按固定优先级找出消息具备的最高能力。
pub fn probe(message: &dyn ProtoMessage) -> Option<MessageTier> {
    if message.as_native().is_some() {
        Some(MessageTier::Native)
    } else if message.as_standard().is_some() {
        Some(MessageTier::Standard)
    } else if message.as_legacy().is_some() {
        Some(MessageTier::Legacy)
    } else {
        None
    }
}

/// 为序列化分类消息。
pub fn classify(message: &dyn ProtoMessage) -> Result<Classified<'_>, CodecError> {
    let classified = match probe(message) {
        Some(MessageTier::Native) => message.as_native().map(Classified::Native),
        Some(MessageTier::Standard) => message.as_standard().map(Classified::Standard),
        Some(MessageTier::Legacy) => message
            .as_legacy()
            .map(|legacy| Classified::Legacy(LegacyAdapter::new(legacy))),
        None => None,
    };
    classified.ok_or_else(|| unsupported(message.type_name(), CodecOperation::Marshal))
}

/// 为反序列化目标分类消息。
///
/// 先用共享访问器确定层级，再只取一次可变访问器，保证返回的可变借用唯一。
pub fn classify_mut(message: &mut dyn ProtoMessage) -> Result<ClassifiedMut<'_>, CodecError> {
    let type_name = message.type_name();
    let classified = match probe(message) {
        Some(MessageTier::Native) => message.as_native_mut().map(ClassifiedMut::Native),
        Some(MessageTier::Standard) => message.as_standard_mut().map(ClassifiedMut::Standard),
        Some(MessageTier::Legacy) => message
            .as_legacy_mut()
            .map(|legacy| ClassifiedMut::Legacy(LegacyAdapterMut::new(legacy))),
        None => None,
    };
    classified.ok_or_else(|| unsupported(type_name, CodecOperation::Unmarshal))
}

fn unsupported(type_name: &'static str, operation: CodecOperation) -> CodecError {
    CodecError::UnsupportedMessageKind {
        type_name,
        operation,
    }
}

impl Classified<'_> {
    /// 选中的能力层级。
    pub fn tier(&self) -> MessageTier {
        match self {
            Classified::Native(_) => MessageTier::Native,
            Classified::Standard(_) => MessageTier::Standard,
            Classified::Legacy(_) => MessageTier::Legacy,
        }
    }

    /// 精确的序列化尺寸；遗留消息的尺寸超出可寻址范围时失败。
    pub fn encoded_len(&self) -> Result<usize, EncodeError> {
        match self {
            Classified::Native(native) => Ok(native.encoded_size()),
            Classified::Standard(standard) => Ok(standard.message_len()),
            Classified::Legacy(adapter) => adapter.checked_len(),
        }
    }

    /// 编码到一次性缓冲。
    pub fn encode_to_vec(&self, size: usize) -> Result<Vec<u8>, EncodeError> {
        let encoded = match self {
            Classified::Native(native) => native.encode_to_new_buffer()?,
            Classified::Standard(standard) => append_into_vec(*standard, size)?,
            Classified::Legacy(adapter) => append_into_vec(adapter, size)?,
        };
        ensure_size(size, encoded.len())?;
        Ok(encoded)
    }

    /// 编码到池化缓冲。
    ///
    /// 原生消息先把缓冲扩展到 `size` 再尾部回填；其余消息追加写入已预留容量的缓冲。
    pub fn encode_into(&self, buffer: &mut PooledBuffer, size: usize) -> Result<(), EncodeError> {
        buffer.clear();
        match self {
            Classified::Native(native) => {
                buffer.resize(size);
                let written = native.encode_to_sized_buffer(&mut buffer[..])?;
                ensure_size(size, written)
            }
            Classified::Standard(standard) => append_into_pooled(*standard, buffer, size),
            Classified::Legacy(adapter) => append_into_pooled(adapter, buffer, size),
        }
    }
}

impl ClassifiedMut<'_> {
    /// 选中的能力层级。
    pub fn tier(&self) -> MessageTier {
        match self {
            ClassifiedMut::Native(_) => MessageTier::Native,
            ClassifiedMut::Standard(_) => MessageTier::Standard,
            ClassifiedMut::Legacy(_) => MessageTier::Legacy,
        }
    }

    /// 从连续字节解码。
    ///
    /// 标准与遗留消息先清空再合并（即“替换”语义）；原生消息的语义由其实现决定。
    pub fn decode(&mut self, src: &[u8]) -> Result<(), DecodeError> {
        match self {
            ClassifiedMut::Native(native) => native.decode_from_slice(src),
            ClassifiedMut::Standard(standard) => replace_with(&mut **standard, src),
            ClassifiedMut::Legacy(adapter) => replace_with(adapter, src),
        }
    }
}

fn append_into_vec<M: StandardEncode + ?Sized>(
    message: &M,
    size: usize,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::with_capacity(size);
    message.encode_message(&mut out)?;
    Ok(out)
}

fn append_into_pooled<M: StandardEncode + ?Sized>(
    message: &M,
    buffer: &mut PooledBuffer,
    size: usize,
) -> Result<(), EncodeError> {
    let writer: &mut dyn BufMut = buffer.writer();
    message.encode_message(writer)?;
    ensure_size(size, buffer.len())
}

fn replace_with<M: StandardMessage + ?Sized>(
    message: &mut M,
    src: &[u8],
) -> Result<(), DecodeError> {
    message.clear_message();
    message.merge_message(src)
}

fn ensure_size(expected: usize, written: usize) -> Result<(), EncodeError> {
    if expected == written {
        Ok(())
    } else {
        Err(EncodeError::SizeMismatch { expected, written })
    }
}
