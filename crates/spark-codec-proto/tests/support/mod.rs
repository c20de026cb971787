//! 集成测试共享的消息类型。
//!
//! - [`StringValue`]：`prost` 生成风格的标准消息；
//! - [`NativeString`]：借助 `spark_codecs::wire` 手写尾部回填编码的原生消息；
//! - [`LegacyString`]：只暴露遗留接口的消息；
//! - [`Instrumented`]：可按需打开三种能力并统计各路径调用次数，用于验证分派优先级。
//!
//! 三者的线格式一致（字段 1 为字符串），因此可以交叉解码。

#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use bytes::BufMut;
use spark_buffer::SlabBufferPool;
use spark_codec_proto::{ProtoCodec, ProtoCodecConfig};
use spark_codecs::{
    DecodeError, EncodeError, LegacyMessage, NativeCodec, ProtoMessage, StandardEncode,
    StandardMessage, impl_proto_message, wire,
};

#[derive(Clone, PartialEq, prost::Message)]
pub struct StringValue {
    #[prost(string, tag = "1")]
    pub value: String,
}

impl_proto_message!(StringValue: standard);

impl StringValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NativeString {
    pub value: String,
}

impl NativeString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl NativeCodec for NativeString {
    fn encoded_size(&self) -> usize {
        string_field_len(&self.value)
    }

    fn encode_to_sized_buffer(&self, dst: &mut [u8]) -> Result<usize, EncodeError> {
        encode_string_field(&self.value, dst)
    }

    fn encode_to_new_buffer(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = vec![0u8; self.encoded_size()];
        self.encode_to_sized_buffer(&mut out)?;
        Ok(out)
    }

    fn decode_from_slice(&mut self, src: &[u8]) -> Result<(), DecodeError> {
        self.value = decode_string_field(src)?;
        Ok(())
    }
}

impl_proto_message!(NativeString: native);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LegacyString {
    pub inner: StringValue,
}

impl LegacyString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: StringValue::new(value),
        }
    }
}

impl LegacyMessage for LegacyString {
    fn compute_size(&self) -> u64 {
        prost::Message::encoded_len(&self.inner) as u64
    }

    fn write_to(&self, mut out: &mut dyn BufMut) -> Result<(), EncodeError> {
        prost::Message::encode(&self.inner, &mut out).map_err(EncodeError::from)
    }

    fn merge_from_bytes(&mut self, data: &[u8]) -> Result<(), DecodeError> {
        prost::Message::merge(&mut self.inner, data).map_err(DecodeError::from)
    }

    fn reset(&mut self) {
        prost::Message::clear(&mut self.inner);
    }
}

impl_proto_message!(LegacyString: legacy);

/// 每条路径的调用计数。
#[derive(Debug, Default)]
pub struct TierHits {
    pub native: AtomicUsize,
    pub standard: AtomicUsize,
    pub legacy: AtomicUsize,
}

impl TierHits {
    pub fn snapshot(&self) -> [usize; 3] {
        [
            self.native.load(Ordering::Relaxed),
            self.standard.load(Ordering::Relaxed),
            self.legacy.load(Ordering::Relaxed),
        ]
    }
}

/// 可配置能力集合的消息，每次编码或解码都会在对应计数上加一。
pub struct Instrumented {
    pub value: String,
    pub native: bool,
    pub standard: bool,
    pub legacy: bool,
    pub hits: Arc<TierHits>,
}

impl Instrumented {
    pub fn new(value: &str, native: bool, standard: bool, legacy: bool) -> Self {
        Self {
            value: value.to_owned(),
            native,
            standard,
            legacy,
            hits: Arc::new(TierHits::default()),
        }
    }

    fn hit(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl NativeCodec for Instrumented {
    fn encoded_size(&self) -> usize {
        string_field_len(&self.value)
    }

    fn encode_to_sized_buffer(&self, dst: &mut [u8]) -> Result<usize, EncodeError> {
        Self::hit(&self.hits.native);
        encode_string_field(&self.value, dst)
    }

    fn encode_to_new_buffer(&self) -> Result<Vec<u8>, EncodeError> {
        Self::hit(&self.hits.native);
        let mut out = vec![0u8; string_field_len(&self.value)];
        encode_string_field(&self.value, &mut out)?;
        Ok(out)
    }

    fn decode_from_slice(&mut self, src: &[u8]) -> Result<(), DecodeError> {
        Self::hit(&self.hits.native);
        self.value = decode_string_field(src)?;
        Ok(())
    }
}

impl StandardEncode for Instrumented {
    fn message_len(&self) -> usize {
        string_field_len(&self.value)
    }

    fn encode_message(&self, buf: &mut dyn BufMut) -> Result<(), EncodeError> {
        Self::hit(&self.hits.standard);
        let mut scratch = vec![0u8; string_field_len(&self.value)];
        encode_string_field(&self.value, &mut scratch)?;
        buf.put_slice(&scratch);
        Ok(())
    }
}

impl StandardMessage for Instrumented {
    fn merge_message(&mut self, src: &[u8]) -> Result<(), DecodeError> {
        Self::hit(&self.hits.standard);
        self.value = decode_string_field(src)?;
        Ok(())
    }

    fn clear_message(&mut self) {
        self.value.clear();
    }
}

impl LegacyMessage for Instrumented {
    fn compute_size(&self) -> u64 {
        string_field_len(&self.value) as u64
    }

    fn write_to(&self, out: &mut dyn BufMut) -> Result<(), EncodeError> {
        Self::hit(&self.hits.legacy);
        let mut scratch = vec![0u8; string_field_len(&self.value)];
        encode_string_field(&self.value, &mut scratch)?;
        out.put_slice(&scratch);
        Ok(())
    }

    fn merge_from_bytes(&mut self, data: &[u8]) -> Result<(), DecodeError> {
        Self::hit(&self.hits.legacy);
        self.value = decode_string_field(data)?;
        Ok(())
    }

    fn reset(&mut self) {
        self.value.clear();
    }
}

impl ProtoMessage for Instrumented {
    fn as_native(&self) -> Option<&dyn NativeCodec> {
        self.native.then_some(self as &dyn NativeCodec)
    }

    fn as_native_mut(&mut self) -> Option<&mut dyn NativeCodec> {
        if self.native { Some(self) } else { None }
    }

    fn as_standard(&self) -> Option<&dyn StandardMessage> {
        self.standard.then_some(self as &dyn StandardMessage)
    }

    fn as_standard_mut(&mut self) -> Option<&mut dyn StandardMessage> {
        if self.standard { Some(self) } else { None }
    }

    fn as_legacy(&self) -> Option<&dyn LegacyMessage> {
        self.legacy.then_some(self as &dyn LegacyMessage)
    }

    fn as_legacy_mut(&mut self) -> Option<&mut dyn LegacyMessage> {
        if self.legacy { Some(self) } else { None }
    }
}

/// 不具备任何能力的类型。
pub struct Opaque;

impl ProtoMessage for Opaque {}

/// 报告的尺寸与实际写入不符，或直接编码失败的原生消息。
pub struct Faulty {
    pub reported: usize,
    pub fail: bool,
}

impl NativeCodec for Faulty {
    fn encoded_size(&self) -> usize {
        self.reported
    }

    fn encode_to_sized_buffer(&self, dst: &mut [u8]) -> Result<usize, EncodeError> {
        if self.fail {
            return Err(EncodeError::message("encoder refused"));
        }
        // 只写一半，制造尺寸不符。
        let half = dst.len() / 2;
        let end = dst.len();
        dst[end - half..].fill(0x01);
        Ok(half)
    }

    fn encode_to_new_buffer(&self) -> Result<Vec<u8>, EncodeError> {
        if self.fail {
            return Err(EncodeError::message("encoder refused"));
        }
        Ok(vec![0x01; self.reported / 2])
    }

    fn decode_from_slice(&mut self, _src: &[u8]) -> Result<(), DecodeError> {
        Err(DecodeError::message("decoder refused"))
    }
}

impl_proto_message!(Faulty: native);

/// 字段 1 字符串的编码长度；空串按 proto3 语义不写入。
pub fn string_field_len(value: &str) -> usize {
    if value.is_empty() {
        0
    } else {
        wire::len_delimited_len(1, value.len())
    }
}

fn encode_string_field(value: &str, dst: &mut [u8]) -> Result<usize, EncodeError> {
    if value.is_empty() {
        return Ok(0);
    }
    let end = dst.len();
    let start = wire::put_len_delimited_reverse(dst, end, 1, value.as_bytes())?;
    Ok(end - start)
}

fn decode_string_field(src: &[u8]) -> Result<String, DecodeError> {
    let mut value = String::new();
    let mut offset = 0;
    while offset < src.len() {
        let (key, next) = wire::read_varint(src, offset)?;
        if key != wire::field_key(1, wire::WIRE_TYPE_LEN) {
            return Err(DecodeError::message(format!("unexpected field key {key}")));
        }
        let (payload, next) = wire::read_len_delimited(src, next)?;
        value = String::from_utf8(payload.to_vec())
            .map_err(|_| DecodeError::message("field 1 is not valid UTF-8"))?;
        offset = next;
    }
    Ok(value)
}

/// 构造编码长度恰为 `encoded_len` 的字符串；该长度无法达到时返回 `None`。
pub fn string_with_encoded_len(encoded_len: usize) -> Option<String> {
    if encoded_len == 0 {
        return Some(String::new());
    }
    (1..=wire::varint_len(encoded_len as u64))
        .filter_map(|width| encoded_len.checked_sub(1 + width))
        .find(|len| *len > 0 && 1 + wire::varint_len(*len as u64) + *len == encoded_len)
        .map(|len| "x".repeat(len))
}

/// 使用独立缓冲池的编解码器，统计互不干扰。
pub fn isolated_codec(threshold: usize) -> (ProtoCodec, SlabBufferPool) {
    let pool = SlabBufferPool::new();
    let codec = ProtoCodec::with_pool(
        ProtoCodecConfig::new().with_pooling_threshold(threshold),
        Arc::new(pool.clone()),
    );
    (codec, pool)
}
