//! protobuf 线格式的最小工具集，供手写 [`NativeCodec`](crate::NativeCodec) 实现使用。
//!
//! # 教案意图（Why）
//! - 原生能力要求“先算尺寸、再从尾部向前回填”，标准库与 `prost` 只提供正向写入，
//!   这里补齐反向写入的 varint 与长度前缀字段；
//! - 解码侧提供与之对称的正向读取，截断时报告出错偏移。
//!
//! # 契约说明（What）
//! - 反向写入函数接收“当前写入边界” `offset`，返回写入后的新边界（更小的下标）；
//! - 所有函数在空间不足时返回错误而不是 panic。

use crate::error::{DecodeError, EncodeError};

/// 长度前缀（length-delimited）字段的线类型编号。
pub const WIRE_TYPE_LEN: u8 = 2;

/// varint 字段的线类型编号。
pub const WIRE_TYPE_VARINT: u8 = 0;

/// 组合字段号与线类型得到字段键。
pub const fn field_key(field: u32, wire_type: u8) -> u64 {
    ((field as u64) << 3) | wire_type as u64
}

/// `value` 编码为 varint 后的字节数。
pub const fn varint_len(value: u64) -> usize {
    // 每 7 个有效位占一个字节，0 也占一个字节。
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// 长度前缀字段（键 + 长度 + 载荷）的总字节数。
pub const fn len_delimited_len(field: u32, payload_len: usize) -> usize {
    varint_len(field_key(field, WIRE_TYPE_LEN)) + varint_len(payload_len as u64) + payload_len
}

/// 在 `dst[..offset]` 的末尾写入 varint，返回新的写入边界。
pub fn put_varint_reverse(dst: &mut [u8], offset: usize, value: u64) -> Result<usize, EncodeError> {
    let width = varint_len(value);
    let start = offset
        .checked_sub(width)
        .filter(|_| offset <= dst.len())
        .ok_or(EncodeError::InsufficientCapacity {
            required: width,
            remaining: offset.min(dst.len()),
        })?;
    let mut rest = value;
    for slot in &mut dst[start..offset - 1] {
        *slot = (rest as u8 & 0x7f) | 0x80;
        rest >>= 7;
    }
    dst[offset - 1] = rest as u8;
    Ok(start)
}

/// 在 `dst[..offset]` 的末尾写入原始字节，返回新的写入边界。
pub fn put_slice_reverse(dst: &mut [u8], offset: usize, src: &[u8]) -> Result<usize, EncodeError> {
    let start = offset
        .checked_sub(src.len())
        .filter(|_| offset <= dst.len())
        .ok_or(EncodeError::InsufficientCapacity {
            required: src.len(),
            remaining: offset.min(dst.len()),
        })?;
    dst[start..offset].copy_from_slice(src);
    Ok(start)
}

/// 在 `dst[..offset]` 的末尾写入一个完整的长度前缀字段，返回新的写入边界。
pub fn put_len_delimited_reverse(
    dst: &mut [u8],
    offset: usize,
    field: u32,
    payload: &[u8],
) -> Result<usize, EncodeError> {
    let offset = put_slice_reverse(dst, offset, payload)?;
    let offset = put_varint_reverse(dst, offset, payload.len() as u64)?;
    put_varint_reverse(dst, offset, field_key(field, WIRE_TYPE_LEN))
}

/// 从 `src[offset..]` 读取 varint，返回值与读取后的偏移。
pub fn read_varint(src: &[u8], offset: usize) -> Result<(u64, usize), DecodeError> {
    let mut value = 0u64;
    for (index, byte) in src.iter().enumerate().skip(offset).take(10) {
        let shift = (index - offset) * 7;
        if shift == 63 && *byte > 1 {
            return Err(DecodeError::message("varint overflows 64 bits"));
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok((value, index + 1));
        }
    }
    Err(DecodeError::Truncated { offset: src.len() })
}

/// 从 `src[offset..]` 读取长度前缀载荷，返回载荷切片与读取后的偏移。
pub fn read_len_delimited(src: &[u8], offset: usize) -> Result<(&[u8], usize), DecodeError> {
    let (len, start) = read_varint(src, offset)?;
    let end = usize::try_from(len)
        .ok()
        .and_then(|len| start.checked_add(len))
        .filter(|end| *end <= src.len())
        .ok_or(DecodeError::Truncated { offset: src.len() })?;
    Ok((&src[start..end], end))
}
