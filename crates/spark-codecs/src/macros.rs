/// 为消息类型生成 [`ProtoMessage`](crate::ProtoMessage) 实现。
///
/// 冒号后列出该类型具备的能力（`native`、`standard`、`legacy`，顺序任意），
/// 宏为每项能力生成一对返回 `Some(self)` 的访问器，其余能力保持默认的 `None`。
///
/// ```
/// use spark_codecs::impl_proto_message;
///
/// #[derive(Clone, PartialEq, prost::Message)]
/// struct Ping {
///     #[prost(uint64, tag = "1")]
///     seq: u64,
/// }
///
/// impl_proto_message!(Ping: standard);
///
/// let ping = Ping { seq: 7 };
/// assert!(spark_codecs::ProtoMessage::as_standard(&ping).is_some());
/// ```
#[macro_export]
macro_rules! impl_proto_message {
    (@tier native) => {
        fn as_native(&self) -> ::core::option::Option<&dyn $crate::NativeCodec> {
            ::core::option::Option::Some(self)
        }

        fn as_native_mut(&mut self) -> ::core::option::Option<&mut dyn $crate::NativeCodec> {
            ::core::option::Option::Some(self)
        }
    };
    (@tier standard) => {
        fn as_standard(&self) -> ::core::option::Option<&dyn $crate::StandardMessage> {
            ::core::option::Option::Some(self)
        }

        fn as_standard_mut(&mut self) -> ::core::option::Option<&mut dyn $crate::StandardMessage> {
            ::core::option::Option::Some(self)
        }
    };
    (@tier legacy) => {
        fn as_legacy(&self) -> ::core::option::Option<&dyn $crate::LegacyMessage> {
            ::core::option::Option::Some(self)
        }

        fn as_legacy_mut(&mut self) -> ::core::option::Option<&mut dyn $crate::LegacyMessage> {
            ::core::option::Option::Some(self)
        }
    };
    ($ty:ty : $($tier:ident),+ $(,)?) => {
        impl $crate::ProtoMessage for $ty {
            $( $crate::impl_proto_message!(@tier $tier); )+
        }
    };
}
