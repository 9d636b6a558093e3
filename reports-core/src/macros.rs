//! Utility macros for reducing boilerplate

/// Declare a fieldless enum that travels on the wire.
///
/// Each variant carries a stable one-byte tag for the binary stream form and
/// a stable string for the structured-text form. The macro generates the
/// enum, tag/string conversions, `Display`, and a [`StreamCodec`] impl.
///
/// # Example
/// ```ignore
/// wire_enum! {
///     /// Output format of a generated report.
///     pub enum FileFormat {
///         Pdf = (0, "Pdf"),
///         Csv = (1, "Csv"),
///     }
/// }
/// ```
///
/// [`StreamCodec`]: crate::codec::StreamCodec
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = ($tag:literal, $text:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in tag order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn tag(&self) -> u8 {
                match self {
                    $($name::$variant => $tag),+
                }
            }

            pub fn from_tag(tag: u8) -> Option<Self> {
                match tag {
                    $($tag => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn parse(text: &str) -> Option<Self> {
                match text {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Parse the structured-text form of this enum.
            pub fn from_document_value(
                field: &'static str,
                value: &::serde_json::Value,
            ) -> $crate::error::CodecResult<Self> {
                let text = $crate::codec::document::expect_string(value)?;
                Self::parse(&text).ok_or_else(|| $crate::error::CodecError::InvalidValue {
                    field,
                    reason: format!("unknown {} '{}'", stringify!($name), text),
                })
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $crate::codec::StreamCodec for $name {
            fn write_to(&self, out: &mut $crate::codec::StreamOutput) {
                out.write_u8(self.tag());
            }

            fn read_from(
                input: &mut $crate::codec::StreamInput<'_>,
            ) -> $crate::error::CodecResult<Self> {
                let tag = input.read_u8(stringify!($name))?;
                Self::from_tag(tag).ok_or($crate::error::CodecError::InvalidTag {
                    kind: stringify!($name),
                    tag,
                })
            }
        }
    };
}
