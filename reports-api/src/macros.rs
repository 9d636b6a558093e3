//! Utility macros for reducing boilerplate

/// Declare a transport message that carries exactly one validated id.
///
/// Generates the struct, a validating `new`, `from_document_with_id` (the
/// supplied id is a default that a body field overrides), and both codec
/// impls. The binary form is the bare string.
///
/// # Example
/// ```ignore
/// id_message! {
///     /// Fetch one report instance.
///     GetReportInstanceRequest { report_instance_id: "reportInstanceId" }
/// }
/// ```
#[macro_export]
macro_rules! id_message {
    (
        $(#[$meta:meta])*
        $name:ident { $field:ident : $json:literal }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub $field: String,
        }

        impl $name {
            /// Structured-text field holding the id.
            pub const ID_FIELD: &'static str = $json;

            pub fn new(id: impl Into<String>) -> Result<Self, ::reports_core::ValidationError> {
                let id = id.into();
                ::reports_core::validate_id($json, &id)?;
                Ok(Self { $field: id })
            }

            pub fn from_document_with_id(
                doc: &::serde_json::Value,
                use_id: Option<&str>,
            ) -> ::reports_core::CodecResult<Self> {
                let mut id = use_id.map(str::to_string);
                for (field, value) in ::reports_core::codec::document::expect_object(doc)? {
                    match field.as_str() {
                        $json => id = Some(::reports_core::codec::document::expect_string(value)?),
                        _ => ::reports_core::codec::skip_unknown_field(stringify!($name), field),
                    }
                }
                let id = ::reports_core::codec::document::require($json, id)?;
                Ok(Self {
                    $field: $crate::actions::checked_id($json, id)?,
                })
            }
        }

        impl ::reports_core::StreamCodec for $name {
            fn write_to(&self, out: &mut ::reports_core::StreamOutput) {
                out.write_string(&self.$field);
            }

            fn read_from(
                input: &mut ::reports_core::StreamInput<'_>,
            ) -> ::reports_core::CodecResult<Self> {
                let id = input.read_string($json)?;
                Ok(Self {
                    $field: $crate::actions::checked_id($json, id)?,
                })
            }
        }

        impl ::reports_core::DocumentCodec for $name {
            fn to_document(&self) -> ::serde_json::Value {
                ::reports_core::codec::DocumentBuilder::new(false)
                    .field($json, self.$field.as_str())
                    .build()
            }

            fn from_document(doc: &::serde_json::Value) -> ::reports_core::CodecResult<Self> {
                Self::from_document_with_id(doc, None)
            }
        }
    };
}

/// Declare a paged list request with `fromIndex` / `maxItems`.
#[macro_export]
macro_rules! page_request {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            pub from_index: u64,
            pub max_items: u32,
        }

        impl $name {
            pub fn new(
                from_index: u64,
                max_items: u32,
            ) -> Result<Self, ::reports_core::ValidationError> {
                $crate::actions::check_max_items(max_items)?;
                Ok(Self {
                    from_index,
                    max_items,
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    from_index: 0,
                    max_items: ::reports_core::DEFAULT_ITEMS_QUERY_COUNT,
                }
            }
        }

        impl ::reports_core::StreamCodec for $name {
            fn write_to(&self, out: &mut ::reports_core::StreamOutput) {
                out.write_vlong(self.from_index);
                out.write_vint(self.max_items);
            }

            fn read_from(
                input: &mut ::reports_core::StreamInput<'_>,
            ) -> ::reports_core::CodecResult<Self> {
                let from_index = input.read_vlong($crate::actions::FROM_INDEX_FIELD)?;
                let max_items = input.read_vint($crate::actions::MAX_ITEMS_FIELD)?;
                $crate::actions::checked_page(from_index, max_items)
                    .map(|(from_index, max_items)| Self {
                        from_index,
                        max_items,
                    })
            }
        }

        impl ::reports_core::DocumentCodec for $name {
            fn to_document(&self) -> ::serde_json::Value {
                ::reports_core::codec::DocumentBuilder::new(false)
                    .field($crate::actions::FROM_INDEX_FIELD, self.from_index)
                    .field($crate::actions::MAX_ITEMS_FIELD, self.max_items)
                    .build()
            }

            fn from_document(doc: &::serde_json::Value) -> ::reports_core::CodecResult<Self> {
                let (from_index, max_items) = $crate::actions::parse_page(stringify!($name), doc)?;
                Ok(Self {
                    from_index,
                    max_items,
                })
            }
        }
    };
}
