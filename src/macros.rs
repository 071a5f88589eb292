//! # Internal Macros
//!
//! ## zerocopy_accessors!
//!
//! Generates getter and setter methods for zerocopy struct fields that use
//! little-endian wrapper types (U32, U64, I32, F32).
//!
//! ### Usage
//!
//! ```ignore
//! use zerocopy::little_endian::{F32, U32};
//!
//! #[repr(C)]
//! struct Header {
//!     num_rows: U32,
//!     min_value: F32,
//! }
//!
//! impl Header {
//!     zerocopy_accessors! {
//!         num_rows: u32,
//!         min_value: f32,
//!     }
//! }
//!
//! // Generates:
//! // pub fn num_rows(&self) -> u32 { self.num_rows.get() }
//! // pub fn set_num_rows(&mut self, val: u32) { self.num_rows = U32::new(val); }
//! // pub fn min_value(&self) -> f32 { self.min_value.get() }
//! // pub fn set_min_value(&mut self, val: f32) { self.min_value = F32::new(val); }
//! ```

/// Generates getter and setter methods for zerocopy little-endian fields.
#[macro_export]
macro_rules! zerocopy_accessors {
    (@emit $field:ident, $ty:ty, $wrapper:ident) => {
        ::paste::paste! {
            #[inline]
            pub fn $field(&self) -> $ty {
                self.$field.get()
            }

            #[inline]
            pub fn [<set_ $field>](&mut self, val: $ty) {
                self.$field = ::zerocopy::little_endian::$wrapper::new(val);
            }
        }
    };
    (@impl $field:ident, u32) => {
        $crate::zerocopy_accessors!(@emit $field, u32, U32);
    };
    (@impl $field:ident, u64) => {
        $crate::zerocopy_accessors!(@emit $field, u64, U64);
    };
    (@impl $field:ident, i32) => {
        $crate::zerocopy_accessors!(@emit $field, i32, I32);
    };
    (@impl $field:ident, f32) => {
        $crate::zerocopy_accessors!(@emit $field, f32, F32);
    };
    ($($field:ident : $ty:tt),* $(,)?) => {
        $(
            $crate::zerocopy_accessors!(@impl $field, $ty);
        )*
    };
}
