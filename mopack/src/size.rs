//! Pre-computed encoded-size upper bounds.
//!
//! These back the `msg_size` side of [`crate::Marshal`]: for any value `v`,
//! the encoder emits at most the bound reported here. Scalars report their
//! widest encoding; length-carrying kinds expose a `const fn` over the
//! payload length.

/// `nil`.
pub const NIL: usize = 1;
/// `true` / `false`.
pub const BOOL: usize = 1;
/// Any signed integer (prefix + 8 bytes).
pub const INT: usize = 9;
/// Any unsigned integer (prefix + 8 bytes).
pub const UINT: usize = 9;
/// `float32`.
pub const FLOAT32: usize = 5;
/// `float64`.
pub const FLOAT64: usize = 9;
/// A complex number of two `f32` components (fixext8).
pub const COMPLEX32: usize = 10;
/// A complex number of two `f64` components (fixext16).
pub const COMPLEX64: usize = 18;
/// A timestamp (fixext8).
pub const TIME: usize = 10;
/// The widest map header (`map32`).
pub const MAP_HEADER: usize = 5;
/// The widest array header (`array32`).
pub const ARRAY_HEADER: usize = 5;
/// The widest string header (`str32`).
pub const STR_HEADER: usize = 5;
/// The widest bin header (`bin32`).
pub const BIN_HEADER: usize = 5;
/// The widest extension header (`ext32`: prefix + length + type id).
pub const EXT_HEADER: usize = 6;

/// Upper bound for a string of `len` bytes.
pub const fn str_size(len: usize) -> usize {
    STR_HEADER + len
}

/// Upper bound for a bin of `len` bytes.
pub const fn bin_size(len: usize) -> usize {
    BIN_HEADER + len
}

/// Upper bound for an extension of `len` payload bytes.
pub const fn ext_size(len: usize) -> usize {
    EXT_HEADER + len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_widest_encodings() {
        // prefix + u64 BE
        assert_eq!(UINT, 1 + 8);
        // str32: prefix + u32 length
        assert_eq!(str_size(0), 5);
        // ext32: prefix + u32 length + i8 type
        assert_eq!(ext_size(16), 22);
    }
}
