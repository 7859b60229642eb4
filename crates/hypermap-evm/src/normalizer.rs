//! Converts alloy-core `DynSolValue` → Hypermap `ParamValue`.

use alloy_core::dyn_abi::DynSolValue;
use hypermap_core::event::ParamValue;
use hypermap_core::serde_hex::to_hex;

/// Convert a decoded `DynSolValue` into a [`ParamValue`].
///
/// Only the types Hypermap events declare have a mapping; anything else
/// normalizes to `Null`.
pub fn normalize(val: DynSolValue) -> ParamValue {
    match val {
        DynSolValue::Address(a) => ParamValue::Address(format!("{a:#x}")),
        DynSolValue::FixedBytes(word, size) => ParamValue::Hash(to_hex(&word[..size.min(32)])),
        DynSolValue::Bytes(b) => ParamValue::Bytes(b),
        DynSolValue::String(s) => ParamValue::Bytes(s.into_bytes()),
        // Decimal avoids precision loss for 256-bit ids
        DynSolValue::Uint(u, _) => ParamValue::Uint(u.to_string()),
        _ => ParamValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, U256};

    #[test]
    fn address_is_lowercase_hex() {
        let addr: Address = "0xD8dA6BF26964aF9D7eEd9e03E53415D37aA96045".parse().unwrap();
        assert_eq!(
            normalize(DynSolValue::Address(addr)),
            ParamValue::Address("0xd8da6bf26964af9d7eed9e03e53415d37aa96045".into())
        );
    }

    #[test]
    fn fixed_bytes_become_hash() {
        let word = B256::repeat_byte(0xab);
        match normalize(DynSolValue::FixedBytes(word, 32)) {
            ParamValue::Hash(h) => assert_eq!(h, format!("0x{}", "ab".repeat(32))),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn uint_is_decimal() {
        let big = U256::MAX;
        assert_eq!(
            normalize(DynSolValue::Uint(big, 256)),
            ParamValue::Uint(big.to_string())
        );
    }

    #[test]
    fn unsupported_is_null() {
        assert!(normalize(DynSolValue::Bool(true)).is_null());
    }
}
