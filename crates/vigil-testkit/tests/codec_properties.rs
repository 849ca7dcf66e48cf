//! Codec round-trip properties over generated value trees

use proptest::prelude::*;
use vigil_core::codec::{decode, decode_item, encode, encode_item, AttributeWire};
use vigil_core::DynamicValue;
use vigil_testkit::strategies::{arb_dynamic_value, arb_item};

proptest! {
    #[test]
    fn decode_inverts_encode(value in arb_dynamic_value()) {
        let wire = encode(&value).unwrap();
        prop_assert_eq!(decode(&wire).unwrap(), value);
    }

    #[test]
    fn wire_survives_json_transport(value in arb_dynamic_value()) {
        let wire = encode(&value).unwrap();
        let json = serde_json::to_string(&wire).unwrap();
        let parsed: AttributeWire = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(decode(&parsed).unwrap(), value);
    }

    #[test]
    fn items_keep_every_attribute(item in arb_item()) {
        let DynamicValue::Map(map) = item else { unreachable!() };
        let wire = encode_item(&map).unwrap();
        prop_assert_eq!(wire.len(), map.len());
        prop_assert_eq!(decode_item(&wire).unwrap(), map);
    }

    #[test]
    fn integers_use_plain_decimal_strings(n in -1_000_000_000i64..1_000_000_000) {
        let wire = encode(&DynamicValue::from(n)).unwrap();
        prop_assert_eq!(wire, AttributeWire::N(n.to_string()));
    }
}

#[test]
fn null_is_an_explicit_marker() {
    assert_eq!(encode(&DynamicValue::Null).unwrap(), AttributeWire::Null(true));
}
