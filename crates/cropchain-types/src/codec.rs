//! Strict JSON codec for [`Product`] records.
//!
//! Every field is required on decode. A missing field, a `null`, or a value
//! of the wrong type is a [`TypeError::Decode`]; nothing is defaulted.
//! Unknown extra fields are ignored.

use crate::error::TypeError;
use crate::product::Product;

/// Serialize a product into the bytes stored on the backing ledger.
pub fn encode(product: &Product) -> Result<Vec<u8>, TypeError> {
    serde_json::to_vec(product).map_err(|e| TypeError::Encode(e.to_string()))
}

/// Deserialize stored bytes back into a product.
pub fn decode(bytes: &[u8]) -> Result<Product, TypeError> {
    serde_json::from_slice(bytes).map_err(|e| TypeError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::ProductId;
    use proptest::prelude::*;

    fn sample() -> Product {
        Product::issue(
            ProductId::from("P1"),
            "grain",
            "farmerA",
            "priceHash1",
            "certHash1",
            1_700_000_000,
        )
    }

    #[test]
    fn roundtrip_sample() {
        let bytes = encode(&sample()).unwrap();
        assert_eq!(decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn decodes_chaincode_layout() {
        let raw = br#"{"ID":"P2","type":"rice","farmer":"f","owner":"o","timestamp":12,"marketPriceHash":"m","certificationIPFSHash":"c"}"#;
        let p = decode(raw).unwrap();
        assert_eq!(p.id.as_str(), "P2");
        assert_eq!(p.product_type, "rice");
        assert_eq!(p.owner, "o");
        assert_eq!(p.timestamp, 12);
    }

    #[test]
    fn missing_field_is_rejected() {
        let raw = br#"{"ID":"P2","type":"rice","farmer":"f","owner":"o","timestamp":12,"marketPriceHash":"m"}"#;
        let err = decode(raw).unwrap_err();
        assert!(matches!(err, TypeError::Decode(msg) if msg.contains("certificationIPFSHash")));
    }

    #[test]
    fn null_field_is_rejected() {
        let raw = br#"{"ID":"P2","type":null,"farmer":"f","owner":"o","timestamp":12,"marketPriceHash":"m","certificationIPFSHash":"c"}"#;
        assert!(decode(raw).is_err());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let raw = br#"{"ID":"P2","type":"rice","farmer":"f","owner":"o","timestamp":"noon","marketPriceHash":"m","certificationIPFSHash":"c"}"#;
        assert!(decode(raw).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode(b"\x00\x01not json").is_err());
        assert!(decode(b"").is_err());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let raw = br#"{"ID":"P2","type":"rice","farmer":"f","owner":"o","timestamp":12,"marketPriceHash":"m","certificationIPFSHash":"c","extra":true}"#;
        assert!(decode(raw).is_ok());
    }

    proptest! {
        #[test]
        fn roundtrip_any_fields(
            id in ".*",
            product_type in ".*",
            farmer in ".*",
            owner in ".*",
            timestamp in any::<i64>(),
            price in ".*",
            cert in ".*",
        ) {
            let product = Product {
                id: ProductId::new(id),
                product_type,
                farmer,
                owner,
                timestamp,
                market_price_hash: price,
                certification_ipfs_hash: cert,
            };
            let bytes = encode(&product).unwrap();
            prop_assert_eq!(decode(&bytes).unwrap(), product);
        }
    }
}
