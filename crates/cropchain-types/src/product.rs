use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique key naming one tracked product instance.
///
/// The identifier is chosen by the caller at creation time and never changes
/// afterwards. It is also the backing-ledger key under which the product's
/// current snapshot and history live.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductId({})", self.0)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Current snapshot of a tracked product.
///
/// Field names on the wire are fixed and every field is required on decode:
/// `ID`, `type`, `farmer`, `owner`, `timestamp`, `marketPriceHash`,
/// `certificationIPFSHash`. The two hash fields are opaque references and are
/// never interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "ID")]
    pub id: ProductId,
    /// Category tag (e.g. "grain").
    #[serde(rename = "type")]
    pub product_type: String,
    /// Original producer identity. Set once at creation.
    pub farmer: String,
    /// Current holder identity.
    pub owner: String,
    /// Seconds since the UNIX epoch of the creation or last custody transfer.
    pub timestamp: i64,
    #[serde(rename = "marketPriceHash")]
    pub market_price_hash: String,
    #[serde(rename = "certificationIPFSHash")]
    pub certification_ipfs_hash: String,
}

impl Product {
    /// A freshly issued product: the producer is its first holder.
    pub fn issue(
        id: ProductId,
        product_type: impl Into<String>,
        farmer: impl Into<String>,
        market_price_hash: impl Into<String>,
        certification_ipfs_hash: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        let farmer = farmer.into();
        Self {
            id,
            product_type: product_type.into(),
            owner: farmer.clone(),
            farmer,
            timestamp,
            market_price_hash: market_price_hash.into(),
            certification_ipfs_hash: certification_ipfs_hash.into(),
        }
    }

    /// Record carrying only the identifier, used for tombstoned history rows.
    pub fn placeholder(id: ProductId) -> Self {
        Self {
            id,
            product_type: String::new(),
            farmer: String::new(),
            owner: String::new(),
            timestamp: 0,
            market_price_hash: String::new(),
            certification_ipfs_hash: String::new(),
        }
    }

    /// Returns `true` if every field except the identifier is empty.
    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder(self.id.clone())
    }

    /// Copy of this record handed to `new_owner` at `timestamp`.
    ///
    /// The timestamp never moves backwards: a `timestamp` earlier than the
    /// current one is clamped to the current one.
    pub fn transferred(&self, new_owner: impl Into<String>, timestamp: i64) -> Self {
        Self {
            owner: new_owner.into(),
            timestamp: timestamp.max(self.timestamp),
            ..self.clone()
        }
    }
}
