use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of travel recorded for a custody transfer.
///
/// Carried for observability only: shipping and receiving run the same
/// transfer and persist the same record shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustodyEvent {
    /// The product left its holder on the way to `new_owner`.
    Shipped,
    /// `new_owner` took delivery of the product.
    Received,
}

impl fmt::Display for CustodyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shipped => write!(f, "shipped"),
            Self::Received => write!(f, "received"),
        }
    }
}
