use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::Arc;

/// Opaque identifier of a catalog product.
///
/// The catalog sends ids either as JSON strings or as JSON numbers; both
/// deserialize to the same textual form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProductId(Arc<str>);

impl ProductId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        ProductId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        ProductId::new(id)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        ProductId::new(id)
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(ProductId::from(s)),
            serde_json::Value::Number(n) => Ok(ProductId::from(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected a string or number product id, got {other}"
            ))),
        }
    }
}

/// A product as described by the catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct Product {
    id: ProductId,
    name: String,
    price: Decimal,
    available: bool,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, price: Decimal, available: bool) -> Self {
        Product {
            id,
            name: name.into(),
            price,
            available,
        }
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}

/// Wire format of the product details endpoint.
#[derive(Deserialize, Debug)]
pub(crate) struct ProductRecord {
    id: ProductId,
    name: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    price: Decimal,
    availability: bool,
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        Product::new(record.id, record.name, record.price, record.availability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_ids_from_strings_and_numbers() {
        let ids: Vec<ProductId> = serde_json::from_str(r#"["2", 3, "abc", 40]"#).unwrap();
        let ids: Vec<&str> = ids.iter().map(ProductId::as_str).collect();
        assert_eq!(ids, vec!["2", "3", "abc", "40"]);
    }

    #[test]
    fn test_product_record_keeps_exact_price() {
        let record: ProductRecord = serde_json::from_str(
            r#"{"id":"2","name":"Dress","price":19.99,"availability":true}"#,
        )
        .unwrap();
        let product = Product::from(record);

        assert_eq!(product.id().as_str(), "2");
        assert_eq!(product.name(), "Dress");
        assert_eq!(product.price(), Decimal::from_str("19.99").unwrap());
        assert_eq!(product.price().to_string(), "19.99");
        assert!(product.is_available());
    }

    #[test]
    fn test_product_record_trailing_zeros() {
        let record: ProductRecord = serde_json::from_str(
            r#"{"id":"5","name":"Coat","price":120.50,"availability":false}"#,
        )
        .unwrap();
        assert_eq!(Product::from(record).price().to_string(), "120.50");
    }

    #[test]
    fn test_product_record_missing_field() {
        let result = serde_json::from_str::<ProductRecord>(r#"{"id":"2","name":"Dress"}"#);
        assert!(result.is_err());
    }
}
