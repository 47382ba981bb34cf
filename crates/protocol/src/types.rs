//! Loosely typed entity records carried in domain event `data`.
//!
//! The server owns these shapes, so every field is optional and anything
//! not modelled here is kept in `extra`.

use serde::{Deserialize, Serialize};

/// A customer embedded in bookings, orders and quotes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// The `customer` field: populated, or just the referenced id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomerRef {
    Ref(String),
    Embedded(Customer),
}

impl CustomerRef {
    /// The embedded customer's name. A bare reference has none.
    pub fn name(&self) -> Option<&str> {
        match self {
            CustomerRef::Embedded(c) => c.name.as_deref(),
            CustomerRef::Ref(_) => None,
        }
    }
}

/// A rental booking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_id", default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::customer", skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerRef>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A rental order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_id", default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::customer", skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerRef>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::amount", skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient::amount", skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A quote request or quote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_id", default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub quote_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::customer", skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerRef>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::amount", skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient::amount", skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn pick_name<'a>(customer: &'a Option<CustomerRef>, fallback: &'a Option<String>) -> Option<&'a str> {
    customer
        .as_ref()
        .and_then(CustomerRef::name)
        .filter(|n| !n.trim().is_empty())
        .or(fallback.as_deref())
        .filter(|n| !n.trim().is_empty())
}

fn pick_id<'a>(id: &'a Option<String>, object_id: &'a Option<String>) -> Option<&'a str> {
    id.as_deref()
        .filter(|s| !s.is_empty())
        .or(object_id.as_deref().filter(|s| !s.is_empty()))
}

impl Booking {
    /// Record id from `id`, else `_id`.
    pub fn id(&self) -> Option<&str> {
        pick_id(&self.id, &self.object_id)
    }

    /// Customer display name from `customer.name` or `customerName`.
    pub fn customer_name(&self) -> Option<&str> {
        pick_name(&self.customer, &self.customer_name)
    }
}

impl Order {
    /// Record id from `id`, else `_id`.
    pub fn id(&self) -> Option<&str> {
        pick_id(&self.id, &self.object_id)
    }

    /// Customer display name from `customer.name` or `customerName`.
    pub fn customer_name(&self) -> Option<&str> {
        pick_name(&self.customer, &self.customer_name)
    }

    /// `totalAmount`, else `total`.
    pub fn amount(&self) -> Option<f64> {
        self.total_amount.or(self.total)
    }

    /// Human reference: the order number if present, else the id.
    pub fn reference(&self) -> Option<&str> {
        self.order_number.as_deref().or(self.id())
    }
}

impl Quote {
    /// Record id from `id`, else `_id`.
    pub fn id(&self) -> Option<&str> {
        pick_id(&self.id, &self.object_id)
    }

    /// Customer display name from `customer.name` or `customerName`.
    pub fn customer_name(&self) -> Option<&str> {
        pick_name(&self.customer, &self.customer_name)
    }

    /// `totalAmount`, else `total`.
    pub fn amount(&self) -> Option<f64> {
        self.total_amount.or(self.total)
    }

    /// Human reference: the quote number if present, else the id.
    pub fn reference(&self) -> Option<&str> {
        self.quote_number.as_deref().or(self.id())
    }
}

/// Field decoders that never fail: a value of an unexpected shape becomes
/// `None` instead of rejecting the whole record.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{Customer, CustomerRef};

    /// Strings as-is; numbers and booleans in their JSON text form.
    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    /// Numbers, or numeric strings such as `"1250.50"` or `"$1,250.50"`.
    pub fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let parsed = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s
                .trim()
                .trim_start_matches('$')
                .replace(',', "")
                .parse::<f64>()
                .ok(),
            _ => None,
        };
        Ok(parsed.filter(|v| v.is_finite()))
    }

    /// A populated customer object or an unpopulated reference id.
    pub fn customer<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<CustomerRef>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(CustomerRef::Ref(s)),
            Value::Number(n) => Some(CustomerRef::Ref(n.to_string())),
            obj @ Value::Object(_) => Customer::deserialize(obj).ok().map(CustomerRef::Embedded),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_customer_name_wins() {
        let q: Quote = serde_json::from_value(serde_json::json!({
            "customer": {"name": "Ada"},
            "customerName": "Someone Else"
        }))
        .unwrap();
        assert_eq!(q.customer_name(), Some("Ada"));
    }

    #[test]
    fn flat_customer_name_fallback() {
        let b: Booking =
            serde_json::from_value(serde_json::json!({"customerName": "Grace"})).unwrap();
        assert_eq!(b.customer_name(), Some("Grace"));
    }

    #[test]
    fn blank_name_is_none() {
        let o: Order =
            serde_json::from_value(serde_json::json!({"customer": {"name": "  "}})).unwrap();
        assert_eq!(o.customer_name(), None);
    }

    #[test]
    fn underscore_id_and_total_fallbacks() {
        let o: Order =
            serde_json::from_value(serde_json::json!({"_id": "o-1", "total": 250.5})).unwrap();
        assert_eq!(o.id(), Some("o-1"));
        assert_eq!(o.amount(), Some(250.5));
        assert_eq!(o.reference(), Some("o-1"));
    }

    #[test]
    fn both_id_and_underscore_id() {
        let q: Quote = serde_json::from_value(serde_json::json!({
            "_id": "a",
            "id": "a",
            "customer": {"name": "Ada"},
            "categoryName": "Tents"
        }))
        .unwrap();
        assert_eq!(q.id(), Some("a"));
        assert_eq!(q.customer_name(), Some("Ada"));
        assert_eq!(q.category_name.as_deref(), Some("Tents"));
    }

    #[test]
    fn numeric_id() {
        let o: Order =
            serde_json::from_value(serde_json::json!({"id": 1042, "customerName": "Grace"}))
                .unwrap();
        assert_eq!(o.id(), Some("1042"));
        assert_eq!(o.reference(), Some("1042"));
        assert_eq!(o.customer_name(), Some("Grace"));
    }

    #[test]
    fn unpopulated_customer_reference() {
        let b: Booking = serde_json::from_value(serde_json::json!({
            "customer": "64ab12",
            "customerName": "Lin"
        }))
        .unwrap();
        assert_eq!(b.customer, Some(CustomerRef::Ref("64ab12".into())));
        assert_eq!(b.customer_name(), Some("Lin"));

        let bare: Booking =
            serde_json::from_value(serde_json::json!({"customer": "64ab12"})).unwrap();
        assert_eq!(bare.customer_name(), None);
    }

    #[test]
    fn string_amounts() {
        let o: Order =
            serde_json::from_value(serde_json::json!({"totalAmount": "1250.50"})).unwrap();
        assert_eq!(o.amount(), Some(1250.5));

        let q: Quote =
            serde_json::from_value(serde_json::json!({"total": "$1,200"})).unwrap();
        assert_eq!(q.amount(), Some(1200.0));

        let junk: Order =
            serde_json::from_value(serde_json::json!({"totalAmount": "call us"})).unwrap();
        assert_eq!(junk.amount(), None);
    }

    #[test]
    fn wrong_field_types_degrade_to_none() {
        let b: Booking = serde_json::from_value(serde_json::json!({
            "id": "b1",
            "status": {"code": 2},
            "eventDate": null,
            "customer": [1, 2]
        }))
        .unwrap();
        assert_eq!(b.id(), Some("b1"));
        assert_eq!(b.status, None);
        assert_eq!(b.event_date, None);
        assert_eq!(b.customer, None);
    }

    #[test]
    fn customer_ref_serializes_in_wire_shape() {
        let r = serde_json::to_value(CustomerRef::Ref("64ab12".into())).unwrap();
        assert_eq!(r, serde_json::json!("64ab12"));
        let e = serde_json::to_value(CustomerRef::Embedded(Customer {
            name: Some("Ada".into()),
            ..Customer::default()
        }))
        .unwrap();
        assert_eq!(e, serde_json::json!({"name": "Ada"}));
    }

    #[test]
    fn unmodelled_fields_land_in_extra() {
        let b: Booking = serde_json::from_value(serde_json::json!({
            "id": "b1",
            "items": [{"sku": "TENT-20"}]
        }))
        .unwrap();
        assert!(b.extra.contains_key("items"));
    }

    #[test]
    fn reference_prefers_number() {
        let q = Quote {
            object_id: Some("abc".into()),
            quote_number: Some("Q-1001".into()),
            ..Quote::default()
        };
        assert_eq!(q.reference(), Some("Q-1001"));
    }
}
