use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{
    domain::{AutoId, OrderId, StatusId, UserId},
    error::GatewayError,
};

/// Reads an explicit `null` as the type's default, the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub id: StatusId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patronomic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl Customer {
    /// Surname, name and patronymic joined by single spaces; empty parts are skipped.
    pub fn full_name(&self) -> String {
        [&self.surname, &self.name, &self.patronomic]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct YearRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: AutoId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<YearRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
}

impl Vehicle {
    /// `"<id> - <brand> <model> <year> <color>"`, skipping unknown attributes.
    pub fn label(&self) -> String {
        let named = |r: &Option<NamedRef>| r.as_ref().and_then(|r| r.name.clone());
        let attributes = [
            named(&self.brand),
            named(&self.model),
            self.year
                .as_ref()
                .and_then(|y| y.year)
                .map(|y| y.to_string()),
            named(&self.color),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

        if attributes.is_empty() {
            self.id.to_string()
        } else {
            format!("{} - {}", self.id, attributes.join(" "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto: Option<Vehicle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order_items: Vec<OrderItem>,
    /// Every other directly-held field the backend sent, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Order {
    pub fn status_name(&self) -> &str {
        self.status.as_ref().map(|s| s.name.as_str()).unwrap_or("")
    }

    pub fn vehicle_ids(&self) -> Vec<AutoId> {
        self.order_items
            .iter()
            .filter_map(|item| item.auto.as_ref().map(|auto| auto.id))
            .collect()
    }

    /// Textual form of each directly-held scalar field. Nested objects are
    /// not flattened and nulls contribute nothing.
    pub fn field_texts(&self) -> Vec<String> {
        let mut texts = vec![self.id.to_string()];
        if let Some(code) = &self.order_code {
            texts.push(code.clone());
        }
        texts.extend(self.extra.values().filter_map(scalar_text));
        texts
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(items) => {
            let parts = items
                .iter()
                .filter(|item| !item.is_array())
                .filter_map(scalar_text)
                .collect::<Vec<_>>();
            (!parts.is_empty()).then(|| parts.join(","))
        }
    }
}

/// The two body shapes accepted from `POST /api/orders/filtered`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OrdersResponse {
    Bare(Vec<Order>),
    Paged {
        content: Vec<Order>,
        #[serde(rename = "totalPages", default)]
        total_pages: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// Only known when the backend answered with the paged envelope.
    pub total_pages: Option<u32>,
}

impl From<OrdersResponse> for OrderPage {
    fn from(value: OrdersResponse) -> Self {
        match value {
            OrdersResponse::Bare(orders) => Self {
                orders,
                total_pages: None,
            },
            OrdersResponse::Paged {
                content,
                total_pages,
            } => Self {
                orders: content,
                total_pages,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<UserSummary>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub auto_ids: Vec<AutoId>,
    pub description: String,
    pub vin: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedOrder {
    pub code: String,
    pub id: OrderId,
}

impl CreatedOrder {
    /// Decodes the `[code, id]` pair returned by order creation. The id may
    /// arrive either as a JSON number or as a numeric string.
    pub fn from_pair(value: Value) -> Result<Self, GatewayError> {
        let Value::Array(items) = value else {
            return Err(GatewayError::shape("expected a [code, id] array"));
        };
        let [code, id] = items.as_slice() else {
            return Err(GatewayError::shape(format!(
                "expected 2 elements in create-order response, got {}",
                items.len()
            )));
        };

        let code = match code {
            Value::String(code) => code.clone(),
            Value::Number(code) => code.to_string(),
            other => {
                return Err(GatewayError::shape(format!(
                    "order code is not a string: {other}"
                )))
            }
        };
        let id = match id {
            Value::Number(id) => id.as_i64(),
            Value::String(id) => id.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| GatewayError::shape(format!("order id is not an integer: {id}")))?;

        Ok(Self {
            code,
            id: OrderId(id),
        })
    }
}
