//! Pure derivation of the rendered order table.
//!
//! Rows are recomputed from (orders, statuses, query, direction) every time a
//! snapshot is taken; nothing here keeps state between calls.

use std::{cmp::Ordering, collections::HashMap};

use feruca::Collator;
use shared::{
    domain::{SortDirection, StatusId},
    protocol::{Order, Status},
};

const MISSING_LABEL: &str = "Not specified";
const MISSING_CODE_LABEL: &str = "No code";

/// One rendered line of the order table.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    /// 1-based position in the visible sequence.
    pub position: usize,
    /// Resolved status display name; empty when the order has none.
    pub status_name: String,
    pub order: Order,
}

impl OrderRow {
    pub fn code_label(&self) -> &str {
        match self.order.order_code.as_deref() {
            Some(code) if !code.is_empty() => code,
            _ => MISSING_CODE_LABEL,
        }
    }

    pub fn customer_label(&self) -> String {
        let name = self
            .order
            .customer
            .as_ref()
            .map(|c| c.full_name())
            .unwrap_or_default();
        if name.is_empty() {
            MISSING_LABEL.to_string()
        } else {
            name
        }
    }

    pub fn contact_label(&self) -> &str {
        self.order
            .customer
            .as_ref()
            .and_then(|c| c.phone_number.as_deref())
            .filter(|phone| !phone.is_empty())
            .unwrap_or(MISSING_LABEL)
    }

    pub fn status_label(&self) -> &str {
        if self.status_name.is_empty() {
            MISSING_LABEL
        } else {
            &self.status_name
        }
    }

    /// CSS-like badge class: lowercase status name or `default`.
    pub fn badge_class(&self) -> String {
        if self.status_name.is_empty() {
            "default".to_string()
        } else {
            self.status_name.to_lowercase()
        }
    }

    pub fn vehicle_labels(&self) -> Vec<String> {
        self.order
            .order_items
            .iter()
            .map(|item| match &item.auto {
                Some(auto) => format!("vehicle {}", auto.id),
                None => format!("vehicle {MISSING_LABEL}"),
            })
            .collect()
    }
}

/// Sort, filter and number the orders for rendering.
pub fn derive_rows(
    orders: &[Order],
    statuses: &[Status],
    query: &str,
    direction: SortDirection,
) -> Vec<OrderRow> {
    let dictionary = status_dictionary(statuses);
    let sorted = sort_by_status(orders, &dictionary, direction);
    filter_by_query(sorted, query)
        .into_iter()
        .enumerate()
        .map(|(index, order)| OrderRow {
            position: index + 1,
            status_name: status_display_name(order, &dictionary).to_string(),
            order: order.clone(),
        })
        .collect()
}

pub fn status_dictionary(statuses: &[Status]) -> HashMap<StatusId, &str> {
    statuses
        .iter()
        .map(|status| (status.id, status.name.as_str()))
        .collect()
}

/// The order's own status name, or the dictionary's name for its status id
/// when the backend sent the reference without a name.
pub fn status_display_name<'a>(order: &'a Order, dictionary: &HashMap<StatusId, &'a str>) -> &'a str {
    match &order.status {
        Some(status) if !status.name.is_empty() => &status.name,
        Some(status) => dictionary.get(&status.id).copied().unwrap_or(""),
        None => "",
    }
}

/// Stable sort on status display name. Descending reverses the comparator,
/// so equal names keep fetch order in both directions.
pub fn sort_by_status<'a>(
    orders: &'a [Order],
    dictionary: &HashMap<StatusId, &'a str>,
    direction: SortDirection,
) -> Vec<&'a Order> {
    let mut collator = StatusCollator::default();
    let mut sorted: Vec<&Order> = orders.iter().collect();
    sorted.sort_by(|a, b| {
        let ordering = collator.compare(
            status_display_name(a, dictionary),
            status_display_name(b, dictionary),
        );
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    sorted
}

/// Keeps orders where the lowercase query is a substring of the lowercase
/// text of any directly-held field. An empty query keeps everything.
pub fn filter_by_query<'a>(orders: Vec<&'a Order>, query: &str) -> Vec<&'a Order> {
    if query.is_empty() {
        return orders;
    }
    let needle = query.to_lowercase();
    orders
        .into_iter()
        .filter(|order| matches_query(order, &needle))
        .collect()
}

fn matches_query(order: &Order, needle: &str) -> bool {
    order
        .field_texts()
        .iter()
        .any(|text| text.to_lowercase().contains(needle))
}

/// Unicode Collation Algorithm ordering with CLDR root tailoring, so accented
/// and Cyrillic names land next to their base letters (`"Ёлка" < "Жук"`).
/// Strings that collate equal fall back to raw text with lowercase first,
/// keeping the order total.
pub struct StatusCollator {
    inner: Collator,
}

impl Default for StatusCollator {
    fn default() -> Self {
        Self {
            inner: Collator::default(),
        }
    }
}

impl StatusCollator {
    pub fn compare(&mut self, a: &str, b: &str) -> Ordering {
        self.inner.collate(a, b).then_with(|| b.cmp(a))
    }
}

/// One-off comparison; sorting should reuse a [`StatusCollator`].
pub fn collate(a: &str, b: &str) -> Ordering {
    StatusCollator::default().compare(a, b)
}

#[cfg(test)]
#[path = "tests/projection_tests.rs"]
mod tests;
