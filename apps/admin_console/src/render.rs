//! Plain-text tables for the console. Every function returns the rendered
//! text so the binary decides where it goes.

use std::fmt::Write as _;

use client_core::{OrderListSnapshot, OrderRow};
use shared::protocol::{Status, UserSummary, Vehicle};

const ORDER_HEADERS: [&str; 6] = ["#", "Code", "Customer", "Contact", "Status", "Vehicles"];

pub fn order_table(snapshot: &OrderListSnapshot) -> String {
    let mut out = String::new();
    let arrow = snapshot.sort_direction.arrow();
    let _ = writeln!(
        out,
        "Orders: {} of {} shown, sorted by status {arrow}",
        snapshot.rows.len(),
        snapshot.order_count
    );
    if !snapshot.search_query.is_empty() {
        let _ = writeln!(out, "Search: {:?}", snapshot.search_query);
    }
    if let Some(pages) = snapshot.total_pages {
        let _ = writeln!(out, "Pages on server: {pages}");
    }
    if let Some(error) = &snapshot.error {
        let _ = writeln!(out, "Error: {error}");
    }

    if snapshot.rows.is_empty() {
        out.push_str("No orders found\n");
        return out;
    }

    let cells: Vec<[String; 6]> = snapshot.rows.iter().map(order_cells).collect();
    out.push_str(&table(&ORDER_HEADERS, &cells));
    out
}

fn order_cells(row: &OrderRow) -> [String; 6] {
    let vehicles = row.vehicle_labels();
    [
        row.position.to_string(),
        row.code_label().to_string(),
        row.customer_label(),
        row.contact_label().to_string(),
        format!("[{}] {}", row.badge_class(), row.status_label()),
        if vehicles.is_empty() {
            "-".to_string()
        } else {
            vehicles.join(", ")
        },
    ]
}

pub fn status_table(statuses: &[Status]) -> String {
    if statuses.is_empty() {
        return "No statuses defined\n".to_string();
    }
    let cells: Vec<[String; 2]> = statuses
        .iter()
        .map(|status| [status.id.to_string(), status.name.clone()])
        .collect();
    table(&["Id", "Name"], &cells)
}

pub fn user_table(users: &[UserSummary], page: u32, total_pages: u32) -> String {
    let mut out = format!("Users: page {} of {}\n", page + 1, total_pages.max(1));
    if users.is_empty() {
        out.push_str("No users found\n");
        return out;
    }
    let cells: Vec<[String; 4]> = users
        .iter()
        .map(|user| {
            let name = [user.surname.as_deref(), user.name.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            [
                user.id.to_string(),
                user.login.clone(),
                name,
                if user.accepted { "yes" } else { "pending" }.to_string(),
            ]
        })
        .collect();
    out.push_str(&table(&["Id", "Login", "Name", "Confirmed"], &cells));
    out
}

pub fn vehicle_list(vehicles: &[Vehicle]) -> String {
    if vehicles.is_empty() {
        return "No vehicles found\n".to_string();
    }
    vehicles.iter().fold(String::new(), |mut out, vehicle| {
        let _ = writeln!(out, "{}", vehicle.label());
        out
    })
}

fn table<const N: usize>(headers: &[&str; N], rows: &[[String; N]]) -> String {
    let mut widths: [usize; N] = std::array::from_fn(|i| headers[i].chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    write_line(&mut out, headers.iter().copied(), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_line(&mut out, rule.iter().map(String::as_str), &widths);
    for row in rows {
        write_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn write_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line = cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}
