//! Flat CSV rendering of the admin tables. Every cell is quoted and inner
//! quotes are doubled; rows are separated by `\n`.

use axum::{
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use super::enrich::ListingView;
use crate::users::repo_types::User;

pub const LISTING_HEADER: [&str; 6] = ["Name", "Category", "Price", "Owner", "Status", "CreatedAt"];
pub const USER_HEADER: [&str; 5] = ["Name", "Email", "Phone", "Role", "CreatedAt"];

pub fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

fn row<S: AsRef<str>>(cells: &[S]) -> String {
    cells
        .iter()
        .map(|c| quote(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

fn timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_default()
}

pub fn listings_csv(views: &[ListingView]) -> String {
    let mut lines = Vec::with_capacity(views.len() + 1);
    lines.push(row(&LISTING_HEADER));
    for v in views {
        let l = &v.listing;
        lines.push(row(&[
            l.name.clone(),
            l.category.clone(),
            l.price.to_string(),
            v.owner.as_ref().map(|o| o.name.clone()).unwrap_or_default(),
            l.status.to_string(),
            timestamp(l.created_at),
        ]));
    }
    lines.join("\n")
}

pub fn users_csv(users: &[User]) -> String {
    let mut lines = Vec::with_capacity(users.len() + 1);
    lines.push(row(&USER_HEADER));
    for u in users {
        lines.push(row(&[
            u.name.clone(),
            u.email.clone(),
            u.phone.clone(),
            u.role.to_string(),
            timestamp(u.created_at),
        ]));
    }
    lines.join("\n")
}

/// `listings_2024-05-10.csv` style attachment name.
pub fn export_file_name(prefix: &str, day: &str) -> String {
    format!("{prefix}_{day}.csv")
}

/// A rendered export served as a file download.
pub struct CsvAttachment {
    pub file_name: String,
    pub body: String,
}

impl CsvAttachment {
    pub fn new(prefix: &str, day: &str, body: String) -> Self {
        Self {
            file_name: export_file_name(prefix, day),
            body,
        }
    }
}

impl IntoResponse for CsvAttachment {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.file_name);
        (
            [
                (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (CONTENT_DISPOSITION, disposition),
            ],
            self.body,
        )
            .into_response()
    }
}
