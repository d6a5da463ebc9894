use chrono::{DateTime, Utc};

use super::schema::ShoppingListRow;

/*
Shopping list document

Shopping list - 2024-05-01
--------------------------
Flour (g): 150
Milk (ml): 500
*/

/// Downloadable rendition of the aggregated shopping list. One line per
/// distinct ingredient; an empty cart produces a document with no lines.
#[derive(Debug, Clone)]
pub struct ShoppingListDocument {
    content: String,
}

impl ShoppingListDocument {
    pub fn render(rows: &[ShoppingListRow]) -> Self {
        Self::render_at(rows, Utc::now())
    }

    pub fn render_at(rows: &[ShoppingListRow], date: DateTime<Utc>) -> Self {
        let header = format!("Shopping list - {}", date.format("%Y-%m-%d"));
        let mut lines = vec![header.clone(), "-".repeat(header.len())];

        lines.extend(
            rows.iter()
                .map(|row| format!("{} ({}): {}", row.name, row.measurement_unit, row.total)),
        );

        Self {
            content: lines.join("\n") + "\n",
        }
    }

    pub fn file_name(&self) -> &'static str {
        "shopping_list.txt"
    }

    pub fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.content.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(name: &str, unit: &str, total: i64) -> ShoppingListRow {
        ShoppingListRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            total,
        }
    }

    #[test]
    fn renders_one_line_per_ingredient() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let doc =
            ShoppingListDocument::render_at(&[row("Flour", "g", 150), row("Milk", "ml", 500)], date);

        let text = doc.as_str();
        assert!(text.starts_with("Shopping list - 2024-05-01\n"));
        assert!(text.contains("Flour (g): 150\n"));
        assert!(text.contains("Milk (ml): 500\n"));
        assert_eq!(text.matches(": ").count(), 2);
    }

    #[test]
    fn empty_cart_renders_empty_document() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let doc = ShoppingListDocument::render_at(&[], date);

        assert_eq!(doc.as_str().lines().count(), 2);
        assert_eq!(doc.file_name(), "shopping_list.txt");
    }
}
