use crate::model::{ItemId, TodoItem};
use chrono::NaiveDate;

/// Colour hint for a list row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    Default,
    Overdue,
    DueTomorrow,
}

pub fn row_style(item: &TodoItem, today: NaiveDate) -> RowStyle {
    if item.deadline < today {
        RowStyle::Overdue
    } else if today.succ_opt() == Some(item.deadline) {
        RowStyle::DueTomorrow
    } else {
        RowStyle::Default
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub item: Option<ItemId>,
    pub text: Option<String>,
    pub style: RowStyle,
    pub context_menu: bool,
}

impl Row {
    pub fn filled(id: ItemId, item: &TodoItem, today: NaiveDate) -> Self {
        Row {
            item: Some(id),
            text: Some(item.short_description.clone()),
            style: row_style(item, today),
            context_menu: true,
        }
    }

    pub fn placeholder() -> Self {
        Row {
            item: None,
            text: None,
            style: RowStyle::Default,
            context_menu: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item.is_none()
    }
}

/// Lays `entries` out over `height` rows; rows past the last entry are
/// placeholders. When there are more entries than rows, all entries are
/// returned and no placeholders are added.
pub fn layout_rows<'a>(
    entries: impl IntoIterator<Item = (ItemId, &'a TodoItem)>,
    height: usize,
    today: NaiveDate,
) -> Vec<Row> {
    let mut rows: Vec<Row> = entries
        .into_iter()
        .map(|(id, item)| Row::filled(id, item, today))
        .collect();
    while rows.len() < height {
        rows.push(Row::placeholder());
    }
    rows
}
