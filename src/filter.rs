use crate::model::{ItemId, TodoItem};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    TodayOnly,
}

impl Filter {
    pub fn matches(&self, item: &TodoItem, today: NaiveDate) -> bool {
        match self {
            Filter::All => true,
            Filter::TodayOnly => item.deadline == today,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Filter::All => Filter::TodayOnly,
            Filter::TodayOnly => Filter::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::TodayOnly => "today",
        }
    }
}

/// Ids of the items passing `filter`, ordered by deadline. `sort_by_key` is
/// stable, so equal deadlines keep their insertion order.
pub fn project<'a>(
    items: impl IntoIterator<Item = (ItemId, &'a TodoItem)>,
    filter: Filter,
    today: NaiveDate,
) -> Vec<ItemId> {
    let mut kept: Vec<(ItemId, NaiveDate)> = items
        .into_iter()
        .filter(|(_, item)| filter.matches(item, today))
        .map(|(id, item)| (id, item.deadline))
        .collect();
    kept.sort_by_key(|(_, deadline)| *deadline);
    kept.into_iter().map(|(id, _)| id).collect()
}
