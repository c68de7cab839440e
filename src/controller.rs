//! List view controller.
//!
//! Owns the filtered and sorted projection of the store, the single
//! selection and the detail panel contents. Dialogs are reached through the
//! [`Confirm`] and [`NewItemSource`] traits so the controller never blocks on
//! a UI of its own.
//!
//! Invariant: `selected`, when set, is always an element of `projection`, and
//! the detail panel always shows the selected item (or nothing).

use crate::clock::Clock;
use crate::filter::{project, Filter};
use crate::model::{ItemError, ItemId, TodoItem};
use crate::render::{layout_rows, Row};
use crate::store::{StoreEvent, StoreHandle};
use log::{error, info};
use std::sync::mpsc::Receiver;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailPanel {
    pub details: String,
    pub deadline: String,
}

impl DetailPanel {
    fn show(&mut self, item: &TodoItem) {
        self.details = item.details.clone();
        self.deadline = item.long_deadline();
    }

    fn clear(&mut self) {
        self.details.clear();
        self.deadline.clear();
    }

    #[cfg(test)]
    pub fn is_clear(&self) -> bool {
        self.details.is_empty() && self.deadline.is_empty()
    }
}

/// Step one of a deletion: what the user is asked before anything changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePrompt {
    pub target: ItemId,
    pub title: String,
    pub header: String,
    pub body: String,
}

pub trait Confirm {
    fn confirm(&mut self, prompt: &DeletePrompt) -> bool;
}

/// Collects a new item from the user. `Ok(None)` means the user cancelled.
pub trait NewItemSource {
    fn collect_new_item(&mut self) -> Result<Option<TodoItem>, DialogError>;
}

#[derive(thiserror::Error, Debug)]
pub enum DialogError {
    #[error("couldn't load the item dialog from {resource}: {reason}")]
    ResourceLoad { resource: String, reason: String },
    #[error(transparent)]
    Invalid(#[from] ItemError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(TodoItem),
    Cancelled,
    /// Target vanished between prompt and answer.
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added(ItemId),
    Cancelled,
}

pub struct ListController {
    store: StoreHandle,
    events: Receiver<StoreEvent>,
    clock: Box<dyn Clock>,
    filter: Filter,
    projection: Vec<ItemId>,
    selected: Option<ItemId>,
    detail: DetailPanel,
    created: Option<ItemId>,
    /// Selection held before entering `TodayOnly`, and what the filter
    /// picked in its place. Dropped on any store change.
    restore: Option<(Option<ItemId>, Option<ItemId>)>,
}

impl ListController {
    pub fn new(store: StoreHandle, clock: Box<dyn Clock>) -> Self {
        let events = store.borrow_mut().subscribe();
        let mut controller = ListController {
            store,
            events,
            clock,
            filter: Filter::All,
            projection: Vec::new(),
            selected: None,
            detail: DetailPanel::default(),
            created: None,
            restore: None,
        };
        controller.recompute();
        controller.select_first();
        controller
    }

    /// Applies pending store notifications. Call after mutating the store
    /// from outside the controller; every controller operation calls it too.
    pub fn sync(&mut self) {
        let changed = self.events.try_iter().count() > 0;
        if !changed {
            return;
        }
        self.restore = None;
        self.recompute();
        match self.created.take() {
            Some(id) if self.projection.contains(&id) => self.select_id(id),
            _ => self.select_first(),
        }
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn projection(&self) -> &[ItemId] {
        &self.projection
    }

    pub fn selected(&self) -> Option<ItemId> {
        self.selected
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected?;
        self.projection.iter().position(|p| *p == id)
    }

    pub fn selected_item(&self) -> Option<TodoItem> {
        let id = self.selected?;
        self.store.borrow().get(id).cloned()
    }

    pub fn detail(&self) -> &DetailPanel {
        &self.detail
    }

    #[cfg(test)]
    pub fn item(&self, id: ItemId) -> Option<TodoItem> {
        self.store.borrow().get(id).cloned()
    }

    /// Items of the projection, in display order.
    pub fn visible_items(&self) -> Vec<(ItemId, TodoItem)> {
        let store = self.store.borrow();
        self.projection
            .iter()
            .filter_map(|id| store.get(*id).map(|item| (*id, item.clone())))
            .collect()
    }

    /// Display rows for a list `height` rows tall, styled against today.
    pub fn rows(&self, height: usize) -> Vec<Row> {
        let today = self.clock.today();
        let store = self.store.borrow();
        let entries = self
            .projection
            .iter()
            .filter_map(|id| store.get(*id).map(|item| (*id, item)));
        layout_rows(entries, height, today)
    }

    /// Selects `id` if it is part of the projection. Returns whether it was.
    #[cfg(test)]
    pub fn select(&mut self, id: ItemId) -> bool {
        self.sync();
        if !self.projection.contains(&id) {
            return false;
        }
        self.select_id(id);
        true
    }

    pub fn select_index(&mut self, idx: usize) -> bool {
        self.sync();
        match self.projection.get(idx).copied() {
            Some(id) => {
                self.select_id(id);
                true
            }
            None => false,
        }
    }

    pub fn select_next(&mut self) {
        self.sync();
        let next = match self.selected_index() {
            Some(idx) => (idx + 1).min(self.projection.len().saturating_sub(1)),
            None => 0,
        };
        self.select_index(next);
    }

    pub fn select_prev(&mut self) {
        self.sync();
        let prev = self.selected_index().map(|idx| idx.saturating_sub(1)).unwrap_or(0);
        self.select_index(prev);
    }

    pub fn toggle_filter(&mut self) -> Filter {
        let next = self.filter.toggled();
        self.set_filter(next);
        next
    }

    /// Switches the active predicate. Entering `TodayOnly` keeps the current
    /// selection only when it is still visible; entering `All` keeps it
    /// without a presence check, as the unfiltered projection contains every
    /// item. If the today filter had to drop or replace the selection and the
    /// user did not pick another item meanwhile, leaving it brings the
    /// original selection back.
    pub fn set_filter(&mut self, filter: Filter) {
        self.sync();
        let previous = self.selected;
        let entering = self.filter != filter;
        self.filter = filter;
        self.recompute();
        info!(
            "event=filter_change filter={} visible={}",
            filter.label(),
            self.projection.len()
        );
        match filter {
            Filter::TodayOnly => {
                if self.projection.is_empty() {
                    self.selected = None;
                    self.detail.clear();
                } else if let Some(id) = previous.filter(|id| self.projection.contains(id)) {
                    self.selected = Some(id);
                } else {
                    self.select_first();
                }
                if entering {
                    self.restore = Some((previous, self.selected));
                }
            }
            Filter::All => {
                let target = match self.restore.take() {
                    Some((held, picked)) if picked == previous => held,
                    _ => previous,
                };
                match target {
                    Some(id) => self.select_id(id),
                    None => {
                        self.selected = None;
                        self.detail.clear();
                    }
                }
            }
        }
    }

    /// Step one of deletion. `None` when `id` is not in the store.
    pub fn begin_delete(&mut self, id: ItemId) -> Option<DeletePrompt> {
        self.sync();
        let store = self.store.borrow();
        let item = store.get(id)?;
        Some(DeletePrompt {
            target: id,
            title: "Delete Todo Item".into(),
            header: format!("Delete Item: {}", item.short_description),
            body: "Are you sure? Press OK to confirm, or Cancel".into(),
        })
    }

    /// Step two of deletion. Nothing changes unless `confirmed`.
    pub fn finish_delete(&mut self, prompt: &DeletePrompt, confirmed: bool) -> DeleteOutcome {
        if !confirmed {
            info!("event=delete_cancel id={}", prompt.target);
            return DeleteOutcome::Cancelled;
        }
        let removed = self.store.borrow_mut().remove(prompt.target);
        self.sync();
        match removed {
            Some(item) => {
                info!("event=delete_confirm id={}", prompt.target);
                DeleteOutcome::Deleted(item)
            }
            None => DeleteOutcome::Missing,
        }
    }

    /// Step one for the keyboard delete gesture. `None` when nothing is
    /// selected.
    pub fn begin_delete_selected(&mut self) -> Option<DeletePrompt> {
        self.sync();
        let id = self.selected?;
        self.begin_delete(id)
    }

    /// Item the row context menu acts on. Only rows backed by an item carry
    /// a menu; opening it selects the row, as a right click would.
    pub fn context_menu_target(&mut self, row_idx: usize) -> Option<ItemId> {
        self.sync();
        let id = self
            .rows(row_idx + 1)
            .get(row_idx)
            .filter(|row| row.context_menu)
            .and_then(|row| row.item)?;
        self.select_id(id);
        Some(id)
    }

    /// Step one for the "Delete" entry of a row's context menu.
    pub fn begin_context_delete(&mut self, row_idx: usize) -> Option<DeletePrompt> {
        let id = self.context_menu_target(row_idx)?;
        self.begin_delete(id)
    }

    /// Context-menu delete with the answer supplied by `confirm`.
    pub fn context_delete(
        &mut self,
        row_idx: usize,
        confirm: &mut dyn Confirm,
    ) -> Option<DeleteOutcome> {
        let prompt = self.begin_context_delete(row_idx);
        self.resolve_delete(prompt, confirm)
    }

    #[cfg(test)]
    pub fn delete_selected(&mut self, confirm: &mut dyn Confirm) -> Option<DeleteOutcome> {
        let prompt = self.begin_delete_selected();
        self.resolve_delete(prompt, confirm)
    }

    fn resolve_delete(
        &mut self,
        prompt: Option<DeletePrompt>,
        confirm: &mut dyn Confirm,
    ) -> Option<DeleteOutcome> {
        let prompt = prompt?;
        let confirmed = confirm.confirm(&prompt);
        Some(self.finish_delete(&prompt, confirmed))
    }

    /// Runs the new-item dialog and appends its result. A dialog that fails
    /// to load leaves everything untouched.
    pub fn add_item(&mut self, source: &mut dyn NewItemSource) -> Result<AddOutcome, DialogError> {
        self.sync();
        let item = match source.collect_new_item() {
            Ok(Some(item)) => item,
            Ok(None) => return Ok(AddOutcome::Cancelled),
            Err(err) => {
                error!("event=add_item status=error reason={}", err);
                return Err(err);
            }
        };
        item.validate()?;
        let id = self.store.borrow_mut().add(item);
        self.created = Some(id);
        self.sync();
        self.created = None;
        info!("event=add_item status=ok id={}", id);
        Ok(AddOutcome::Added(id))
    }

    fn recompute(&mut self) {
        let today = self.clock.today();
        let store = self.store.borrow();
        self.projection = project(store.iter(), self.filter, today);
    }

    fn select_first(&mut self) {
        match self.projection.first().copied() {
            Some(id) => self.select_id(id),
            None => {
                self.selected = None;
                self.detail.clear();
            }
        }
    }

    fn select_id(&mut self, id: ItemId) {
        let store = self.store.borrow();
        match store.get(id) {
            Some(item) => {
                self.detail.show(item);
                self.selected = Some(id);
            }
            None => {
                self.detail.clear();
                self.selected = None;
            }
        }
    }
}
