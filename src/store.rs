use crate::model::{ItemId, TodoItem};
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Shared handle the UI and the controller both hold.
pub type StoreHandle = Rc<RefCell<ItemStore>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Added(ItemId),
    Removed(ItemId),
}

/// Insertion-ordered list of to-do items. Subscribers receive one event per
/// mutation, in order.
#[derive(Debug, Default)]
pub struct ItemStore {
    entries: Vec<(ItemId, TodoItem)>,
    next_id: u64,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = TodoItem>) -> Self {
        let mut store = ItemStore::new();
        for item in items {
            store.add(item);
        }
        store
    }

    pub fn into_handle(self) -> StoreHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn add(&mut self, item: TodoItem) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        debug!(
            "event=store_add id={} deadline={} len={}",
            id,
            item.deadline,
            self.entries.len() + 1
        );
        self.entries.push((id, item));
        self.notify(StoreEvent::Added(id));
        id
    }

    /// Removes exactly the entry with `id`; equal-looking items are untouched.
    pub fn remove(&mut self, id: ItemId) -> Option<TodoItem> {
        let idx = self.entries.iter().position(|(eid, _)| *eid == id)?;
        let (_, item) = self.entries.remove(idx);
        debug!("event=store_remove id={} len={}", id, self.entries.len());
        self.notify(StoreEvent::Removed(id));
        Some(item)
    }

    pub fn get(&self, id: ItemId) -> Option<&TodoItem> {
        self.entries
            .iter()
            .find(|(eid, _)| *eid == id)
            .map(|(_, item)| item)
    }

    #[cfg(test)]
    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &TodoItem)> {
        self.entries.iter().map(|(id, item)| (*id, item))
    }

    pub fn items(&self) -> impl Iterator<Item = &TodoItem> {
        self.entries.iter().map(|(_, item)| item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn notify(&mut self, event: StoreEvent) {
        // receivers that were dropped are pruned here
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn item(name: &str) -> TodoItem {
        TodoItem::new(name, "", NaiveDate::from_ymd_opt(2022, 4, 25).unwrap()).unwrap()
    }

    #[test]
    fn keeps_insertion_order_and_duplicates() {
        let mut store = ItemStore::new();
        let a = store.add(item("same"));
        let b = store.add(item("same"));
        assert_ne!(a, b);
        let ids: Vec<_> = store.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn remove_takes_only_the_given_entry() {
        let mut store = ItemStore::with_items([item("same"), item("same"), item("other")]);
        let second = store.iter().nth(1).map(|(id, _)| id).unwrap();
        assert!(store.remove(second).is_some());
        assert_eq!(store.len(), 2);
        assert!(!store.contains(second));
        assert!(store.remove(second).is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn subscribers_see_every_mutation_in_order() {
        let mut store = ItemStore::new();
        let rx = store.subscribe();
        let a = store.add(item("a"));
        let b = store.add(item("b"));
        store.remove(a);
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                StoreEvent::Added(a),
                StoreEvent::Added(b),
                StoreEvent::Removed(a)
            ]
        );
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let mut store = ItemStore::new();
        let rx = store.subscribe();
        drop(rx);
        store.add(item("a"));
        assert!(store.subscribers.is_empty());
    }
}
