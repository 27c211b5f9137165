use crate::types::Item;

/// Items of the active step plus the cursor into them.
#[derive(Debug, Clone, Default)]
pub struct ItemList {
    items: Vec<Item>,
    cursor: usize,
}

impl ItemList {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items, cursor: 0 }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Item under the cursor, `None` for an empty list.
    pub fn current(&self) -> Option<&Item> {
        self.items.get(self.cursor)
    }

    pub fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor < self.items.len().saturating_sub(1) {
            self.cursor += 1;
        }
    }
}

/// Ordered, duplicate-free set of chosen items. Insertion order is the order
/// the titles end up in on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    items: Vec<Item>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes `item` if it is already selected, appends it otherwise.
    /// Returns whether the item is selected afterwards; `None` is a no-op.
    pub fn toggle(&mut self, item: Option<&Item>) -> bool {
        let Some(item) = item else {
            return false;
        };
        match self
            .items
            .iter()
            .position(|selected| selected.filter_value() == item.filter_value())
        {
            Some(index) => {
                self.items.remove(index);
                false
            }
            None => {
                self.items.push(item.clone());
                true
            }
        }
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.items
            .iter()
            .any(|selected| selected.filter_value() == item.filter_value())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn titles(&self) -> Vec<&str> {
        self.items.iter().map(Item::title).collect()
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }
}

/// A list step where any number of rows may be toggled.
#[derive(Debug, Clone, Default)]
pub struct MultiSelect {
    pub list: ItemList,
    pub selected: SelectionSet,
}

impl MultiSelect {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            list: ItemList::new(items),
            selected: SelectionSet::new(),
        }
    }

    pub fn toggle_current(&mut self) -> bool {
        self.selected.toggle(self.list.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(titles: &[&str]) -> Vec<Item> {
        titles.iter().map(|t| Item::titled(*t)).collect()
    }

    #[test]
    fn toggling_twice_returns_to_empty() {
        let mut set = SelectionSet::new();
        let item = Item::titled("default");

        assert!(set.toggle(Some(&item)));
        assert_eq!(set.titles(), vec!["default"]);
        assert!(!set.toggle(Some(&item)));
        assert!(set.is_empty());
    }

    #[test]
    fn toggling_again_removes_only_that_item() {
        let mut set = SelectionSet::new();
        for item in items(&["a", "b", "c", "d"]) {
            set.toggle(Some(&item));
        }

        set.toggle(Some(&Item::titled("b")));

        assert_eq!(set.titles(), vec!["a", "c", "d"]);
    }

    #[test]
    fn identity_is_the_title() {
        let mut set = SelectionSet::new();
        set.toggle(Some(&Item::new("kube-system", "first")));
        set.toggle(Some(&Item::new("kube-system", "different description")));

        assert!(set.is_empty());
    }

    #[test]
    fn toggle_without_current_item_is_noop() {
        let mut multi = MultiSelect::new(Vec::new());
        assert!(!multi.toggle_current());
        assert!(multi.selected.is_empty());

        let mut set = SelectionSet::new();
        set.toggle(Some(&Item::titled("a")));
        set.toggle(None);
        assert_eq!(set.titles(), vec!["a"]);
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut list = ItemList::new(items(&["one", "two"]));
        list.move_up();
        assert_eq!(list.cursor(), 0);
        list.move_down();
        list.move_down();
        assert_eq!(list.cursor(), 1);
        assert_eq!(list.current().map(Item::title), Some("two"));

        let mut empty = ItemList::default();
        empty.move_down();
        assert!(empty.current().is_none());
    }

    #[test]
    fn multi_select_toggles_row_under_cursor() {
        let mut multi = MultiSelect::new(items(&["ns1", "ns2", "ns3"]));
        multi.list.move_down();
        multi.list.move_down();
        multi.toggle_current();
        multi.list.move_up();
        multi.list.move_up();
        multi.toggle_current();

        assert_eq!(multi.selected.titles(), vec!["ns3", "ns1"]);
    }
}
