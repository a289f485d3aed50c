//! Freeform checklist runner.
//!
//! Headers and subheadings are labels. Items with details are disclosures
//! (expand/collapse) rather than checkboxes. Completion never depends on
//! how many boxes are ticked.

use crate::{BlockOutcome, ChecklistItem, Error, Result};

/// How an item renders right now
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemState {
    Label,
    Checkbox { checked: bool },
    Disclosure { expanded: bool },
}

#[derive(Debug, Clone)]
pub struct ChecklistRunner {
    items: Vec<ChecklistItem>,
    /// Checked for checkboxes, expanded for disclosures
    flags: Vec<bool>,
}

impl ChecklistRunner {
    pub fn new(items: Vec<ChecklistItem>) -> Self {
        let flags = vec![false; items.len()];
        Self { items, flags }
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    pub fn item_state(&self, index: usize) -> Option<ItemState> {
        let flag = *self.flags.get(index)?;
        let state = match &self.items[index] {
            ChecklistItem::Header { .. } | ChecklistItem::Subheading { .. } => ItemState::Label,
            ChecklistItem::Item { details, .. } if !details.is_empty() => {
                ItemState::Disclosure { expanded: flag }
            }
            ChecklistItem::Item { .. } => ItemState::Checkbox { checked: flag },
        };
        Some(state)
    }

    pub fn checked_count(&self) -> usize {
        (0..self.items.len())
            .filter(|i| self.item_state(*i) == Some(ItemState::Checkbox { checked: true }))
            .count()
    }

    /// Check/uncheck a checkbox, or expand/collapse a disclosure.
    pub fn toggle_item(&mut self, index: usize) -> Result<()> {
        match self.item_state(index) {
            None => Err(Error::intent(format!(
                "item {} out of range (0..{})",
                index,
                self.items.len()
            ))),
            Some(ItemState::Label) => Err(Error::intent(format!(
                "'{}' is a heading",
                self.items[index].text()
            ))),
            Some(_) => {
                self.flags[index] = !self.flags[index];
                Ok(())
            }
        }
    }

    pub fn complete(&mut self) -> BlockOutcome {
        tracing::debug!(
            "Checklist completed with {} item(s) checked",
            self.checked_count()
        );
        BlockOutcome::Completed { payload: None }
    }
}
