//! Hub sections derived from the block list.
//!
//! Membership is by label equality across the whole list, not by position,
//! so a label that appears in two separate runs of blocks is one section.
//! This is a read-only projection; it never touches session state.

use crate::Block;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    /// Block indices carrying this label, ascending
    pub members: Vec<usize>,
}

/// Section state for hub rendering
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    pub name: String,
    pub members: Vec<usize>,
    pub done_count: usize,
    /// Every member is completed or skipped
    pub done: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SectionIndex {
    sections: Vec<Section>,
}

impl SectionIndex {
    /// Group blocks by section label, sections ordered by first appearance.
    pub fn build(blocks: &[Block]) -> Self {
        let mut sections: Vec<Section> = Vec::new();
        for (index, block) in blocks.iter().enumerate() {
            match sections.iter_mut().find(|s| s.name == block.section) {
                Some(section) => section.members.push(index),
                None => sections.push(Section {
                    name: block.section.clone(),
                    members: vec![index],
                }),
            }
        }
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Summaries given the set of done (completed or skipped) indices.
    pub fn summaries(&self, done: &HashSet<usize>) -> Vec<SectionSummary> {
        self.sections
            .iter()
            .map(|section| {
                let done_count = section.members.iter().filter(|i| done.contains(i)).count();
                SectionSummary {
                    name: section.name.clone(),
                    members: section.members.clone(),
                    done_count,
                    done: done_count == section.members.len(),
                }
            })
            .collect()
    }
}

impl Section {
    /// Where selecting this section starts: the first member not yet done,
    /// or the first member when all are done (a re-run).
    pub fn entry_index(&self, done: &HashSet<usize>) -> Option<usize> {
        self.members
            .iter()
            .copied()
            .find(|i| !done.contains(i))
            .or_else(|| self.members.first().copied())
    }
}
