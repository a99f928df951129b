//! Per-document undo and redo stacks
//!
//! The undo stack is bounded; once full, recording a new command evicts the
//! oldest entry permanently. The redo stack is unbounded and is cleared by
//! every newly recorded command.

use std::collections::VecDeque;

use crate::command::Command;
use crate::document::DocumentContent;

/// Default maximum number of undo entries
pub const DEFAULT_UNDO_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Command>,
    redo_stack: Vec<Command>,
    max_undo_depth: usize,
}

impl History {
    pub fn new(max_undo_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_undo_depth: max_undo_depth.max(1),
        }
    }

    /// Push a command whose effect is already applied
    ///
    /// Clears the redo stack and evicts the oldest entry when over capacity.
    pub fn record(&mut self, command: Command) {
        tracing::debug!(description = %command.description(), "recording command");
        self.undo_stack.push_back(command);
        self.redo_stack.clear();
        self.evict_overflow();
    }

    /// Roll back the most recent command. Returns false if there was none.
    pub fn undo(&mut self, content: &mut DocumentContent) -> bool {
        let Some(command) = self.undo_stack.pop_back() else {
            tracing::trace!("undo on empty stack");
            return false;
        };
        tracing::debug!(description = %command.description(), "undo");
        command.rollback(content);
        self.redo_stack.push(command);
        true
    }

    /// Re-apply the most recently undone command. Returns false if there was none.
    pub fn redo(&mut self, content: &mut DocumentContent) -> bool {
        let Some(command) = self.redo_stack.pop() else {
            tracing::trace!("redo on empty stack");
            return false;
        };
        tracing::debug!(description = %command.description(), "redo");
        command.apply(content);
        self.undo_stack.push_back(command);
        self.evict_overflow();
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Description of the command the next undo would revert
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(Command::description)
    }

    /// Description of the command the next redo would re-apply
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(Command::description)
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_undo_depth(&self) -> usize {
        self.max_undo_depth
    }

    /// Change the capacity, evicting the oldest entries if it shrank
    pub fn set_max_undo_depth(&mut self, depth: usize) {
        self.max_undo_depth = depth.max(1);
        self.evict_overflow();
    }

    /// Drop both stacks
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn evict_overflow(&mut self) {
        while self.undo_stack.len() > self.max_undo_depth {
            if let Some(evicted) = self.undo_stack.pop_front() {
                tracing::debug!(description = %evicted.description(), "evicted oldest undo entry");
            }
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Placed;
    use crate::entities::Bookmark;

    fn add_bookmark(content: &mut DocumentContent, history: &mut History, title: &str) {
        let cmd = Command::AddBookmark(Placed::new(Bookmark::new(title, 0), content.bookmarks.len()));
        cmd.apply(content);
        history.record(cmd);
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut content = DocumentContent::new(1);
        let mut history = History::default();
        add_bookmark(&mut content, &mut history, "A");
        add_bookmark(&mut content, &mut history, "B");

        assert!(history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.undo_description().as_deref(), Some("Add Bookmark \"B\""));

        assert!(history.undo(&mut content));
        assert_eq!(content.bookmarks.len(), 1);
        assert_eq!(history.redo_description().as_deref(), Some("Add Bookmark \"B\""));

        assert!(history.redo(&mut content));
        assert_eq!(content.bookmarks.len(), 2);
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut content = DocumentContent::new(1);
        let mut history = History::default();
        assert!(!history.undo(&mut content));
        assert!(!history.redo(&mut content));
        assert_eq!(history.undo_description(), None);
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut content = DocumentContent::new(1);
        let mut history = History::default();
        add_bookmark(&mut content, &mut history, "A");
        history.undo(&mut content);
        assert!(history.can_redo());

        add_bookmark(&mut content, &mut history, "C");
        assert!(!history.can_redo());
    }

    #[test]
    fn test_eviction_keeps_newest() {
        let mut content = DocumentContent::new(1);
        let mut history = History::new(3);
        for title in ["1", "2", "3", "4", "5"] {
            add_bookmark(&mut content, &mut history, title);
        }
        assert_eq!(history.undo_depth(), 3);
        while history.undo(&mut content) {}
        let titles: Vec<_> = content.bookmarks.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["1", "2"]);
    }

    #[test]
    fn test_shrinking_capacity_evicts() {
        let mut content = DocumentContent::new(1);
        let mut history = History::new(10);
        for title in ["1", "2", "3", "4"] {
            add_bookmark(&mut content, &mut history, title);
        }
        history.set_max_undo_depth(2);
        assert_eq!(history.undo_depth(), 2);
        assert_eq!(history.max_undo_depth(), 2);

        history.clear();
        assert!(!history.can_undo());
    }
}
