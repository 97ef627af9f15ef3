use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A personal to-do item, owned by the user identified by `email`.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct TodoItem {
    /// Generated id used by the update/toggle/delete routes
    pub id: String,

    /// Owner key
    pub email: String,

    /// Task text as entered on the form
    pub task: String,

    /// "pending" or "done"
    pub status: String,
}

impl TodoItem {
    pub fn new(email: &str, task: &str) -> Self {
        TodoItem {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            task: task.to_string(),
            status: "pending".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_items_start_pending_with_unique_ids() {
        let a = TodoItem::new("kai@uni.edu", "read chapter 4");
        let b = TodoItem::new("kai@uni.edu", "read chapter 5");
        assert_eq!(a.status, "pending");
        assert_ne!(a.id, b.id);
    }
}
