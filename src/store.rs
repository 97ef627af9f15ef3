use crate::auth::User;
use crate::expenses::ExpenditureRecord;
use crate::gpa::SemesterRecord;
use crate::todo::TodoItem;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs::{self, File, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

// Collection files under the store root
const USERS_FILE: &str = "users.json";
const TODOS_FILE: &str = "todos.json";
const EXPENDITURES_FILE: &str = "expenditures.json";

/// JSON-file document store holding the three collections.
///
/// Each collection is one pretty-printed JSON file under the root directory:
/// users keyed by email, to-dos and expenditures as flat lists with generated
/// ids. Every operation is an independent read or read-modify-write of one
/// file; there is no cross-collection transaction, so the promise is last
/// write wins.
///
/// The store is passed explicitly into handlers and domain operations rather
/// than living in module-level globals.
#[derive(Clone, Debug)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Store { root: root.into() }
    }

    /// Initialize the database structure
    ///
    /// Creates the root directory and the collection files if they don't
    /// exist. This should be called before any other database operations.
    pub fn init(&self) -> std::io::Result<()> {
        if !self.root.exists() {
            create_dir_all(&self.root)?;
        }

        let users_path = self.root.join(USERS_FILE);
        if !users_path.exists() {
            let mut file = File::create(users_path)?;
            file.write_all(b"{}")?;
        }

        for name in [TODOS_FILE, EXPENDITURES_FILE] {
            let path = self.root.join(name);
            if !path.exists() {
                let mut file = File::create(path)?;
                file.write_all(b"[]")?;
            }
        }

        Ok(())
    }

    fn read_collection<T: DeserializeOwned>(&self, name: &str) -> Result<T, String> {
        let path = self.root.join(name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(_) => return Err(format!("Failed to read {}", name)),
        };

        match serde_json::from_str(&contents) {
            Ok(value) => Ok(value),
            Err(_) => Err(format!("Failed to parse {}", name)),
        }
    }

    fn write_collection<T: Serialize>(&self, name: &str, value: &T) -> Result<(), String> {
        let json = match serde_json::to_string_pretty(value) {
            Ok(json) => json,
            Err(_) => return Err(format!("Failed to serialize {}", name)),
        };

        if fs::write(self.root.join(name), json).is_err() {
            return Err(format!("Failed to write {}", name));
        }

        Ok(())
    }

    // ---- users ----

    /// Get all registered users, keyed by email.
    pub fn users(&self) -> Result<HashMap<String, User>, String> {
        self.read_collection(USERS_FILE)
    }

    pub fn save_users(&self, users: &HashMap<String, User>) -> Result<(), String> {
        self.write_collection(USERS_FILE, users)
    }

    pub fn get_user(&self, email: &str) -> Result<Option<User>, String> {
        let users = self.users()?;
        Ok(users.get(email).cloned())
    }

    /// Register a new user document.
    ///
    /// # Errors
    /// * Returns an error if a user with the same email already exists; the
    ///   collection is left untouched in that case.
    pub fn insert_user(&self, user: User) -> Result<(), String> {
        let mut users = self.users()?;
        if users.contains_key(&user.email) {
            return Err("Email already exists. Please login.".to_string());
        }
        users.insert(user.email.clone(), user);
        self.save_users(&users)
    }

    /// Append a semester record to a user's semester list.
    ///
    /// Records are append-only; a second submission under the same semester
    /// label is stored as its own record, matching the original behavior.
    pub fn append_semester(&self, email: &str, record: SemesterRecord) -> Result<(), String> {
        let mut users = self.users()?;
        let user = match users.get_mut(email) {
            Some(user) => user,
            None => return Err("User data not found.".to_string()),
        };
        user.semesters.push(record);
        self.save_users(&users)
    }

    // ---- todos ----

    pub fn todos_for(&self, email: &str) -> Result<Vec<TodoItem>, String> {
        let todos: Vec<TodoItem> = self.read_collection(TODOS_FILE)?;
        Ok(todos.into_iter().filter(|t| t.email == email).collect())
    }

    pub fn insert_todo(&self, todo: TodoItem) -> Result<(), String> {
        let mut todos: Vec<TodoItem> = self.read_collection(TODOS_FILE)?;
        todos.push(todo);
        self.write_collection(TODOS_FILE, &todos)
    }

    /// Rename a to-do. An unknown id (e.g. a race with delete) is a no-op.
    pub fn rename_todo(&self, email: &str, id: &str, task: &str) -> Result<(), String> {
        let mut todos: Vec<TodoItem> = self.read_collection(TODOS_FILE)?;
        if let Some(todo) = todos.iter_mut().find(|t| t.id == id && t.email == email) {
            todo.task = task.to_string();
        }
        self.write_collection(TODOS_FILE, &todos)
    }

    /// Flip a to-do between "pending" and "done". Unknown ids no-op.
    pub fn toggle_todo(&self, email: &str, id: &str) -> Result<(), String> {
        let mut todos: Vec<TodoItem> = self.read_collection(TODOS_FILE)?;
        if let Some(todo) = todos.iter_mut().find(|t| t.id == id && t.email == email) {
            todo.status = if todo.status == "done" {
                "pending".to_string()
            } else {
                "done".to_string()
            };
        }
        self.write_collection(TODOS_FILE, &todos)
    }

    pub fn delete_todo(&self, email: &str, id: &str) -> Result<(), String> {
        let mut todos: Vec<TodoItem> = self.read_collection(TODOS_FILE)?;
        todos.retain(|t| !(t.id == id && t.email == email));
        self.write_collection(TODOS_FILE, &todos)
    }

    // ---- expenditures ----

    pub fn expenditures_for(&self, email: &str) -> Result<Vec<ExpenditureRecord>, String> {
        let records: Vec<ExpenditureRecord> = self.read_collection(EXPENDITURES_FILE)?;
        Ok(records.into_iter().filter(|r| r.email == email).collect())
    }

    pub fn insert_expenditure(&self, record: ExpenditureRecord) -> Result<(), String> {
        let mut records: Vec<ExpenditureRecord> = self.read_collection(EXPENDITURES_FILE)?;
        records.push(record);
        self.write_collection(EXPENDITURES_FILE, &records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpa::CourseEntry;

    fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        store.init().unwrap();
        (dir, store)
    }

    fn sample_user(email: &str) -> User {
        User {
            email: email.to_string(),
            name: "Kai Iyer".to_string(),
            password: "hunter2".to_string(),
            roll_no: "21CS100".to_string(),
            university_id: "U-4471".to_string(),
            department: "CSE".to_string(),
            semesters: Vec::new(),
        }
    }

    #[test]
    fn init_creates_empty_collections() {
        let (_dir, store) = test_store();
        assert!(store.users().unwrap().is_empty());
        assert!(store.todos_for("kai@uni.edu").unwrap().is_empty());
        assert!(store.expenditures_for("kai@uni.edu").unwrap().is_empty());
    }

    #[test]
    fn duplicate_signup_is_rejected() {
        let (_dir, store) = test_store();
        store.insert_user(sample_user("kai@uni.edu")).unwrap();

        let mut dup = sample_user("kai@uni.edu");
        dup.name = "Someone Else".to_string();
        assert!(store.insert_user(dup).is_err());

        // The original record is untouched and no second record exists.
        let users = store.users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users["kai@uni.edu"].name, "Kai Iyer");
    }

    #[test]
    fn semesters_append_without_merging() {
        let (_dir, store) = test_store();
        store.insert_user(sample_user("kai@uni.edu")).unwrap();

        let course = CourseEntry {
            course_name: "Algorithms".to_string(),
            course_code: "CS301".to_string(),
            credit_hours: 4,
            grade: "A".to_string(),
            attendance: None,
        };
        for _ in 0..2 {
            store
                .append_semester(
                    "kai@uni.edu",
                    SemesterRecord {
                        semester: "Fall2024".to_string(),
                        cgpa: 8.0,
                        courses: vec![course.clone()],
                    },
                )
                .unwrap();
        }

        let user = store.get_user("kai@uni.edu").unwrap().unwrap();
        assert_eq!(user.semesters.len(), 2);
    }

    #[test]
    fn append_semester_for_unknown_user_fails() {
        let (_dir, store) = test_store();
        let result = store.append_semester(
            "nobody@uni.edu",
            SemesterRecord {
                semester: "Fall2024".to_string(),
                cgpa: 0.0,
                courses: Vec::new(),
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn todos_are_scoped_to_their_owner() {
        let (_dir, store) = test_store();
        store
            .insert_todo(TodoItem::new("kai@uni.edu", "read chapter 4"))
            .unwrap();
        store
            .insert_todo(TodoItem::new("ana@uni.edu", "book lab slot"))
            .unwrap();

        let todos = store.todos_for("kai@uni.edu").unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].task, "read chapter 4");
    }

    #[test]
    fn todo_toggle_flips_status() {
        let (_dir, store) = test_store();
        let todo = TodoItem::new("kai@uni.edu", "submit report");
        let id = todo.id.clone();
        store.insert_todo(todo).unwrap();

        store.toggle_todo("kai@uni.edu", &id).unwrap();
        assert_eq!(store.todos_for("kai@uni.edu").unwrap()[0].status, "done");

        store.toggle_todo("kai@uni.edu", &id).unwrap();
        assert_eq!(store.todos_for("kai@uni.edu").unwrap()[0].status, "pending");
    }

    #[test]
    fn todo_update_and_delete_of_unknown_id_no_op() {
        let (_dir, store) = test_store();
        let todo = TodoItem::new("kai@uni.edu", "submit report");
        store.insert_todo(todo).unwrap();

        store
            .rename_todo("kai@uni.edu", "missing-id", "renamed")
            .unwrap();
        store.delete_todo("kai@uni.edu", "missing-id").unwrap();
        store.toggle_todo("kai@uni.edu", "missing-id").unwrap();

        let todos = store.todos_for("kai@uni.edu").unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].task, "submit report");
        assert_eq!(todos[0].status, "pending");
    }

    #[test]
    fn todo_delete_requires_matching_owner() {
        let (_dir, store) = test_store();
        let todo = TodoItem::new("kai@uni.edu", "submit report");
        let id = todo.id.clone();
        store.insert_todo(todo).unwrap();

        store.delete_todo("ana@uni.edu", &id).unwrap();
        assert_eq!(store.todos_for("kai@uni.edu").unwrap().len(), 1);

        store.delete_todo("kai@uni.edu", &id).unwrap();
        assert!(store.todos_for("kai@uni.edu").unwrap().is_empty());
    }

    #[test]
    fn expenditures_round_trip_through_the_store() {
        let (_dir, store) = test_store();
        store
            .insert_expenditure(ExpenditureRecord {
                id: uuid::Uuid::new_v4().to_string(),
                email: "kai@uni.edu".to_string(),
                title: "Hostel mess".to_string(),
                amount: 120.0,
                date: "2024-10-02".to_string(),
                category: "food".to_string(),
                semester: "Fall2024".to_string(),
            })
            .unwrap();

        let records = store.expenditures_for("kai@uni.edu").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, 120.0);
        assert!(store.expenditures_for("ana@uni.edu").unwrap().is_empty());
    }
}
