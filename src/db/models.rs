use crate::schema::{books, users};
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Deserializer};

/// Role assigned when registration does not name one
pub const DEFAULT_ROLE: &str = "user";

/// Represents a registered user in the database
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, never the plaintext
    pub password: String,
    pub role: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: &'a str,
}

/// Represents a book in the database
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = books)]
pub struct NewBook<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub description: Option<&'a str>,
}

/// Partial update of a user; omitted fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Plaintext; hashed before it reaches the database
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Partial update of a book; omitted fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// `None` keeps the description, `Some(None)` clears it
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

impl BookPatch {
    /// Merges the patch over the stored book
    pub fn apply(self, current: Book) -> Book {
        Book {
            id: current.id,
            title: self.title.unwrap_or(current.title),
            author: self.author.unwrap_or(current.author),
            description: self.description.unwrap_or(current.description),
        }
    }
}

/// Marks a field as present even when its value is `null`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
