use crate::db::models::{Book, BookPatch, NewBook};
use crate::errors::Error;
use crate::schema::books;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

const BOOK_NOT_FOUND: &str = "Book not found";

/// Repository for managing book records in the SQLite database
pub struct BookRepository<'a> {
    /// Database connection
    pub conn: &'a mut SqliteConnection,
}

impl<'a> BookRepository<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        BookRepository { conn }
    }

    pub fn create_book(
        &mut self,
        title: &str,
        author: &str,
        description: Option<&str>,
    ) -> Result<Book, Error> {
        let book = diesel::insert_into(books::table)
            .values(&NewBook {
                title,
                author,
                description,
            })
            .returning(Book::as_returning())
            .get_result(self.conn)?;
        Ok(book)
    }

    /// Returns every book, oldest first
    pub fn list_books(&mut self) -> Result<Vec<Book>, Error> {
        let found = books::table
            .order(books::id.asc())
            .select(Book::as_select())
            .load(self.conn)?;
        Ok(found)
    }

    /// Applies a partial update to the book with `book_id`
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when no such book exists
    pub fn update_book(&mut self, book_id: i32, patch: BookPatch) -> Result<Book, Error> {
        self.conn.transaction(|conn| {
            let current = books::table
                .find(book_id)
                .select(Book::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| Error::NotFound(BOOK_NOT_FOUND.to_string()))?;

            let merged = patch.apply(current);

            let book = diesel::update(books::table.find(book_id))
                .set((
                    books::title.eq(&merged.title),
                    books::author.eq(&merged.author),
                    books::description.eq(&merged.description),
                ))
                .returning(Book::as_returning())
                .get_result(conn)?;
            Ok(book)
        })
    }

    /// Permanently removes the book with `book_id`
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when no such book exists
    pub fn delete_book(&mut self, book_id: i32) -> Result<(), Error> {
        let deleted = diesel::delete(books::table.find(book_id)).execute(self.conn)?;
        if deleted == 0 {
            return Err(Error::NotFound(BOOK_NOT_FOUND.to_string()));
        }
        Ok(())
    }
}
