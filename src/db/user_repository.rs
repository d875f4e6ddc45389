use crate::db::models::{NewUser, User, UserPatch};
use crate::errors::Error;
use crate::password::{hash_password, verify_password};
use crate::schema::users;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;

const USERNAME_TAKEN: &str = "Username already exists";
const EMAIL_TAKEN: &str = "Email already exists";
const USER_NOT_FOUND: &str = "User not found";

/// Repository for managing user records in the SQLite database
pub struct UserRepository<'a> {
    /// Database connection
    pub conn: &'a mut SqliteConnection,
}

impl<'a> UserRepository<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        UserRepository { conn }
    }

    /// Registers a new user, hashing the supplied plaintext password
    ///
    /// # Arguments
    ///
    /// * `username` - Must not belong to any existing user
    /// * `email` - Must not belong to any existing user
    /// * `password` - Plaintext password
    /// * `role` - Role name stored verbatim
    ///
    /// # Errors
    ///
    /// Returns `Error::Conflict` when the username or email is taken, or an
    /// Error if hashing or the insert fails. Nothing is written on failure.
    pub fn create_user(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<User, Error> {
        let hashed = hash_password(password)?;

        self.conn.transaction(|conn| {
            ensure_username_free(conn, username, None)?;
            ensure_email_free(conn, email, None)?;

            diesel::insert_into(users::table)
                .values(&NewUser {
                    username,
                    email,
                    password: &hashed,
                    role,
                })
                .returning(User::as_returning())
                .get_result(conn)
                .map_err(unique_violation_to_conflict)
        })
    }

    pub fn find_by_email(&mut self, email: &str) -> Result<Option<User>, Error> {
        let found = users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(self.conn)
            .optional()?;
        Ok(found)
    }

    /// Looks up the user by email and checks the password against the stored hash
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCredentials` both for an unknown email and for a
    /// wrong password, so callers cannot tell which one failed.
    pub fn verify_credentials(&mut self, email: &str, password: &str) -> Result<User, Error> {
        match self.find_by_email(email)? {
            Some(user) if verify_password(password, &user.password) => Ok(user),
            _ => Err(Error::InvalidCredentials),
        }
    }

    /// Applies a partial update to the user with `user_id`
    ///
    /// A supplied password is hashed the same way registration does.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown id and `Error::Conflict` when the
    /// new username or email belongs to another user.
    pub fn update_user(&mut self, user_id: i32, patch: UserPatch) -> Result<User, Error> {
        let hashed = patch.password.as_deref().map(hash_password).transpose()?;

        self.conn.transaction(|conn| {
            let current = users::table
                .find(user_id)
                .select(User::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| Error::NotFound(USER_NOT_FOUND.to_string()))?;

            let username = patch.username.unwrap_or(current.username);
            let email = patch.email.unwrap_or(current.email);
            let password = hashed.unwrap_or(current.password);
            let role = patch.role.unwrap_or(current.role);

            ensure_username_free(conn, &username, Some(user_id))?;
            ensure_email_free(conn, &email, Some(user_id))?;

            diesel::update(users::table.find(user_id))
                .set((
                    users::username.eq(&username),
                    users::email.eq(&email),
                    users::password.eq(&password),
                    users::role.eq(&role),
                ))
                .returning(User::as_returning())
                .get_result(conn)
                .map_err(unique_violation_to_conflict)
        })
    }

    /// Permanently removes the user with `user_id`
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when no such user exists
    pub fn delete_user(&mut self, user_id: i32) -> Result<(), Error> {
        let deleted = diesel::delete(users::table.find(user_id)).execute(self.conn)?;
        if deleted == 0 {
            return Err(Error::NotFound(USER_NOT_FOUND.to_string()));
        }
        Ok(())
    }
}

fn ensure_username_free(
    conn: &mut SqliteConnection,
    username: &str,
    except: Option<i32>,
) -> Result<(), Error> {
    let owner: Option<i32> = users::table
        .filter(users::username.eq(username))
        .select(users::id)
        .first(conn)
        .optional()?;

    match owner {
        Some(id) if Some(id) != except => Err(Error::Conflict(USERNAME_TAKEN.to_string())),
        _ => Ok(()),
    }
}

fn ensure_email_free(
    conn: &mut SqliteConnection,
    email: &str,
    except: Option<i32>,
) -> Result<(), Error> {
    let owner: Option<i32> = users::table
        .filter(users::email.eq(email))
        .select(users::id)
        .first(conn)
        .optional()?;

    match owner {
        Some(id) if Some(id) != except => Err(Error::Conflict(EMAIL_TAKEN.to_string())),
        _ => Ok(()),
    }
}

/// A concurrent writer can slip past the pre-checks; the unique index still catches it.
fn unique_violation_to_conflict(err: DieselError) -> Error {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
            if info.message().contains("users.email") {
                Error::Conflict(EMAIL_TAKEN.to_string())
            } else {
                Error::Conflict(USERNAME_TAKEN.to_string())
            }
        }
        other => Error::DieselError(other),
    }
}
