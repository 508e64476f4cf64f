//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    pub async fn find(&self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// Search books with pagination, ordered by author then title
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')",
        )
        .bind(&query.title)
        .fetch_one(&self.pool)
        .await?;

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
            ORDER BY author, title, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&query.title)
        .bind(query.per_page())
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((books, total))
    }

    /// Create book
    pub async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, cover, inventory, daily_fee)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.author)
        .bind(data.cover)
        .bind(data.inventory)
        .bind(data.daily_fee)
        .fetch_one(&self.pool)
        .await?;
        Ok(book)
    }

    /// Update only the fields present in the request
    pub async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        let mut sets: Vec<String> = Vec::new();
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.title, "title");
        add_field!(data.author, "author");
        add_field!(data.cover, "cover");
        add_field!(data.inventory, "inventory");
        add_field!(data.daily_fee, "daily_fee");

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!("UPDATE books SET {} WHERE id = $1 RETURNING *", sets.join(", "));
        let mut builder = sqlx::query_as::<_, Book>(&query).bind(id);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.title);
        bind_field!(data.author);
        bind_field!(data.cover);
        bind_field!(data.inventory);
        bind_field!(data.daily_fee);

        builder
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Delete book; refused while borrowings reference it
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_constraint(e, "Book has borrowings and cannot be deleted"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}
