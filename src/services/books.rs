//! Book catalog service

use validator::Validate;

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    pub async fn get(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;
        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = created.id, "Book created: {}", created);
        Ok(created)
    }

    /// Apply the fields present in `book`
    pub async fn update(&self, id: i32, book: UpdateBook) -> AppResult<Book> {
        book.validate()?;
        self.repository.books.update(id, &book).await
    }

    /// Fails with a conflict while borrowings still reference the book
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }
}
