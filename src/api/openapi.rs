//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, borrowings, health, payments, users};

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Service API",
        version = "1.0.0",
        description = "Book lending REST API: catalog, borrowings and payments"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&BearerAuth),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Users
        users::register,
        users::set_staff,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Borrowings
        borrowings::list_borrowings,
        borrowings::create_borrowing,
        borrowings::get_borrowing,
        borrowings::return_borrowing,
        // Payments
        payments::list_payments,
        payments::get_payment,
        payments::renew_session,
        payments::payment_success,
        payments::payment_cancel,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            // Users
            crate::models::user::User,
            crate::models::user::CreateUser,
            crate::models::user::UpdateStaff,
            // Books
            books::BooksListResponse,
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::enums::Cover,
            // Borrowings
            borrowings::ReturnResponse,
            crate::models::borrowing::Borrowing,
            crate::models::borrowing::BorrowingDetails,
            crate::models::borrowing::CreateBorrowing,
            // Payments
            payments::PaymentSuccessResponse,
            payments::PaymentCancelResponse,
            crate::models::payment::Payment,
            crate::models::enums::PaymentStatus,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User accounts"),
        (name = "books", description = "Book catalog"),
        (name = "borrowings", description = "Borrowing and returning books"),
        (name = "payments", description = "Borrowing fees and checkout")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_lending_paths_and_auth_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/borrowings/{id}/return"));
        assert!(doc.paths.paths.contains_key("/payments/success"));
        assert!(doc
            .components
            .as_ref()
            .map(|c| c.security_schemes.contains_key("bearer_auth"))
            .unwrap_or(false));
    }
}
