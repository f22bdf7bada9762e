pub mod ledger;
pub mod report;

use serde::Serialize;

/// `{ status, message, data }` envelope wrapping every successful response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            status: "success",
            message: message.into(),
            data,
        }
    }
}
