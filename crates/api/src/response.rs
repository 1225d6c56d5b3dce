//! Response envelope shared by all handlers.

use serde::Serialize;

/// Standard `{ "data": T }` envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
