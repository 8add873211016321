// Error type codes
// Stable `error_type` strings carried in API error bodies and report events

pub mod expected {
    pub const VALIDATION: &str = "validation_error";
    pub const AUTHENTICATION: &str = "authentication_error";
    pub const AUTHORIZATION: &str = "authorization_error";
    pub const NOT_FOUND: &str = "not_found";
    pub const CONFLICT: &str = "conflict";
    pub const RATE_LIMIT: &str = "rate_limit_exceeded";
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNPROCESSABLE_ENTITY: &str = "unprocessable_entity";
    pub const SERVICE_UNAVAILABLE: &str = "service_unavailable";
}

pub mod unhandled {
    pub const INTERNAL: &str = "internal_error";
    pub const PANIC: &str = "panic";
    /// Source of an unhandled error further down its chain
    pub const CAUSE: &str = "cause";
}
