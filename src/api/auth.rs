use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};

use super::error::ApiError;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Server-side access key. `None` leaves the API open.
#[derive(Debug, Clone, Default)]
pub struct AccessKey(Option<String>);

impl AccessKey {
    pub fn new(key: Option<String>) -> Self {
        Self(key)
    }

    pub fn is_open(&self) -> bool {
        self.0.is_none()
    }

    pub fn check(&self, presented: Option<&[u8]>) -> Result<(), ApiError> {
        let Some(expected) = &self.0 else {
            return Ok(());
        };
        match presented {
            None => Err(ApiError::MissingApiKey),
            Some(key) if constant_time_eq(key, expected.as_bytes()) => Ok(()),
            Some(_) => Err(ApiError::InvalidApiKey),
        }
    }
}

/// Extractor guarding a handler with the configured [`AccessKey`].
pub struct Authorized;

impl FromRequest for Authorized {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<AccessKey>>() {
            Some(access) => access
                .check(req.headers().get(API_KEY_HEADER).map(|v| v.as_bytes()))
                .map(|_| Authorized),
            None => Ok(Authorized),
        };
        ready(result)
    }
}

/// Comparison time depends only on the length, not on where bytes differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
