//! Shared parsing helpers for query strings and path segments.
//!
//! Every failure is reported as a validation error naming the offending
//! field, matching the shape used for body validation.

use std::str::FromStr;

use pagination::PageRequest;

use crate::domain::{Error, FieldViolation, LoanId, LoanStatus, Role, UserId};

fn invalid(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::validation(vec![FieldViolation::new(field, code, message)])
}

/// Build a page request, rejecting `page=0`.
pub(crate) fn parse_page(page: Option<u32>, limit: Option<u32>) -> Result<PageRequest, Error> {
    PageRequest::new(page, limit).map_err(|err| invalid("page", "out_of_range", err.to_string()))
}

/// Parse a loan identifier from a path segment.
pub(crate) fn parse_loan_id(raw: &str) -> Result<LoanId, Error> {
    LoanId::from_str(raw).map_err(|err| invalid("id", "invalid_uuid", err.to_string()))
}

/// Parse a user identifier from a path segment.
pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|_| invalid("id", "invalid_uuid", "user id must be a valid UUID"))
}

/// Parse an optional status filter. Blank values mean "no filter".
pub(crate) fn parse_status(raw: Option<&str>) -> Result<Option<LoanStatus>, Error> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            LoanStatus::from_str(value)
                .map_err(|err| invalid("status", "invalid_value", err.to_string()))
        })
        .transpose()
}

/// Parse an optional role filter. Blank values mean "no filter".
pub(crate) fn parse_role(raw: Option<&str>) -> Result<Option<Role>, Error> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            Role::from_str(value).map_err(|err| invalid("role", err.code(), err.to_string()))
        })
        .transpose()
}
