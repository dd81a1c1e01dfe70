//! Result type alias for Fieldsync
//!
//! This module provides a convenient Result type alias that uses FieldsyncError
//! as the error type.

use super::errors::FieldsyncError;

/// Result type alias for Fieldsync operations
///
/// # Examples
///
/// ```
/// use fieldsync::domain::result::Result;
/// use fieldsync::domain::errors::FieldsyncError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(FieldsyncError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, FieldsyncError>;
