use crate::utils::error::{GatewayError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid_value(field: &str, value: impl ToString, reason: impl Into<String>) -> GatewayError {
    GatewayError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// 僅接受 http / https 的絕對網址
pub fn validate_url(field: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw).map_err(|e| invalid_value(field, raw, format!("Invalid URL: {}", e)))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(()),
        "http" | "https" => Err(invalid_value(field, raw, "URL has no host")),
        scheme => Err(invalid_value(field, raw, format!("Unsupported URL scheme: {}", scheme))),
    }
}

pub fn validate_non_empty_string(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid_value(field, value, "Value cannot be blank"));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid_value(
            field,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

/// 請求欄位的範圍檢查，錯誤歸類為 400
pub fn check_request_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(GatewayError::validation(
            field_name,
            format!("{} is outside the allowed range {}..={}", value, min, max),
        ));
    }
    Ok(())
}

pub fn check_finite(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(GatewayError::validation(field_name, "must be a finite number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorCategory;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("api_base", "https://earthengine.googleapis.com").is_ok());
        assert!(validate_url("api_base", "http://localhost:8080").is_ok());
        assert!(validate_url("api_base", "").is_err());
        assert!(validate_url("api_base", "invalid-url").is_err());
        assert!(validate_url("api_base", "ftp://example.com").is_err());
    }

    #[test]
    fn test_blank_string_rejected() {
        assert!(validate_non_empty_string("collection", "COPERNICUS/S2_SR_HARMONIZED").is_ok());
        assert!(validate_non_empty_string("collection", "  ").is_err());
    }

    #[test]
    fn test_request_range_is_validation_error() {
        let err = check_request_range("latitude", 91.0, -90.0, 90.0).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.to_string().contains("latitude"));

        assert!(check_request_range("latitude", 90.0, -90.0, 90.0).is_ok());
        assert!(check_finite("radiusKm", f64::NAN).is_err());
    }

    #[test]
    fn test_config_range_is_config_error() {
        let err = validate_range("cloud_threshold_percent", 120.0, 0.0, 100.0).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
