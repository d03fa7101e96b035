//! Bucket-name and object-key validation policy.

use crate::catalog::object::CATALOG_FILE;
use crate::errors::S3Error;

/// Bucket-name prefixes reserved by the naming policy.
const RESERVED_PREFIXES: &[&str] = &["xn--", "sthree-", "amzn-s3-demo-"];

/// Bucket-name suffixes reserved by the naming policy.
const RESERVED_SUFFIXES: &[&str] = &["-s3alias", "--ol-s3", ".mrap", "--x-s3"];

/// Validate that a bucket name conforms to the naming rules.
///
/// Rules:
/// - 3-63 characters long
/// - Only lowercase letters, numbers, hyphens, and periods
/// - Must begin and end with a letter or number
/// - No two consecutive periods
/// - Cannot be formatted as an IP address (e.g., 192.168.5.4)
/// - Must not carry a reserved prefix or suffix
pub fn validate_bucket_name(name: &str) -> Result<(), S3Error> {
    let invalid = || S3Error::InvalidBucketName {
        name: name.to_string(),
    };

    if !(3..=63).contains(&name.len()) {
        return Err(invalid());
    }

    // Must only contain lowercase letters, digits, hyphens, periods.
    for ch in name.chars() {
        if !ch.is_ascii_lowercase() && !ch.is_ascii_digit() && ch != '-' && ch != '.' {
            return Err(invalid());
        }
    }

    // Must begin and end with a letter or digit.
    let bytes = name.as_bytes();
    if !bytes[0].is_ascii_alphanumeric() || !bytes[bytes.len() - 1].is_ascii_alphanumeric() {
        return Err(invalid());
    }

    if name.contains("..") {
        return Err(invalid());
    }

    if looks_like_ip(name) {
        return Err(invalid());
    }

    if RESERVED_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return Err(invalid());
    }
    if RESERVED_SUFFIXES.iter().any(|s| name.ends_with(s)) {
        return Err(invalid());
    }

    Ok(())
}

/// Validate that an object key is acceptable.
///
/// Keys are permissive: `/`-separated hierarchical keys are allowed. Any
/// segment equal to `..` is rejected so a key can never escape its bucket
/// directory, and the catalog filename itself is reserved.
pub fn validate_object_key(key: &str) -> Result<(), S3Error> {
    let invalid = || S3Error::InvalidObjectKey {
        key: key.to_string(),
    };

    if key.is_empty() {
        return Err(invalid());
    }

    if key.split('/').any(|segment| segment == "..") {
        return Err(invalid());
    }

    if key == CATALOG_FILE {
        return Err(invalid());
    }

    Ok(())
}

/// Check whether a string looks like an IPv4 address (e.g., "192.168.5.4").
fn looks_like_ip(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() != 4 {
        return false;
    }
    parts.iter().all(|p| p.parse::<u8>().is_ok())
}

// -- Validation struct (garde-derived mirror of the same policy) ---------------

/// Declarative mirror of the bucket-name rules for request-level validation.
#[derive(Debug, garde::Validate)]
pub struct BucketNameInput {
    /// Bucket name: 3-63 lowercase alphanumeric characters, dots, and hyphens.
    #[garde(length(min = 3, max = 63), pattern(r"^[a-z0-9][a-z0-9.\-]*[a-z0-9]$"))]
    pub bucket_name: String,
}

// -- Tests --------------------------------------------------------------------
