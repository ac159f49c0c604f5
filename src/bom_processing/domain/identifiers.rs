//! Serial-number and blob-tag conventions.

use uuid::Uuid;

const URN_UUID_PREFIX: &str = "urn:uuid:";
const BLOB_TAG_PREFIX: &str = "rebom-";
const RAW_SUFFIX: &str = "-raw";

/// Strips a leading `urn:uuid:` from a serial number.
pub fn strip_urn(serial_number: &str) -> &str {
    serial_number
        .strip_prefix(URN_UUID_PREFIX)
        .unwrap_or(serial_number)
}

/// Adds `urn:uuid:` when missing.
pub fn with_urn(serial_number: &str) -> String {
    if serial_number.starts_with(URN_UUID_PREFIX) {
        serial_number.to_string()
    } else {
        format!("{}{}", URN_UUID_PREFIX, serial_number)
    }
}

/// Serial-number equality, ignoring the `urn:uuid:` prefix.
pub fn same_serial(a: &str, b: &str) -> bool {
    strip_urn(a).eq_ignore_ascii_case(strip_urn(b))
}

pub fn generate_serial_number() -> String {
    format!("{}{}", URN_UUID_PREFIX, Uuid::new_v4())
}

/// Normalizes a blob tag: `sha256:` digests pass through, otherwise any
/// `urn:uuid:` is dropped and the `rebom-` prefix is ensured.
pub fn normalize_blob_tag(tag: &str) -> String {
    if tag.starts_with("sha256:") {
        return tag.to_string();
    }
    let tag = strip_urn(tag);
    if tag.starts_with(BLOB_TAG_PREFIX) {
        tag.to_string()
    } else {
        format!("{}{}", BLOB_TAG_PREFIX, tag)
    }
}

/// Tag holding the processed content of a record.
pub fn processed_blob_tag(uuid: &Uuid) -> String {
    format!("{}{}", BLOB_TAG_PREFIX, uuid)
}

/// Tag holding the untransformed input of a record.
pub fn raw_blob_tag(uuid: &Uuid) -> String {
    format!("{}{}{}", BLOB_TAG_PREFIX, uuid, RAW_SUFFIX)
}

/// Tag holding an original SPDX upload.
pub fn spdx_blob_tag(uuid: &Uuid) -> String {
    format!("{}spdx-{}", BLOB_TAG_PREFIX, uuid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_normalization() {
        let id = "3e671687-395b-41f5-a30f-a58921a69b79";
        assert_eq!(strip_urn(&format!("urn:uuid:{}", id)), id);
        assert_eq!(with_urn(id), format!("urn:uuid:{}", id));
        assert_eq!(with_urn(&with_urn(id)), format!("urn:uuid:{}", id));
        assert!(same_serial(id, &format!("urn:uuid:{}", id.to_uppercase())));
        assert!(!same_serial(id, "urn:uuid:other"));
    }

    #[test]
    fn test_generated_serial_has_urn_prefix() {
        let serial = generate_serial_number();
        assert!(serial.starts_with("urn:uuid:"));
        assert!(Uuid::parse_str(strip_urn(&serial)).is_ok());
    }

    #[test]
    fn test_blob_tags() {
        let uuid = Uuid::parse_str("3e671687-395b-41f5-a30f-a58921a69b79").unwrap();
        assert_eq!(
            processed_blob_tag(&uuid),
            "rebom-3e671687-395b-41f5-a30f-a58921a69b79"
        );
        assert_eq!(
            raw_blob_tag(&uuid),
            "rebom-3e671687-395b-41f5-a30f-a58921a69b79-raw"
        );
    }

    #[test]
    fn test_normalize_blob_tag() {
        assert_eq!(normalize_blob_tag("urn:uuid:abc"), "rebom-abc");
        assert_eq!(normalize_blob_tag("rebom-abc"), "rebom-abc");
        assert_eq!(normalize_blob_tag("sha256:ff00"), "sha256:ff00");
    }
}
