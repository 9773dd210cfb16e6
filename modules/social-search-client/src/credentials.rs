use base64::Engine;

use crate::types::Credentials;

/// Encode a key pair into the value of a `Basic` authorization header.
///
/// Key and secret are percent-encoded independently (space becomes `%20`),
/// joined with `:`, and the result is standard, unwrapped, padded Base64.
pub fn encode_credentials(api_key: &str, api_secret: &str) -> String {
    let combined = format!(
        "{}:{}",
        urlencoding::encode(api_key),
        urlencoding::encode(api_secret)
    );
    base64::engine::general_purpose::STANDARD.encode(combined.as_bytes())
}

impl Credentials {
    pub fn encoded(&self) -> String {
        encode_credentials(&self.api_key, &self.api_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(encoded: &str) -> String {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .expect("valid base64");
        String::from_utf8(bytes).expect("utf-8")
    }

    #[test]
    fn encodes_known_pair() {
        // "xvz1evFS4wEEPTGEFPHBog:L8qq9PZyRg6ieKGEKhZolGC0vJWLw8iEJ88DRdyOg"
        let encoded = encode_credentials(
            "xvz1evFS4wEEPTGEFPHBog",
            "L8qq9PZyRg6ieKGEKhZolGC0vJWLw8iEJ88DRdyOg",
        );
        assert_eq!(
            encoded,
            "eHZ6MWV2RlM0d0VFUFRHRUZQSEJvZzpMOHFxOVBaeVJnNmllS0dFS2hab2xHQzB2SldMdzhpRUo4OERSZHlPZw=="
        );
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(encode_credentials("k", "s"), encode_credentials("k", "s"));
    }

    #[test]
    fn round_trip_recovers_percent_encoded_parts() {
        let encoded = encode_credentials("my key", "p@ss:word");
        let decoded = decode(&encoded);
        let (key, secret) = decoded.split_once(':').expect("separator");
        assert_eq!(key, "my%20key");
        assert_eq!(secret, "p%40ss%3Aword");
    }

    #[test]
    fn space_is_not_plus() {
        let decoded = decode(&encode_credentials("a b", "c"));
        assert_eq!(decoded, "a%20b:c");
    }

    #[test]
    fn output_has_no_line_breaks() {
        let long = "k".repeat(200);
        let encoded = encode_credentials(&long, &long);
        assert!(!encoded.contains('\n'));
        assert!(!encoded.contains('\r'));
    }

    #[test]
    fn credentials_method_matches_free_function() {
        let creds = Credentials::new("key", "secret");
        assert_eq!(creds.encoded(), encode_credentials("key", "secret"));
    }
}
