use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Cluster admin identity used for HTTP Basic auth against the management
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value for the `Authorization` request header.
    pub fn http_basic_auth(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {}", encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_basic_auth_header() {
        let credentials = Credentials::new("admin", "password");
        assert_eq!(
            credentials.http_basic_auth(),
            "Basic YWRtaW46cGFzc3dvcmQ="
        );
    }
}
