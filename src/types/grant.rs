//! Grant Types
//!
//! The OAuth2 grants a client can present at the token endpoint, and their
//! form-encoded parameters.

use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// OAuth2 grant.
#[derive(Clone, Debug)]
pub enum OAuth2Grant {
    ClientCredentials {
        client_id: String,
        client_secret: SecretString,
        scope: Option<String>,
    },
    AuthorizationCode {
        client_id: String,
        client_secret: Option<SecretString>,
        code: String,
        redirect_uri: Url,
    },
    AuthorizationCodePkce {
        client_id: String,
        code: String,
        code_verifier: String,
        redirect_uri: Url,
    },
    ResourceOwnerPassword {
        username: String,
        password: SecretString,
        scope: Option<String>,
        client_id: String,
        client_secret: Option<SecretString>,
    },
    Implicit {
        client_id: String,
        scope: Option<String>,
        redirect_uri: Url,
    },
    RefreshToken {
        client_id: String,
        client_secret: Option<SecretString>,
        refresh_token: String,
    },
}

impl OAuth2Grant {
    /// `grant_type` parameter value.
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::ClientCredentials { .. } => "client_credentials",
            Self::AuthorizationCode { .. } | Self::AuthorizationCodePkce { .. } => {
                "authorization_code"
            }
            Self::ResourceOwnerPassword { .. } => "password",
            Self::Implicit { .. } => "implicit",
            Self::RefreshToken { .. } => "refresh_token",
        }
    }

    pub fn client_id(&self) -> &str {
        match self {
            Self::ClientCredentials { client_id, .. }
            | Self::AuthorizationCode { client_id, .. }
            | Self::AuthorizationCodePkce { client_id, .. }
            | Self::ResourceOwnerPassword { client_id, .. }
            | Self::Implicit { client_id, .. }
            | Self::RefreshToken { client_id, .. } => client_id,
        }
    }

    /// Form parameters, sorted by field name. Absent optional fields are
    /// omitted rather than sent empty.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let grant_type = ("grant_type", self.grant_type().to_string());
        let mut fields = match self {
            Self::ClientCredentials {
                client_id,
                client_secret,
                scope,
            } => vec![
                Some(("client_id", client_id.clone())),
                Some(("client_secret", client_secret.expose_secret().clone())),
                Some(grant_type),
                scope.clone().map(|s| ("scope", s)),
            ],
            Self::AuthorizationCode {
                client_id,
                client_secret,
                code,
                redirect_uri,
            } => vec![
                Some(("client_id", client_id.clone())),
                exposed("client_secret", client_secret),
                Some(("code", code.clone())),
                Some(grant_type),
                Some(("redirect_uri", redirect_uri.to_string())),
            ],
            Self::AuthorizationCodePkce {
                client_id,
                code,
                code_verifier,
                redirect_uri,
            } => vec![
                Some(("client_id", client_id.clone())),
                Some(("code", code.clone())),
                Some(("code_verifier", code_verifier.clone())),
                Some(grant_type),
                Some(("redirect_uri", redirect_uri.to_string())),
            ],
            Self::ResourceOwnerPassword {
                username,
                password,
                scope,
                client_id,
                client_secret,
            } => vec![
                Some(("client_id", client_id.clone())),
                exposed("client_secret", client_secret),
                Some(grant_type),
                Some(("password", password.expose_secret().clone())),
                scope.clone().map(|s| ("scope", s)),
                Some(("username", username.clone())),
            ],
            Self::Implicit {
                client_id,
                scope,
                redirect_uri,
            } => vec![
                Some(("client_id", client_id.clone())),
                Some(grant_type),
                Some(("redirect_uri", redirect_uri.to_string())),
                scope.clone().map(|s| ("scope", s)),
            ],
            Self::RefreshToken {
                client_id,
                client_secret,
                refresh_token,
            } => vec![
                Some(("client_id", client_id.clone())),
                exposed("client_secret", client_secret),
                Some(grant_type),
                Some(("refresh_token", refresh_token.clone())),
            ],
        }
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

        fields.sort_by_key(|(name, _)| *name);
        fields
    }

    /// Form-urlencoded body.
    pub fn to_form_body(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.form_fields())
            .finish()
    }
}

fn exposed(name: &'static str, secret: &Option<SecretString>) -> Option<(&'static str, String)> {
    secret
        .as_ref()
        .map(|s| (name, s.expose_secret().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(grant: &OAuth2Grant) -> Vec<&'static str> {
        grant.form_fields().into_iter().map(|(name, _)| name).collect()
    }

    fn redirect() -> Url {
        Url::parse("myapp://callback").unwrap()
    }

    #[test]
    fn test_client_credentials_fields() {
        let grant = OAuth2Grant::ClientCredentials {
            client_id: "c".to_string(),
            client_secret: SecretString::new("s".to_string()),
            scope: None,
        };
        assert_eq!(grant.grant_type(), "client_credentials");
        assert_eq!(names(&grant), vec!["client_id", "client_secret", "grant_type"]);
    }

    #[test]
    fn test_password_grant_omits_absent_optionals() {
        let grant = OAuth2Grant::ResourceOwnerPassword {
            username: "ada".to_string(),
            password: SecretString::new("pw".to_string()),
            scope: None,
            client_id: "c".to_string(),
            client_secret: None,
        };

        let fields = grant.form_fields();
        assert_eq!(
            fields,
            vec![
                ("client_id", "c".to_string()),
                ("grant_type", "password".to_string()),
                ("password", "pw".to_string()),
                ("username", "ada".to_string()),
            ]
        );
        assert!(!grant.to_form_body().contains("scope"));
        assert!(!grant.to_form_body().contains("client_secret"));
    }

    #[test]
    fn test_password_grant_with_all_fields() {
        let grant = OAuth2Grant::ResourceOwnerPassword {
            username: "ada".to_string(),
            password: SecretString::new("pw".to_string()),
            scope: Some("read".to_string()),
            client_id: "c".to_string(),
            client_secret: Some(SecretString::new("s".to_string())),
        };
        assert_eq!(
            names(&grant),
            vec!["client_id", "client_secret", "grant_type", "password", "scope", "username"]
        );
    }

    #[test]
    fn test_authorization_code_fields() {
        let grant = OAuth2Grant::AuthorizationCode {
            client_id: "c".to_string(),
            client_secret: None,
            code: "xyz".to_string(),
            redirect_uri: redirect(),
        };
        assert_eq!(grant.grant_type(), "authorization_code");
        assert_eq!(names(&grant), vec!["client_id", "code", "grant_type", "redirect_uri"]);
    }

    #[test]
    fn test_pkce_fields() {
        let grant = OAuth2Grant::AuthorizationCodePkce {
            client_id: "c".to_string(),
            code: "xyz".to_string(),
            code_verifier: "v".to_string(),
            redirect_uri: redirect(),
        };
        assert_eq!(grant.grant_type(), "authorization_code");
        assert_eq!(
            names(&grant),
            vec!["client_id", "code", "code_verifier", "grant_type", "redirect_uri"]
        );
    }

    #[test]
    fn test_implicit_and_refresh_fields() {
        let implicit = OAuth2Grant::Implicit {
            client_id: "c".to_string(),
            scope: Some("openid".to_string()),
            redirect_uri: redirect(),
        };
        assert_eq!(implicit.grant_type(), "implicit");
        assert_eq!(names(&implicit), vec!["client_id", "grant_type", "redirect_uri", "scope"]);

        let refresh = OAuth2Grant::RefreshToken {
            client_id: "c".to_string(),
            client_secret: None,
            refresh_token: "rt".to_string(),
        };
        assert_eq!(names(&refresh), vec!["client_id", "grant_type", "refresh_token"]);
    }

    #[test]
    fn test_form_body_encoding() {
        let grant = OAuth2Grant::AuthorizationCode {
            client_id: "my client".to_string(),
            client_secret: None,
            code: "a/b".to_string(),
            redirect_uri: Url::parse("https://app.example.com/cb").unwrap(),
        };
        assert_eq!(
            grant.to_form_body(),
            "client_id=my+client&code=a%2Fb&grant_type=authorization_code&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb"
        );
    }
}
