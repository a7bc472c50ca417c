//! Credentials for the Corbee Gestão API and their declarative descriptor.
//!
//! The host stores and decrypts credentials; this module only describes the
//! fields it must collect and gives the nodes a typed view of them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::description::{DefaultValue, FieldDescriptor, OptionValue, PropertyKind};

/// Host that backs the demo environment; also the default base URL.
pub const DEMO_BASE_URL: &str = "https://demo.corbee.com.br";

/// Credential type name nodes refer to.
pub const CREDENTIAL_NAME: &str = "corbeeGestaoApi";

// ---------------------------------------------------------------------------
// UserType / Environment
// ---------------------------------------------------------------------------

/// Which user table the login is checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Internal back-office user.
    #[default]
    Interno,
    /// Broker.
    Corretor,
}

impl FromStr for UserType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "interno" => Ok(UserType::Interno),
            "corretor" => Ok(UserType::Corretor),
            _ => Err(()),
        }
    }
}

/// Deployment the credentials point at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Always talk to [`DEMO_BASE_URL`], whatever `base_url` says.
    Demo,
    /// Use the configured `base_url`.
    #[default]
    Custom,
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "demo" => Ok(Environment::Demo),
            "custom" => Ok(Environment::Custom),
            _ => Err(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Errors from [`Credentials::from_env`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {var} has unsupported value '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Login data for one execution. Never mutated once handed to a node.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "baseUrl", default = "default_base_url")]
    base_url: String,
    login: String,
    senha: String,
    #[serde(default)]
    type_user: UserType,
    #[serde(default)]
    environment: Environment,
}

fn default_base_url() -> String {
    DEMO_BASE_URL.to_owned()
}

impl Credentials {
    pub fn new(
        base_url: impl Into<String>,
        login: impl Into<String>,
        senha: impl Into<String>,
        type_user: UserType,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            login: login.into(),
            senha: senha.into(),
            type_user,
            environment: Environment::Custom,
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Read credentials from `CORBEE_*` environment variables.
    ///
    /// `CORBEE_LOGIN` and `CORBEE_PASSWORD` are mandatory; the rest fall back
    /// to the descriptor defaults.
    pub fn from_env() -> Result<Self, CredentialsError> {
        let base_url = std::env::var("CORBEE_BASE_URL").unwrap_or_else(|_| default_base_url());
        let login = std::env::var("CORBEE_LOGIN")
            .map_err(|_| CredentialsError::Missing("CORBEE_LOGIN"))?;
        let senha = std::env::var("CORBEE_PASSWORD")
            .map_err(|_| CredentialsError::Missing("CORBEE_PASSWORD"))?;

        let type_user = match std::env::var("CORBEE_USER_TYPE") {
            Ok(value) => value.parse().map_err(|_| CredentialsError::Invalid {
                var: "CORBEE_USER_TYPE",
                value,
            })?,
            Err(_) => UserType::default(),
        };
        let environment = match std::env::var("CORBEE_ENVIRONMENT") {
            Ok(value) => value.parse().map_err(|_| CredentialsError::Invalid {
                var: "CORBEE_ENVIRONMENT",
                value,
            })?,
            Err(_) => Environment::default(),
        };

        Ok(Self::new(base_url, login, senha, type_user).with_environment(environment))
    }

    /// Effective base URL after applying the environment switch.
    pub fn base_url(&self) -> &str {
        match self.environment {
            Environment::Demo => DEMO_BASE_URL,
            Environment::Custom => &self.base_url,
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn type_user(&self) -> UserType {
        self.type_user
    }

    /// Body of the `POST /api/v2/login` call.
    pub fn login_body(&self) -> Value {
        json!({
            "login": self.login,
            "senha": self.senha,
            "type_user": self.type_user,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("login", &self.login)
            .field("senha", &"***")
            .field("type_user", &self.type_user)
            .field("environment", &self.environment)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Declarative description of the credential form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDescriptor {
    pub name: &'static str,
    pub display_name: &'static str,
    pub documentation_url: &'static str,
    pub properties: &'static [FieldDescriptor],
}

const USER_TYPES: &[OptionValue] = &[
    OptionValue { name: "User", value: "interno" },
    OptionValue { name: "Corretor", value: "corretor" },
];

static CREDENTIAL_FIELDS: [FieldDescriptor; 4] = [
    FieldDescriptor::new("baseUrl", "Base URL", PropertyKind::String, "Base URL for the Corbee Gestão API")
        .with_default(DefaultValue::Text(DEMO_BASE_URL))
        .with_placeholder(DEMO_BASE_URL),
    FieldDescriptor::new("login", "Login", PropertyKind::String, "Your Corbee Gestão login username"),
    FieldDescriptor::new("senha", "Password", PropertyKind::Password, "Your Corbee Gestão password"),
    FieldDescriptor::new("type_user", "User Type", PropertyKind::Options(USER_TYPES), "Type of user for authentication")
        .with_default(DefaultValue::Text("interno")),
];

pub fn descriptor() -> CredentialDescriptor {
    CredentialDescriptor {
        name: CREDENTIAL_NAME,
        display_name: "Corbee Gestão API",
        documentation_url: "https://demo.corbee.com.br/api/documentation",
        properties: &CREDENTIAL_FIELDS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_environment_overrides_base_url() {
        let creds = Credentials::new("https://corbee.example.com", "ana", "pw", UserType::Interno);
        assert_eq!(creds.base_url(), "https://corbee.example.com");

        let demo = creds.with_environment(Environment::Demo);
        assert_eq!(demo.base_url(), DEMO_BASE_URL);
    }

    #[test]
    fn login_body_uses_wire_names() {
        let creds = Credentials::new(DEMO_BASE_URL, "ana", "pw", UserType::Corretor);
        assert_eq!(
            creds.login_body(),
            json!({ "login": "ana", "senha": "pw", "type_user": "corretor" })
        );
    }

    #[test]
    fn debug_output_hides_password() {
        let creds = Credentials::new(DEMO_BASE_URL, "ana", "hunter2", UserType::Interno);
        let printed = format!("{creds:?}");
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn deserializes_host_payload_with_defaults() {
        let creds: Credentials =
            serde_json::from_value(json!({ "login": "ana", "senha": "pw" })).unwrap();
        assert_eq!(creds.base_url(), DEMO_BASE_URL);
        assert_eq!(creds.type_user(), UserType::Interno);
    }

    #[test]
    fn descriptor_masks_password_field() {
        let desc = descriptor();
        let senha = desc.properties.iter().find(|p| p.name == "senha").unwrap();
        assert_eq!(senha.kind, PropertyKind::Password);
        assert_eq!(desc.name, CREDENTIAL_NAME);
    }

    // One test owns every CORBEE_* variable so the mutations cannot race.
    #[test]
    fn from_env_reads_corbee_variables() {
        const VARS: [&str; 5] = [
            "CORBEE_BASE_URL",
            "CORBEE_LOGIN",
            "CORBEE_PASSWORD",
            "CORBEE_USER_TYPE",
            "CORBEE_ENVIRONMENT",
        ];
        for var in VARS {
            std::env::remove_var(var);
        }

        assert_eq!(Credentials::from_env().unwrap_err(), CredentialsError::Missing("CORBEE_LOGIN"));

        std::env::set_var("CORBEE_LOGIN", "ana");
        assert_eq!(Credentials::from_env().unwrap_err(), CredentialsError::Missing("CORBEE_PASSWORD"));

        std::env::set_var("CORBEE_PASSWORD", "pw");
        let defaults = Credentials::from_env().unwrap();
        assert_eq!(defaults.base_url(), DEMO_BASE_URL);
        assert_eq!(defaults.login(), "ana");
        assert_eq!(defaults.type_user(), UserType::Interno);
        assert_eq!(defaults.environment, Environment::Custom);

        std::env::set_var("CORBEE_USER_TYPE", "admin");
        assert_eq!(
            Credentials::from_env().unwrap_err(),
            CredentialsError::Invalid { var: "CORBEE_USER_TYPE", value: "admin".into() }
        );

        std::env::set_var("CORBEE_USER_TYPE", "corretor");
        std::env::set_var("CORBEE_ENVIRONMENT", "production");
        assert_eq!(
            Credentials::from_env().unwrap_err(),
            CredentialsError::Invalid { var: "CORBEE_ENVIRONMENT", value: "production".into() }
        );

        std::env::set_var("CORBEE_BASE_URL", "https://corbee.example.com");
        std::env::set_var("CORBEE_ENVIRONMENT", "custom");
        let custom = Credentials::from_env().unwrap();
        assert_eq!(custom.base_url(), "https://corbee.example.com");
        assert_eq!(custom.type_user(), UserType::Corretor);

        std::env::set_var("CORBEE_ENVIRONMENT", "demo");
        assert_eq!(Credentials::from_env().unwrap().base_url(), DEMO_BASE_URL);

        for var in VARS {
            std::env::remove_var(var);
        }
    }
}
