use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Nuvei production tokenization endpoint.
pub const NUVEI_PRODUCTION_URL: &str = "https://secure.nuvei.com/ppp/api/v1/tokenization";

/// Nuvei sandbox tokenization endpoint.
pub const NUVEI_SANDBOX_URL: &str = "https://ppptest.nuvei.com/ppp/api/v1/tokenization";

/// DialedIn (ChaseData) lead update endpoint.
pub const DIALEDIN_UPDATE_LEAD_URL: &str = "https://api.chasedatacorp.com/HttpImport/UpdateLead.php";

pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);
pub const CRM_TIMEOUT: Duration = Duration::from_secs(15);

/// Deployment environment. Selects the Nuvei endpoint and whether internal
/// error details are returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Production,
    #[default]
    Development,
    Test,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn tokenization_url(&self) -> &'static str {
        match self {
            Environment::Production => NUVEI_PRODUCTION_URL,
            Environment::Development | Environment::Test => NUVEI_SANDBOX_URL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
            Environment::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}
