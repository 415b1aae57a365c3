use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Persistence backend types
///
/// `Postgres` is the production store. `Memory` keeps everything in process and is
/// used for local development and the integration tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    Memory,
}

impl FromStr for DatabaseBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(DatabaseBackend::Postgres),
            "memory" | "in-memory" => Ok(DatabaseBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid database backend: {}", s)),
        }
    }
}

impl Display for DatabaseBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DatabaseBackend::Postgres => write!(f, "postgres"),
            DatabaseBackend::Memory => write!(f, "memory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!(
            "Postgres".parse::<DatabaseBackend>().unwrap(),
            DatabaseBackend::Postgres
        );
        assert_eq!(
            "memory".parse::<DatabaseBackend>().unwrap(),
            DatabaseBackend::Memory
        );
        assert!("sqlite".parse::<DatabaseBackend>().is_err());
    }
}
