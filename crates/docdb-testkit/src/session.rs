//! Session tokens: `<lsn>` or `<version>#<globalLsn>#<region>=<lsn>...`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::TestkitError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionToken {
    Simple {
        global_lsn: i64,
    },
    Vector {
        version: i64,
        global_lsn: i64,
        /// Region id to local LSN.
        regional: BTreeMap<u32, i64>,
    },
}

impl SessionToken {
    pub fn parse(raw: &str) -> Result<Self, TestkitError> {
        let invalid = || TestkitError::invalid_argument(format!("session token {raw:?}"));
        let mut parts = raw.split('#');
        let first = parts.next().ok_or_else(invalid)?;
        let Some(second) = parts.next() else {
            let global_lsn = first.parse().map_err(|_| invalid())?;
            return Ok(SessionToken::Simple { global_lsn });
        };
        let version = first.parse().map_err(|_| invalid())?;
        let global_lsn = second.parse().map_err(|_| invalid())?;
        let mut regional = BTreeMap::new();
        for part in parts {
            let (region, lsn) = part.split_once('=').ok_or_else(invalid)?;
            regional.insert(
                region.parse().map_err(|_| invalid())?,
                lsn.parse().map_err(|_| invalid())?,
            );
        }
        Ok(SessionToken::Vector {
            version,
            global_lsn,
            regional,
        })
    }

    pub fn global_lsn(&self) -> i64 {
        match self {
            SessionToken::Simple { global_lsn } | SessionToken::Vector { global_lsn, .. } => {
                *global_lsn
            }
        }
    }

    /// Same token shape with the global LSN replaced.
    pub fn with_global_lsn(&self, global_lsn: i64) -> Self {
        match self {
            SessionToken::Simple { .. } => SessionToken::Simple { global_lsn },
            SessionToken::Vector {
                version, regional, ..
            } => SessionToken::Vector {
                version: *version,
                global_lsn,
                regional: regional.clone(),
            },
        }
    }
}

impl FromStr for SessionToken {
    type Err = TestkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionToken::parse(s)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionToken::Simple { global_lsn } => write!(f, "{global_lsn}"),
            SessionToken::Vector {
                version,
                global_lsn,
                regional,
            } => {
                write!(f, "{version}#{global_lsn}")?;
                for (region, lsn) in regional {
                    write!(f, "#{region}={lsn}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_token() {
        let t = SessionToken::parse("42").unwrap();
        assert_eq!(t, SessionToken::Simple { global_lsn: 42 });
        assert_eq!(t.with_global_lsn(100).to_string(), "100");
    }

    #[test]
    fn vector_token_keeps_regions() {
        let t: SessionToken = "1#100#1=20#2=5".parse().unwrap();
        assert_eq!(t.global_lsn(), 100);
        assert_eq!(t.with_global_lsn(7).to_string(), "1#7#1=20#2=5");
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert!(SessionToken::parse("").is_err());
        assert!(SessionToken::parse("1#x").is_err());
        assert!(SessionToken::parse("1#2#3").is_err());
    }
}
