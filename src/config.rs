//! # Summary
//!
//! Deployment configuration surface: the cluster shape as loaded from a
//! YAML file. The protocol engine never reads this itself; it exists for
//! the process wrapper assembling a cluster.

use serde::Deserialize;

use crate::error::Error;

/// Cluster shape described by a YAML deployment file.
#[derive(Deserialize)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Number of acceptors in the cluster
    #[serde(rename = "numbers.acceptor")]
    pub acceptors: usize,

    /// Number of replicas hosting learners
    #[serde(rename = "numbers.replicas")]
    pub replicas: usize,

    /// Number of proposers competing for leadership
    #[serde(rename = "numbers.leaders")]
    pub leaders: usize,
}

impl Config {
    /// Loads a configuration from a YAML file.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Config, Error> {
        let file = std::fs::File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }
}

impl std::str::FromStr for Config {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Config, Error> {
        Ok(serde_yaml::from_str(raw)?)
    }
}
