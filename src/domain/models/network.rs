//! Network domain model.
//!
//! A network is an ordered sequence of model identifiers interpreted
//! cyclically: the model for sequence position `n` is `network[n mod len]`.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{EngineError, EngineResult};

/// Cyclic sequence of model identifiers, length >= 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Network(Vec<String>);

impl Network {
    /// Create a network, rejecting an empty model list.
    pub fn new(models: Vec<String>) -> EngineResult<Self> {
        if models.is_empty() {
            return Err(EngineError::Validation(
                "network must contain at least one model".to_string(),
            ));
        }
        Ok(Self(models))
    }

    /// The model identifier for a sequence position.
    pub fn model_at(&self, sequence_number: usize) -> &str {
        &self.0[sequence_number % self.0.len()]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn models(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(" -> "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_network() {
        assert!(Network::new(vec![]).is_err());
    }

    #[test]
    fn model_at_wraps_cyclically() {
        let network =
            Network::new(vec!["a".to_string(), "b".to_string(), "c".to_string()]).unwrap();
        assert_eq!(network.model_at(0), "a");
        assert_eq!(network.model_at(1), "b");
        assert_eq!(network.model_at(2), "c");
        assert_eq!(network.model_at(3), "a");
        assert_eq!(network.model_at(7), "b");
    }

    #[test]
    fn single_model_network_always_selects_it() {
        let network = Network::new(vec!["only".to_string()]).unwrap();
        for seq in 0..5 {
            assert_eq!(network.model_at(seq), "only");
        }
    }
}
