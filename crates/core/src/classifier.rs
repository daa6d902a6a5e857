//! Intent classification: the replaceable strategy that turns free text into a plan.

use crate::capability::Parameters;
use crate::message::ConversationTurn;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The capability to run for an instruction, with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationPlan {
    pub capability: String,
    #[serde(default)]
    pub parameters: Parameters,
}

impl ClassificationPlan {
    pub fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            parameters: Parameters::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// Maps an instruction plus history to zero or one plan.
///
/// Implementations see capability names only, never handlers. Returning
/// `None` means no confident match; classifiers never fail outright.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Strategy name, for logs.
    fn name(&self) -> &str;

    async fn classify(
        &self,
        instruction: &str,
        history: &[ConversationTurn],
        known_capabilities: &[String],
    ) -> Option<ClassificationPlan>;
}
