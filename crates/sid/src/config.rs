//! Configuration

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use smol::future::BoxedLocal;

/// Application-supplied authentication hook: token in, verdict out
pub type AuthCallback = Rc<dyn Fn(String) -> BoxedLocal<Result<(), String>>>;

/// Authentication metadata advertised to agents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidAuth {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_hint: Option<String>,
}

/// Options for [`SidHost::init`](crate::SidHost::init)
#[derive(Clone)]
pub struct SidConfig {
    /// Keep the registry in sync with DOM mutations
    pub observe_mutations: bool,
    pub auth: Option<SidAuth>,
    pub authenticate: Option<AuthCallback>,
}

impl SidConfig {
    pub fn with_auth(mut self, auth: SidAuth, authenticate: AuthCallback) -> Self {
        self.auth = Some(auth);
        self.authenticate = Some(authenticate);
        self
    }
}

impl Default for SidConfig {
    fn default() -> Self {
        Self {
            observe_mutations: true,
            auth: None,
            authenticate: None,
        }
    }
}

impl fmt::Debug for SidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SidConfig")
            .field("observe_mutations", &self.observe_mutations)
            .field("auth", &self.auth)
            .field("authenticate", &self.authenticate.as_ref().map(|_| "<callback>"))
            .finish()
    }
}
