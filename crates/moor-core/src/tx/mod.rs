//! Transaction intents: the ordered list of operations one submission
//! carries. Built per call, submitted once, discarded.

pub mod schema;

use serde::{Deserialize, Serialize};

/// A fully qualified entry point, rendered as `package::module::function`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub package: String,
    pub module: String,
    pub function: String,
}

impl EntryPoint {
    pub fn new(
        package: impl Into<String>,
        module: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            module: module.into(),
            function: function.into(),
        }
    }

    /// The `pkg::module::function` target string used on the wire and in logs.
    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }
}

/// One typed argument of an entry-point call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum CallArg {
    /// Reference to an existing ledger object.
    Object(String),
    U64(u64),
    Str(String),
    Address(String),
    /// List of strings (allow-lists of network identifiers).
    VecStr(Vec<String>),
}

/// One operation within an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "op")]
pub enum Operation {
    /// Publish a compiled module bundle.
    Publish {
        modules: Vec<String>,
        dependencies: Vec<String>,
    },
    /// Transfer the capability object yielded by the publish operation.
    TransferPublished { recipient: String },
    /// Call a named entry point with ordered typed arguments.
    MoveCall {
        entry: EntryPoint,
        arguments: Vec<CallArg>,
    },
}

/// An ordered list of operations submitted as one atomic transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub operations: Vec<Operation>,
}

impl TransactionIntent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a publish operation over a compiled bundle.
    pub fn publish(&mut self, modules: Vec<String>, dependencies: Vec<String>) -> &mut Self {
        self.operations.push(Operation::Publish {
            modules,
            dependencies,
        });
        self
    }

    /// Append a transfer of the publish-yielded capability to `recipient`.
    pub fn transfer_published(&mut self, recipient: impl Into<String>) -> &mut Self {
        self.operations.push(Operation::TransferPublished {
            recipient: recipient.into(),
        });
        self
    }

    /// Append an entry-point call.
    pub fn move_call(&mut self, entry: EntryPoint, arguments: Vec<CallArg>) -> &mut Self {
        self.operations.push(Operation::MoveCall { entry, arguments });
        self
    }

    /// Canonical JSON bytes of this intent, the payload that gets signed.
    pub fn to_bytes(&self) -> Vec<u8> {
        // serde_json cannot fail on this type: no maps with non-string keys,
        // no non-finite floats.
        serde_json::to_vec(self).unwrap_or_default()
    }
}
