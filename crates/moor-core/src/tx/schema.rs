//! Declarative call schemas for the configuration entry points.
//!
//! Each variant is a fixed, ordered parameter list bound to an entry-point
//! name; one builder assembles the intent for all of them.

use std::collections::BTreeMap;

use crate::error::DeployError;
use crate::tx::{CallArg, EntryPoint, Operation};

/// The argument kind a schema position accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Reference to an existing ledger object.
    Object,
    U64,
    Str,
    Address,
    StrList,
}

impl ParamKind {
    fn matches(self, arg: &CallArg) -> bool {
        matches!(
            (self, arg),
            (ParamKind::Object, CallArg::Object(_))
                | (ParamKind::U64, CallArg::U64(_))
                | (ParamKind::Str, CallArg::Str(_))
                | (ParamKind::Address, CallArg::Address(_))
                | (ParamKind::StrList, CallArg::VecStr(_))
        )
    }

    fn expected(self) -> &'static str {
        match self {
            ParamKind::Object => "an object reference",
            ParamKind::U64 => "an unsigned integer",
            ParamKind::Str => "a string",
            ParamKind::Address => "an address",
            ParamKind::StrList => "a list of strings",
        }
    }
}

/// One named, typed parameter position.
#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
}

const fn param(name: &'static str, kind: ParamKind) -> Param {
    Param { name, kind }
}

/// An entry point plus its ordered parameter list.
#[derive(Debug, Clone, Copy)]
pub struct CallSchema {
    pub module: &'static str,
    pub function: &'static str,
    pub params: &'static [Param],
}

impl CallSchema {
    fn target(&self, package_id: &str) -> String {
        format!("{package_id}::{}::{}", self.module, self.function)
    }
}

/// `spoke_manager::configure`: admin cap, shared storage, manager config,
/// witness carrier, version, token identifier. No allow-lists; only the
/// token variant takes those.
pub const MANAGER_CONFIGURE: CallSchema = CallSchema {
    module: "spoke_manager",
    function: "configure",
    params: &[
        param("admin", ParamKind::Object),
        param("storage", ParamKind::Object),
        param("manager-config", ParamKind::Object),
        param("witness", ParamKind::Object),
        param("version", ParamKind::U64),
        param("token-id", ParamKind::Str),
    ],
};

/// `spoke_token::configure`: admin cap, shared storage, witness carrier,
/// version, token identifier, the allow-lists, treasury cap last.
pub const TOKEN_CONFIGURE: CallSchema = CallSchema {
    module: "spoke_token",
    function: "configure",
    params: &[
        param("admin", ParamKind::Object),
        param("storage", ParamKind::Object),
        param("witness", ParamKind::Object),
        param("version", ParamKind::U64),
        param("token-id", ParamKind::Str),
        param("sources", ParamKind::StrList),
        param("destinations", ParamKind::StrList),
        param("treasury", ParamKind::Object),
    ],
};

/// `test_coin::mint`: treasury cap, amount, recipient.
pub const COIN_MINT: CallSchema = CallSchema {
    module: "test_coin",
    function: "mint",
    params: &[
        param("treasury", ParamKind::Object),
        param("amount", ParamKind::U64),
        param("recipient", ParamKind::Address),
    ],
};

/// Named argument values for one schema-driven call.
#[derive(Debug, Clone, Default)]
pub struct CallValues {
    values: BTreeMap<&'static str, CallArg>,
}

impl CallValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(mut self, name: &'static str, id: impl Into<String>) -> Self {
        self.values.insert(name, CallArg::Object(id.into()));
        self
    }

    pub fn u64(mut self, name: &'static str, value: u64) -> Self {
        self.values.insert(name, CallArg::U64(value));
        self
    }

    pub fn str(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(name, CallArg::Str(value.into()));
        self
    }

    pub fn address(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(name, CallArg::Address(value.into()));
        self
    }

    pub fn str_list(mut self, name: &'static str, values: Vec<String>) -> Self {
        self.values.insert(name, CallArg::VecStr(values));
        self
    }
}

/// Assemble a `MoveCall` operation from a schema and named values.
///
/// Arguments come out in the schema's declared order regardless of insertion
/// order. A missing value or a kind mismatch is a typed error; extra values
/// not named by the schema are ignored.
pub fn build_call(
    package_id: &str,
    schema: &CallSchema,
    values: &CallValues,
) -> Result<Operation, DeployError> {
    let target = schema.target(package_id);
    let mut arguments = Vec::with_capacity(schema.params.len());

    for position in schema.params {
        let arg = values
            .values
            .get(position.name)
            .ok_or_else(|| DeployError::MissingArgument {
                target: target.clone(),
                name: position.name.to_string(),
            })?;
        if !position.kind.matches(arg) {
            return Err(DeployError::ArgumentMismatch {
                target: target.clone(),
                name: position.name.to_string(),
                expected: position.kind.expected(),
            });
        }
        arguments.push(arg.clone());
    }

    Ok(Operation::MoveCall {
        entry: EntryPoint::new(package_id, schema.module, schema.function),
        arguments,
    })
}
