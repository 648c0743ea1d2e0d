// Cadastro
// Copyright 2025 The Cadastro Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Access to configuration coming from environment variables.

use std::env;

/// Result alias for variable lookups and conversions.
type Result<T> = std::result::Result<T, String>;

/// Raw value of an environment variable, convertible into richer types.
#[derive(Debug)]
pub(crate) struct Value(String);

impl TryFrom<Value> for String {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        Ok(value.0)
    }
}

/// Derives `TryFrom<Value>` for any type that comes with a `FromStr` implementation.
macro_rules! tryfrom_value_for_fromstr [
    ( $t:ty ) => {
        impl TryFrom<Value> for $t {
            type Error = String;

            fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
                value.0.parse::<$t>().map_err(|e| format!("Invalid {}: {}", stringify!($t), e))
            }
        }
    }
];

tryfrom_value_for_fromstr!(u16);
tryfrom_value_for_fromstr!(u32);

/// Queries the raw content of the environment variable `name`, distinguishing variables that
/// are not set from variables that cannot be read.
fn lookup(name: &str) -> Result<Option<Value>> {
    match env::var(name) {
        Ok(value) => Ok(Some(Value(value))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(format!("Invalid value in environment variable {}", name))
        }
    }
}

/// Converts the `value` of the environment variable `name` to the type `T`.
fn convert<T: TryFrom<Value, Error = String>>(name: &str, value: Value) -> Result<T> {
    value.try_into().map_err(|e| format!("Invalid type in environment variable {}: {}", name, e))
}

/// Reads the environment variable `<prefix>_<suffix>` as a `T`, failing when it is not set.
pub(crate) fn get_required_var<T: TryFrom<Value, Error = String>>(
    prefix: &str,
    suffix: &str,
) -> Result<T> {
    let name = format!("{}_{}", prefix, suffix);
    match lookup(&name)? {
        Some(value) => convert(&name, value),
        None => Err(format!("Required environment variable {} not present", name)),
    }
}

/// Reads the environment variable `<prefix>_<suffix>` as a `T`, yielding `None` when it is
/// not set.
pub(crate) fn get_optional_var<T: TryFrom<Value, Error = String>>(
    prefix: &str,
    suffix: &str,
) -> Result<Option<T>> {
    let name = format!("{}_{}", prefix, suffix);
    match lookup(&name)? {
        Some(value) => convert(&name, value).map(Some),
        None => Ok(None),
    }
}
