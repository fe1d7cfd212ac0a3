// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// Actor输入错误类型
#[derive(Error, Debug)]
pub enum InputError {
    #[error("input must be a JSON object")]
    NotAnObject,

    #[error("field `leads` is required")]
    MissingLeads,

    #[error("{0}")]
    InvalidField(#[from] serde_json::Error),
}
