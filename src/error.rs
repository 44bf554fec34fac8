//  Copyright 2026 Robert Zavalczki
//  Copyright 2013 Google Inc. All Rights Reserved.
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

use thiserror::Error;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown word: {0:?}")]
    UnknownWord(String),

    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),

    #[error("training was interrupted")]
    Interrupted,

    /// Wraps the first worker failure observed by the coordinator. The
    /// trainer never returns a partial model; any worker error fails the
    /// whole run.
    #[error("training failed: {source}")]
    Training { source: Box<Error> },
}

impl Error {
    pub fn training(source: Error) -> Error {
        Error::Training {
            source: Box::new(source),
        }
    }
}
