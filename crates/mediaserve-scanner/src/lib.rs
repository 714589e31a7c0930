// MediaServe - Content-Addressed Media Catalogue
// Copyright (C) 2025 MediaServe Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Storage scanning for MediaServe
//!
//! This crate provides:
//! - The `Scanner`, which walks the storage tree and produces a complete
//!   hash-keyed snapshot of every readable media file
//! - The `RescanScheduler`, a background loop publishing fresh snapshots
//!   into the media index on a fixed interval

pub mod error;
pub mod scan;
pub mod scheduler;

pub use error::ScanError;
pub use scan::Scanner;
pub use scheduler::RescanScheduler;
