// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod chrome_engine;
pub mod factory;
pub mod null_engine;
pub mod options;
pub mod readiness;
pub mod traits;
