// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

mod readiness_scenarios_test;
mod token_concurrency_test;
