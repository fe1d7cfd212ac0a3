// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use lead_filter::utils::telemetry;

#[test]
fn test_telemetry_initialization_is_idempotent() {
    telemetry::init_telemetry();
    telemetry::init_telemetry();

    tracing::info!(
        company_name = "Acme",
        qualified = true,
        "Successfully evaluated lead"
    );
    tracing::error!(error = "boom", "Error evaluating lead");
}
