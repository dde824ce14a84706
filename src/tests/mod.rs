mod api_tests;
mod scenario_tests;
