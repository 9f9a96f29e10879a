//! Shared test harness modules for the chance-verify CLI.

use super::*;

mod helpers;
