//! Shared test harness modules for the Headway CLI.

use super::*;

mod helpers;
mod probe_unit;
