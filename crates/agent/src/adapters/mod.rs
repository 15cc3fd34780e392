// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference adapters (§12): concrete, runnable implementations of the
//! `Supervisor`/`DesiredStateSource` contracts, supplied so `fleetd` is a
//! runnable daemon end to end. Not part of the reconciliation core and
//! not exercised by the §8 property tests — see `DESIGN.md`.

mod file_desired_state;
mod process_supervisor;

pub use file_desired_state::{FileDesiredStateError, FileDesiredStateSource};
pub use process_supervisor::{ProcessSupervisor, ProcessSupervisorFactory};
