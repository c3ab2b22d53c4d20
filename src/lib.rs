// DAGBENCH
// LOG-PARSING AND AGGREGATION ENGINE FOR DAG SCHEDULER BENCHMARKS
//
// THE SCHEDULERS ARE BLACK BOXES: THEIR ONLY OBSERVABLE OUTPUT IS LOG TEXT.
// PURE MODULES (natsort, logparse, scale) HAVE NO PROCESS OR FS SIDE EFFECTS
// BEYOND READING ONE LOG, AND ARE TESTABLE OFFLINE.

pub mod config;
pub mod error;
pub mod logparse;
pub mod natsort;
pub mod report;
pub mod runner;
pub mod scale;
pub mod sweep;
