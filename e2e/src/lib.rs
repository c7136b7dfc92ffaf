//! Test harness for the loyalty engine: a scripted stand-in for the accrual system, served over real HTTP.
pub mod mock_accrual;
