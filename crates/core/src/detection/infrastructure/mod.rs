pub mod simulated_unit;
