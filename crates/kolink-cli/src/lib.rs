pub mod commands;
pub mod pattern_list;
pub mod trace_init;
