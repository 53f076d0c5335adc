
pub mod logging;
pub mod commands;
pub mod star;
pub mod imod;
