pub mod list;
pub mod plan;
pub mod run;

pub use list::handle_list_command;
pub use plan::handle_plan_command;
pub use run::handle_run_command;
