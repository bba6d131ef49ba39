//! Tool adapters: local collaborators, remote forwarders, and the registry
//! that presents them behind one executor port.

pub mod command;
pub mod data;
pub mod file;
pub mod local;
pub mod location;
pub mod registry;
pub mod remote;

pub use local::LocalToolExecutor;
pub use registry::ToolRegistry;
pub use remote::RemoteToolClient;

use switchboard_domain::ToolSpec;

/// The default local tool set.
pub fn local_tool_spec() -> ToolSpec {
    ToolSpec::new()
        .register(location::current_location_definition())
        .register(file::read_file_definition())
        .register(file::find_files_definition())
        .register(command::run_command_definition())
        .register(data::summarize_data_definition())
}
